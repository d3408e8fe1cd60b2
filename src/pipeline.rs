//! Driver-facing entry points.
//!
//! The engines in `ember_sema` return typed errors and leave reporting to
//! their caller. A [`Session`] is that caller for a validation driver: it
//! runs one engine, routes any failure through the session's [`Reporter`]
//! and hands back what the driver needs to continue.
//!
//! ```text
//! constants, array sizes ──► evaluate
//! enum declarations      ──► assign_enum_values
//! polymorphic calls      ──► resolve ──┐
//! match instructions     ──► discriminate ──┴─► Done | Blocked (retry later) | Failed (reported)
//! ```

use ember_ast::{Ast, BlockId, DeclId, DiscriminationId, ExprId, TaggedValue};
use ember_core::Reporter;
use ember_sema::{
    ConstantEvaluator, Dependency, DiscriminationValidator, MonoOutcome, Monomorphizer,
    OperatorSearch, Resolution, SemaContext, ValidationOutcome, ValidationResult, report,
};
use tracing::debug;

/// Result of one stage, after reporting.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage<T> {
    Done(T),
    /// Park the task and run it again once the dependency is validated.
    Blocked(Dependency),
    /// The failure has already been reported.
    Failed,
}

impl<T> Stage<T> {
    pub fn done(self) -> Option<T> {
        match self {
            Stage::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Stage::Blocked(_))
    }
}

pub struct Session<'a, 'db> {
    db: &'db dyn salsa::Database,
    ctx: &'a SemaContext<'db>,
    operators: &'a dyn OperatorSearch<'db>,
    reporter: &'a dyn Reporter,
}

impl<'a, 'db> Session<'a, 'db> {
    pub fn new(
        db: &'db dyn salsa::Database,
        ctx: &'a SemaContext<'db>,
        operators: &'a dyn OperatorSearch<'db>,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            db,
            ctx,
            operators,
            reporter,
        }
    }

    pub fn evaluate(
        &self,
        ast: &Ast<'db>,
        expr: ExprId,
        scope: BlockId,
    ) -> Option<TaggedValue<'db>> {
        ConstantEvaluator::new(self.db, ast, &self.ctx.config)
            .evaluate(expr, scope)
            .inspect_err(|error| report(self.reporter, error))
            .ok()
    }

    /// Give every member of the enum `decl` its value; `false` once the
    /// failure has been reported.
    pub fn assign_enum_values(&self, ast: &mut Ast<'db>, decl: DeclId) -> bool {
        ember_sema::assign_enum_values(self.db, ast, &self.ctx.config, decl)
            .inspect_err(|error| report(self.reporter, error))
            .is_ok()
    }

    pub fn resolve(
        &self,
        ast: &Ast<'db>,
        decl: DeclId,
        args: &[ExprId],
        scope: BlockId,
    ) -> Stage<Resolution<'db>> {
        match Monomorphizer::new(self.db, ast, self.ctx).resolve(decl, args, scope) {
            MonoOutcome::Resolved(resolution) => Stage::Done(resolution),
            MonoOutcome::Blocked(dependency) => {
                debug!("call to {decl} waits for {dependency}");
                Stage::Blocked(dependency)
            }
            MonoOutcome::Failed(error) => {
                report(self.reporter, &error);
                Stage::Failed
            }
        }
    }

    pub fn discriminate(
        &self,
        ast: &mut Ast<'db>,
        id: DiscriminationId,
    ) -> Stage<ValidationResult<'db>> {
        match DiscriminationValidator::new(self.db, &self.ctx.config, self.operators)
            .validate(ast, id)
        {
            ValidationOutcome::Valid(result) => Stage::Done(result),
            ValidationOutcome::Blocked(dependency) => {
                debug!("discrimination {id} waits for {dependency}");
                Stage::Blocked(dependency)
            }
            ValidationOutcome::Failed(error) => {
                report(self.reporter, &error);
                Stage::Failed
            }
        }
    }
}
