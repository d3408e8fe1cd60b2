//! Monomorphization: binding the `$Name`s of a polymorphic declaration
//! from the arguments of one call site.
//!
//! Resolution runs in four steps:
//! 1. every `$Name` the parameter shapes introduce is registered as a
//!    type or value item before any argument is looked at;
//! 2. each argument type is walked in lock-step with its parameter shape,
//!    producing candidates tagged with the depth they were found at;
//! 3. the candidates of each item are checked against each other and
//!    against the item's constraint;
//! 4. the resulting set is substituted back into the declaration to build
//!    the concrete signature, and the instantiation is looked up or created
//!    in the shared cache.

mod cache;
mod error;
mod item;
mod resolve;
mod unify;

use std::sync::Arc;

use ember_ast::{AggregateDecl, Ast, BlockId, DeclId, DeclKind, ExprId, FunctionDecl, Type};
use tracing::debug;

use crate::eval::EvalError;
use crate::report::ErrorSite;
use crate::{Dependency, SemaContext};
use item::{Candidate, ItemTable};

pub use cache::{InstanceId, Instantiation, MonomorphCache};
pub use error::MonoError;
pub use item::{MonomorphizationItem, MonomorphizationSet};

/// A successful resolution for one call site.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution<'db> {
    pub set: MonomorphizationSet<'db>,
    /// Concrete signature, with value parameters removed, or the aggregate
    /// instance type.
    pub ty: Type<'db>,
    /// Tie-break score among overloads; deeper bindings score higher.
    pub weight: f64,
    pub instance: Arc<Instantiation<'db>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MonoOutcome<'db> {
    Resolved(Resolution<'db>),
    /// Something the call depends on is not validated yet. The driver parks
    /// the call and retries; this is never a failure.
    Blocked(Dependency),
    Failed(MonoError<'db>),
}

impl<'db> MonoOutcome<'db> {
    pub fn resolved(self) -> Option<Resolution<'db>> {
        match self {
            MonoOutcome::Resolved(resolution) => Some(resolution),
            _ => None,
        }
    }

    pub fn failed(self) -> Option<MonoError<'db>> {
        match self {
            MonoOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, MonoOutcome::Blocked(_))
    }
}

/// Early exit from a resolution step.
#[derive(Debug)]
pub(crate) enum Halt<'db> {
    Blocked(Dependency),
    Failed(MonoError<'db>),
}

impl<'db> From<MonoError<'db>> for Halt<'db> {
    fn from(error: MonoError<'db>) -> Self {
        Halt::Failed(error)
    }
}

impl From<EvalError> for Halt<'_> {
    fn from(error: EvalError) -> Self {
        Halt::Failed(MonoError::Evaluation(error))
    }
}

type Step<'db, T = ()> = Result<T, Halt<'db>>;

/// Where a shape is being matched: the argument it came from and the scope
/// its names resolve in.
#[derive(Clone, Copy, Debug)]
struct ShapeSite {
    arg: ExprId,
    scope: BlockId,
}

pub struct Monomorphizer<'a, 'db> {
    db: &'db dyn salsa::Database,
    ast: &'a Ast<'db>,
    ctx: &'a SemaContext<'db>,
}

impl<'a, 'db> Monomorphizer<'a, 'db> {
    pub fn new(db: &'db dyn salsa::Database, ast: &'a Ast<'db>, ctx: &'a SemaContext<'db>) -> Self {
        Self { db, ast, ctx }
    }

    /// Resolve the polymorphic function or aggregate `decl` for a call with
    /// `args`, whose values are evaluated from `scope`.
    pub fn resolve(&self, decl: DeclId, args: &[ExprId], scope: BlockId) -> MonoOutcome<'db> {
        let result = match &self.ast.decl(decl).kind {
            DeclKind::Function(function) => self.resolve_function(decl, function, args, scope),
            DeclKind::Aggregate(aggregate) => self.resolve_aggregate(decl, aggregate, args, scope),
            _ => Err(MonoError::UnsupportedShape {
                span: self.ast.decl(decl).span,
                site: ErrorSite::Decl(decl),
                detail: "only functions and aggregates can be instantiated".to_string(),
            }
            .into()),
        };
        match result {
            Ok(resolution) => {
                debug!(
                    "resolved `{}` as {} ({})",
                    self.ast.decl(decl).name,
                    resolution.ty.display(self.db),
                    resolution.instance.id
                );
                MonoOutcome::Resolved(resolution)
            }
            Err(Halt::Blocked(dependency)) => {
                debug!("`{}` is blocked on {dependency}", self.ast.decl(decl).name);
                MonoOutcome::Blocked(dependency)
            }
            Err(Halt::Failed(error)) => MonoOutcome::Failed(error),
        }
    }

    fn resolve_function(
        &self,
        decl: DeclId,
        function: &FunctionDecl,
        args: &[ExprId],
        scope: BlockId,
    ) -> Step<'db, Resolution<'db>> {
        let mut table = self.discover(function)?;

        let mut weight = 0.0;
        match function.params.len().checked_sub(1) {
            Some(last) => {
                for (index, &arg) in args.iter().enumerate() {
                    // Trailing variadic parameters absorb the extra arguments.
                    let param = function.params[index.min(last)];
                    weight += self.unify_argument(&mut table, param, arg, function.scope, scope)?;
                }
            }
            None => {
                if let Some(&arg) = args.first() {
                    return Err(MonoError::TooManyArguments {
                        span: self.ast.expr(arg).span,
                        expected: 0,
                        found: args.len(),
                    }
                    .into());
                }
            }
        }
        let weight = if args.is_empty() {
            1.0
        } else {
            weight / args.len() as f64
        };

        let set = self.select(&table, self.ast.decl(decl).span)?;
        let ty = self.function_type(function, &set)?;
        let instance = self
            .ctx
            .monomorphizations
            .instantiate(decl, set.clone(), ty);
        Ok(Resolution {
            set,
            ty,
            weight,
            instance,
        })
    }

    fn resolve_aggregate(
        &self,
        decl: DeclId,
        aggregate: &AggregateDecl<'db>,
        args: &[ExprId],
        scope: BlockId,
    ) -> Step<'db, Resolution<'db>> {
        let mut table = self.aggregate_table(aggregate);
        for (ident, arg) in self.aggregate_arguments(aggregate, args)? {
            let Some(ty) = self.ast.expr(arg).ty else {
                return Err(Halt::Blocked(Dependency::Expr(arg)));
            };
            let value = crate::eval::ConstantEvaluator::new(self.db, self.ast, &self.ctx.config)
                .evaluate(arg, scope)?;
            let candidate = Candidate {
                item: self.value_item(ident, value, Some(ty)),
                depth: 1,
                site: arg,
            };
            self.add_candidate(&mut table, ident, candidate)?;
        }

        let set = self.select(&table, self.ast.decl(decl).span)?;
        let instance = self.instantiate_aggregate(decl, set.clone())?;
        Ok(Resolution {
            set,
            ty: instance.ty,
            weight: 1.0,
            instance,
        })
    }
}
