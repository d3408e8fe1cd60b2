//! Validation of match instructions.
//!
//! The discriminee's type decides the rule set:
//! - enums and error sets: labels name members, and the cases together must
//!   cover every member unless there is a default branch;
//! - named tagged unions: each case names one member, optionally capturing
//!   its payload, and a default branch is always required;
//! - anonymous unions: the same, with type labels instead of names;
//! - anything else: labels are values compared with the type's `==`.
//!
//! Validation first works out everything it will change, and only touches
//! the tree once the whole instruction has been accepted.

mod error;

use ember_ast::{
    Ast, BinaryOp, BlockId, Conversion, ConversionKind, Decl, DeclId, DeclKind, Discrimination,
    DiscriminationId, DiscriminationKind, ExprId, ExprKind, Type, TypeKind,
};
use ember_core::{Span, Symbol};
use tracing::{debug, trace};

use crate::conversion::find_conversion;
use crate::eval::denoted_type;
use crate::members::{MemberInfo, aggregate_members, enum_members};
use crate::operators::{OperatorCandidate, OperatorSearch};
use crate::suggest::nearest_name;
use crate::{Dependency, SemaConfig};

pub use error::DiscriminationError;

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationResult<'db> {
    pub kind: DiscriminationKind,
    /// The `==` chosen for a scalar discrimination.
    pub operator: Option<OperatorCandidate<'db>>,
    /// Capture declarations, in case order.
    pub captures: Vec<DeclId>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValidationOutcome<'db> {
    Valid(ValidationResult<'db>),
    Blocked(Dependency),
    Failed(DiscriminationError),
}

impl<'db> ValidationOutcome<'db> {
    pub fn valid(self) -> Option<ValidationResult<'db>> {
        match self {
            ValidationOutcome::Valid(result) => Some(result),
            _ => None,
        }
    }

    pub fn failed(self) -> Option<DiscriminationError> {
        match self {
            ValidationOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

enum Halt {
    Blocked(Dependency),
    Failed(DiscriminationError),
}

impl From<DiscriminationError> for Halt {
    fn from(error: DiscriminationError) -> Self {
        Halt::Failed(error)
    }
}

type Step<T = ()> = Result<T, Halt>;

/// A payload binding to synthesize once validation succeeds.
struct CaptureSpec<'db> {
    case: usize,
    name: Symbol,
    span: Span,
    member: Type<'db>,
    index: usize,
}

/// Everything a successful validation writes back.
struct Plan<'db> {
    kind: DiscriminationKind,
    operator: Option<OperatorCandidate<'db>>,
    matched: Vec<Vec<Symbol>>,
    captures: Vec<CaptureSpec<'db>>,
    conversions: Vec<(ExprId, Conversion<'db>)>,
}

impl<'db> Plan<'db> {
    fn new(kind: DiscriminationKind, cases: usize) -> Self {
        Self {
            kind,
            operator: None,
            matched: vec![Vec::new(); cases],
            captures: Vec::new(),
            conversions: Vec::new(),
        }
    }
}

pub struct DiscriminationValidator<'a, 'db> {
    db: &'db dyn salsa::Database,
    config: &'a SemaConfig,
    operators: &'a dyn OperatorSearch<'db>,
}

impl<'a, 'db> DiscriminationValidator<'a, 'db> {
    pub fn new(
        db: &'db dyn salsa::Database,
        config: &'a SemaConfig,
        operators: &'a dyn OperatorSearch<'db>,
    ) -> Self {
        Self {
            db,
            config,
            operators,
        }
    }

    /// Check the match instruction `id` and, when it is accepted, record
    /// its kind, the members each case covers, capture declarations and
    /// label conversions in the tree.
    pub fn validate(&self, ast: &mut Ast<'db>, id: DiscriminationId) -> ValidationOutcome<'db> {
        let tree: &Ast<'db> = ast;
        let plan = match self.plan(tree, tree.discrimination(id)) {
            Ok(plan) => plan,
            Err(Halt::Blocked(dependency)) => {
                debug!("discrimination {id} is blocked on {dependency}");
                return ValidationOutcome::Blocked(dependency);
            }
            Err(Halt::Failed(error)) => return ValidationOutcome::Failed(error),
        };
        debug!("discrimination {id} validated as {:?}", plan.kind);
        ValidationOutcome::Valid(self.apply(ast, id, plan))
    }

    fn plan(&self, ast: &Ast<'db>, discr: &Discrimination) -> Step<Plan<'db>> {
        let db = self.db;
        let Some(mut ty) = ast.expr(discr.discriminee).ty else {
            return Err(Halt::Blocked(Dependency::Expr(discr.discriminee)));
        };
        let mut dereference = None;
        if let TypeKind::Reference(pointee) = ty.kind(db) {
            ty = *pointee;
            dereference = Some(Conversion {
                kind: ConversionKind::Dereference,
                target: ty,
            });
        }

        let mut plan = match ty.kind(db) {
            TypeKind::Enum { decl, .. } | TypeKind::Error { decl, .. } => {
                trace!("discriminating enum `{}`", ty.display(db));
                self.plan_enum(ast, discr, ty, *decl)?
            }
            TypeKind::Struct { decl, .. } | TypeKind::Union { decl, .. } => {
                let target = ast.decl(*decl);
                if !target.validated {
                    return Err(Halt::Blocked(Dependency::Decl(*decl)));
                }
                match &target.kind {
                    DeclKind::Aggregate(aggregate) if aggregate.is_union => {
                        if aggregate.is_unsafe {
                            return Err(DiscriminationError::UnsafeUnion {
                                span: discr.span,
                                owner: ty.display(db),
                            }
                            .into());
                        }
                        trace!("discriminating union `{}`", ty.display(db));
                        self.plan_union(ast, discr, ty, DiscriminationKind::Union)?
                    }
                    _ => self.plan_scalar(ast, discr, ty)?,
                }
            }
            TypeKind::AnonymousUnion(_) => {
                trace!("discriminating anonymous union `{}`", ty.display(db));
                self.plan_union(ast, discr, ty, DiscriminationKind::AnonymousUnion)?
            }
            _ => self.plan_scalar(ast, discr, ty)?,
        };
        if let Some(conversion) = dereference {
            plan.conversions.push((discr.discriminee, conversion));
        }
        Ok(plan)
    }

    fn plan_enum(
        &self,
        ast: &Ast<'db>,
        discr: &Discrimination,
        ty: Type<'db>,
        decl: DeclId,
    ) -> Step<Plan<'db>> {
        let owner = ty.display(self.db);
        let domain: Vec<Symbol> = enum_members(ast, decl)
            .iter()
            .filter(|&&member| {
                matches!(&ast.decl(member).kind,
                    DeclKind::EnumMember(m) if !m.implicit && !m.constant)
            })
            .map(|&member| ast.decl(member).name)
            .collect();

        let mut plan = Plan::new(DiscriminationKind::Enum, discr.cases.len());
        let mut seen = Vec::new();
        for (index, case) in discr.cases.iter().enumerate() {
            for leaf in ast.flatten_comma(case.labels) {
                let span = ast.expr(leaf).span;
                let name = self.label_name(ast, discr.block, leaf, ty)?;
                if !domain.contains(&name) {
                    let known = enum_members(ast, decl)
                        .iter()
                        .any(|&member| ast.decl(member).name == name);
                    return Err(if known {
                        DiscriminationError::IneligibleMember {
                            span,
                            owner,
                            member: name,
                        }
                    } else {
                        self.unknown_member(span, owner, name, domain.iter().copied())
                    }
                    .into());
                }
                if seen.contains(&name) {
                    return Err(DiscriminationError::RedefinedMember { span, member: name }.into());
                }
                seen.push(name);
                plan.matched[index].push(name);
            }
        }

        if !discr.has_default() {
            let missing: Vec<Symbol> = domain
                .iter()
                .copied()
                .filter(|name| !seen.contains(name))
                .collect();
            if !missing.is_empty() {
                return Err(DiscriminationError::IncompleteCoverage {
                    span: discr.span,
                    owner,
                    missing,
                }
                .into());
            }
        }
        Ok(plan)
    }

    fn plan_union(
        &self,
        ast: &Ast<'db>,
        discr: &Discrimination,
        ty: Type<'db>,
        kind: DiscriminationKind,
    ) -> Step<Plan<'db>> {
        let db = self.db;
        let owner = ty.display(db);
        let members = aggregate_members(db, ast, ty).unwrap_or_default();
        let by_type = kind == DiscriminationKind::AnonymousUnion;

        let mut plan = Plan::new(kind, discr.cases.len());
        let mut seen = Vec::new();
        for (index, case) in discr.cases.iter().enumerate() {
            let label = match ast.flatten_comma(case.labels).as_slice() {
                [label] => *label,
                _ => {
                    return Err(invalid_label(
                        ast.expr(case.labels).span,
                        "a union case names exactly one member",
                    ));
                }
            };
            let span = ast.expr(label).span;
            let (selector, capture) = match &ast.expr(label).kind {
                ExprKind::Call { callee, args } => match args.as_slice() {
                    [arg] => match ast.expr(*arg).kind {
                        ExprKind::Name(name) => (*callee, Some((name, ast.expr(*arg).span))),
                        _ => return Err(invalid_label(span, "a capture must be a plain name")),
                    },
                    _ => return Err(invalid_label(span, "a capture takes exactly one name")),
                },
                _ => (label, None),
            };

            let member = if by_type {
                self.member_by_type(ast, discr.block, selector, &members, &owner)?
            } else {
                self.member_by_name(ast, discr.block, selector, ty, &members, &owner)?
            };
            if !member.is_eligible() {
                return Err(DiscriminationError::IneligibleMember {
                    span,
                    owner,
                    member: member.name,
                }
                .into());
            }
            if seen.contains(&member.index) {
                return Err(DiscriminationError::RedefinedMember {
                    span,
                    member: member.name,
                }
                .into());
            }
            seen.push(member.index);
            plan.matched[index].push(member.name);

            if let Some((name, capture_span)) = capture {
                if member.ty.is_void(db) {
                    return Err(DiscriminationError::CaptureFromVoid {
                        span: capture_span,
                        member: member.name,
                    }
                    .into());
                }
                if ast.lookup_local(case.body, name).is_some() {
                    return Err(DiscriminationError::CaptureShadowsLocal {
                        span: capture_span,
                        name,
                    }
                    .into());
                }
                plan.captures.push(CaptureSpec {
                    case: index,
                    name,
                    span: capture_span,
                    member: member.ty,
                    index: member.index,
                });
            }
        }

        if !discr.has_default() {
            return Err(DiscriminationError::MissingDefault {
                span: discr.span,
                owner,
            }
            .into());
        }
        Ok(plan)
    }

    /// The member a label names: `Member` alone, or `Owner.Member` where
    /// `Owner` denotes the discriminee's own type.
    fn label_name(
        &self,
        ast: &Ast<'db>,
        scope: BlockId,
        label: ExprId,
        ty: Type<'db>,
    ) -> Step<Symbol> {
        let span = ast.expr(label).span;
        match ast.expr(label).kind {
            ExprKind::Name(name) => Ok(name),
            ExprKind::Member { base, member } => {
                if denoted_type(self.db, ast, base, scope) == Some(ty) {
                    Ok(member)
                } else {
                    Err(invalid_label(
                        span,
                        &format!("`{member}` is not qualified by `{}`", ty.display(self.db)),
                    ))
                }
            }
            _ => Err(invalid_label(span, "expected a member name")),
        }
    }

    fn member_by_name(
        &self,
        ast: &Ast<'db>,
        scope: BlockId,
        label: ExprId,
        ty: Type<'db>,
        members: &[MemberInfo<'db>],
        owner: &str,
    ) -> Step<MemberInfo<'db>> {
        let span = ast.expr(label).span;
        let name = self.label_name(ast, scope, label, ty)?;
        members
            .iter()
            .find(|member| member.name == name)
            .copied()
            .ok_or_else(|| {
                self.unknown_member(span, owner.to_string(), name, eligible(members))
                    .into()
            })
    }

    fn member_by_type(
        &self,
        ast: &Ast<'db>,
        scope: BlockId,
        label: ExprId,
        members: &[MemberInfo<'db>],
        owner: &str,
    ) -> Step<MemberInfo<'db>> {
        let db = self.db;
        let span = ast.expr(label).span;
        let Some(label_ty) = denoted_type(db, ast, label, scope) else {
            return Err(invalid_label(span, "expected a type"));
        };
        match members.iter().find(|member| member.ty == label_ty) {
            Some(member) => Ok(*member),
            None => Err(self
                .unknown_member(
                    span,
                    owner.to_string(),
                    Symbol::from_dynamic(&label_ty.display(db)),
                    eligible(members),
                )
                .into()),
        }
    }

    fn plan_scalar(
        &self,
        ast: &Ast<'db>,
        discr: &Discrimination,
        ty: Type<'db>,
    ) -> Step<Plan<'db>> {
        let db = self.db;
        let owner = ty.display(db);
        let Some(operator) = self.operators.best(db, ty, ty, BinaryOp::Eq) else {
            return Err(DiscriminationError::NoEqualityOperator {
                span: discr.span,
                owner,
            }
            .into());
        };
        trace!("discriminating `{owner}` with `==` of weight {}", operator.weight);

        let mut plan = Plan::new(DiscriminationKind::Scalar, discr.cases.len());
        plan.operator = Some(operator);
        for case in &discr.cases {
            for leaf in ast.flatten_comma(case.labels) {
                let Some(leaf_ty) = ast.expr(leaf).ty else {
                    return Err(Halt::Blocked(Dependency::Expr(leaf)));
                };
                let Some(kind) = find_conversion(db, leaf_ty, ty) else {
                    return Err(DiscriminationError::LabelTypeMismatch {
                        span: ast.expr(leaf).span,
                        expected: owner,
                        found: leaf_ty.display(db),
                    }
                    .into());
                };
                plan.conversions
                    .push((leaf, Conversion { kind, target: ty }));
            }
        }

        if !discr.has_default() {
            return Err(DiscriminationError::MissingDefault {
                span: discr.span,
                owner,
            }
            .into());
        }
        Ok(plan)
    }

    fn unknown_member(
        &self,
        span: Span,
        owner: String,
        member: Symbol,
        candidates: impl IntoIterator<Item = Symbol>,
    ) -> DiscriminationError {
        DiscriminationError::UnknownMember {
            span,
            owner,
            member,
            suggestion: nearest_name(member, candidates, self.config.suggestion_distance),
        }
    }

    fn apply(&self, ast: &mut Ast<'db>, id: DiscriminationId, plan: Plan<'db>) -> ValidationResult<'db> {
        for (expr, conversion) in plan.conversions {
            ast.expr_mut(expr).conversion = Some(conversion);
        }

        let discriminee = ast.discrimination(id).discriminee;
        let mut captures = Vec::with_capacity(plan.captures.len());
        for capture in plan.captures {
            let body = ast.discrimination(id).cases[capture.case].body;
            let payload = ast.alloc_at(
                ExprKind::ExtractUnionPayload {
                    union_expr: discriminee,
                    member: capture.member,
                    index: capture.index,
                },
                capture.span,
            );
            ast.set_type(payload, capture.member);
            let decl = ast.alloc_decl(Decl {
                name: capture.name,
                span: capture.span,
                kind: DeclKind::Variable {
                    init: Some(payload),
                },
                ty: Some(capture.member),
                parent: body,
                validated: true,
            });
            ast.insert_declaration_at_front(body, decl);
            ast.discrimination_mut(id).cases[capture.case].capture = Some(decl);
            trace!("captured `{}` in {body}", capture.name);
            captures.push(decl);
        }

        let discr = ast.discrimination_mut(id);
        discr.kind = Some(plan.kind);
        for (case, matched) in discr.cases.iter_mut().zip(plan.matched) {
            case.matched = matched;
        }
        ValidationResult {
            kind: plan.kind,
            operator: plan.operator,
            captures,
        }
    }
}

fn eligible<'a>(members: &'a [MemberInfo<'_>]) -> impl Iterator<Item = Symbol> + 'a {
    members
        .iter()
        .filter(|member| member.is_eligible())
        .map(|member| member.name)
}

fn invalid_label(span: Span, detail: &str) -> Halt {
    Halt::Failed(DiscriminationError::InvalidCaseLabel {
        span,
        detail: detail.to_string(),
    })
}
