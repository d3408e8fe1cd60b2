//! Compile-time evaluation of constant expressions.
//!
//! Evaluation is pure: it reads the tree, follows names through the
//! enclosing scopes and recurses into initializers, but never writes back.
//! Caching evaluated constants is the driver's business.

mod enums;
mod literal;

use ember_ast::{
    Ast, BinaryOp, BlockId, DeclId, DeclKind, ExprId, ExprKind, Literal, TaggedValue, Type,
    TypeKind, UnaryOp,
};
use ember_core::{ErrorKind, Span, Symbol, symbol::known};
use tracing::trace;

use crate::SemaConfig;
use crate::layout::size_of;
use crate::members::find_enum_member;
use crate::report::{ErrorSite, SemaError};

pub use enums::assign_enum_values;
pub use literal::{parse_int, parse_real};

/// Outcome of evaluating one expression.
pub type EvaluationResult<'db> = Result<TaggedValue<'db>, EvalError>;

/// Why an expression could not be reduced to a value.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{message}")]
pub struct EvalError {
    pub site: ErrorSite,
    pub span: Span,
    pub kind: ErrorKind,
    pub message: String,
}

impl SemaError for EvalError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Default)]
struct EvalState {
    depth: usize,
    /// Constants whose initializer is being evaluated.
    visiting: Vec<DeclId>,
}

pub struct ConstantEvaluator<'a, 'db> {
    db: &'db dyn salsa::Database,
    ast: &'a Ast<'db>,
    config: &'a SemaConfig,
}

impl<'a, 'db> ConstantEvaluator<'a, 'db> {
    pub fn new(db: &'db dyn salsa::Database, ast: &'a Ast<'db>, config: &'a SemaConfig) -> Self {
        Self { db, ast, config }
    }

    /// Reduce `expr` to a value, resolving names from `scope`.
    pub fn evaluate(&self, expr: ExprId, scope: BlockId) -> EvaluationResult<'db> {
        self.eval(expr, scope, &mut EvalState::default())
    }

    fn error(&self, expr: ExprId, kind: ErrorKind, message: impl Into<String>) -> EvalError {
        EvalError {
            site: ErrorSite::Expr(expr),
            span: self.ast.expr(expr).span,
            kind,
            message: message.into(),
        }
    }

    fn eval(&self, id: ExprId, scope: BlockId, state: &mut EvalState) -> EvaluationResult<'db> {
        if state.depth >= self.config.max_eval_depth {
            return Err(self.error(
                id,
                ErrorKind::NotConstant,
                "expression nests too deeply to evaluate",
            ));
        }
        state.depth += 1;
        let result = self.eval_expr(id, scope, state);
        state.depth -= 1;
        result
    }

    fn eval_expr(&self, id: ExprId, scope: BlockId, state: &mut EvalState) -> EvaluationResult<'db> {
        let expr = self.ast.expr(id);
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(id, literal),
            ExprKind::Name(ident) => self.name(id, *ident, scope, state),
            ExprKind::TypeLiteral(ty) => Ok(TaggedValue::Type(*ty)),
            ExprKind::TypeOf(operand) => match self.ast.expr(*operand).ty {
                Some(ty) => Ok(TaggedValue::Type(ty.denoted(self.db))),
                None => Err(self.error(
                    id,
                    ErrorKind::NotConstant,
                    "the type of this expression is not known yet",
                )),
            },
            ExprKind::SizeOf(operand) => self.size_of(id, *operand, scope),
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
                negated,
            } => {
                let value = self.eval(*condition, scope, state)?;
                let TaggedValue::Bool(holds) = value else {
                    return Err(self.error(
                        *condition,
                        ErrorKind::WrongOperandKind,
                        format!("condition must be a bool, found {}", value.kind_name()),
                    ));
                };
                if holds != *negated {
                    self.eval(*then_branch, scope, state)
                } else if let Some(else_branch) = else_branch {
                    self.eval(*else_branch, scope, state)
                } else {
                    Err(self.error(
                        id,
                        ErrorKind::NotConstant,
                        "the condition does not hold and there is no `else` branch",
                    ))
                }
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval(*operand, scope, state)?;
                self.unary(id, *op, value)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                // Both sides are always evaluated, `&&` and `||` included.
                let lhs = self.eval(*lhs, scope, state)?;
                let rhs = self.eval(*rhs, scope, state)?;
                self.binary(id, *op, lhs, rhs)
            }
            // Casts keep the value as-is; only the static type changes.
            ExprKind::Paren(inner) | ExprKind::Cast { expr: inner, .. } => {
                self.eval(*inner, scope, state)
            }
            ExprKind::Member { base, member } => self.member(id, *base, *member, scope, state),
            ExprKind::Call { callee, args } => self.construct_opaque(id, *callee, args, scope, state),
            ExprKind::ArrayLiteral(_) => Ok(TaggedValue::Array(id)),
            _ => Err(self.error(
                id,
                ErrorKind::NotConstant,
                "expression cannot be evaluated at compile time",
            )),
        }
    }

    fn literal(&self, id: ExprId, literal: &Literal) -> EvaluationResult<'db> {
        match literal {
            Literal::Bool(value) => Ok(TaggedValue::Bool(*value)),
            Literal::Int(text) => parse_int(text).map(TaggedValue::Int).ok_or_else(|| {
                self.error(
                    id,
                    ErrorKind::NotConstant,
                    format!("integer literal `{text}` does not fit in 64 bits"),
                )
            }),
            Literal::Real(text) => parse_real(text).map(TaggedValue::real).ok_or_else(|| {
                self.error(
                    id,
                    ErrorKind::NotConstant,
                    format!("malformed real literal `{text}`"),
                )
            }),
            Literal::Char(c) => Ok(TaggedValue::Int(i64::from(u32::from(*c)))),
            Literal::Str(_) => Ok(TaggedValue::String(id)),
        }
    }

    fn name(
        &self,
        id: ExprId,
        ident: Symbol,
        scope: BlockId,
        state: &mut EvalState,
    ) -> EvaluationResult<'db> {
        let Some(decl_id) = self.ast.lookup(scope, ident) else {
            return Err(self.error(
                id,
                ErrorKind::UnknownDeclaration,
                format!("no declaration named `{ident}` is in scope"),
            ));
        };
        self.declaration_value(id, decl_id, state)
    }

    /// Value of the declaration a name or member access resolved to.
    fn declaration_value(
        &self,
        id: ExprId,
        decl_id: DeclId,
        state: &mut EvalState,
    ) -> EvaluationResult<'db> {
        let decl = self.ast.decl(decl_id);
        let (cached, init) = match &decl.kind {
            DeclKind::Function(_) => return Ok(TaggedValue::Function(decl_id)),
            DeclKind::Constant { value, init } => (*value, *init),
            DeclKind::EnumMember(member) => (member.value, member.init),
            kind if kind.is_type() => {
                return decl.ty.map(TaggedValue::Type).ok_or_else(|| {
                    self.error(
                        id,
                        ErrorKind::NotConstant,
                        format!("type `{}` is not resolved yet", decl.name),
                    )
                });
            }
            _ => {
                return Err(self.error(
                    id,
                    ErrorKind::NotConstant,
                    format!("`{}` is not a constant", decl.name),
                ));
            }
        };
        if let Some(value) = cached {
            return Ok(value);
        }
        let Some(init) = init else {
            return Err(self.error(
                id,
                ErrorKind::NotConstant,
                format!("`{}` has no value yet", decl.name),
            ));
        };
        if state.visiting.contains(&decl_id) {
            return Err(self.error(
                id,
                ErrorKind::NotConstant,
                format!("the value of `{}` depends on itself", decl.name),
            ));
        }
        trace!("evaluating initializer of `{}`", decl.name);
        state.visiting.push(decl_id);
        let result = self.eval(init, decl.parent, state);
        state.visiting.pop();
        result
    }

    fn denoted_type(&self, id: ExprId, scope: BlockId) -> Option<Type<'db>> {
        denoted_type(self.db, self.ast, id, scope)
    }

    fn size_of(&self, id: ExprId, operand: ExprId, scope: BlockId) -> EvaluationResult<'db> {
        let Some(ty) = self.denoted_type(operand, scope) else {
            return Err(self.error(
                id,
                ErrorKind::NotConstant,
                "the type whose size is requested is not known yet",
            ));
        };
        let size = size_of(self.db, self.ast, ty).and_then(|size| i64::try_from(size).ok());
        size.map(TaggedValue::Int).ok_or_else(|| {
            self.error(
                id,
                ErrorKind::NotConstant,
                format!("type `{}` has no fixed size", ty.display(self.db)),
            )
        })
    }

    fn member(
        &self,
        id: ExprId,
        base: ExprId,
        member: Symbol,
        scope: BlockId,
        state: &mut EvalState,
    ) -> EvaluationResult<'db> {
        let Some(ty) = self.denoted_type(base, scope) else {
            return Err(self.error(
                id,
                ErrorKind::NotConstant,
                "member access on an untyped expression",
            ));
        };
        match ty.kind(self.db) {
            TypeKind::Enum { .. } | TypeKind::Error { .. } => {
                match find_enum_member(self.db, self.ast, ty, member) {
                    Some(decl) => self.declaration_value(id, decl, state),
                    None => Err(self.error(
                        id,
                        ErrorKind::UnknownDeclaration,
                        format!("`{}` has no member `{member}`", ty.display(self.db)),
                    )),
                }
            }
            TypeKind::FixedArray { size, .. } if member == known::size() => Ok(TaggedValue::Int(*size)),
            _ => Err(self.error(
                id,
                ErrorKind::NotConstant,
                format!(
                    "member `{member}` of `{}` is not a compile-time value",
                    ty.display(self.db)
                ),
            )),
        }
    }

    fn construct_opaque(
        &self,
        id: ExprId,
        callee: ExprId,
        args: &[ExprId],
        scope: BlockId,
        state: &mut EvalState,
    ) -> EvaluationResult<'db> {
        let opaque = self
            .denoted_type(callee, scope)
            .and_then(|ty| match ty.kind(self.db) {
                TypeKind::Opaque { inner, .. } => Some((ty, *inner)),
                _ => None,
            });
        let Some((opaque, inner)) = opaque else {
            return Err(self.error(
                id,
                ErrorKind::NotConstant,
                "function calls cannot be evaluated at compile time",
            ));
        };
        let [arg] = args else {
            return Err(self.error(
                id,
                ErrorKind::ArityViolation,
                format!(
                    "constructing `{}` takes exactly one argument, found {}",
                    opaque.display(self.db),
                    args.len()
                ),
            ));
        };
        let eligible = matches!(
            inner.kind(self.db),
            TypeKind::Int { .. }
                | TypeKind::IntLiteral
                | TypeKind::Real { .. }
                | TypeKind::Bool
                | TypeKind::Enum { .. }
                | TypeKind::Error { .. }
        );
        if !eligible {
            return Err(self.error(
                id,
                ErrorKind::WrongOperandKind,
                format!(
                    "`{}` wraps `{}`, which has no compile-time values",
                    opaque.display(self.db),
                    inner.display(self.db)
                ),
            ));
        }
        self.eval(*arg, scope, state)
    }

    fn unary(&self, id: ExprId, op: UnaryOp, value: TaggedValue<'db>) -> EvaluationResult<'db> {
        let result = match (op, value) {
            (UnaryOp::Not, TaggedValue::Bool(b)) => Some(TaggedValue::Bool(!b)),
            (UnaryOp::Not, TaggedValue::Int(i)) => Some(TaggedValue::Bool(i == 0)),
            (UnaryOp::Not, TaggedValue::Real(r)) => Some(TaggedValue::Bool(r.value() == 0.0)),
            (UnaryOp::Not, TaggedValue::String(literal)) => match &self.ast.expr(literal).kind {
                ExprKind::Literal(Literal::Str(text)) => Some(TaggedValue::Bool(text.is_empty())),
                _ => None,
            },
            (UnaryOp::Complement, TaggedValue::Int(i)) => Some(TaggedValue::Int(!i)),
            (UnaryOp::Plus, TaggedValue::Int(_) | TaggedValue::Real(_)) => Some(value),
            (UnaryOp::Minus, TaggedValue::Int(i)) => Some(TaggedValue::Int(i.wrapping_neg())),
            (UnaryOp::Minus, TaggedValue::Real(r)) => Some(TaggedValue::real(-r.value())),
            _ => None,
        };
        result.ok_or_else(|| {
            self.error(
                id,
                ErrorKind::WrongOperandKind,
                format!("operator {op:?} cannot be applied to {}", value.kind_name()),
            )
        })
    }

    fn binary(
        &self,
        id: ExprId,
        op: BinaryOp,
        lhs: TaggedValue<'db>,
        rhs: TaggedValue<'db>,
    ) -> EvaluationResult<'db> {
        let mismatch = || {
            self.error(
                id,
                ErrorKind::WrongOperandKind,
                format!(
                    "operator `{op}` cannot be applied to {} and {}",
                    lhs.kind_name(),
                    rhs.kind_name()
                ),
            )
        };

        if op.is_logical() {
            let (TaggedValue::Bool(a), TaggedValue::Bool(b)) = (lhs, rhs) else {
                return Err(mismatch());
            };
            return Ok(TaggedValue::Bool(if op == BinaryOp::And { a && b } else { a || b }));
        }

        if op.is_comparison() {
            let ordering = match (lhs, rhs) {
                (TaggedValue::Int(a), TaggedValue::Int(b)) => a.partial_cmp(&b),
                (TaggedValue::Real(a), TaggedValue::Real(b)) => a.value().partial_cmp(&b.value()),
                (TaggedValue::Bool(a), TaggedValue::Bool(b)) => a.partial_cmp(&b),
                (TaggedValue::Type(a), TaggedValue::Type(b)) => {
                    return match op {
                        BinaryOp::Eq => Ok(TaggedValue::Bool(a == b)),
                        BinaryOp::Ne => Ok(TaggedValue::Bool(a != b)),
                        _ => Err(mismatch()),
                    };
                }
                _ => return Err(mismatch()),
            };
            // NaN is unordered: only `!=` holds.
            let holds = match ordering {
                None => op == BinaryOp::Ne,
                Some(ordering) => match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    BinaryOp::Ge => ordering.is_ge(),
                    BinaryOp::Eq => ordering.is_eq(),
                    _ => ordering.is_ne(),
                },
            };
            return Ok(TaggedValue::Bool(holds));
        }

        match (lhs, rhs) {
            (TaggedValue::Int(a), TaggedValue::Int(b)) => self.int_arith(id, op, a, b),
            (TaggedValue::Real(a), TaggedValue::Real(b)) => {
                let (a, b) = (a.value(), b.value());
                let value = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => return Err(mismatch()),
                };
                Ok(TaggedValue::real(value))
            }
            _ => Err(mismatch()),
        }
    }

    fn int_arith(&self, id: ExprId, op: BinaryOp, a: i64, b: i64) -> EvaluationResult<'db> {
        let value = match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                return Err(self.error(id, ErrorKind::WrongOperandKind, "division by zero"));
            }
            BinaryOp::Div => a.wrapping_div(b),
            BinaryOp::Rem => a.wrapping_rem(b),
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            BinaryOp::BitXor => a ^ b,
            BinaryOp::Shl | BinaryOp::Shr => {
                let shift = u32::try_from(b).ok().filter(|shift| *shift < i64::BITS);
                let Some(shift) = shift else {
                    return Err(self.error(
                        id,
                        ErrorKind::WrongOperandKind,
                        format!("shift amount {b} is out of range"),
                    ));
                };
                if op == BinaryOp::Shl { a << shift } else { a >> shift }
            }
            _ => unreachable!("comparisons and logical operators are handled by the caller"),
        };
        Ok(TaggedValue::Int(value))
    }
}

/// The type a type expression or typed expression stands for.
pub(crate) fn denoted_type<'db>(
    db: &'db dyn salsa::Database,
    ast: &Ast<'db>,
    id: ExprId,
    scope: BlockId,
) -> Option<Type<'db>> {
    let expr = ast.expr(id);
    if let Some(ty) = expr.ty {
        return Some(ty.denoted(db));
    }
    match &expr.kind {
        ExprKind::TypeLiteral(ty) => Some(*ty),
        ExprKind::Name(ident) => {
            let decl = ast.decl(ast.lookup(scope, *ident)?);
            if decl.kind.is_type() { decl.ty } else { None }
        }
        ExprKind::Paren(inner) => denoted_type(db, ast, *inner, scope),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use ember_ast::{BlockKind, EnumFlavor};
    use ember_core::Symbol;

    use super::*;

    struct Fixture<'db> {
        ast: Ast<'db>,
        root: BlockId,
        config: SemaConfig,
    }

    impl<'db> Fixture<'db> {
        fn new() -> Self {
            let mut ast = Ast::new();
            let module = ast.add_module(Symbol::new("main"));
            let root = ast.module(module).root;
            Self {
                ast,
                root,
                config: SemaConfig::default(),
            }
        }

        fn eval(&self, db: &'db dyn salsa::Database, expr: ExprId) -> EvaluationResult<'db> {
            ConstantEvaluator::new(db, &self.ast, &self.config).evaluate(expr, self.root)
        }
    }

    #[test]
    fn test_arithmetic_precedence_tree() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let three = fx.ast.int_lit("3");
        let four = fx.ast.int_lit("4");
        let two = fx.ast.int_lit("2");
        let product = fx.ast.binary(BinaryOp::Mul, four, two);
        let sum = fx.ast.binary(BinaryOp::Add, three, product);
        assert_eq!(fx.eval(&db, sum), Ok(TaggedValue::Int(11)));
    }

    #[test]
    fn test_real_rejects_integral_operators() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let a = fx.ast.real_lit("7.5");
        let b = fx.ast.real_lit("2.0");
        let rem = fx.ast.binary(BinaryOp::Rem, a, b);
        let err = fx.eval(&db, rem).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongOperandKind);
        assert_eq!(err.site, ErrorSite::Expr(rem));
        insta::assert_snapshot!(err.to_string(), @"operator `%` cannot be applied to real and real");

        let div = fx.ast.binary(BinaryOp::Div, a, b);
        assert_eq!(fx.eval(&db, div), Ok(TaggedValue::real(3.75)));
    }

    #[test]
    fn test_mixed_operands_are_rejected() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let a = fx.ast.int_lit("1");
        let b = fx.ast.real_lit("1.0");
        let sum = fx.ast.binary(BinaryOp::Add, a, b);
        assert_eq!(fx.eval(&db, sum).unwrap_err().kind, ErrorKind::WrongOperandKind);
        let cmp = fx.ast.binary(BinaryOp::Lt, a, b);
        assert_eq!(fx.eval(&db, cmp).unwrap_err().kind, ErrorKind::WrongOperandKind);
    }

    #[test]
    fn test_division_by_zero_and_shifts() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let one = fx.ast.int_lit("1");
        let zero = fx.ast.int_lit("0");
        let div = fx.ast.binary(BinaryOp::Div, one, zero);
        assert_eq!(fx.eval(&db, div).unwrap_err().message, "division by zero");

        let ten = fx.ast.int_lit("10");
        let shl = fx.ast.binary(BinaryOp::Shl, one, ten);
        assert_eq!(fx.eval(&db, shl), Ok(TaggedValue::Int(1024)));
        let big = fx.ast.int_lit("64");
        let bad = fx.ast.binary(BinaryOp::Shr, one, big);
        assert_eq!(fx.eval(&db, bad).unwrap_err().kind, ErrorKind::WrongOperandKind);
    }

    #[test]
    fn test_comparisons() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let two = fx.ast.int_lit("2");
        let two_again = fx.ast.int_lit("0b10");
        let le = fx.ast.binary(BinaryOp::Le, two, two_again);
        let lt = fx.ast.binary(BinaryOp::Lt, two, two_again);
        assert_eq!(fx.eval(&db, le), Ok(TaggedValue::Bool(true)));
        assert_eq!(fx.eval(&db, lt), Ok(TaggedValue::Bool(false)));

        let t = fx.ast.type_expr(&db, Type::i32(&db));
        let u = fx.ast.type_expr(&db, Type::int(&db, true, 32));
        let same = fx.ast.binary(BinaryOp::Eq, t, u);
        assert_eq!(fx.eval(&db, same), Ok(TaggedValue::Bool(true)));
        let ordered = fx.ast.binary(BinaryOp::Lt, t, u);
        assert_eq!(fx.eval(&db, ordered).unwrap_err().kind, ErrorKind::WrongOperandKind);
    }

    #[test]
    fn test_logical_operators_need_bools() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let t = fx.ast.bool_lit(true);
        let f = fx.ast.bool_lit(false);
        let or = fx.ast.binary(BinaryOp::Or, f, t);
        assert_eq!(fx.eval(&db, or), Ok(TaggedValue::Bool(true)));
        let one = fx.ast.int_lit("1");
        let and = fx.ast.binary(BinaryOp::And, t, one);
        assert_eq!(fx.eval(&db, and).unwrap_err().kind, ErrorKind::WrongOperandKind);
    }

    #[test]
    fn test_unary_operators() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let empty = fx.ast.str_lit("");
        let not_empty = fx.ast.alloc(ExprKind::Unary {
            op: UnaryOp::Not,
            operand: empty,
        });
        assert_eq!(fx.eval(&db, not_empty), Ok(TaggedValue::Bool(true)));

        let five = fx.ast.int_lit("5");
        let complement = fx.ast.alloc(ExprKind::Unary {
            op: UnaryOp::Complement,
            operand: five,
        });
        assert_eq!(fx.eval(&db, complement), Ok(TaggedValue::Int(!5)));

        let half = fx.ast.real_lit("0.5");
        let negated = fx.ast.alloc(ExprKind::Unary {
            op: UnaryOp::Minus,
            operand: half,
        });
        assert_eq!(fx.eval(&db, negated), Ok(TaggedValue::real(-0.5)));
        let bad = fx.ast.alloc(ExprKind::Unary {
            op: UnaryOp::Complement,
            operand: half,
        });
        assert_eq!(fx.eval(&db, bad).unwrap_err().kind, ErrorKind::WrongOperandKind);
    }

    #[test]
    fn test_conditionals() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let cond = fx.ast.bool_lit(false);
        let then = fx.ast.int_lit("1");
        let other = fx.ast.int_lit("2");
        let unless = fx.ast.alloc(ExprKind::If {
            condition: cond,
            then_branch: then,
            else_branch: Some(other),
            negated: true,
        });
        assert_eq!(fx.eval(&db, unless), Ok(TaggedValue::Int(1)));

        let missing_else = fx.ast.alloc(ExprKind::If {
            condition: cond,
            then_branch: then,
            else_branch: None,
            negated: false,
        });
        assert_eq!(fx.eval(&db, missing_else).unwrap_err().kind, ErrorKind::NotConstant);

        let not_bool = fx.ast.alloc(ExprKind::If {
            condition: then,
            then_branch: then,
            else_branch: None,
            negated: false,
        });
        let err = fx.eval(&db, not_bool).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongOperandKind);
        assert_eq!(err.site, ErrorSite::Expr(then));
    }

    #[test]
    fn test_names_follow_constant_initializers() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let root = fx.root;
        let ten = fx.ast.int_lit("10");
        fx.ast.declare_constant(root, Symbol::new("BASE"), ten);
        let base = fx.ast.name(Symbol::new("BASE"));
        let one = fx.ast.int_lit("1");
        let init = fx.ast.binary(BinaryOp::Add, base, one);
        fx.ast.declare_constant(root, Symbol::new("NEXT"), init);

        let body = fx.ast.add_block(root, BlockKind::Plain);
        let next = fx.ast.name(Symbol::new("NEXT"));
        let result = ConstantEvaluator::new(&db, &fx.ast, &fx.config).evaluate(next, body);
        assert_eq!(result, Ok(TaggedValue::Int(11)));

        let missing = fx.ast.name(Symbol::new("MISSING"));
        assert_eq!(fx.eval(&db, missing).unwrap_err().kind, ErrorKind::UnknownDeclaration);
    }

    #[test]
    fn test_self_referential_constant() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let root = fx.root;
        let b = fx.ast.name(Symbol::new("B"));
        fx.ast.declare_constant(root, Symbol::new("A"), b);
        let a = fx.ast.name(Symbol::new("A"));
        fx.ast.declare_constant(root, Symbol::new("B"), a);

        let probe = fx.ast.name(Symbol::new("A"));
        let err = fx.eval(&db, probe).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotConstant);
        assert!(err.message.contains("depends on itself"));
    }

    #[test]
    fn test_variables_are_not_constant() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let root = fx.root;
        fx.ast
            .declare_variable(root, Symbol::new("counter"), Some(Type::i32(&db)), None);
        let counter = fx.ast.name(Symbol::new("counter"));
        insta::assert_snapshot!(
            fx.eval(&db, counter).unwrap_err().to_string(),
            @"`counter` is not a constant"
        );
    }

    #[test]
    fn test_enum_member_access_and_array_size() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let root = fx.root;
        let five = fx.ast.int_lit("5");
        let color = fx.ast.declare_enum(
            &db,
            root,
            Symbol::new("Color"),
            EnumFlavor::Plain,
            vec![(Symbol::new("Red"), Some(five)), (Symbol::new("Green"), None)],
        );
        assign_enum_values(&db, &mut fx.ast, &fx.config, color).unwrap();

        let ty = fx.ast.name(Symbol::new("Color"));
        let green = fx.ast.alloc(ExprKind::Member {
            base: ty,
            member: Symbol::new("Green"),
        });
        assert_eq!(fx.eval(&db, green), Ok(TaggedValue::Int(6)));

        let array = fx
            .ast
            .type_expr(&db, Type::fixed_array(&db, Type::bool(&db), 12));
        let size = fx.ast.alloc(ExprKind::Member {
            base: array,
            member: Symbol::new("size"),
        });
        assert_eq!(fx.eval(&db, size), Ok(TaggedValue::Int(12)));
    }

    #[test]
    fn test_size_of_and_type_of() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let ty = fx.ast.type_expr(&db, Type::fixed_array(&db, Type::i64(&db), 3));
        let size = fx.ast.alloc(ExprKind::SizeOf(ty));
        assert_eq!(fx.eval(&db, size), Ok(TaggedValue::Int(24)));

        let operand = fx.ast.alloc_typed(
            ExprKind::Literal(Literal::Bool(true)),
            Type::bool(&db),
        );
        let type_of = fx.ast.alloc(ExprKind::TypeOf(operand));
        assert_eq!(fx.eval(&db, type_of), Ok(TaggedValue::Type(Type::bool(&db))));
    }

    #[test]
    fn test_opaque_construction() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let root = fx.root;
        fx.ast
            .declare_opaque(&db, root, Symbol::new("Meters"), Type::f64(&db));
        let callee = fx.ast.name(Symbol::new("Meters"));
        let arg = fx.ast.real_lit("1.5");
        let call = fx.ast.alloc(ExprKind::Call {
            callee,
            args: vec![arg],
        });
        assert_eq!(fx.eval(&db, call), Ok(TaggedValue::real(1.5)));

        let no_args = fx.ast.alloc(ExprKind::Call {
            callee,
            args: vec![],
        });
        assert_eq!(fx.eval(&db, no_args).unwrap_err().kind, ErrorKind::ArityViolation);

        fx.ast.declare_opaque(
            &db,
            root,
            Symbol::new("Handle"),
            Type::pointer(&db, Type::void(&db)),
        );
        let handle = fx.ast.name(Symbol::new("Handle"));
        let wrapped = fx.ast.alloc(ExprKind::Call {
            callee: handle,
            args: vec![arg],
        });
        assert_eq!(fx.eval(&db, wrapped).unwrap_err().kind, ErrorKind::WrongOperandKind);
    }

    #[test]
    fn test_cast_passes_value_through() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        let value = fx.ast.int_lit("300");
        let target = fx.ast.type_expr(&db, Type::int(&db, false, 8));
        let cast = fx.ast.alloc(ExprKind::Cast {
            expr: value,
            target,
        });
        assert_eq!(fx.eval(&db, cast), Ok(TaggedValue::Int(300)));
    }

    #[test]
    fn test_evaluation_depth_is_bounded() {
        let db = salsa::DatabaseImpl::new();
        let mut fx = Fixture::new();
        fx.config.max_eval_depth = 4;
        let mut expr = fx.ast.int_lit("1");
        for _ in 0..8 {
            expr = fx.ast.alloc(ExprKind::Paren(expr));
        }
        assert_eq!(fx.eval(&db, expr).unwrap_err().kind, ErrorKind::NotConstant);
    }
}
