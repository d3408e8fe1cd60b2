//! Operator candidates for binary expressions.

use dashmap::DashMap;
use ember_ast::{BinaryOp, DeclId, Type, TypeKind};

use crate::conversion::find_conversion;

/// One way of applying a binary operator to a pair of operand types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OperatorCandidate<'db> {
    pub op: BinaryOp,
    pub lhs: Type<'db>,
    pub rhs: Type<'db>,
    pub result: Type<'db>,
    /// User-defined overload; `None` for built-in operators.
    pub decl: Option<DeclId>,
    /// Higher is a better match.
    pub weight: f64,
}

/// Candidate search shared by binary-expression typing and scalar
/// discrimination.
pub trait OperatorSearch<'db> {
    fn candidates(
        &self,
        db: &'db dyn salsa::Database,
        lhs: Type<'db>,
        rhs: Type<'db>,
        op: BinaryOp,
    ) -> Vec<OperatorCandidate<'db>>;

    /// The highest-weighted candidate; the first one wins ties.
    fn best(
        &self,
        db: &'db dyn salsa::Database,
        lhs: Type<'db>,
        rhs: Type<'db>,
        op: BinaryOp,
    ) -> Option<OperatorCandidate<'db>> {
        self.candidates(db, lhs, rhs, op)
            .into_iter()
            .filter(|candidate| candidate.weight > 0.0)
            .fold(None, |best: Option<OperatorCandidate<'db>>, candidate| match best {
                Some(best) if best.weight >= candidate.weight => Some(best),
                _ => Some(candidate),
            })
    }
}

/// Built-in operators on scalar kinds, plus overloads registered by the
/// driver as it validates operator declarations.
#[derive(Debug, Default)]
pub struct BuiltinOperators<'db> {
    overloads: DashMap<(Type<'db>, Type<'db>, BinaryOp), Vec<OperatorCandidate<'db>>>,
}

impl<'db> BuiltinOperators<'db> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, candidate: OperatorCandidate<'db>) {
        self.overloads
            .entry((candidate.lhs, candidate.rhs, candidate.op))
            .or_default()
            .push(candidate);
    }

    fn builtin(
        db: &'db dyn salsa::Database,
        ty: Type<'db>,
        op: BinaryOp,
    ) -> Option<Type<'db>> {
        let kind = ty.kind(db);
        let is_number = matches!(
            kind,
            TypeKind::Int { .. } | TypeKind::IntLiteral | TypeKind::Real { .. }
        );
        let supported = match op {
            BinaryOp::Eq | BinaryOp::Ne => {
                is_number
                    || matches!(
                        kind,
                        TypeKind::Bool
                            | TypeKind::Pointer(_)
                            | TypeKind::Function { .. }
                            | TypeKind::Enum { .. }
                            | TypeKind::Error { .. }
                            | TypeKind::TypeOf(_)
                    )
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                is_number || matches!(kind, TypeKind::Pointer(_))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => is_number,
            BinaryOp::Rem | BinaryOp::Shl | BinaryOp::Shr => ty.is_integer(db),
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                ty.is_integer(db) || matches!(kind, TypeKind::Enum { .. })
            }
            BinaryOp::And | BinaryOp::Or => matches!(kind, TypeKind::Bool),
        };
        if !supported {
            return None;
        }
        Some(if op.is_comparison() || op.is_logical() {
            Type::bool(db)
        } else {
            ty
        })
    }
}

impl<'db> OperatorSearch<'db> for BuiltinOperators<'db> {
    fn candidates(
        &self,
        db: &'db dyn salsa::Database,
        lhs: Type<'db>,
        rhs: Type<'db>,
        op: BinaryOp,
    ) -> Vec<OperatorCandidate<'db>> {
        let mut candidates = Vec::new();
        if let Some(result) = Self::builtin(db, lhs, op) {
            let weight = match find_conversion(db, rhs, lhs) {
                Some(ember_ast::ConversionKind::Identity) => Some(1.0),
                Some(_) => Some(0.5),
                None => None,
            };
            if let Some(weight) = weight {
                candidates.push(OperatorCandidate {
                    op,
                    lhs,
                    rhs: lhs,
                    result,
                    decl: None,
                    weight,
                });
            }
        }
        if let Some(overloads) = self.overloads.get(&(lhs, rhs, op)) {
            candidates.extend(overloads.iter().copied());
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_equality() {
        let db = salsa::DatabaseImpl::new();
        let ops = BuiltinOperators::new();
        let i32_ty = Type::i32(&db);

        let best = ops.best(&db, i32_ty, i32_ty, BinaryOp::Eq).unwrap();
        assert_eq!(best.result, Type::bool(&db));
        assert_eq!(best.weight, 1.0);

        let widened = ops
            .best(&db, i32_ty, Type::int_literal(&db), BinaryOp::Eq)
            .unwrap();
        assert_eq!(widened.weight, 0.5);

        let array = Type::dynamic_array(&db, i32_ty);
        assert!(ops.best(&db, array, array, BinaryOp::Eq).is_none());
    }

    #[test]
    fn test_registered_overload_wins() {
        let db = salsa::DatabaseImpl::new();
        let ops = BuiltinOperators::new();
        let array = Type::dynamic_array(&db, Type::i32(&db));
        ops.register(OperatorCandidate {
            op: BinaryOp::Eq,
            lhs: array,
            rhs: array,
            result: Type::bool(&db),
            decl: Some(DeclId::from_raw(7)),
            weight: 1.0,
        });
        let best = ops.best(&db, array, array, BinaryOp::Eq).unwrap();
        assert_eq!(best.decl, Some(DeclId::from_raw(7)));
    }
}
