//! Value assignment for enum and error-set members.

use ember_ast::{
    Ast, BlockId, Decl, DeclId, DeclKind, EnumFlavor, EnumMember, ExprId, TaggedValue, Type,
};
use ember_core::{
    ErrorKind,
    symbol::known,
};
use tracing::debug;

use super::{ConstantEvaluator, EvalError};
use crate::SemaConfig;
use crate::report::ErrorSite;

/// Give every member of the enum `decl` its value, then append the implicit
/// `count`, `min` and `max` members and mark the enum validated.
///
/// Members are processed in declaration order and each value is stored
/// before the next initializer runs, so an initializer may name any member
/// declared before it. On failure every value stored by this call is
/// cleared again, leaving the enum as it was.
pub fn assign_enum_values<'db>(
    db: &'db dyn salsa::Database,
    ast: &mut Ast<'db>,
    config: &SemaConfig,
    decl: DeclId,
) -> Result<(), EvalError> {
    let (flavor, members, body) = match &ast.decl(decl).kind {
        DeclKind::Enum(enum_decl) if !ast.decl(decl).validated => {
            (enum_decl.flavor, enum_decl.members.clone(), enum_decl.body)
        }
        _ => return Ok(()),
    };
    let enum_name = ast.decl(decl).name;
    debug!("assigning values of enum `{enum_name}`");

    let mut assigned = Vec::new();
    let values = match assign_members(db, ast, config, flavor, &members, body, &mut assigned) {
        Ok(values) => values,
        Err(error) => {
            for member in assigned {
                if let DeclKind::EnumMember(data) = &mut ast.decl_mut(member).kind {
                    data.value = None;
                }
                ast.decl_mut(member).validated = false;
            }
            return Err(error);
        }
    };

    let count = i64::try_from(values.len()).unwrap_or(i64::MAX);
    let min = values.iter().copied().min().unwrap_or_default();
    let max = values.iter().copied().max().unwrap_or_default();
    let enum_ty = ast.decl(decl).ty;
    let span = ast.decl(decl).span;
    for (name, value, ty) in [
        (known::count(), count, Some(Type::i64(db))),
        (known::min(), min, enum_ty),
        (known::max(), max, enum_ty),
    ] {
        let implicit = ast.declare(
            body,
            name,
            span,
            DeclKind::EnumMember(EnumMember {
                owner: decl,
                init: None,
                value: Some(TaggedValue::Int(value)),
                implicit: true,
                constant: false,
            }),
            ty,
        );
        ast.mark_validated(implicit);
        if let DeclKind::Enum(enum_decl) = &mut ast.decl_mut(decl).kind {
            enum_decl.members.push(implicit);
        }
    }
    ast.mark_validated(decl);
    Ok(())
}

/// Values of the non-implicit members in declaration order. Every member
/// given a value here is pushed to `assigned`.
fn assign_members<'db>(
    db: &'db dyn salsa::Database,
    ast: &mut Ast<'db>,
    config: &SemaConfig,
    flavor: EnumFlavor,
    members: &[DeclId],
    body: BlockId,
    assigned: &mut Vec<DeclId>,
) -> Result<Vec<i64>, EvalError> {
    let mut previous: Option<i64> = None;
    let mut values = Vec::with_capacity(members.len());
    for &member in members {
        let init = match member_state(ast, member) {
            MemberState::Implicit => continue,
            MemberState::Assigned(value) => {
                previous = Some(value);
                values.push(value);
                continue;
            }
            MemberState::Pending(init) => init,
        };
        let value = match init {
            Some(init) => {
                let evaluator = ConstantEvaluator::new(db, ast, config);
                match evaluator.evaluate(init, body)? {
                    TaggedValue::Int(value) => value,
                    other => {
                        return Err(invalid(
                            ast,
                            member,
                            format!(
                                "enum member `{}` must be an integer, found {}",
                                ast.decl(member).name,
                                other.kind_name()
                            ),
                        ));
                    }
                }
            }
            None => next_value(flavor, previous).ok_or_else(|| {
                invalid(
                    ast,
                    member,
                    format!(
                        "no value follows {} for `{}`",
                        previous.unwrap_or_default(),
                        ast.decl(member).name
                    ),
                )
            })?,
        };

        if i32::try_from(value).is_err() {
            return Err(invalid(
                ast,
                member,
                format!(
                    "value {value} of `{}` does not fit in 32 bits",
                    ast.decl(member).name
                ),
            ));
        }
        if flavor == EnumFlavor::Error && value == 0 {
            return Err(invalid(
                ast,
                member,
                format!(
                    "error `{}` cannot be 0, which means \"no error\"",
                    ast.decl(member).name
                ),
            ));
        }

        if let DeclKind::EnumMember(data) = &mut ast.decl_mut(member).kind {
            data.value = Some(TaggedValue::Int(value));
        }
        ast.mark_validated(member);
        assigned.push(member);
        previous = Some(value);
        values.push(value);
    }
    Ok(values)
}

enum MemberState {
    Implicit,
    Assigned(i64),
    Pending(Option<ExprId>),
}

fn member_state(ast: &Ast<'_>, member: DeclId) -> MemberState {
    match ast.decl(member) {
        Decl {
            kind: DeclKind::EnumMember(data),
            ..
        } if !data.implicit => match data.value.and_then(TaggedValue::as_int) {
            Some(value) => MemberState::Assigned(value),
            None => MemberState::Pending(data.init),
        },
        _ => MemberState::Implicit,
    }
}

fn next_value(flavor: EnumFlavor, previous: Option<i64>) -> Option<i64> {
    match (flavor, previous) {
        (EnumFlavor::Plain, None) => Some(0),
        (EnumFlavor::Flags | EnumFlavor::Error, None) => Some(1),
        (EnumFlavor::Plain | EnumFlavor::Error, Some(previous)) => previous.checked_add(1),
        (EnumFlavor::Flags, Some(previous)) => previous
            .checked_mul(2)
            .filter(|next| *next > 0 && next.count_ones() == 1),
    }
}

fn invalid(ast: &Ast<'_>, member: DeclId, message: String) -> EvalError {
    EvalError {
        site: ErrorSite::Decl(member),
        span: ast.decl(member).span,
        kind: ErrorKind::InvalidEnumValue,
        message,
    }
}

#[cfg(test)]
mod tests {
    use ember_ast::{BinaryOp, BlockId};
    use ember_core::Symbol;

    use super::*;
    use crate::members::enum_members;

    fn setup<'db>() -> (Ast<'db>, BlockId) {
        let mut ast = Ast::new();
        let module = ast.add_module(Symbol::new("main"));
        let root = ast.module(module).root;
        (ast, root)
    }

    fn values(ast: &Ast<'_>, decl: DeclId) -> Vec<(String, i64, bool)> {
        enum_members(ast, decl)
            .iter()
            .map(|&member| {
                let decl = ast.decl(member);
                let DeclKind::EnumMember(data) = &decl.kind else {
                    panic!("expected an enum member");
                };
                (
                    decl.name.to_string(),
                    data.value.and_then(TaggedValue::as_int).unwrap(),
                    data.implicit,
                )
            })
            .collect()
    }

    #[test]
    fn test_plain_enum_counts_from_zero() {
        let db = salsa::DatabaseImpl::new();
        let (mut ast, root) = setup();
        let ten = ast.int_lit("10");
        let e = ast.declare_enum(
            &db,
            root,
            Symbol::new("Level"),
            EnumFlavor::Plain,
            vec![
                (Symbol::new("Low"), None),
                (Symbol::new("High"), Some(ten)),
                (Symbol::new("Max"), None),
            ],
        );
        assign_enum_values(&db, &mut ast, &SemaConfig::default(), e).unwrap();
        assert_eq!(
            values(&ast, e),
            vec![
                ("Low".to_string(), 0, false),
                ("High".to_string(), 10, false),
                ("Max".to_string(), 11, false),
                ("count".to_string(), 3, true),
                ("min".to_string(), 0, true),
                ("max".to_string(), 11, true),
            ]
        );
        assert!(ast.decl(e).validated);
    }

    #[test]
    fn test_initializer_names_earlier_member() {
        let db = salsa::DatabaseImpl::new();
        let (mut ast, root) = setup();
        let read = ast.name(Symbol::new("Read"));
        let write = ast.name(Symbol::new("Write"));
        let both = ast.binary(BinaryOp::BitOr, read, write);
        let e = ast.declare_enum(
            &db,
            root,
            Symbol::new("Access"),
            EnumFlavor::Flags,
            vec![
                (Symbol::new("Read"), None),
                (Symbol::new("Write"), None),
                (Symbol::new("ReadWrite"), Some(both)),
            ],
        );
        assign_enum_values(&db, &mut ast, &SemaConfig::default(), e).unwrap();
        let found: Vec<i64> = values(&ast, e).into_iter().map(|(_, v, _)| v).take(3).collect();
        assert_eq!(found, vec![1, 2, 3]);
    }

    #[test]
    fn test_flags_require_powers_of_two() {
        let db = salsa::DatabaseImpl::new();
        let (mut ast, root) = setup();
        let three = ast.int_lit("3");
        let e = ast.declare_enum(
            &db,
            root,
            Symbol::new("Mode"),
            EnumFlavor::Flags,
            vec![(Symbol::new("Both"), Some(three)), (Symbol::new("Next"), None)],
        );
        let err = assign_enum_values(&db, &mut ast, &SemaConfig::default(), e).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidEnumValue);
        insta::assert_snapshot!(err.to_string(), @"no value follows 3 for `Next`");
    }

    #[test]
    fn test_error_set_rejects_zero() {
        let db = salsa::DatabaseImpl::new();
        let (mut ast, root) = setup();
        let zero = ast.int_lit("0");
        let e = ast.declare_enum(
            &db,
            root,
            Symbol::new("IoError"),
            EnumFlavor::Error,
            vec![(Symbol::new("Ok"), Some(zero))],
        );
        let err = assign_enum_values(&db, &mut ast, &SemaConfig::default(), e).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidEnumValue);
        assert!(!ast.decl(e).validated);
    }

    #[test]
    fn test_value_must_fit_in_32_bits() {
        let db = salsa::DatabaseImpl::new();
        let (mut ast, root) = setup();
        let big = ast.int_lit("0x1_0000_0000");
        let e = ast.declare_enum(
            &db,
            root,
            Symbol::new("Huge"),
            EnumFlavor::Plain,
            vec![(Symbol::new("Big"), Some(big))],
        );
        let err = assign_enum_values(&db, &mut ast, &SemaConfig::default(), e).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"value 4294967296 of `Big` does not fit in 32 bits");
    }

    #[test]
    fn test_failed_assignment_can_be_retried() {
        let db = salsa::DatabaseImpl::new();
        let (mut ast, root) = setup();
        let later = ast.name(Symbol::new("LATER"));
        let e = ast.declare_enum(
            &db,
            root,
            Symbol::new("Stage"),
            EnumFlavor::Plain,
            vec![
                (Symbol::new("A"), None),
                (Symbol::new("B"), Some(later)),
                (Symbol::new("C"), None),
            ],
        );
        let config = SemaConfig::default();
        let err = assign_enum_values(&db, &mut ast, &config, e).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownDeclaration);
        assert!(!ast.decl(e).validated);
        for &member in enum_members(&ast, e) {
            let decl = ast.decl(member);
            assert!(!decl.validated);
            assert!(matches!(&decl.kind, DeclKind::EnumMember(data) if data.value.is_none()));
        }

        let five = ast.int_lit("5");
        ast.declare_constant(root, Symbol::new("LATER"), five);
        assign_enum_values(&db, &mut ast, &config, e).unwrap();
        assert_eq!(
            values(&ast, e),
            vec![
                ("A".to_string(), 0, false),
                ("B".to_string(), 5, false),
                ("C".to_string(), 6, false),
                ("count".to_string(), 3, true),
                ("min".to_string(), 0, true),
                ("max".to_string(), 6, true),
            ]
        );
    }

    #[test]
    fn test_second_assignment_is_a_no_op() {
        let db = salsa::DatabaseImpl::new();
        let (mut ast, root) = setup();
        let e = ast.declare_enum(
            &db,
            root,
            Symbol::new("Unit"),
            EnumFlavor::Plain,
            vec![(Symbol::new("Only"), None)],
        );
        let config = SemaConfig::default();
        assign_enum_values(&db, &mut ast, &config, e).unwrap();
        assign_enum_values(&db, &mut ast, &config, e).unwrap();
        assert_eq!(enum_members(&ast, e).len(), 4);
    }
}
