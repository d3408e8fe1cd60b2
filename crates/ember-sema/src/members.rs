//! Member tables of aggregate and enum types.

use ember_ast::{Ast, DeclId, DeclKind, TaggedValue, Type, TypeKind, substitute_placeholders};
use ember_core::Symbol;

/// A member of a struct or union as seen through a concrete type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberInfo<'db> {
    pub name: Symbol,
    /// Member type with the instance's parameters substituted.
    pub ty: Type<'db>,
    /// Position in the declaration, which is also the union tag value.
    pub index: usize,
    pub implicit: bool,
    pub constant: bool,
}

impl MemberInfo<'_> {
    /// Members that can be matched or stored in a value.
    pub fn is_eligible(&self) -> bool {
        !self.implicit && !self.constant
    }
}

/// Members of a struct, union or anonymous union type.
///
/// Anonymous union members are named after their type.
pub fn aggregate_members<'db>(
    db: &'db dyn salsa::Database,
    ast: &Ast<'db>,
    ty: Type<'db>,
) -> Option<Vec<MemberInfo<'db>>> {
    match ty.kind(db) {
        TypeKind::Struct { decl, args, .. } | TypeKind::Union { decl, args, .. } => {
            let DeclKind::Aggregate(aggregate) = &ast.decl(*decl).kind else {
                return None;
            };
            let bindings: Vec<(Symbol, TaggedValue<'db>)> = aggregate
                .params
                .iter()
                .map(|&param| ast.decl(param).name)
                .zip(args.iter().copied())
                .collect();
            Some(
                aggregate
                    .members
                    .iter()
                    .enumerate()
                    .map(|(index, member)| MemberInfo {
                        name: member.name,
                        ty: substitute_placeholders(db, member.ty, &bindings),
                        index,
                        implicit: member.implicit,
                        constant: member.constant,
                    })
                    .collect(),
            )
        }
        TypeKind::AnonymousUnion(types) => Some(
            types
                .iter()
                .enumerate()
                .map(|(index, &ty)| MemberInfo {
                    name: Symbol::from_dynamic(&ty.display(db)),
                    ty,
                    index,
                    implicit: false,
                    constant: false,
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Member declarations of an enum or error set, implicit ones included.
pub fn enum_members<'a>(ast: &'a Ast<'_>, decl: DeclId) -> &'a [DeclId] {
    match &ast.decl(decl).kind {
        DeclKind::Enum(decl) => &decl.members,
        _ => &[],
    }
}

/// Resolve `Type.member` for an enum or error type.
pub fn find_enum_member<'db>(
    db: &'db dyn salsa::Database,
    ast: &Ast<'db>,
    ty: Type<'db>,
    name: Symbol,
) -> Option<DeclId> {
    let decl = match ty.kind(db) {
        TypeKind::Enum { decl, .. } | TypeKind::Error { decl, .. } => *decl,
        _ => return None,
    };
    enum_members(ast, decl)
        .iter()
        .copied()
        .find(|&member| ast.decl(member).name == name)
}

#[cfg(test)]
mod tests {
    use ember_ast::{AggregateMember, AggregateSpec, PolySpec};
    use ember_core::Span;

    use super::*;

    #[test]
    fn test_instance_members_are_substituted() {
        let db = salsa::DatabaseImpl::new();
        let mut ast = Ast::new();
        let module = ast.add_module(Symbol::new("main"));
        let root = ast.module(module).root;
        let t = Symbol::new("T");
        let option = ast.declare_aggregate(
            &db,
            root,
            Symbol::new("Option"),
            AggregateSpec {
                is_union: true,
                params: vec![PolySpec::ty(t)],
                members: vec![
                    AggregateMember {
                        name: Symbol::new("Some"),
                        span: Span::default(),
                        ty: Type::polymorphic(&db, t),
                        implicit: false,
                        constant: false,
                    },
                    AggregateMember {
                        name: Symbol::new("None"),
                        span: Span::default(),
                        ty: Type::void(&db),
                        implicit: false,
                        constant: false,
                    },
                ],
                ..Default::default()
            },
        );
        let instance = Type::new(
            &db,
            TypeKind::Union {
                decl: option,
                name: Symbol::new("Option"),
                args: vec![TaggedValue::Type(Type::f64(&db))],
            },
        );

        let members = aggregate_members(&db, &ast, instance).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].ty, Type::f64(&db));
        assert_eq!(members[1].index, 1);
        assert!(members[1].ty.is_void(&db));
    }

    #[test]
    fn test_anonymous_union_members_named_by_type() {
        let db = salsa::DatabaseImpl::new();
        let ast = Ast::new();
        let ty = Type::new(
            &db,
            TypeKind::AnonymousUnion(vec![Type::i32(&db), Type::bool(&db)]),
        );
        let members = aggregate_members(&db, &ast, ty).unwrap();
        assert_eq!(members[0].name, Symbol::new("i32"));
        assert_eq!(members[1].name, Symbol::new("bool"));
    }
}
