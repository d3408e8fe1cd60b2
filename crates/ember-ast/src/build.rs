//! Declaration builders used when lowering parsed source into an [`Ast`].

use ember_core::{Span, Symbol};

use crate::{
    AggregateDecl, AggregateMember, Ast, BinaryOp, BlockId, BlockKind, DeclId, DeclKind,
    EnumDecl, EnumFlavor, EnumMember, ExprId, ExprKind, FunctionDecl, Literal, PolyParam, Type,
    TypeKind,
};

/// One function parameter: `name: shape`, or `$name: shape` for a value
/// parameter.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: Symbol,
    pub shape: ExprId,
    pub value_param: bool,
}

impl ParamSpec {
    pub fn new(name: Symbol, shape: ExprId) -> Self {
        Self {
            name,
            shape,
            value_param: false,
        }
    }

    pub fn value(name: Symbol, shape: ExprId) -> Self {
        Self {
            name,
            shape,
            value_param: true,
        }
    }
}

/// A polymorphic parameter of an aggregate.
#[derive(Clone, Debug)]
pub struct PolySpec<'db> {
    pub name: Symbol,
    pub param: PolyParam<'db>,
}

impl<'db> PolySpec<'db> {
    pub fn ty(name: Symbol) -> Self {
        Self {
            name,
            param: PolyParam {
                is_value: false,
                ty: None,
            },
        }
    }

    pub fn value(name: Symbol, ty: Type<'db>) -> Self {
        Self {
            name,
            param: PolyParam {
                is_value: true,
                ty: Some(ty),
            },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AggregateSpec<'db> {
    pub is_union: bool,
    pub is_unsafe: bool,
    pub params: Vec<PolySpec<'db>>,
    pub members: Vec<AggregateMember<'db>>,
}

impl<'db> Ast<'db> {
    pub fn declare_constant(&mut self, block: BlockId, name: Symbol, init: ExprId) -> DeclId {
        self.declare(
            block,
            name,
            self.expr(init).span,
            DeclKind::Constant {
                init: Some(init),
                value: None,
            },
            None,
        )
    }

    pub fn declare_variable(
        &mut self,
        block: BlockId,
        name: Symbol,
        ty: Option<Type<'db>>,
        init: Option<ExprId>,
    ) -> DeclId {
        self.declare(block, name, Span::default(), DeclKind::Variable { init }, ty)
    }

    /// Declare a function and its parameter block.
    ///
    /// Every `$T` mentioned by a parameter shape is registered in the
    /// parameter block so the body and the outputs can name it.
    pub fn declare_function(
        &mut self,
        block: BlockId,
        name: Symbol,
        params: Vec<ParamSpec>,
        outputs: Vec<ExprId>,
    ) -> DeclId {
        let scope = self.add_block(block, BlockKind::Function);
        for param in &params {
            for (placeholder, is_value) in self.placeholders(param.shape) {
                if self.lookup_local(scope, placeholder).is_none() {
                    let span = self.expr(param.shape).span;
                    self.declare(
                        scope,
                        placeholder,
                        span,
                        DeclKind::Polymorphic(PolyParam { is_value, ty: None }),
                        None,
                    );
                }
            }
        }
        let param_ids = params
            .iter()
            .map(|param| {
                let span = self.expr(param.shape).span;
                self.declare(
                    scope,
                    param.name,
                    span,
                    DeclKind::Param {
                        shape: param.shape,
                        value_param: param.value_param,
                    },
                    None,
                )
            })
            .collect();
        let body = self.add_block(scope, BlockKind::Plain);
        self.declare(
            block,
            name,
            Span::default(),
            DeclKind::Function(FunctionDecl {
                params: param_ids,
                outputs,
                scope,
                body: Some(body),
            }),
            None,
        )
    }

    /// Declare a structure or union; its `Decl::ty` is the base type.
    pub fn declare_aggregate(
        &mut self,
        db: &'db dyn salsa::Database,
        block: BlockId,
        name: Symbol,
        spec: AggregateSpec<'db>,
    ) -> DeclId {
        let scope = self.add_block(block, BlockKind::Plain);
        let params = spec
            .params
            .into_iter()
            .map(|poly| {
                self.declare(
                    scope,
                    poly.name,
                    Span::default(),
                    DeclKind::Polymorphic(poly.param),
                    None,
                )
            })
            .collect();
        let is_union = spec.is_union;
        let id = self.declare(
            block,
            name,
            Span::default(),
            DeclKind::Aggregate(AggregateDecl {
                is_union,
                is_unsafe: spec.is_unsafe,
                params,
                members: spec.members,
                scope,
            }),
            None,
        );
        let kind = if is_union {
            TypeKind::Union {
                decl: id,
                name,
                args: Vec::new(),
            }
        } else {
            TypeKind::Struct {
                decl: id,
                name,
                args: Vec::new(),
            }
        };
        self.decl_mut(id).ty = Some(Type::new(db, kind));
        id
    }

    /// Declare an enum or error set with its members. Values are assigned
    /// later by constant evaluation.
    pub fn declare_enum(
        &mut self,
        db: &'db dyn salsa::Database,
        block: BlockId,
        name: Symbol,
        flavor: EnumFlavor,
        members: Vec<(Symbol, Option<ExprId>)>,
    ) -> DeclId {
        let body = self.add_block(block, BlockKind::Plain);
        let id = self.declare(
            block,
            name,
            Span::default(),
            DeclKind::Enum(EnumDecl {
                flavor,
                members: Vec::new(),
                body,
            }),
            None,
        );
        let ty = match flavor {
            EnumFlavor::Error => Type::new(db, TypeKind::Error { decl: id, name }),
            EnumFlavor::Plain | EnumFlavor::Flags => Type::new(db, TypeKind::Enum { decl: id, name }),
        };
        self.decl_mut(id).ty = Some(ty);

        let member_ids: Vec<DeclId> = members
            .into_iter()
            .map(|(member, init)| {
                self.declare(
                    body,
                    member,
                    Span::default(),
                    DeclKind::EnumMember(EnumMember {
                        owner: id,
                        init,
                        value: None,
                        implicit: false,
                        constant: false,
                    }),
                    Some(ty),
                )
            })
            .collect();
        if let DeclKind::Enum(decl) = &mut self.decl_mut(id).kind {
            decl.members = member_ids;
        }
        id
    }

    pub fn declare_opaque(
        &mut self,
        db: &'db dyn salsa::Database,
        block: BlockId,
        name: Symbol,
        inner: Type<'db>,
    ) -> DeclId {
        let id = self.declare(block, name, Span::default(), DeclKind::Opaque, None);
        self.decl_mut(id).ty = Some(Type::new(
            db,
            TypeKind::Opaque {
                decl: id,
                name,
                inner,
            },
        ));
        id
    }

    pub fn mark_validated(&mut self, decl: DeclId) {
        self.decl_mut(decl).validated = true;
    }

    /// `$Name`s introduced by a parameter shape, in first-occurrence order,
    /// flagged `true` when they stand for a value (a fixed-array size).
    pub fn placeholders(&self, shape: ExprId) -> Vec<(Symbol, bool)> {
        let mut found = Vec::new();
        self.collect_placeholders(shape, false, &mut found);
        found
    }

    fn collect_placeholders(&self, id: ExprId, is_value: bool, found: &mut Vec<(Symbol, bool)>) {
        match &self.expr(id).kind {
            ExprKind::PolymorphicType(name) => push_unique(found, *name, is_value),
            ExprKind::ConstrainedType { var, constraint } => {
                push_unique(found, *var, false);
                self.collect_placeholders(*constraint, false, found);
            }
            ExprKind::FixedArrayType { size, element } => {
                self.collect_placeholders(*size, true, found);
                self.collect_placeholders(*element, false, found);
            }
            _ => {
                for child in self.children(id) {
                    self.collect_placeholders(child, false, found);
                }
            }
        }
    }

    // ========================================================================
    // Expression shorthands
    // ========================================================================

    pub fn int_lit(&mut self, text: &str) -> ExprId {
        self.alloc(ExprKind::Literal(Literal::Int(text.to_string())))
    }

    pub fn real_lit(&mut self, text: &str) -> ExprId {
        self.alloc(ExprKind::Literal(Literal::Real(text.to_string())))
    }

    pub fn bool_lit(&mut self, value: bool) -> ExprId {
        self.alloc(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn str_lit(&mut self, text: &str) -> ExprId {
        self.alloc(ExprKind::Literal(Literal::Str(text.to_string())))
    }

    pub fn name(&mut self, ident: Symbol) -> ExprId {
        self.alloc(ExprKind::Name(ident))
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let span = self.expr(lhs).span.to(self.expr(rhs).span);
        self.alloc_at(ExprKind::Binary { op, lhs, rhs }, span)
    }

    /// A type spelled in source, typed as `type(ty)`.
    pub fn type_expr(&mut self, db: &'db dyn salsa::Database, ty: Type<'db>) -> ExprId {
        self.alloc_typed(ExprKind::TypeLiteral(ty), Type::type_of(db, ty))
    }
}

fn push_unique(found: &mut Vec<(Symbol, bool)>, name: Symbol, is_value: bool) {
    if !found.iter().any(|(seen, _)| *seen == name) {
        found.push((name, is_value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_function_registers_placeholders() {
        let db = salsa::DatabaseImpl::new();
        let mut ast = Ast::new();
        let module = ast.add_module(Symbol::new("main"));
        let root = ast.module(module).root;

        let t = ast.alloc(ExprKind::PolymorphicType(Symbol::new("T")));
        let n = ast.alloc(ExprKind::PolymorphicType(Symbol::new("N")));
        let array = ast.alloc(ExprKind::FixedArrayType { size: n, element: t });
        let t_again = ast.alloc(ExprKind::PolymorphicType(Symbol::new("T")));
        let output = ast.type_expr(&db, Type::bool(&db));
        let f = ast.declare_function(
            root,
            Symbol::new("contains"),
            vec![
                ParamSpec::new(Symbol::new("items"), array),
                ParamSpec::new(Symbol::new("needle"), t_again),
            ],
            vec![output],
        );

        assert_eq!(
            ast.placeholders(array),
            vec![(Symbol::new("N"), true), (Symbol::new("T"), false)]
        );
        let DeclKind::Function(func) = &ast.decl(f).kind else {
            panic!("expected a function");
        };
        assert_eq!(func.params.len(), 2);
        let scope = func.scope;
        let t_decl = ast.lookup_local(scope, Symbol::new("T")).unwrap();
        assert!(matches!(
            ast.decl(t_decl).kind,
            DeclKind::Polymorphic(PolyParam { is_value: false, .. })
        ));
        let body = func.body.unwrap();
        assert_eq!(ast.lookup(body, Symbol::new("needle")), Some(func.params[1]));
    }

    #[test]
    fn test_declare_enum_types_members() {
        let db = salsa::DatabaseImpl::new();
        let mut ast = Ast::new();
        let module = ast.add_module(Symbol::new("main"));
        let root = ast.module(module).root;
        let color = ast.declare_enum(
            &db,
            root,
            Symbol::new("Color"),
            EnumFlavor::Plain,
            vec![(Symbol::new("Red"), None), (Symbol::new("Green"), None)],
        );
        let ty = ast.decl(color).ty.unwrap();
        assert_eq!(ty.display(&db), "Color");
        let DeclKind::Enum(decl) = &ast.decl(color).kind else {
            panic!("expected an enum");
        };
        assert_eq!(decl.members.len(), 2);
        assert_eq!(ast.decl(decl.members[1]).ty, Some(ty));
    }
}
