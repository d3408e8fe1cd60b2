//! The type registry.
//!
//! Types are salsa-interned: building the same structural description twice
//! yields the same handle, so `==` on [`Type`] is structural equality.
//! Aggregates, enums and opaque types are nominal and carry the id of their
//! declaration instead of their members, which keeps self-referential
//! declarations finite.

use ember_core::Symbol;

use crate::{DeclId, TaggedValue};

#[salsa::interned(debug)]
pub struct Type<'db> {
    #[returns(ref)]
    pub kind: TypeKind<'db>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum TypeKind<'db> {
    // === Scalars ===
    Void,
    Bool,
    Int { signed: bool, bits: u8 },
    /// Type of an unsuffixed integer constant, before it settles on a width.
    IntLiteral,
    Real { bits: u8 },

    // === Indirections and sequences ===
    Pointer(Type<'db>),
    Reference(Type<'db>),
    FixedArray { element: Type<'db>, size: i64 },
    DynamicArray(Type<'db>),
    Slice(Type<'db>),
    Variadic(Type<'db>),

    Function {
        params: Vec<Type<'db>>,
        output: Type<'db>,
    },
    Tuple(Vec<Type<'db>>),

    // === Nominal types ===
    /// A structure. `args` holds the parameter values of a monomorphized
    /// instance and is empty for the polymorphic base and plain structures.
    Struct {
        decl: DeclId,
        name: Symbol,
        args: Vec<TaggedValue<'db>>,
    },
    Union {
        decl: DeclId,
        name: Symbol,
        args: Vec<TaggedValue<'db>>,
    },
    /// `A | B`: members are identified by their type.
    AnonymousUnion(Vec<Type<'db>>),
    Enum { decl: DeclId, name: Symbol },
    /// An error set; behaves like an enum whose zero value is reserved.
    Error { decl: DeclId, name: Symbol },
    Opaque {
        decl: DeclId,
        name: Symbol,
        inner: Type<'db>,
    },

    // === Type-level ===
    /// `$T` before monomorphization.
    Polymorphic(Symbol),
    /// The type of an expression that denotes a type.
    TypeOf(Type<'db>),
}

impl<'db> Type<'db> {
    pub fn void(db: &'db dyn salsa::Database) -> Self {
        Type::new(db, TypeKind::Void)
    }

    pub fn bool(db: &'db dyn salsa::Database) -> Self {
        Type::new(db, TypeKind::Bool)
    }

    pub fn int(db: &'db dyn salsa::Database, signed: bool, bits: u8) -> Self {
        Type::new(db, TypeKind::Int { signed, bits })
    }

    pub fn i32(db: &'db dyn salsa::Database) -> Self {
        Type::int(db, true, 32)
    }

    pub fn i64(db: &'db dyn salsa::Database) -> Self {
        Type::int(db, true, 64)
    }

    pub fn int_literal(db: &'db dyn salsa::Database) -> Self {
        Type::new(db, TypeKind::IntLiteral)
    }

    pub fn real(db: &'db dyn salsa::Database, bits: u8) -> Self {
        Type::new(db, TypeKind::Real { bits })
    }

    pub fn f64(db: &'db dyn salsa::Database) -> Self {
        Type::real(db, 64)
    }

    pub fn pointer(db: &'db dyn salsa::Database, pointee: Type<'db>) -> Self {
        Type::new(db, TypeKind::Pointer(pointee))
    }

    pub fn reference(db: &'db dyn salsa::Database, pointee: Type<'db>) -> Self {
        Type::new(db, TypeKind::Reference(pointee))
    }

    pub fn fixed_array(db: &'db dyn salsa::Database, element: Type<'db>, size: i64) -> Self {
        Type::new(db, TypeKind::FixedArray { element, size })
    }

    pub fn dynamic_array(db: &'db dyn salsa::Database, element: Type<'db>) -> Self {
        Type::new(db, TypeKind::DynamicArray(element))
    }

    pub fn slice(db: &'db dyn salsa::Database, element: Type<'db>) -> Self {
        Type::new(db, TypeKind::Slice(element))
    }

    pub fn function(
        db: &'db dyn salsa::Database,
        params: Vec<Type<'db>>,
        output: Type<'db>,
    ) -> Self {
        Type::new(db, TypeKind::Function { params, output })
    }

    pub fn type_of(db: &'db dyn salsa::Database, ty: Type<'db>) -> Self {
        Type::new(db, TypeKind::TypeOf(ty))
    }

    pub fn polymorphic(db: &'db dyn salsa::Database, name: Symbol) -> Self {
        Type::new(db, TypeKind::Polymorphic(name))
    }

    /// The type an expression denotes when its own type is `TypeOf(_)`.
    pub fn denoted(self, db: &'db dyn salsa::Database) -> Type<'db> {
        match self.kind(db) {
            TypeKind::TypeOf(inner) => *inner,
            _ => self,
        }
    }

    pub fn is_integer(self, db: &'db dyn salsa::Database) -> bool {
        matches!(self.kind(db), TypeKind::Int { .. } | TypeKind::IntLiteral)
    }

    pub fn is_real(self, db: &'db dyn salsa::Database) -> bool {
        matches!(self.kind(db), TypeKind::Real { .. })
    }

    pub fn is_void(self, db: &'db dyn salsa::Database) -> bool {
        matches!(self.kind(db), TypeKind::Void)
    }

    /// Declaration behind a nominal type.
    pub fn decl(self, db: &'db dyn salsa::Database) -> Option<DeclId> {
        match self.kind(db) {
            TypeKind::Struct { decl, .. }
            | TypeKind::Union { decl, .. }
            | TypeKind::Enum { decl, .. }
            | TypeKind::Error { decl, .. }
            | TypeKind::Opaque { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// Whether a `$T` placeholder occurs anywhere inside this type.
    pub fn is_polymorphic(self, db: &'db dyn salsa::Database) -> bool {
        match self.kind(db) {
            TypeKind::Polymorphic(_) => true,
            TypeKind::Pointer(inner)
            | TypeKind::Reference(inner)
            | TypeKind::DynamicArray(inner)
            | TypeKind::Slice(inner)
            | TypeKind::Variadic(inner)
            | TypeKind::TypeOf(inner)
            | TypeKind::FixedArray { element: inner, .. }
            | TypeKind::Opaque { inner, .. } => inner.is_polymorphic(db),
            TypeKind::Function { params, output } => {
                params.iter().any(|p| p.is_polymorphic(db)) || output.is_polymorphic(db)
            }
            TypeKind::Tuple(items) | TypeKind::AnonymousUnion(items) => {
                items.iter().any(|t| t.is_polymorphic(db))
            }
            TypeKind::Struct { args, .. } | TypeKind::Union { args, .. } => args
                .iter()
                .any(|arg| matches!(arg, TaggedValue::Type(t) if t.is_polymorphic(db))),
            TypeKind::Void
            | TypeKind::Bool
            | TypeKind::Int { .. }
            | TypeKind::IntLiteral
            | TypeKind::Real { .. }
            | TypeKind::Enum { .. }
            | TypeKind::Error { .. } => false,
        }
    }

    /// Nesting depth of the type tree; scalars and nominal types count 1.
    pub fn depth(self, db: &'db dyn salsa::Database) -> usize {
        let children = match self.kind(db) {
            TypeKind::Pointer(inner)
            | TypeKind::Reference(inner)
            | TypeKind::DynamicArray(inner)
            | TypeKind::Slice(inner)
            | TypeKind::Variadic(inner)
            | TypeKind::TypeOf(inner)
            | TypeKind::FixedArray { element: inner, .. } => inner.depth(db),
            TypeKind::Function { params, output } => params
                .iter()
                .map(|p| p.depth(db))
                .max()
                .unwrap_or(0)
                .max(output.depth(db)),
            TypeKind::Tuple(items) | TypeKind::AnonymousUnion(items) => {
                items.iter().map(|t| t.depth(db)).max().unwrap_or(0)
            }
            TypeKind::Struct { args, .. } | TypeKind::Union { args, .. } => args
                .iter()
                .filter_map(|arg| arg.as_type())
                .map(|t| t.depth(db))
                .max()
                .unwrap_or(0),
            _ => 0,
        };
        children + 1
    }

    /// Human-readable rendering for diagnostics.
    pub fn display(self, db: &'db dyn salsa::Database) -> String {
        let join = |types: &[Type<'db>], sep: &str| {
            types
                .iter()
                .map(|t| t.display(db))
                .collect::<Vec<_>>()
                .join(sep)
        };
        match self.kind(db) {
            TypeKind::Void => "void".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Int { signed, bits } => {
                format!("{}{bits}", if *signed { 'i' } else { 'u' })
            }
            TypeKind::IntLiteral => "integer literal".to_string(),
            TypeKind::Real { bits } => format!("f{bits}"),
            TypeKind::Pointer(inner) => format!("*{}", inner.display(db)),
            TypeKind::Reference(inner) => format!("&{}", inner.display(db)),
            TypeKind::FixedArray { element, size } => format!("[{size}]{}", element.display(db)),
            TypeKind::DynamicArray(inner) => format!("[..]{}", inner.display(db)),
            TypeKind::Slice(inner) => format!("[]{}", inner.display(db)),
            TypeKind::Variadic(inner) => format!("...{}", inner.display(db)),
            TypeKind::Function { params, output } => {
                format!("fn({}) -> {}", join(params, ", "), output.display(db))
            }
            TypeKind::Tuple(items) => format!("({})", join(items, ", ")),
            TypeKind::Struct { name, args, .. } | TypeKind::Union { name, args, .. } => {
                if args.is_empty() {
                    name.to_string()
                } else {
                    let args = args
                        .iter()
                        .map(|arg| arg.display(db))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{name}({args})")
                }
            }
            TypeKind::AnonymousUnion(members) => join(members, " | "),
            TypeKind::Enum { name, .. }
            | TypeKind::Error { name, .. }
            | TypeKind::Opaque { name, .. } => name.to_string(),
            TypeKind::Polymorphic(name) => format!("${name}"),
            TypeKind::TypeOf(inner) => format!("type({})", inner.display(db)),
        }
    }
}

/// Replace `$T` placeholders with the types bound to them.
///
/// Placeholders without a type binding are left in place.
pub fn substitute_placeholders<'db>(
    db: &'db dyn salsa::Database,
    ty: Type<'db>,
    bindings: &[(Symbol, TaggedValue<'db>)],
) -> Type<'db> {
    if bindings.is_empty() || !ty.is_polymorphic(db) {
        return ty;
    }
    let subst = |t: Type<'db>| substitute_placeholders(db, t, bindings);
    let kind = match ty.kind(db) {
        TypeKind::Polymorphic(name) => {
            return bindings
                .iter()
                .find(|(bound, _)| bound == name)
                .and_then(|(_, value)| value.as_type())
                .unwrap_or(ty);
        }
        TypeKind::Pointer(inner) => TypeKind::Pointer(subst(*inner)),
        TypeKind::Reference(inner) => TypeKind::Reference(subst(*inner)),
        TypeKind::DynamicArray(inner) => TypeKind::DynamicArray(subst(*inner)),
        TypeKind::Slice(inner) => TypeKind::Slice(subst(*inner)),
        TypeKind::Variadic(inner) => TypeKind::Variadic(subst(*inner)),
        TypeKind::TypeOf(inner) => TypeKind::TypeOf(subst(*inner)),
        TypeKind::FixedArray { element, size } => TypeKind::FixedArray {
            element: subst(*element),
            size: *size,
        },
        TypeKind::Function { params, output } => TypeKind::Function {
            params: params.iter().map(|p| subst(*p)).collect(),
            output: subst(*output),
        },
        TypeKind::Tuple(items) => TypeKind::Tuple(items.iter().map(|t| subst(*t)).collect()),
        TypeKind::AnonymousUnion(items) => {
            TypeKind::AnonymousUnion(items.iter().map(|t| subst(*t)).collect())
        }
        TypeKind::Opaque { decl, name, inner } => TypeKind::Opaque {
            decl: *decl,
            name: *name,
            inner: subst(*inner),
        },
        TypeKind::Struct { decl, name, args } => TypeKind::Struct {
            decl: *decl,
            name: *name,
            args: substitute_args(db, args, bindings),
        },
        TypeKind::Union { decl, name, args } => TypeKind::Union {
            decl: *decl,
            name: *name,
            args: substitute_args(db, args, bindings),
        },
        _ => return ty,
    };
    Type::new(db, kind)
}

fn substitute_args<'db>(
    db: &'db dyn salsa::Database,
    args: &[TaggedValue<'db>],
    bindings: &[(Symbol, TaggedValue<'db>)],
) -> Vec<TaggedValue<'db>> {
    args.iter()
        .map(|arg| match arg {
            TaggedValue::Type(t) => TaggedValue::Type(substitute_placeholders(db, *t, bindings)),
            other => *other,
        })
        .collect()
}
