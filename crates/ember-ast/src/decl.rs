//! Declaration nodes.

use ember_core::{Span, Symbol};

use crate::{BlockId, DeclId, ExprId, TaggedValue, Type};

#[derive(Clone, Debug, PartialEq)]
pub struct Decl<'db> {
    pub name: Symbol,
    pub span: Span,
    pub kind: DeclKind<'db>,
    /// Declared or inferred type. For type declarations this is the type
    /// being declared.
    pub ty: Option<Type<'db>>,
    /// Block whose symbol table holds this declaration.
    pub parent: BlockId,
    /// Set once semantic validation of the declaration has finished.
    pub validated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind<'db> {
    /// `NAME :: init`. `value` caches the result once a driver has evaluated it.
    Constant {
        init: Option<ExprId>,
        value: Option<TaggedValue<'db>>,
    },
    /// A runtime local or global.
    Variable { init: Option<ExprId> },
    /// A function parameter. `value_param` marks `$N: shape` parameters
    /// whose argument must be known at compile time.
    Param { shape: ExprId, value_param: bool },
    /// A `$T` introduced by a polymorphic declaration.
    Polymorphic(PolyParam<'db>),
    Function(FunctionDecl),
    Aggregate(AggregateDecl<'db>),
    Enum(EnumDecl),
    EnumMember(EnumMember<'db>),
    /// `Name :: opaque T`; the declared type is in `Decl::ty`.
    Opaque,
}

impl<'db> DeclKind<'db> {
    /// Declarations that stay visible to nested functions: anything that
    /// does not live in a stack frame.
    pub fn is_static(&self) -> bool {
        !matches!(self, DeclKind::Variable { .. } | DeclKind::Param { .. })
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            DeclKind::Aggregate(_) | DeclKind::Enum(_) | DeclKind::Opaque
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolyParam<'db> {
    /// Value parameter (`$N: i64`) rather than type parameter (`$T`).
    pub is_value: bool,
    /// Value parameters: the declared type. Type parameters: the constraint.
    pub ty: Option<Type<'db>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub params: Vec<DeclId>,
    pub outputs: Vec<ExprId>,
    /// Function-boundary block holding the parameters and `$T` declarations.
    pub scope: BlockId,
    pub body: Option<BlockId>,
}

/// A structure or tagged union.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateDecl<'db> {
    pub is_union: bool,
    /// Unions without a tag cannot be discriminated.
    pub is_unsafe: bool,
    /// Polymorphic parameters in declaration order.
    pub params: Vec<DeclId>,
    pub members: Vec<AggregateMember<'db>>,
    pub scope: BlockId,
}

impl<'db> AggregateDecl<'db> {
    pub fn is_polymorphic(&self) -> bool {
        !self.params.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateMember<'db> {
    pub name: Symbol,
    pub span: Span,
    /// May mention the aggregate's own `$T` placeholders.
    pub ty: Type<'db>,
    /// Compiler-synthesized member.
    pub implicit: bool,
    /// Declared with `::`; belongs to the type, not to values of it.
    pub constant: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumFlavor {
    Plain,
    /// Members default to successive powers of two.
    Flags,
    /// Error sets; zero is reserved for "no error".
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub flavor: EnumFlavor,
    /// Members in declaration order, followed by implicit ones once values
    /// have been assigned.
    pub members: Vec<DeclId>,
    pub body: BlockId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember<'db> {
    pub owner: DeclId,
    pub init: Option<ExprId>,
    pub value: Option<TaggedValue<'db>>,
    pub implicit: bool,
    pub constant: bool,
}
