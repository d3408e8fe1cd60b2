//! Typed syntax tree consumed by the semantic core.
//!
//! The parser and the typing pass live elsewhere; this crate only defines
//! the shape they hand over:
//! - [`Ast`]: arenas of expressions, declarations, blocks and match
//!   instructions, addressed by the handles in [`ids`]
//! - [`Type`]: the interned type registry
//! - [`TaggedValue`]: compile-time values

pub mod ast;
pub mod block;
pub mod build;
pub mod decl;
pub mod expr;
pub mod ids;
mod scope;
pub mod types;
pub mod value;

pub use ast::Ast;
pub use block::{
    Block, BlockKind, Discrimination, DiscriminationCase, DiscriminationKind, Module, Statement,
};
pub use build::{AggregateSpec, ParamSpec, PolySpec};
pub use decl::{
    AggregateDecl, AggregateMember, Decl, DeclKind, EnumDecl, EnumFlavor, EnumMember,
    FunctionDecl, PolyParam,
};
pub use expr::{BinaryOp, Conversion, ConversionKind, Expr, ExprKind, Literal, UnaryOp};
pub use ids::{BlockId, DeclId, DiscriminationId, ExprId, ModuleId};
pub use types::{Type, TypeKind, substitute_placeholders};
pub use value::{FloatBits, TaggedValue};
