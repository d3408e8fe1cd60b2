//! Blocks and match instructions.

use ember_core::{Span, Symbol};

use crate::{BlockId, DeclId, DiscriminationId, ExprId, ModuleId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Top-level block of a module.
    Module,
    /// Parameter block of a function; locals above it are out of reach.
    Function,
    Plain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Statement {
    Decl(DeclId),
    Expr(ExprId),
    Discrimination(DiscriminationId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub parent: Option<BlockId>,
    pub module: ModuleId,
    pub statements: Vec<Statement>,
    /// Declarations visible by name in this block, in registration order.
    pub symbols: Vec<DeclId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub name: Symbol,
    pub root: BlockId,
    pub imports: Vec<ModuleId>,
}

/// Which rule a match instruction was validated under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscriminationKind {
    Enum,
    Union,
    AnonymousUnion,
    Scalar,
}

/// A match instruction: `discr x { A, B => ..., C(v) => ..., sinon => ... }`.
#[derive(Clone, Debug, PartialEq)]
pub struct Discrimination {
    pub span: Span,
    pub discriminee: ExprId,
    pub cases: Vec<DiscriminationCase>,
    pub default: Option<BlockId>,
    /// Block containing the instruction.
    pub block: BlockId,
    /// Filled in by validation.
    pub kind: Option<DiscriminationKind>,
}

impl Discrimination {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiscriminationCase {
    /// A single label or a `Comma` list of labels.
    pub labels: ExprId,
    pub body: BlockId,
    /// Payload binding synthesized by validation.
    pub capture: Option<DeclId>,
    /// Variant names this case covers, filled in by validation.
    pub matched: Vec<Symbol>,
}

impl DiscriminationCase {
    pub fn new(labels: ExprId, body: BlockId) -> Self {
        Self {
            labels,
            body,
            capture: None,
            matched: Vec::new(),
        }
    }
}
