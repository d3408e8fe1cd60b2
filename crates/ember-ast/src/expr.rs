//! Expression nodes.

use ember_core::{Span, Symbol};

use crate::{ExprId, Type};

/// An expression together with the facts earlier passes recorded on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr<'db> {
    pub kind: ExprKind<'db>,
    pub span: Span,
    /// Type assigned by the typing pass, if it has run.
    pub ty: Option<Type<'db>>,
    /// Implicit conversion applied to this node's value.
    pub conversion: Option<Conversion<'db>>,
}

impl<'db> Expr<'db> {
    pub fn new(kind: ExprKind<'db>, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
            conversion: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind<'db> {
    Literal(Literal),
    /// Identifier resolved through the enclosing scope.
    Name(Symbol),

    // === Type expressions and parameter shapes ===
    /// A type spelled directly, such as `i32`.
    TypeLiteral(Type<'db>),
    /// The `type` keyword: any type at all.
    AnyType,
    /// `$T`
    PolymorphicType(Symbol),
    /// `$T/Constraint`
    ConstrainedType { var: Symbol, constraint: ExprId },
    /// `*T`
    PointerType(ExprId),
    /// `&T`
    ReferenceType(ExprId),
    /// `[]T`
    SliceType(ExprId),
    /// `[..]T`
    DynamicArrayType(ExprId),
    /// `[N]T`
    FixedArrayType { size: ExprId, element: ExprId },
    /// `...T`
    VariadicType(ExprId),
    /// `fn(A, B) -> (C, D)`
    FunctionType {
        params: Vec<ExprId>,
        outputs: Vec<ExprId>,
    },

    // === Operators ===
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// `if c { a } else { b }`, or `unless` when `negated` is set.
    If {
        condition: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
        negated: bool,
    },
    Paren(ExprId),
    /// `expr as Target`
    Cast { expr: ExprId, target: ExprId },

    // === Access and construction ===
    Member { base: ExprId, member: Symbol },
    Call { callee: ExprId, args: Vec<ExprId> },
    /// `name = value` inside a call.
    NamedArgument { name: Symbol, value: ExprId },
    /// `a, b, c` as used by case labels.
    Comma(Vec<ExprId>),
    ArrayLiteral(Vec<ExprId>),
    SizeOf(ExprId),
    TypeOf(ExprId),
    /// Reads the payload of union member `index`; synthesized for captures.
    ExtractUnionPayload {
        union_expr: ExprId,
        member: Type<'db>,
        index: usize,
    },
}

/// Literal lexemes. Numbers keep their source text so every lexical base
/// is handled in one place.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(String),
    Real(String),
    Char(char),
    Str(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `~`
    Complement,
    Plus,
    Minus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Operators only defined on integers.
    pub fn is_integral_only(self) -> bool {
        matches!(
            self,
            BinaryOp::Rem
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Shl
                | BinaryOp::Shr
        )
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An implicit conversion recorded on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Conversion<'db> {
    pub kind: ConversionKind,
    pub target: Type<'db>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// Source and target are already the same type.
    Identity,
    /// An unsuffixed integer constant settling on a concrete numeric type.
    FromIntLiteral,
    IntWidening,
    RealWidening,
    /// Load through one level of reference.
    Dereference,
    /// Bind a value to a reference parameter.
    TakeReference,
    /// An array or fixed array viewed as a slice.
    ToSlice,
}
