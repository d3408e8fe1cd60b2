//! Compile-time values.

use crate::{DeclId, ExprId, Type};

/// Wrapper for f64 that implements Eq and Hash.
///
/// Comparison goes through the bit pattern, so `NaN == NaN` and `0.0 != -0.0`.
#[derive(Clone, Copy, Debug)]
pub struct FloatBits(f64);

impl FloatBits {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for FloatBits {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatBits {}

impl std::hash::Hash for FloatBits {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for FloatBits {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// A value known at compile time.
///
/// Literal strings and arrays are kept as references to their literal node;
/// nothing is copied out of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum TaggedValue<'db> {
    None,
    Bool(bool),
    Int(i64),
    Real(FloatBits),
    String(ExprId),
    Array(ExprId),
    Function(DeclId),
    Type(Type<'db>),
}

impl<'db> TaggedValue<'db> {
    pub fn real(value: f64) -> Self {
        TaggedValue::Real(FloatBits::new(value))
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            TaggedValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(self) -> Option<i64> {
        match self {
            TaggedValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_real(self) -> Option<f64> {
        match self {
            TaggedValue::Real(value) => Some(value.value()),
            _ => None,
        }
    }

    pub fn as_type(self) -> Option<Type<'db>> {
        match self {
            TaggedValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in operand-kind errors.
    pub fn kind_name(self) -> &'static str {
        match self {
            TaggedValue::None => "nothing",
            TaggedValue::Bool(_) => "bool",
            TaggedValue::Int(_) => "integer",
            TaggedValue::Real(_) => "real",
            TaggedValue::String(_) => "string",
            TaggedValue::Array(_) => "array",
            TaggedValue::Function(_) => "function",
            TaggedValue::Type(_) => "type",
        }
    }

    pub fn display(self, db: &'db dyn salsa::Database) -> String {
        match self {
            TaggedValue::None => "none".to_string(),
            TaggedValue::Bool(value) => value.to_string(),
            TaggedValue::Int(value) => value.to_string(),
            TaggedValue::Real(value) => format!("{:?}", value.value()),
            TaggedValue::String(expr) => format!("string literal {expr}"),
            TaggedValue::Array(expr) => format!("array literal {expr}"),
            TaggedValue::Function(decl) => format!("function {decl}"),
            TaggedValue::Type(ty) => ty.display(db),
        }
    }
}
