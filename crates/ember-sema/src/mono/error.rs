//! Monomorphization failures.

use ember_core::{ErrorKind, Span, Symbol};

use super::MonomorphizationItem;
use crate::eval::EvalError;
use crate::report::{ErrorSite, SemaError};

/// Why a polymorphic declaration could not be instantiated for a call.
///
/// Conflicts keep both items involved so a driver can point at each of
/// them; the rendered `expected`/`found` strings feed the message.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum MonoError<'db> {
    #[from(ignore)]
    #[display("`${ident}` expects {expected}, but was given {found}")]
    KindMismatch {
        span: Span,
        ident: Symbol,
        expected: String,
        found: String,
        first: MonomorphizationItem<'db>,
        second: MonomorphizationItem<'db>,
    },

    #[from(ignore)]
    #[display("`${ident}` is `{expected}` here, but `{found}` was given")]
    TypeMismatch {
        span: Span,
        ident: Symbol,
        expected: String,
        found: String,
        first: MonomorphizationItem<'db>,
        second: MonomorphizationItem<'db>,
    },

    /// An argument's type does not have the structure its parameter shape asks for.
    #[from(ignore)]
    #[display("expected an argument of shape `{expected}`, found `{found}`")]
    ShapeMismatch {
        span: Span,
        expected: String,
        found: String,
    },

    #[from(ignore)]
    #[display("`${ident}` is {expected} here, but {found} was given")]
    ValueMismatch {
        span: Span,
        ident: Symbol,
        expected: String,
        found: String,
        first: MonomorphizationItem<'db>,
        second: MonomorphizationItem<'db>,
    },

    #[from(ignore)]
    #[display("could not determine `${ident}` from the arguments")]
    ItemMissing { span: Span, ident: Symbol },

    #[from(ignore)]
    #[display("no parameter named `{ident}`")]
    UnknownParameter { span: Span, ident: Symbol },

    #[from(ignore)]
    #[display("expected at most {expected} arguments, found {found}")]
    TooManyArguments {
        span: Span,
        expected: usize,
        found: usize,
    },

    /// A declaration shape the engine does not know how to take apart.
    #[from(ignore)]
    #[display("internal error: cannot unify against {site}: {detail}")]
    UnsupportedShape {
        span: Span,
        site: ErrorSite,
        detail: String,
    },

    #[display("{_0}")]
    Evaluation(EvalError),
}

impl SemaError for MonoError<'_> {
    fn kind(&self) -> ErrorKind {
        match self {
            MonoError::KindMismatch { .. } => ErrorKind::KindMismatch,
            MonoError::TypeMismatch { .. } | MonoError::ShapeMismatch { .. } => {
                ErrorKind::TypeMismatch
            }
            MonoError::ValueMismatch { .. } => ErrorKind::ValueMismatch,
            MonoError::ItemMissing { .. } => ErrorKind::ItemMissing,
            MonoError::UnknownParameter { .. } | MonoError::TooManyArguments { .. } => {
                ErrorKind::ArityViolation
            }
            MonoError::UnsupportedShape { .. } => ErrorKind::InternalUnsupportedShape,
            MonoError::Evaluation(error) => error.kind,
        }
    }

    fn span(&self) -> Span {
        match self {
            MonoError::KindMismatch { span, .. }
            | MonoError::TypeMismatch { span, .. }
            | MonoError::ShapeMismatch { span, .. }
            | MonoError::ValueMismatch { span, .. }
            | MonoError::ItemMissing { span, .. }
            | MonoError::UnknownParameter { span, .. }
            | MonoError::TooManyArguments { span, .. }
            | MonoError::UnsupportedShape { span, .. } => *span,
            MonoError::Evaluation(error) => error.span,
        }
    }
}
