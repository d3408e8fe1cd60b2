//! Discrimination failures.

use ember_core::{ErrorKind, Span, Symbol};

use crate::report::SemaError;

#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DiscriminationError {
    #[display("`{owner}` is an unsafe union and has no tag to discriminate on")]
    UnsafeUnion { span: Span, owner: String },

    #[display("`{owner}` has no member `{member}`{}", hint(*suggestion))]
    UnknownMember {
        span: Span,
        owner: String,
        member: Symbol,
        suggestion: Option<Symbol>,
    },

    /// Implicit and `::` members belong to the type and never occur as a
    /// value's variant.
    #[display("`{member}` of `{owner}` cannot be matched on")]
    IneligibleMember {
        span: Span,
        owner: String,
        member: Symbol,
    },

    #[display("`{member}` is already handled by an earlier case")]
    RedefinedMember { span: Span, member: Symbol },

    #[display("discrimination of `{owner}` needs a default branch")]
    MissingDefault { span: Span, owner: String },

    #[display("discrimination of `{owner}` does not handle {}", list(missing))]
    IncompleteCoverage {
        span: Span,
        owner: String,
        missing: Vec<Symbol>,
    },

    #[display("values of type `{owner}` cannot be compared with `==`")]
    NoEqualityOperator { span: Span, owner: String },

    #[display("case label of type `{found}` cannot be compared with `{expected}`")]
    LabelTypeMismatch {
        span: Span,
        expected: String,
        found: String,
    },

    #[display("invalid case label: {detail}")]
    InvalidCaseLabel { span: Span, detail: String },

    #[display("capture `{name}` shadows a local of the same name")]
    CaptureShadowsLocal { span: Span, name: Symbol },

    #[display("member `{member}` carries no value to capture")]
    CaptureFromVoid { span: Span, member: Symbol },
}

fn hint(suggestion: Option<Symbol>) -> String {
    suggestion
        .map(|name| format!("; did you mean `{name}`?"))
        .unwrap_or_default()
}

fn list(names: &[Symbol]) -> String {
    names
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SemaError for DiscriminationError {
    fn kind(&self) -> ErrorKind {
        match self {
            DiscriminationError::UnsafeUnion { .. } => ErrorKind::UnsafeUnion,
            DiscriminationError::UnknownMember { .. } => ErrorKind::UnknownMember,
            DiscriminationError::IneligibleMember { .. } => ErrorKind::IneligibleMember,
            DiscriminationError::RedefinedMember { .. } => ErrorKind::RedefinedMember,
            DiscriminationError::MissingDefault { .. } => ErrorKind::MissingDefault,
            DiscriminationError::IncompleteCoverage { .. } => ErrorKind::IncompleteCoverage,
            DiscriminationError::NoEqualityOperator { .. } => ErrorKind::NoEqualityOperator,
            DiscriminationError::LabelTypeMismatch { .. } => ErrorKind::TypeMismatch,
            DiscriminationError::InvalidCaseLabel { .. } => ErrorKind::InvalidCaseLabel,
            DiscriminationError::CaptureShadowsLocal { .. } => ErrorKind::CaptureShadowsLocal,
            DiscriminationError::CaptureFromVoid { .. } => ErrorKind::CaptureFromVoid,
        }
    }

    fn span(&self) -> Span {
        match self {
            DiscriminationError::UnsafeUnion { span, .. }
            | DiscriminationError::UnknownMember { span, .. }
            | DiscriminationError::IneligibleMember { span, .. }
            | DiscriminationError::RedefinedMember { span, .. }
            | DiscriminationError::MissingDefault { span, .. }
            | DiscriminationError::IncompleteCoverage { span, .. }
            | DiscriminationError::NoEqualityOperator { span, .. }
            | DiscriminationError::LabelTypeMismatch { span, .. }
            | DiscriminationError::InvalidCaseLabel { span, .. }
            | DiscriminationError::CaptureShadowsLocal { span, .. }
            | DiscriminationError::CaptureFromVoid { span, .. } => *span,
        }
    }
}
