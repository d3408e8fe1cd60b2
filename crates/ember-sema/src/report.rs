//! Routing errors to the driver's reporter.

use ember_ast::{DeclId, ExprId};
use ember_core::{ErrorKind, Reporter, Span};

/// The node an error is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSite {
    Expr(ExprId),
    Decl(DeclId),
}

impl std::fmt::Display for ErrorSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSite::Expr(id) => write!(f, "{id}"),
            ErrorSite::Decl(id) => write!(f, "{id}"),
        }
    }
}

/// Common view over the error types of the semantic core.
pub trait SemaError: std::fmt::Display {
    fn kind(&self) -> ErrorKind;
    fn span(&self) -> Span;
}

/// Hand `error` to `reporter` as a single `(site, kind, message)` triple.
pub fn report(reporter: &dyn Reporter, error: &dyn SemaError) {
    reporter.report(error.span(), error.kind(), error.to_string());
}
