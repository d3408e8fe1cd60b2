//! Shared foundations for the ember semantic core: interned names, source
//! spans and the diagnostic reporting contract.

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{
    CompilationPhase, Diagnostic, DiagnosticSeverity, DiagnosticSink, ErrorKind, Reporter,
};
pub use span::Span;
pub use symbol::Symbol;
