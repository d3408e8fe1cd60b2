//! Diagnostics produced by the semantic core.
//!
//! The core never formats or prints anything itself. Every failure is handed
//! to a [`Reporter`] as `(site, kind, message)`; rendering is left to whoever
//! owns the reporter.

use parking_lot::Mutex;

use crate::Span;

/// Error kinds raised by the semantic core, grouped by the phase raising them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorKind {
    // Constant evaluation
    #[display("not constant")]
    NotConstant,
    #[display("unknown declaration")]
    UnknownDeclaration,
    #[display("wrong operand kind")]
    WrongOperandKind,
    #[display("arity violation")]
    ArityViolation,
    #[display("invalid enum value")]
    InvalidEnumValue,

    // Monomorphization
    #[display("kind mismatch")]
    KindMismatch,
    #[display("type mismatch")]
    TypeMismatch,
    #[display("value mismatch")]
    ValueMismatch,
    #[display("item missing")]
    ItemMissing,
    #[display("internal: unsupported shape")]
    InternalUnsupportedShape,
    #[display("blocked")]
    Blocked,

    // Discrimination
    #[display("unknown member")]
    UnknownMember,
    #[display("redefined member")]
    RedefinedMember,
    #[display("missing default")]
    MissingDefault,
    #[display("incomplete coverage")]
    IncompleteCoverage,
    #[display("no equality operator")]
    NoEqualityOperator,
    #[display("unsafe union")]
    UnsafeUnion,
    #[display("invalid case label")]
    InvalidCaseLabel,
    #[display("ineligible member")]
    IneligibleMember,
    #[display("capture shadows local")]
    CaptureShadowsLocal,
    #[display("capture from void member")]
    CaptureFromVoid,
}

impl ErrorKind {
    /// Phase that raises errors of this kind.
    pub fn phase(self) -> CompilationPhase {
        use ErrorKind::*;
        match self {
            NotConstant | UnknownDeclaration | WrongOperandKind | ArityViolation
            | InvalidEnumValue => CompilationPhase::ConstantEvaluation,
            KindMismatch | TypeMismatch | ValueMismatch | ItemMissing
            | InternalUnsupportedShape | Blocked => CompilationPhase::Monomorphization,
            UnknownMember | RedefinedMember | MissingDefault | IncompleteCoverage
            | NoEqualityOperator | UnsafeUnion | InvalidCaseLabel | IneligibleMember
            | CaptureShadowsLocal | CaptureFromVoid => CompilationPhase::Discrimination,
        }
    }

    /// Internal errors point at a compiler defect rather than user code.
    pub fn is_internal(self) -> bool {
        matches!(self, ErrorKind::InternalUnsupportedShape)
    }
}

/// A reported problem with its source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
    pub severity: DiagnosticSeverity,
    pub phase: CompilationPhase,
}

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// Compilation phase where a diagnostic was emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompilationPhase {
    ConstantEvaluation,
    Monomorphization,
    Discrimination,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "ERROR"),
            DiagnosticSeverity::Warning => write!(f, "WARNING"),
            DiagnosticSeverity::Info => write!(f, "INFO"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}: {}", self.severity, self.span, self.kind, self.message)
    }
}

/// The single outlet for failures found by the semantic core.
///
/// Implementations must be shareable between validation workers.
pub trait Reporter: Send + Sync {
    fn report(&self, site: Span, kind: ErrorKind, message: String);
}

/// A [`Reporter`] that keeps every diagnostic in arrival order.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    /// Take all collected diagnostics, leaving the sink empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }
}

impl Reporter for DiagnosticSink {
    fn report(&self, site: Span, kind: ErrorKind, message: String) {
        self.diagnostics.lock().push(Diagnostic {
            message,
            span: site,
            kind,
            severity: DiagnosticSeverity::Error,
            phase: kind.phase(),
        });
    }
}
