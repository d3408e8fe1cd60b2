//! The semantic core of the ember compiler.
//!
//! Three engines, invoked by an external validation driver:
//! - [`eval`]: compile-time evaluation of constant expressions and enum
//!   member values
//! - [`mono`]: binding the `$T`s of polymorphic functions and aggregates at
//!   each call site, with a shared instantiation cache
//! - [`discr`]: exhaustiveness and capture synthesis for match instructions
//!
//! None of them prints anything. Failures come back as typed errors that
//! implement [`SemaError`] and can be handed to a reporter with [`report`].

pub mod config;
pub mod context;
pub mod conversion;
pub mod discr;
pub mod eval;
pub mod layout;
pub mod members;
pub mod mono;
pub mod operators;
pub mod report;
pub mod suggest;

pub use config::SemaConfig;
pub use context::{Dependency, SemaContext};
pub use conversion::find_conversion;
pub use discr::{
    DiscriminationError, DiscriminationValidator, ValidationOutcome, ValidationResult,
};
pub use eval::{ConstantEvaluator, EvalError, EvaluationResult, assign_enum_values};
pub use layout::{Layout, layout_of, size_of};
pub use mono::{
    InstanceId, Instantiation, MonoError, MonoOutcome, MonomorphCache, MonomorphizationItem,
    MonomorphizationSet, Monomorphizer, Resolution,
};
pub use operators::{BuiltinOperators, OperatorCandidate, OperatorSearch};
pub use report::{ErrorSite, SemaError, report};
