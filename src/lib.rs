//! ember: the semantic core of a compiler for a small systems language.
//!
//! The work is split across the workspace crates, re-exported here:
//! - `ember_core`: symbols, spans and the diagnostic contract
//! - `ember_ast`: the typed tree and the interned type registry
//! - `ember_sema`: constant evaluation, monomorphization and discrimination

pub mod pipeline;

pub use {ember_ast, ember_core, ember_sema};

pub use pipeline::{Session, Stage};
