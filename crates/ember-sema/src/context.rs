//! State shared by every validation task of a compilation.

use ember_ast::{DeclId, ExprId};

use crate::SemaConfig;
use crate::mono::MonomorphCache;

/// Configuration plus the instantiation cache.
///
/// Workers validating different call sites share one context; the cache is
/// the only part written to, and it handles its own locking.
#[derive(Debug, Default)]
pub struct SemaContext<'db> {
    pub config: SemaConfig,
    pub monomorphizations: MonomorphCache<'db>,
}

impl<'db> SemaContext<'db> {
    pub fn new(config: SemaConfig) -> Self {
        Self {
            config,
            monomorphizations: MonomorphCache::new(),
        }
    }
}

/// What a blocked task is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// An expression the typing pass has not reached yet.
    Expr(ExprId),
    /// A declaration that has not finished validation.
    Decl(DeclId),
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dependency::Expr(id) => write!(f, "expression {id}"),
            Dependency::Decl(id) => write!(f, "declaration {id}"),
        }
    }
}
