//! Interned identifiers.

use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

static INTERNER: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// An interned identifier (`$T`, member names, declaration names).
///
/// Comparing two symbols is a key comparison; the text is only touched for
/// display and suggestions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, salsa::Update)]
pub struct Symbol(Spur);

impl Symbol {
    pub fn new(text: &'static str) -> Self {
        Self::intern(text, |rodeo| rodeo.get_or_intern_static(text))
    }

    /// Intern text built at runtime, such as a type's display form.
    pub fn from_dynamic(text: &str) -> Self {
        Self::intern(text, |rodeo| rodeo.get_or_intern(text))
    }

    /// Most names are already present, so the write lock is only taken for
    /// a miss.
    fn intern(text: &str, insert: impl FnOnce(&mut Rodeo) -> Spur) -> Self {
        let mut table = INTERNER.upgradable_read();
        match table.get(text) {
            Some(key) => Symbol(key),
            None => Symbol(table.with_upgraded(insert)),
        }
    }

    /// Run `f` on the text. The lock is recursive, so `f` may intern.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(INTERNER.read_recursive().resolve(&self.0))
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_str(|text| f.write_str(text))
    }
}

/// Member names the semantic core gives a meaning of its own.
pub mod known {
    use super::Symbol;

    /// Length of a fixed array.
    pub fn size() -> Symbol {
        Symbol::new("size")
    }

    /// Implicit enum members.
    pub fn count() -> Symbol {
        Symbol::new("count")
    }

    pub fn min() -> Symbol {
        Symbol::new("min")
    }

    pub fn max() -> Symbol {
        Symbol::new("max")
    }
}
