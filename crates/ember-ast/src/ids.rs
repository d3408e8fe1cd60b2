//! Arena handles.
//!
//! Every node kind lives in its own arena inside [`crate::Ast`]; these
//! handles index into them. They are local to one `Ast` and must not be
//! mixed between compilation units.

macro_rules! arena_id {
    ($(#[$attr:meta])* $name:ident => $prefix:literal) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, salsa::Update)]
        pub struct $name(u32);

        impl $name {
            /// Build a handle from its raw index.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn next(len: usize) -> Self {
                Self(u32::try_from(len).unwrap_or(u32::MAX))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id! {
    /// An expression node.
    ExprId => "e"
}
arena_id! {
    /// A declaration node.
    DeclId => "d"
}
arena_id! {
    /// A lexical block with its own symbol table.
    BlockId => "b"
}
arena_id! {
    ModuleId => "m"
}
arena_id! {
    /// A match instruction.
    DiscriminationId => "s"
}
