//! Name lookup.

use ember_core::Symbol;

use crate::{Ast, BlockId, BlockKind, DeclId};

impl<'db> Ast<'db> {
    /// Find the declaration `ident` refers to from inside `block`.
    ///
    /// Enclosing blocks are searched innermost first. Once the search leaves
    /// a function's parameter block only static declarations stay visible.
    /// Top-level blocks of imported modules are searched last.
    pub fn lookup(&self, block: BlockId, ident: Symbol) -> Option<DeclId> {
        let mut statics_only = false;
        let mut current = Some(block);
        let mut module = self.block(block).module;
        while let Some(id) = current {
            if let Some(found) = self.find_in_block(id, ident, statics_only) {
                return Some(found);
            }
            let block = self.block(id);
            if block.kind == BlockKind::Function {
                statics_only = true;
            }
            module = block.module;
            current = block.parent;
        }

        self.module(module)
            .imports
            .iter()
            .find_map(|&imported| self.find_in_block(self.module(imported).root, ident, true))
    }

    /// Like [`Ast::lookup`], but stops at the nearest function boundary and
    /// never consults imports.
    pub fn lookup_local(&self, block: BlockId, ident: Symbol) -> Option<DeclId> {
        let mut current = Some(block);
        while let Some(id) = current {
            if let Some(found) = self.find_in_block(id, ident, false) {
                return Some(found);
            }
            let block = self.block(id);
            if matches!(block.kind, BlockKind::Function | BlockKind::Module) {
                return None;
            }
            current = block.parent;
        }
        None
    }

    fn find_in_block(&self, block: BlockId, ident: Symbol, statics_only: bool) -> Option<DeclId> {
        self.block(block).symbols.iter().rev().copied().find(|&id| {
            let decl = self.decl(id);
            decl.name == ident && (!statics_only || decl.kind.is_static())
        })
    }
}
