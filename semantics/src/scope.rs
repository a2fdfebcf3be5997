//! Scope-chained declaration and lookup over the block tree.

use crate::ast::{Ast, BlockRef, ValueId};
use crate::literal::Literal;
use crate::Sym;

/// Which map of a block a declaration lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Argument,
    Local,
}

impl Ast {
    /// Declare `sym` in `block`. Fails (returns `None`) when the block
    /// already declares the name in either of its own maps; outer-scope
    /// declarations of the same name are fine and will be shadowed.
    pub fn declare(
        &mut self,
        block: BlockRef,
        namespace: Namespace,
        sym: Sym,
        name: &str,
    ) -> Option<ValueId> {
        if self.block(block).declares(sym) {
            return None;
        }
        let value = self.add_value(name.to_string());
        let map = match namespace {
            Namespace::Argument => &mut self.block_mut(block).arguments,
            Namespace::Local => &mut self.block_mut(block).variables,
        };
        map.insert(sym, value);
        Some(value)
    }

    /// Walk `block` and its parent chain looking for `sym`; on a method
    /// block the walk falls through to the owning class's instance then
    /// class variable maps. The first match wins, so inner declarations
    /// shadow outer ones and resolution never aggregates across scopes.
    pub fn resolve(&self, block: BlockRef, sym: Sym) -> Option<ValueId> {
        let mut current = Some(block);
        let mut outermost = block;
        while let Some(b) = current {
            let scope = self.block(b);
            if let Some(&value) = scope.arguments.get(&sym) {
                return Some(value);
            }
            if let Some(&value) = scope.variables.get(&sym) {
                return Some(value);
            }
            outermost = b;
            current = scope.parent;
        }
        let class = self.block(outermost).class?;
        let class = self.class(class);
        if let Some(&value) = class.variables.get(&sym) {
            return Some(value);
        }
        class.class_variables.get(&sym).copied()
    }

    /// Class-level constants resolve to literals, not values. Consulted
    /// only after `resolve` comes up empty.
    pub fn resolve_constant(&self, block: BlockRef, sym: Sym) -> Option<&Literal> {
        let mut current = Some(block);
        let mut outermost = block;
        while let Some(b) = current {
            outermost = b;
            current = self.block(b).parent;
        }
        let class = self.block(outermost).class?;
        self.class(class).constants.get(&sym)
    }
}
