//! Three-address lowering.
//!
//! Rewrites every block's statement list so that no operand of a
//! `Calculate`, `Dispatch` or `Result` node is itself a compound
//! expression. Nested computations are hoisted into assignments to fresh
//! temporaries, inserted before the statement that consumed them. The pass
//! also stamps every variable reference with its revision number: the first
//! binding of a value establishes revision 0 and each later write
//! increments it, so distinct revisions name distinct defining writes.
//!
//! Lowering runs on an AST the builder accepted. Anything structurally
//! impossible at that point (dangling handles, a class nested in a block)
//! is an internal fault, not a user diagnostic.

use std::fmt;

use crate::ast::{Ast, BlockRef, NodeKind, NodeRef, ValueId};
use crate::build::method_blocks;
use crate::literal::Literal;

/// Internal invariant violation during lowering. Distinct from the
/// user-facing diagnostics of the build phase: encountering one means the
/// input AST was malformed or the pass itself has a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweringFault {
    message: String,
}

impl LoweringFault {
    fn new(message: impl Into<String>) -> Self {
        LoweringFault { message: message.into() }
    }

    /// Fault reported when lowering is requested without a cleanly built
    /// AST to run on.
    pub fn build_failed() -> Self {
        LoweringFault::new("lowering requires a successfully built AST")
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoweringFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lowering fault: {}", self.message)
    }
}

impl std::error::Error for LoweringFault {}

/// Lower the whole AST to three-address form in place. For a class root
/// every method body is lowered; for a block root the block itself.
pub fn to_three_address_form(ast: &mut Ast) -> Result<(), LoweringFault> {
    let Some(root) = ast.root else {
        return Err(LoweringFault::new("AST has no root"));
    };
    let kind = ast
        .try_node(root)
        .ok_or_else(|| LoweringFault::new("dangling root reference"))?
        .kind
        .clone();
    let mut pass = Lowering { ast, next_temp: 0 };
    match kind {
        NodeKind::Block(block) => pass.lower_block(block),
        NodeKind::Class(class) => {
            let bodies: Vec<BlockRef> = method_blocks(pass.ast.class(class)).collect();
            for body in bodies {
                pass.lower_block(body)?;
            }
            Ok(())
        }
        _ => Err(LoweringFault::new("root must be a block or a class")),
    }
}

struct Lowering<'a> {
    ast: &'a mut Ast,
    /// Next candidate index for a temporary name in the block being
    /// lowered.
    next_temp: u32,
}

impl Lowering<'_> {
    fn lower_block(&mut self, block: BlockRef) -> Result<(), LoweringFault> {
        // Temporary numbering restarts per block; each block is its own
        // namespace.
        let saved = std::mem::replace(&mut self.next_temp, 0);
        let statements = self.ast.block(block).statements.clone();
        let mut out = Vec::with_capacity(statements.len());
        for statement in statements {
            self.lower_stmt(statement, block, &mut out)?;
        }
        self.ast.block_mut(block).statements = out;
        self.next_temp = saved;
        Ok(())
    }

    /// Lower one statement, appending it (preceded by any hoisted
    /// temporaries) to `out`.
    fn lower_stmt(
        &mut self,
        node: NodeRef,
        block: BlockRef,
        out: &mut Vec<NodeRef>,
    ) -> Result<(), LoweringFault> {
        let kind = self
            .ast
            .try_node(node)
            .ok_or_else(|| LoweringFault::new("dangling node reference"))?
            .kind
            .clone();
        match kind {
            NodeKind::Assign { target, value } => {
                let value = self.lower_to_simple(value, block, out)?;
                self.note_write(target)?;
                if let NodeKind::Assign { value: slot, .. } = &mut self.ast.node_mut(node).kind {
                    *slot = value;
                }
                out.push(node);
            }
            NodeKind::Result { value } => {
                // Returned values must already be materialized.
                let value = self.lower_to_leaf(value, block, out)?;
                if let NodeKind::Result { value: slot } = &mut self.ast.node_mut(node).kind {
                    *slot = value;
                }
                out.push(node);
            }
            NodeKind::While { condition, action } => {
                // Hoists for the condition land inside the condition's own
                // statement list so they re-run every iteration.
                self.lower_inline(condition, block)?;
                self.lower_inline(action, block)?;
                out.push(node);
            }
            NodeKind::Block(inner) => {
                self.lower_block(inner)?;
                out.push(node);
            }
            NodeKind::InlineBlock { .. } => {
                self.lower_inline(node, block)?;
                out.push(node);
            }
            NodeKind::Calculate { .. } | NodeKind::Dispatch { .. } => {
                let simple = self.lower_to_simple(node, block, out)?;
                out.push(simple);
            }
            NodeKind::ValueRef { is_write: false, .. } => {
                self.note_read(node)?;
                out.push(node);
            }
            NodeKind::ValueRef { is_write: true, .. } => {
                return Err(LoweringFault::new("write reference outside an assignment"));
            }
            NodeKind::Constant(_) => out.push(node),
            NodeKind::Class(_) => {
                return Err(LoweringFault::new("class definition inside a block"));
            }
        }
        Ok(())
    }

    fn lower_inline(&mut self, node: NodeRef, block: BlockRef) -> Result<(), LoweringFault> {
        let NodeKind::InlineBlock { statements } = self.ast.node(node).kind.clone() else {
            return Err(LoweringFault::new("expected an inline block"));
        };
        let mut out = Vec::with_capacity(statements.len());
        for statement in statements {
            self.lower_stmt(statement, block, &mut out)?;
        }
        if let NodeKind::InlineBlock { statements: slot } = &mut self.ast.node_mut(node).kind {
            *slot = out;
        }
        Ok(())
    }

    /// Reduce `node` to something valid on the right of an assignment: a
    /// leaf, or a `Calculate`/`Dispatch` whose operands are all leaves.
    /// Statement-like subexpressions are pushed to `out` and replaced by
    /// their resulting value.
    fn lower_to_simple(
        &mut self,
        node: NodeRef,
        block: BlockRef,
        out: &mut Vec<NodeRef>,
    ) -> Result<NodeRef, LoweringFault> {
        let kind = self
            .ast
            .try_node(node)
            .ok_or_else(|| LoweringFault::new("dangling node reference"))?
            .kind
            .clone();
        match kind {
            NodeKind::Constant(_) => Ok(node),
            NodeKind::ValueRef { is_write: false, .. } => {
                self.note_read(node)?;
                Ok(node)
            }
            NodeKind::ValueRef { is_write: true, .. } => {
                Err(LoweringFault::new("write reference in operand position"))
            }
            NodeKind::Calculate { left, right, .. } => {
                let left = self.lower_to_leaf(left, block, out)?;
                let right = self.lower_to_leaf(right, block, out)?;
                if let NodeKind::Calculate { left: l, right: r, .. } =
                    &mut self.ast.node_mut(node).kind
                {
                    *l = left;
                    *r = right;
                }
                Ok(node)
            }
            NodeKind::Dispatch { arguments, .. } => {
                let mut lowered = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    lowered.push(self.lower_to_leaf(argument, block, out)?);
                }
                if let NodeKind::Dispatch { arguments: slot, .. } =
                    &mut self.ast.node_mut(node).kind
                {
                    *slot = lowered;
                }
                Ok(node)
            }
            NodeKind::Assign { target, value } => {
                // A nested assignment runs as its own statement; the
                // consumer reads the assigned variable back.
                let value = self.lower_to_simple(value, block, out)?;
                self.note_write(target)?;
                if let NodeKind::Assign { value: slot, .. } = &mut self.ast.node_mut(node).kind {
                    *slot = value;
                }
                out.push(node);
                let NodeKind::ValueRef { value: id, .. } = self.ast.node(target).kind else {
                    return Err(LoweringFault::new("assignment target is not a reference"));
                };
                let kind = self.ast.node(node).value_kind;
                let read = self.ast.new_value_ref(id, false, kind);
                self.note_read(read)?;
                Ok(read)
            }
            NodeKind::While { .. } => {
                // A loop used as a value runs for effect and yields nil.
                self.lower_stmt(node, block, out)?;
                Ok(self
                    .ast
                    .add_node(NodeKind::Constant(Literal::Nil), crate::ValueKind::Nil))
            }
            NodeKind::Result { value } => {
                let value = self.lower_to_leaf(value, block, out)?;
                if let NodeKind::Result { value: slot } = &mut self.ast.node_mut(node).kind {
                    *slot = value;
                }
                out.push(node);
                Ok(self
                    .ast
                    .add_node(NodeKind::Constant(Literal::Nil), crate::ValueKind::Nil))
            }
            NodeKind::Block(inner) => {
                // A block literal is already a value; only its insides need
                // lowering.
                self.lower_block(inner)?;
                Ok(node)
            }
            NodeKind::InlineBlock { .. } => {
                Err(LoweringFault::new("inline block in operand position"))
            }
            NodeKind::Class(_) => Err(LoweringFault::new("class definition in operand position")),
        }
    }

    /// Reduce `node` all the way to a leaf (constant or variable
    /// reference), hoisting a temporary assignment when needed.
    fn lower_to_leaf(
        &mut self,
        node: NodeRef,
        block: BlockRef,
        out: &mut Vec<NodeRef>,
    ) -> Result<NodeRef, LoweringFault> {
        if self.ast.is_leaf(node) {
            if let NodeKind::ValueRef { is_write, .. } = self.ast.node(node).kind {
                if is_write {
                    return Err(LoweringFault::new("write reference in operand position"));
                }
                self.note_read(node)?;
            }
            return Ok(node);
        }
        let simple = self.lower_to_simple(node, block, out)?;
        if self.ast.is_leaf(simple) {
            return Ok(simple);
        }
        self.hoist(simple, block, out)
    }

    /// Assign `simple` to a fresh temporary of `block` and return a read of
    /// that temporary.
    fn hoist(
        &mut self,
        simple: NodeRef,
        block: BlockRef,
        out: &mut Vec<NodeRef>,
    ) -> Result<NodeRef, LoweringFault> {
        let kind = self.ast.node(simple).value_kind;
        let id = self.fresh_temp(block);
        let write = self.ast.new_value_ref(id, true, kind);
        self.note_write(write)?;
        let assign = self
            .ast
            .add_node(NodeKind::Assign { target: write, value: simple }, kind);
        out.push(assign);
        let read = self.ast.new_value_ref(id, false, kind);
        self.note_read(read)?;
        Ok(read)
    }

    /// Declare a new temporary local in `block`, skipping over any `t<n>`
    /// the program already declared there.
    fn fresh_temp(&mut self, block: BlockRef) -> ValueId {
        loop {
            let name = format!("t{}", self.next_temp);
            self.next_temp += 1;
            let sym = self.ast.interner.get_or_intern(&name);
            if self.ast.block(block).declares(sym) {
                continue;
            }
            let id = self.ast.add_value(name);
            self.ast.block_mut(block).variables.insert(sym, id);
            return id;
        }
    }

    /// Stamp a read with the value's current revision, establishing
    /// revision 0 when the read is the first binding observed.
    fn note_read(&mut self, node: NodeRef) -> Result<(), LoweringFault> {
        let NodeKind::ValueRef { value, is_write: false, .. } = self.ast.node(node).kind else {
            return Err(LoweringFault::new("expected a read reference"));
        };
        let revision = *self.ast.value_mut(value).revision.get_or_insert(0);
        if let NodeKind::ValueRef { revision: slot, .. } = &mut self.ast.node_mut(node).kind {
            *slot = revision;
        }
        Ok(())
    }

    /// Stamp a write with a fresh revision: 0 for the value's first
    /// binding, the successor of the last revision otherwise.
    fn note_write(&mut self, node: NodeRef) -> Result<(), LoweringFault> {
        let NodeKind::ValueRef { value, is_write: true, .. } = self.ast.node(node).kind else {
            return Err(LoweringFault::new("expected a write reference"));
        };
        let revision = self.ast.value(value).revision.map_or(0, |r| r + 1);
        self.ast.value_mut(value).revision = Some(revision);
        if let NodeKind::ValueRef { revision: slot, .. } = &mut self.ast.node_mut(node).kind {
            *slot = revision;
        }
        Ok(())
    }
}
