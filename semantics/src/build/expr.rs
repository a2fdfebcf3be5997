//! Expression-tree construction and identifier resolution.

use crate::ast::{BlockRef, NodeKind, NodeRef};
use crate::diag::Diagnostic;
use crate::literal::ValueKind;
use crate::parse_tree::{ParseNode, ParseNodeRef};
use crate::scope::Namespace;
use crate::Sym;

use super::AstBuilder;

impl AstBuilder<'_> {
    /// Build a standalone expression subtree. Nothing is appended to any
    /// statement list, but declarations encountered on the way (implicit
    /// first-write locals, nested block scopes) are still registered.
    pub(crate) fn build_expr_tree(&mut self, parse_node: ParseNodeRef, block: BlockRef) -> NodeRef {
        let Some(node) = self.tree.get(parse_node).cloned() else {
            self.report(Diagnostic::malformed_construct("dangling node reference"));
            return self.nil_placeholder();
        };
        match node {
            ParseNode::Literal(literal) => {
                let kind = literal.value_kind();
                self.ast.add_node(NodeKind::Constant(literal), kind)
            }
            ParseNode::Name(sym) => self.build_name(sym, parse_node, block),
            ParseNode::Assign { target, value } => {
                self.build_assign(target, value, parse_node, block)
            }
            ParseNode::Return { value } => {
                let value = self.build_expr_tree(value, block);
                let kind = self.ast.node(value).value_kind;
                self.ast.add_node(NodeKind::Result { value }, kind)
            }
            ParseNode::Block(_) => {
                // A block literal in expression position opens its own
                // scope, unlike the inline blocks of control flow.
                let inner = self.build_block(parse_node, Some(block), None);
                self.ast.add_node(NodeKind::Block(inner), ValueKind::Slot)
            }
            ParseNode::Call(_) => self.build_call(parse_node, block),
            ParseNode::Binop(_) => self.build_binop(parse_node, block),
            ParseNode::Class(_) => {
                self.report(
                    Diagnostic::malformed_construct(
                        "class definitions are only allowed at the top level",
                    )
                    .with_location(self.tree.span(parse_node)),
                );
                self.nil_placeholder()
            }
        }
    }

    fn build_name(&mut self, sym: Sym, parse_node: ParseNodeRef, block: BlockRef) -> NodeRef {
        if let Some(node) = self.find_value(sym, block, false) {
            return node;
        }
        if let Some(literal) = self.ast.resolve_constant(block, sym).cloned() {
            let kind = literal.value_kind();
            return self.ast.add_node(NodeKind::Constant(literal), kind);
        }
        self.report(
            Diagnostic::unresolved_identifier(self.tree.name_of(sym))
                .with_location(self.tree.span(parse_node)),
        );
        self.nil_placeholder()
    }

    fn build_assign(
        &mut self,
        target: Sym,
        value: ParseNodeRef,
        parse_node: ParseNodeRef,
        block: BlockRef,
    ) -> NodeRef {
        // The right-hand side is evaluated first, so its references come
        // first in the value's reference list too.
        let value = self.build_expr_tree(value, block);
        let target = match self.find_value(target, block, true) {
            Some(node) => node,
            None => {
                // Assignment to a previously unseen name implicitly
                // declares it as a new local of the current block.
                let name = self.tree.name_of(target).to_string();
                match self.ast.declare(block, Namespace::Local, target, &name) {
                    Some(id) => self.ast.new_value_ref(id, true, ValueKind::Slot),
                    None => {
                        self.report(
                            Diagnostic::duplicate_declaration(&name)
                                .with_location(self.tree.span(parse_node)),
                        );
                        return self.nil_placeholder();
                    }
                }
            }
        };
        let kind = self.ast.node(value).value_kind;
        self.ast.add_node(NodeKind::Assign { target, value }, kind)
    }

    /// Thin wrapper over scope resolution that materializes the reference
    /// node on success. "Not found" is left to the caller: a read treats it
    /// as an error, a write as an implicit declaration.
    pub(crate) fn find_value(
        &mut self,
        sym: Sym,
        block: BlockRef,
        is_write: bool,
    ) -> Option<NodeRef> {
        let value = self.ast.resolve(block, sym)?;
        Some(self.ast.new_value_ref(value, is_write, ValueKind::Slot))
    }
}
