//! Call/operator disambiguation.
//!
//! A call-shaped parse node can denote a control construct, a primitive
//! calculation, or a method dispatch. `classify` encodes the fixed priority
//! (control > primitive > dispatch), so a user method sharing a name with a
//! reserved selector is shadowed by the built-in reading on purpose.

use crate::ast::{BlockRef, NodeKind, NodeRef};
use crate::diag::Diagnostic;
use crate::lang::{ControlOp, LanguageDef, PrimitiveOp};
use crate::literal::ValueKind;
use crate::parse_tree::{ParseNode, ParseNodeRef};
use crate::Sym;

use super::AstBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Control(ControlOp),
    Primitive(PrimitiveOp),
    Dispatch,
}

/// The one ordered classification over a call's selector and, when known,
/// the static kinds of its two operands. Pass `None` before operands are
/// built; a `Primitive` answer is only possible once both kinds are known
/// and acceptable for the operation.
pub fn classify(
    lang: &LanguageDef,
    selector: Sym,
    operand_kinds: Option<(ValueKind, ValueKind)>,
) -> CallKind {
    if let Some(op) = lang.control_op(selector) {
        return CallKind::Control(op);
    }
    if let (Some(op), Some((left, right))) = (lang.primitive_op(selector), operand_kinds) {
        if op.accepts(left, right) {
            return CallKind::Primitive(op);
        }
    }
    CallKind::Dispatch
}

impl AstBuilder<'_> {
    /// Calls can be control flow or method dispatches. Differentiate,
    /// assemble, and return.
    pub(crate) fn build_call(&mut self, parse_node: ParseNodeRef, block: BlockRef) -> NodeRef {
        let Some(ParseNode::Call(call)) = self.tree.get(parse_node).cloned() else {
            self.report(Diagnostic::malformed_construct("expected a call node"));
            return self.nil_placeholder();
        };

        if let CallKind::Control(op) = classify(self.lang, call.selector, None) {
            let mut operands: Vec<ParseNodeRef> = Vec::new();
            operands.extend(call.receiver);
            operands.extend(call.arguments.iter().copied());
            return self.build_control(op, &operands, parse_node, block);
        }

        // Receiver is argument 0 by convention.
        let mut arguments = Vec::new();
        if let Some(receiver) = call.receiver {
            arguments.push(self.build_expr_tree(receiver, block));
        }
        for argument in call.arguments {
            arguments.push(self.build_expr_tree(argument, block));
        }

        if let [receiver, argument] = arguments[..] {
            let kinds = (
                self.ast.node(receiver).value_kind,
                self.ast.node(argument).value_kind,
            );
            if let CallKind::Primitive(op) = classify(self.lang, call.selector, Some(kinds)) {
                let kind = op.result_kind(kinds.0, kinds.1);
                return self.ast.add_node(
                    NodeKind::Calculate { selector: call.selector, left: receiver, right: argument },
                    kind,
                );
            }
        }

        self.dispatch_node(call.selector, arguments)
    }

    /// Binops can be arithmetic functions or method dispatches.
    /// Differentiate, assemble, and return.
    pub(crate) fn build_binop(&mut self, parse_node: ParseNodeRef, block: BlockRef) -> NodeRef {
        let Some(ParseNode::Binop(binop)) = self.tree.get(parse_node).cloned() else {
            self.report(Diagnostic::malformed_construct("expected a binop node"));
            return self.nil_placeholder();
        };

        let left = self.build_expr_tree(binop.left, block);
        let right = self.build_expr_tree(binop.right, block);
        let kinds = (
            self.ast.node(left).value_kind,
            self.ast.node(right).value_kind,
        );
        match classify(self.lang, binop.selector, Some(kinds)) {
            CallKind::Primitive(op) => {
                let kind = op.result_kind(kinds.0, kinds.1);
                self.ast.add_node(
                    NodeKind::Calculate { selector: binop.selector, left, right },
                    kind,
                )
            }
            // An operand of generic slot kind (or an unrecognized operator)
            // sends the message instead; the left operand becomes the
            // receiver.
            CallKind::Control(_) | CallKind::Dispatch => {
                self.dispatch_node(binop.selector, vec![left, right])
            }
        }
    }

    fn build_control(
        &mut self,
        op: ControlOp,
        operands: &[ParseNodeRef],
        parse_node: ParseNodeRef,
        block: BlockRef,
    ) -> NodeRef {
        match op {
            ControlOp::While => {
                let [condition, action] = operands[..] else {
                    self.report(
                        Diagnostic::malformed_construct("while expects two block arguments")
                            .with_location(self.tree.span(parse_node)),
                    );
                    return self.nil_placeholder();
                };
                if !self.is_block_shaped(condition) || !self.is_block_shaped(action) {
                    self.report(
                        Diagnostic::malformed_construct("while arguments must be blocks")
                            .with_location(self.tree.span(parse_node)),
                    );
                    return self.nil_placeholder();
                }
                let condition = self.build_inline_block(condition, block);
                let action = self.build_inline_block(action, block);
                self.ast
                    .add_node(NodeKind::While { condition, action }, ValueKind::Nil)
            }
        }
    }

    fn is_block_shaped(&self, parse_node: ParseNodeRef) -> bool {
        matches!(self.tree.get(parse_node), Some(ParseNode::Block(_)))
    }

    fn dispatch_node(&mut self, selector: Sym, arguments: Vec<NodeRef>) -> NodeRef {
        let selector_name = self.tree.name_of(selector).to_string();
        self.ast.add_node(
            NodeKind::Dispatch { selector, selector_name, arguments },
            ValueKind::Slot,
        )
    }
}
