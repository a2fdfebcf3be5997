//! Transliterates a parse tree into the AST, resolving every identifier
//! through the scope chain on the way.

mod call;
mod class;
mod expr;
#[cfg(test)]
mod tests;

use string_interner::DefaultStringInterner;

use crate::ast::{Ast, Block, BlockRef, NodeKind, NodeRef};
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::lang::LanguageDef;
use crate::literal::ValueKind;
use crate::parse_tree::{ParseNode, ParseNodeRef, ParseTree};
use crate::scope::Namespace;
use crate::Sym;

pub use call::{classify, CallKind};
pub use class::method_blocks;

/// Build an AST from `tree` using the standard language definition.
/// Diagnostics go to `sink`; the returned flag is false when any were
/// reported. The AST is returned either way so callers can inspect partial
/// results.
pub fn build_ast(tree: &ParseTree, sink: &mut DiagnosticSink) -> (Ast, bool) {
    let mut interner = tree.interner.clone();
    let lang = LanguageDef::standard(&mut interner);
    AstBuilder::new(tree, &lang, interner, sink).build()
}

pub struct AstBuilder<'a> {
    pub(crate) tree: &'a ParseTree,
    pub(crate) lang: &'a LanguageDef,
    pub(crate) sink: &'a mut DiagnosticSink,
    pub(crate) ast: Ast,
    pub(crate) failed: bool,
}

impl<'a> AstBuilder<'a> {
    /// `interner` must contain every symbol of `tree` (typically a clone of
    /// the tree's interner, extended with the language definition's
    /// selectors).
    pub fn new(
        tree: &'a ParseTree,
        lang: &'a LanguageDef,
        interner: DefaultStringInterner,
        sink: &'a mut DiagnosticSink,
    ) -> Self {
        AstBuilder {
            tree,
            lang,
            sink,
            ast: Ast::new(interner),
            failed: false,
        }
    }

    /// Entry point: dispatch on whether the root is a class definition, a
    /// block, or a bare expression. Returns the AST and the success flag.
    pub fn build(mut self) -> (Ast, bool) {
        match self.tree.root {
            Some(root) => {
                let node = self.build_root(root);
                self.ast.root = Some(node);
            }
            None => {
                self.report(Diagnostic::malformed_construct("parse tree has no root"));
            }
        }
        let ok = !self.failed;
        (self.ast, ok)
    }

    fn build_root(&mut self, root: ParseNodeRef) -> NodeRef {
        match self.tree.get(root) {
            Some(ParseNode::Class(_)) => {
                let class = self.build_class(root);
                self.ast.add_node(NodeKind::Class(class), ValueKind::Slot)
            }
            Some(ParseNode::Block(_)) => {
                let block = self.build_block(root, None, None);
                self.ast.add_node(NodeKind::Block(block), ValueKind::Slot)
            }
            Some(_) => {
                // A bare top-level expression gets a synthetic outermost
                // block so it still has a scope to declare into.
                let block = self.ast.add_block(Block::new(None, None));
                let mut statements = Vec::new();
                self.fill_ast(root, block, &mut statements);
                self.ast.block_mut(block).statements = statements;
                self.ast.add_node(NodeKind::Block(block), ValueKind::Slot)
            }
            None => {
                self.report(Diagnostic::malformed_construct("dangling root reference"));
                self.nil_placeholder()
            }
        }
    }

    /// Create a new scoped block under `parent`, register its declared
    /// arguments and locals, then fill its statement list.
    pub(crate) fn build_block(
        &mut self,
        parse_block: ParseNodeRef,
        parent: Option<BlockRef>,
        class: Option<crate::ast::ClassRef>,
    ) -> BlockRef {
        let block = self.ast.add_block(Block::new(parent, class));
        let Some(ParseNode::Block(node)) = self.tree.get(parse_block).cloned() else {
            self.report(
                Diagnostic::malformed_construct("expected a block node")
                    .with_location(self.tree.span(parse_block)),
            );
            return block;
        };

        for sym in node.arguments {
            self.declare_or_report(block, Namespace::Argument, sym, parse_block);
        }
        for sym in node.variables {
            self.declare_or_report(block, Namespace::Local, sym, parse_block);
        }

        let mut statements = Vec::new();
        for statement in node.statements {
            self.fill_ast(statement, block, &mut statements);
        }
        self.ast.block_mut(block).statements = statements;
        block
    }

    /// Same traversal as `build_block`, but declarations register against
    /// `enclosing`: control-flow bodies share their enclosing scope.
    pub(crate) fn build_inline_block(
        &mut self,
        parse_block: ParseNodeRef,
        enclosing: BlockRef,
    ) -> NodeRef {
        let Some(ParseNode::Block(node)) = self.tree.get(parse_block).cloned() else {
            self.report(
                Diagnostic::malformed_construct("expected a block node")
                    .with_location(self.tree.span(parse_block)),
            );
            return self.nil_placeholder();
        };

        if !node.arguments.is_empty() {
            self.report(
                Diagnostic::malformed_construct("a control-flow block takes no arguments")
                    .with_location(self.tree.span(parse_block)),
            );
        }
        for sym in node.variables {
            self.declare_or_report(enclosing, Namespace::Local, sym, parse_block);
        }

        let mut statements = Vec::new();
        for statement in node.statements {
            self.fill_ast(statement, enclosing, &mut statements);
        }
        let value_kind = statements
            .last()
            .map_or(ValueKind::Nil, |&last| self.ast.node(last).value_kind);
        self.ast
            .add_node(NodeKind::InlineBlock { statements }, value_kind)
    }

    /// Append the AST translation of one parse statement to `statements`,
    /// resolving identifiers against `block`.
    pub(crate) fn fill_ast(
        &mut self,
        parse_node: ParseNodeRef,
        block: BlockRef,
        statements: &mut Vec<NodeRef>,
    ) {
        let node = self.build_expr_tree(parse_node, block);
        statements.push(node);
    }

    pub(crate) fn declare_or_report(
        &mut self,
        block: BlockRef,
        namespace: Namespace,
        sym: Sym,
        at: ParseNodeRef,
    ) {
        let name = self.tree.name_of(sym).to_string();
        if self.ast.declare(block, namespace, sym, &name).is_none() {
            self.report(
                Diagnostic::duplicate_declaration(&name).with_location(self.tree.span(at)),
            );
        }
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.failed = true;
        self.sink.report(diagnostic);
    }

    /// Stand-in node emitted after a reported error so the walk can
    /// continue and surface further independent diagnostics.
    pub(crate) fn nil_placeholder(&mut self) -> NodeRef {
        self.ast
            .add_node(NodeKind::Constant(crate::literal::Literal::Nil), ValueKind::Nil)
    }
}
