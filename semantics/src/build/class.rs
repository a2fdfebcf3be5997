//! Class construction: member registration and method building.

use crate::ast::{BlockRef, Class, ClassRef};
use crate::diag::Diagnostic;
use crate::parse_tree::{ParseNode, ParseNodeRef};
use crate::Sym;

use super::AstBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Member {
    InstanceVariable,
    ClassVariable,
}

impl AstBuilder<'_> {
    /// Register instance variables, class variables and constants, then
    /// build every method as a block whose scope resolution falls through
    /// to the class's own maps.
    pub(crate) fn build_class(&mut self, parse_node: ParseNodeRef) -> ClassRef {
        let Some(ParseNode::Class(node)) = self.tree.get(parse_node).cloned() else {
            self.report(
                Diagnostic::malformed_construct("expected a class node")
                    .with_location(self.tree.span(parse_node)),
            );
            let missing = self.tree.interner.get("<missing>");
            let sym = missing.unwrap_or_else(|| self.ast.interner.get_or_intern("<missing>"));
            return self.ast.add_class(Class::new("<missing>".to_string(), sym, None));
        };

        let name = self.tree.name_of(node.name).to_string();
        let class = self
            .ast
            .add_class(Class::new(name, node.name, node.superclass));

        for sym in node.variables {
            self.declare_member(class, Member::InstanceVariable, sym, parse_node);
        }
        for sym in node.class_variables {
            self.declare_member(class, Member::ClassVariable, sym, parse_node);
        }
        for (sym, literal) in node.constants {
            let name = self.tree.name_of(sym).to_string();
            if self.ast.class(class).declares_member(sym) {
                self.report(
                    Diagnostic::duplicate_declaration(&name)
                        .with_location(self.tree.span(parse_node)),
                );
                continue;
            }
            let entry = self.ast.class_mut(class);
            entry.constants.insert(sym, literal);
            entry.names.insert(sym, name);
        }

        for method in node.methods {
            self.build_method(class, method.name, method.is_class_method, method.body);
        }
        class
    }

    fn declare_member(
        &mut self,
        class: ClassRef,
        member: Member,
        sym: Sym,
        at: ParseNodeRef,
    ) {
        let name = self.tree.name_of(sym).to_string();
        if self.ast.class(class).declares_member(sym) {
            self.report(Diagnostic::duplicate_declaration(&name).with_location(self.tree.span(at)));
            return;
        }
        let value = self.ast.add_value(name);
        let entry = self.ast.class_mut(class);
        match member {
            Member::InstanceVariable => entry.variables.insert(sym, value),
            Member::ClassVariable => entry.class_variables.insert(sym, value),
        };
    }

    fn build_method(
        &mut self,
        class: ClassRef,
        sym: Sym,
        is_class_method: bool,
        body: ParseNodeRef,
    ) {
        let name = self.tree.name_of(sym).to_string();
        let duplicate = if is_class_method {
            self.ast.class(class).class_methods.contains_key(&sym)
        } else {
            self.ast.class(class).methods.contains_key(&sym)
        };
        if duplicate {
            self.report(
                Diagnostic::duplicate_declaration(&name).with_location(self.tree.span(body)),
            );
            return;
        }

        // Methods are outermost blocks: no lexical parent, but the class
        // link lets field names resolve implicitly.
        let block = self.build_block(body, None, Some(class));
        let entry = self.ast.class_mut(class);
        if is_class_method {
            entry.class_methods.insert(sym, block);
        } else {
            entry.methods.insert(sym, block);
        }
        entry.names.insert(sym, name);
    }
}

/// Every method body of a class, instance and class methods alike; used by
/// passes that need to visit all code of a class.
pub fn method_blocks(class: &Class) -> impl Iterator<Item = BlockRef> + '_ {
    class
        .methods
        .values()
        .chain(class.class_methods.values())
        .copied()
}
