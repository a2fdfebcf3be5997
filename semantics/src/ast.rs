use std::collections::HashMap;

use string_interner::DefaultStringInterner;

use crate::literal::{Literal, ValueKind};
use crate::Sym;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

/// One AST node: the closed variant set plus the static result-kind tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub value_kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Write a value into a variable. `target` is a write-mode `ValueRef`.
    Assign { target: NodeRef, value: NodeRef },
    /// Scoped block of code; scope data lives in the block pool.
    Block(BlockRef),
    /// Statement list without a scope of its own; its declarations were
    /// hoisted into the nearest enclosing `Block` during building.
    InlineBlock { statements: Vec<NodeRef> },
    /// Primitive binary arithmetic or comparison. Only built when both
    /// operand kinds are statically primitive-compatible.
    Calculate { selector: Sym, left: NodeRef, right: NodeRef },
    Constant(Literal),
    /// General method call. The receiver is argument 0. The spelled-out
    /// selector is kept for diagnostics; symbols alone are enough for
    /// resolution.
    Dispatch { selector: Sym, selector_name: String, arguments: Vec<NodeRef> },
    /// A named variable occurrence. `slot` is this reference's position in
    /// the value's reference list, making unlink an O(1) invalidation.
    ValueRef { value: ValueId, is_write: bool, revision: u32, slot: u32 },
    /// The value a block yields (explicit return).
    Result { value: NodeRef },
    /// Loop with no scope of its own; condition and action are inline
    /// blocks.
    While { condition: NodeRef, action: NodeRef },
    Class(ClassRef),
}

/// Scope data of a `Block` node: parent link for the lookup chain, the
/// owning class for method blocks, declared values, and the statement list
/// in program order.
#[derive(Debug)]
pub struct Block {
    pub parent: Option<BlockRef>,
    pub class: Option<ClassRef>,
    pub arguments: HashMap<Sym, ValueId>,
    pub variables: HashMap<Sym, ValueId>,
    pub statements: Vec<NodeRef>,
}

impl Block {
    pub fn new(parent: Option<BlockRef>, class: Option<ClassRef>) -> Self {
        Block {
            parent,
            class,
            arguments: HashMap::new(),
            variables: HashMap::new(),
            statements: Vec::new(),
        }
    }

    pub fn declares(&self, sym: Sym) -> bool {
        self.arguments.contains_key(&sym) || self.variables.contains_key(&sym)
    }
}

/// Registry entry for one named variable. References are use sites in
/// declaration/use order; `None` marks an unlinked slot.
#[derive(Debug)]
pub struct Value {
    pub name: String,
    pub references: Vec<Option<NodeRef>>,
    /// Last revision established during lowering. `None` until the value's
    /// first binding is observed.
    pub revision: Option<u32>,
}

impl Value {
    pub fn new(name: String) -> Self {
        Value { name, references: Vec::new(), revision: None }
    }

    /// Live (non-unlinked) references, in use order.
    pub fn live_references(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.references.iter().filter_map(|slot| *slot)
    }
}

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub name_sym: Sym,
    pub superclass: Option<Sym>,
    pub variables: HashMap<Sym, ValueId>,
    pub class_variables: HashMap<Sym, ValueId>,
    pub constants: HashMap<Sym, Literal>,
    pub methods: HashMap<Sym, BlockRef>,
    pub class_methods: HashMap<Sym, BlockRef>,
    /// Values carry their own names; constants and methods recover theirs
    /// here.
    pub names: HashMap<Sym, String>,
}

impl Class {
    pub fn new(name: String, name_sym: Sym, superclass: Option<Sym>) -> Self {
        Class {
            name,
            name_sym,
            superclass,
            variables: HashMap::new(),
            class_variables: HashMap::new(),
            constants: HashMap::new(),
            methods: HashMap::new(),
            class_methods: HashMap::new(),
            names: HashMap::new(),
        }
    }

    pub fn declares_member(&self, sym: Sym) -> bool {
        self.variables.contains_key(&sym)
            || self.class_variables.contains_key(&sym)
            || self.constants.contains_key(&sym)
    }
}

/// The whole AST: node, block, class and value pools, rooted at `root`.
/// Owned by one `SyntaxAnalyzer` for its entire lifetime.
#[derive(Debug)]
pub struct Ast {
    pub nodes: Vec<Node>,
    pub blocks: Vec<Block>,
    pub classes: Vec<Class>,
    pub values: Vec<Value>,
    pub interner: DefaultStringInterner,
    pub root: Option<NodeRef>,
}

impl Ast {
    pub fn new(interner: DefaultStringInterner) -> Self {
        Ast {
            nodes: Vec::new(),
            blocks: Vec::new(),
            classes: Vec::new(),
            values: Vec::new(),
            interner,
            root: None,
        }
    }

    pub fn add_node(&mut self, kind: NodeKind, value_kind: ValueKind) -> NodeRef {
        let index = self.nodes.len() as u32;
        self.nodes.push(Node { kind, value_kind });
        NodeRef(index)
    }

    pub fn node(&self, node: NodeRef) -> &Node {
        &self.nodes[node.0 as usize]
    }

    pub fn node_mut(&mut self, node: NodeRef) -> &mut Node {
        &mut self.nodes[node.0 as usize]
    }

    pub fn try_node(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node.0 as usize)
    }

    pub fn add_block(&mut self, block: Block) -> BlockRef {
        let index = self.blocks.len() as u32;
        self.blocks.push(block);
        BlockRef(index)
    }

    pub fn block(&self, block: BlockRef) -> &Block {
        &self.blocks[block.0 as usize]
    }

    pub fn block_mut(&mut self, block: BlockRef) -> &mut Block {
        &mut self.blocks[block.0 as usize]
    }

    pub fn add_class(&mut self, class: Class) -> ClassRef {
        let index = self.classes.len() as u32;
        self.classes.push(class);
        ClassRef(index)
    }

    pub fn class(&self, class: ClassRef) -> &Class {
        &self.classes[class.0 as usize]
    }

    pub fn class_mut(&mut self, class: ClassRef) -> &mut Class {
        &mut self.classes[class.0 as usize]
    }

    pub fn add_value(&mut self, name: String) -> ValueId {
        let index = self.values.len() as u32;
        self.values.push(Value::new(name));
        ValueId(index)
    }

    pub fn value(&self, value: ValueId) -> &Value {
        &self.values[value.0 as usize]
    }

    pub fn value_mut(&mut self, value: ValueId) -> &mut Value {
        &mut self.values[value.0 as usize]
    }

    /// Create a `ValueRef` node for a use of `value`, appending it to the
    /// value's reference list and recording its slot.
    pub fn new_value_ref(&mut self, value: ValueId, is_write: bool, kind: ValueKind) -> NodeRef {
        let slot = self.values[value.0 as usize].references.len() as u32;
        let node = self.add_node(
            NodeKind::ValueRef { value, is_write, revision: 0, slot },
            kind,
        );
        self.values[value.0 as usize].references.push(Some(node));
        node
    }

    /// Remove a reference from its value's reference list. O(1): the slot
    /// recorded on the node is invalidated, nothing shifts.
    pub fn unlink_reference(&mut self, node: NodeRef) {
        if let NodeKind::ValueRef { value, slot, .. } = self.node(node).kind {
            if let Some(entry) = self.values[value.0 as usize]
                .references
                .get_mut(slot as usize)
            {
                *entry = None;
            }
        }
    }

    /// True for nodes a three-address operand position may contain.
    pub fn is_leaf(&self, node: NodeRef) -> bool {
        matches!(
            self.node(node).kind,
            NodeKind::Constant(_) | NodeKind::ValueRef { .. }
        )
    }
}
