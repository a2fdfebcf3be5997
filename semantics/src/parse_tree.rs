use string_interner::DefaultStringInterner;

use crate::literal::Literal;
use crate::Sym;

/// Byte range of a parse node in the original source, carried through to
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseNodeRef(pub u32);

/// Block literal: argument names, declared locals, ordered statements.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub arguments: Vec<Sym>,
    pub variables: Vec<Sym>,
    pub statements: Vec<ParseNodeRef>,
}

/// Call with a selector, an optional receiver and ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    pub selector: Sym,
    pub receiver: Option<ParseNodeRef>,
    pub arguments: Vec<ParseNodeRef>,
}

/// Infix operator application; the operator token is a selector too.
#[derive(Debug, Clone, PartialEq)]
pub struct BinopNode {
    pub selector: Sym,
    pub left: ParseNodeRef,
    pub right: ParseNodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodNode {
    pub name: Sym,
    pub is_class_method: bool,
    pub body: ParseNodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    pub name: Sym,
    pub superclass: Option<Sym>,
    pub variables: Vec<Sym>,
    pub class_variables: Vec<Sym>,
    pub constants: Vec<(Sym, Literal)>,
    pub methods: Vec<MethodNode>,
}

/// One node of the input parse tree. The analyzer never mutates these.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseNode {
    Literal(Literal),
    Name(Sym),
    Assign { target: Sym, value: ParseNodeRef },
    Return { value: ParseNodeRef },
    Block(BlockNode),
    Call(CallNode),
    Binop(BinopNode),
    Class(Box<ClassNode>),
}

/// The parse tree handed to the analyzer: a node pool, spans parallel to it,
/// a root, and the interner that owns every `Sym` in the tree.
#[derive(Debug)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    spans: Vec<Span>,
    pub root: Option<ParseNodeRef>,
    pub interner: DefaultStringInterner,
}

impl ParseTree {
    pub fn get(&self, node: ParseNodeRef) -> Option<&ParseNode> {
        self.nodes.get(node.0 as usize)
    }

    pub fn span(&self, node: ParseNodeRef) -> Span {
        self.spans.get(node.0 as usize).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Spelled-out name of an interned symbol, for diagnostics.
    pub fn name_of(&self, sym: Sym) -> &str {
        self.interner.resolve(sym).unwrap_or("<unknown>")
    }
}

/// Assembles a `ParseTree` node by node. Used by upstream parsers and,
/// extensively, by tests.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<ParseNode>,
    spans: Vec<Span>,
    interner: DefaultStringInterner,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder {
            nodes: Vec::new(),
            spans: Vec::new(),
            interner: DefaultStringInterner::new(),
        }
    }

    pub fn intern(&mut self, name: &str) -> Sym {
        self.interner.get_or_intern(name)
    }

    fn add(&mut self, node: ParseNode) -> ParseNodeRef {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        self.spans.push(Span::default());
        ParseNodeRef(index)
    }

    /// Attach a source span to an already-added node.
    pub fn set_span(&mut self, node: ParseNodeRef, span: Span) {
        if let Some(slot) = self.spans.get_mut(node.0 as usize) {
            *slot = span;
        }
    }

    pub fn literal(&mut self, value: Literal) -> ParseNodeRef {
        self.add(ParseNode::Literal(value))
    }

    pub fn int(&mut self, value: i64) -> ParseNodeRef {
        self.literal(Literal::Integer(value))
    }

    pub fn name(&mut self, sym: Sym) -> ParseNodeRef {
        self.add(ParseNode::Name(sym))
    }

    pub fn name_str(&mut self, name: &str) -> ParseNodeRef {
        let sym = self.intern(name);
        self.name(sym)
    }

    pub fn assign(&mut self, target: &str, value: ParseNodeRef) -> ParseNodeRef {
        let target = self.intern(target);
        self.add(ParseNode::Assign { target, value })
    }

    pub fn ret(&mut self, value: ParseNodeRef) -> ParseNodeRef {
        self.add(ParseNode::Return { value })
    }

    pub fn block(
        &mut self,
        arguments: Vec<&str>,
        variables: Vec<&str>,
        statements: Vec<ParseNodeRef>,
    ) -> ParseNodeRef {
        let arguments = arguments.iter().map(|n| self.intern(n)).collect();
        let variables = variables.iter().map(|n| self.intern(n)).collect();
        self.add(ParseNode::Block(BlockNode { arguments, variables, statements }))
    }

    pub fn call(
        &mut self,
        selector: &str,
        receiver: Option<ParseNodeRef>,
        arguments: Vec<ParseNodeRef>,
    ) -> ParseNodeRef {
        let selector = self.intern(selector);
        self.add(ParseNode::Call(CallNode { selector, receiver, arguments }))
    }

    pub fn binop(&mut self, operator: &str, left: ParseNodeRef, right: ParseNodeRef) -> ParseNodeRef {
        let selector = self.intern(operator);
        self.add(ParseNode::Binop(BinopNode { selector, left, right }))
    }

    pub fn class(&mut self, class: ClassNode) -> ParseNodeRef {
        self.add(ParseNode::Class(Box::new(class)))
    }

    /// Convenience for class construction in tests: interns all the member
    /// names in one go.
    pub fn class_decl(
        &mut self,
        name: &str,
        superclass: Option<&str>,
        variables: Vec<&str>,
        class_variables: Vec<&str>,
        constants: Vec<(&str, Literal)>,
        methods: Vec<(&str, bool, ParseNodeRef)>,
    ) -> ParseNodeRef {
        let name = self.intern(name);
        let superclass = superclass.map(|s| self.intern(s));
        let variables = variables.iter().map(|n| self.intern(n)).collect();
        let class_variables = class_variables.iter().map(|n| self.intern(n)).collect();
        let constants = constants
            .into_iter()
            .map(|(n, lit)| (self.intern(n), lit))
            .collect();
        let methods = methods
            .into_iter()
            .map(|(n, is_class_method, body)| MethodNode {
                name: self.intern(n),
                is_class_method,
                body,
            })
            .collect();
        self.class(ClassNode {
            name,
            superclass,
            variables,
            class_variables,
            constants,
            methods,
        })
    }

    pub fn finish(self, root: ParseNodeRef) -> ParseTree {
        ParseTree {
            nodes: self.nodes,
            spans: self.spans,
            root: Some(root),
            interner: self.interner,
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
