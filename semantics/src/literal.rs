/// A constant value carried by the parse tree and, after building, by
/// `NodeKind::Constant`. Values are opaque to the analyzer; only the
/// `ValueKind` tag derived from them participates in any decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Symbol(String),
    Nil,
}

impl Literal {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Literal::Integer(_) => ValueKind::Integer,
            Literal::Float(_) => ValueKind::Float,
            Literal::Boolean(_) => ValueKind::Boolean,
            // Strings and symbols are heap objects, not unboxed primitives.
            Literal::String(_) | Literal::Symbol(_) => ValueKind::Slot,
            Literal::Nil => ValueKind::Nil,
        }
    }
}

/// Static tag for the kind of result a node produces. `Slot` is the generic
/// "could be anything" tag of a dynamic value; the refined tags only appear
/// when a constant (or a calculation over constants) pins the kind down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Slot,
    Nil,
    Integer,
    Float,
    Boolean,
}

impl ValueKind {
    /// True for the unboxed kinds a `Calculate` node can operate on.
    pub fn is_primitive(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float | ValueKind::Boolean)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }
}
