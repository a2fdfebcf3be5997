use std::collections::HashMap;

use string_interner::DefaultStringInterner;

use crate::literal::ValueKind;
use crate::Sym;

/// Control constructs a call selector can denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOp {
    While,
}

/// Primitive operation classes a binary selector can denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveOp {
    Arithmetic,
    Comparison,
}

impl PrimitiveOp {
    /// Whether a pair of statically-known operand kinds is acceptable for
    /// this operation class. Anything else stays a method dispatch.
    pub fn accepts(self, left: ValueKind, right: ValueKind) -> bool {
        match self {
            PrimitiveOp::Arithmetic => left.is_numeric() && right.is_numeric(),
            PrimitiveOp::Comparison => {
                (left.is_numeric() && right.is_numeric())
                    || (left == ValueKind::Boolean && right == ValueKind::Boolean)
            }
        }
    }

    /// Result kind of a `Calculate` node using this operation.
    pub fn result_kind(self, left: ValueKind, right: ValueKind) -> ValueKind {
        match self {
            PrimitiveOp::Comparison => ValueKind::Boolean,
            PrimitiveOp::Arithmetic => {
                if left == ValueKind::Integer && right == ValueKind::Integer {
                    ValueKind::Integer
                } else {
                    ValueKind::Float
                }
            }
        }
    }
}

/// The reserved-selector tables of the language being analyzed. These are
/// configuration handed in by the language definition, not constants of the
/// analyzer: the builder consults them but never extends them.
///
/// Classification priority is fixed: a selector found in the control table
/// shadows any user method of the same name, and a primitive operator
/// selector shadows dispatch whenever both operand kinds qualify.
#[derive(Debug, Clone)]
pub struct LanguageDef {
    control: HashMap<Sym, ControlOp>,
    primitive_ops: HashMap<Sym, PrimitiveOp>,
}

impl LanguageDef {
    pub fn empty() -> Self {
        LanguageDef {
            control: HashMap::new(),
            primitive_ops: HashMap::new(),
        }
    }

    /// The stock table: `while` plus the ten arithmetic/comparison
    /// operators. Selectors are interned so later lookups are symbol
    /// comparisons.
    pub fn standard(interner: &mut DefaultStringInterner) -> Self {
        let mut def = Self::empty();
        def.control
            .insert(interner.get_or_intern("while"), ControlOp::While);
        for op in ["+", "-", "*", "/"] {
            def.primitive_ops
                .insert(interner.get_or_intern(op), PrimitiveOp::Arithmetic);
        }
        for op in ["<", "<=", ">", ">=", "==", "!="] {
            def.primitive_ops
                .insert(interner.get_or_intern(op), PrimitiveOp::Comparison);
        }
        def
    }

    pub fn with_control(mut self, selector: Sym, op: ControlOp) -> Self {
        self.control.insert(selector, op);
        self
    }

    pub fn with_primitive_op(mut self, selector: Sym, op: PrimitiveOp) -> Self {
        self.primitive_ops.insert(selector, op);
        self
    }

    pub fn control_op(&self, selector: Sym) -> Option<ControlOp> {
        self.control.get(&selector).copied()
    }

    pub fn primitive_op(&self, selector: Sym) -> Option<PrimitiveOp> {
        self.primitive_ops.get(&selector).copied()
    }
}
