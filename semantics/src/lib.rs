pub mod ast;
pub mod build;
pub mod diag;
pub mod lang;
pub mod literal;
pub mod lower;
pub mod parse_tree;
pub mod scope;

/// Interned identifier symbol. All name lookups key on this, never on the
/// spelled-out string.
pub type Sym = string_interner::DefaultSymbol;

pub use ast::{Ast, Block, BlockRef, Class, ClassRef, Node, NodeKind, NodeRef, Value, ValueId};
pub use build::{build_ast, AstBuilder};
pub use diag::{Diagnostic, DiagnosticKind, DiagnosticSink};
pub use lang::{ControlOp, LanguageDef, PrimitiveOp};
pub use literal::{Literal, ValueKind};
pub use lower::{to_three_address_form, LoweringFault};
pub use parse_tree::{ParseNode, ParseNodeRef, ParseTree, Span, TreeBuilder};
