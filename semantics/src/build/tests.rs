use rstest::rstest;

use super::*;
use crate::ast::NodeKind;
use crate::diag::DiagnosticKind;
use crate::lang::{ControlOp, PrimitiveOp};
use crate::literal::{Literal, ValueKind};
use crate::parse_tree::TreeBuilder;

fn build(tree: &ParseTree) -> (Ast, bool, DiagnosticSink) {
    let mut sink = DiagnosticSink::new();
    let (ast, ok) = build_ast(tree, &mut sink);
    (ast, ok, sink)
}

fn root_block(ast: &Ast) -> BlockRef {
    match ast.node(ast.root.unwrap()).kind {
        NodeKind::Block(block) => block,
        ref other => panic!("expected block root, got {:?}", other),
    }
}

fn statement(ast: &Ast, block: BlockRef, index: usize) -> NodeRef {
    ast.block(block).statements[index]
}

mod classify_tests {
    use super::*;
    use string_interner::DefaultStringInterner;

    #[test]
    fn control_shadows_primitive_and_dispatch() {
        let mut interner = DefaultStringInterner::new();
        let sym = interner.get_or_intern("while");
        // Even a selector registered in both tables classifies as control.
        let lang = LanguageDef::standard(&mut interner)
            .with_primitive_op(sym, PrimitiveOp::Arithmetic);
        let kinds = Some((ValueKind::Integer, ValueKind::Integer));
        assert_eq!(classify(&lang, sym, kinds), CallKind::Control(ControlOp::While));
    }

    #[test]
    fn primitive_requires_both_operand_kinds() {
        let mut interner = DefaultStringInterner::new();
        let lang = LanguageDef::standard(&mut interner);
        let plus = interner.get_or_intern("+");
        assert_eq!(classify(&lang, plus, None), CallKind::Dispatch);
        assert_eq!(
            classify(&lang, plus, Some((ValueKind::Integer, ValueKind::Integer))),
            CallKind::Primitive(PrimitiveOp::Arithmetic)
        );
        assert_eq!(
            classify(&lang, plus, Some((ValueKind::Slot, ValueKind::Integer))),
            CallKind::Dispatch
        );
    }

    #[test]
    fn unknown_selector_dispatches() {
        let mut interner = DefaultStringInterner::new();
        let lang = LanguageDef::standard(&mut interner);
        let sym = interner.get_or_intern("max");
        assert_eq!(
            classify(&lang, sym, Some((ValueKind::Integer, ValueKind::Integer))),
            CallKind::Dispatch
        );
    }
}

mod expr_tests {
    use super::*;

    #[test]
    fn constant_statement() {
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let root = b.block(vec![], vec![], vec![one]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);

        let block = root_block(&ast);
        let node = ast.node(statement(&ast, block, 0));
        assert_eq!(node.kind, NodeKind::Constant(Literal::Integer(1)));
        assert_eq!(node.value_kind, ValueKind::Integer);
    }

    #[rstest]
    #[case("+", ValueKind::Integer)]
    #[case("-", ValueKind::Integer)]
    #[case("*", ValueKind::Integer)]
    #[case("/", ValueKind::Integer)]
    #[case("<", ValueKind::Boolean)]
    #[case("==", ValueKind::Boolean)]
    fn binop_on_constants_calculates(#[case] op: &str, #[case] expected: ValueKind) {
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let expr = b.binop(op, one, two);
        let root = b.block(vec![], vec![], vec![expr]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);

        let block = root_block(&ast);
        let node = ast.node(statement(&ast, block, 0));
        assert!(matches!(node.kind, NodeKind::Calculate { .. }), "{:?}", node);
        assert_eq!(node.value_kind, expected);
    }

    #[test]
    fn float_operand_widens_arithmetic() {
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let half = b.literal(Literal::Float(0.5));
        let expr = b.binop("+", one, half);
        let root = b.block(vec![], vec![], vec![expr]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);
        let block = root_block(&ast);
        assert_eq!(ast.node(statement(&ast, block, 0)).value_kind, ValueKind::Float);
    }

    #[rstest]
    #[case("+")]
    #[case("<")]
    fn slot_operand_forces_dispatch(#[case] op: &str) {
        let mut b = TreeBuilder::new();
        let a = b.name_str("a");
        let one = b.int(1);
        let expr = b.binop(op, a, one);
        let root = b.block(vec!["a"], vec![], vec![expr]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);

        let block = root_block(&ast);
        let node = ast.node(statement(&ast, block, 0));
        match &node.kind {
            NodeKind::Dispatch { selector_name, arguments, .. } => {
                assert_eq!(selector_name, op);
                assert_eq!(arguments.len(), 2);
                // Left operand is the receiver.
                assert!(matches!(
                    ast.node(arguments[0]).kind,
                    NodeKind::ValueRef { is_write: false, .. }
                ));
            }
            other => panic!("expected dispatch, got {:?}", other),
        }
    }

    #[test]
    fn calculate_tag_propagates_through_nesting() {
        // (1 + 2) * 3 stays a calculation: the inner node's tag is Integer.
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let three = b.int(3);
        let sum = b.binop("+", one, two);
        let product = b.binop("*", sum, three);
        let root = b.block(vec![], vec![], vec![product]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);

        let block = root_block(&ast);
        let node = ast.node(statement(&ast, block, 0));
        match node.kind {
            NodeKind::Calculate { left, .. } => {
                assert!(matches!(ast.node(left).kind, NodeKind::Calculate { .. }));
            }
            ref other => panic!("expected calculate, got {:?}", other),
        }
    }

    #[test]
    fn operator_call_with_receiver_calculates() {
        // 1.+(2) written as a call: receiver plus a sole argument.
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let expr = b.call("+", Some(one), vec![two]);
        let root = b.block(vec![], vec![], vec![expr]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);
        let block = root_block(&ast);
        let node = ast.node(statement(&ast, block, 0));
        assert!(matches!(node.kind, NodeKind::Calculate { .. }));
    }

    #[test]
    fn general_call_dispatches_with_receiver_as_argument_zero() {
        let mut b = TreeBuilder::new();
        let recv = b.name_str("point");
        let one = b.int(1);
        let two = b.int(2);
        let expr = b.call("moveBy", Some(recv), vec![one, two]);
        let root = b.block(vec![], vec!["point"], vec![expr]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);

        let block = root_block(&ast);
        match &ast.node(statement(&ast, block, 0)).kind {
            NodeKind::Dispatch { selector_name, arguments, .. } => {
                assert_eq!(selector_name, "moveBy");
                assert_eq!(arguments.len(), 3);
                assert!(matches!(ast.node(arguments[0]).kind, NodeKind::ValueRef { .. }));
            }
            other => panic!("expected dispatch, got {:?}", other),
        }
    }
}

mod assignment_tests {
    use super::*;

    #[test]
    fn implicit_first_write_declares_a_local() {
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let stmt = b.assign("x", one);
        let root = b.block(vec![], vec![], vec![stmt]);
        let tree = b.finish(root);
        let (ast, ok, sink) = build(&tree);
        assert!(ok, "{:?}", sink.diagnostics());

        let block = root_block(&ast);
        let sym = ast.interner.get("x").unwrap();
        let value = ast.block(block).variables[&sym];
        assert_eq!(ast.value(value).name, "x");

        match ast.node(statement(&ast, block, 0)).kind {
            NodeKind::Assign { target, .. } => match ast.node(target).kind {
                NodeKind::ValueRef { value: v, is_write, .. } => {
                    assert_eq!(v, value);
                    assert!(is_write);
                }
                ref other => panic!("expected value ref target, got {:?}", other),
            },
            ref other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn read_before_any_write_is_unresolved() {
        let mut b = TreeBuilder::new();
        let x = b.name_str("x");
        let one = b.int(1);
        let expr = b.binop("+", x, one);
        let stmt = b.assign("x", expr);
        let root = b.block(vec![], vec![], vec![stmt]);
        let tree = b.finish(root);
        let (_, ok, sink) = build(&tree);
        assert!(!ok);
        assert!(matches!(
            sink.diagnostics()[0].kind,
            DiagnosticKind::UnresolvedIdentifier { .. }
        ));
    }

    #[test]
    fn rhs_references_precede_the_target_write() {
        // x = 1 then x = x + 1: the value's reference list must hold, in
        // order, write / read / write.
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let first = b.assign("x", one);
        let x = b.name_str("x");
        let one_again = b.int(1);
        let sum = b.binop("+", x, one_again);
        let second = b.assign("x", sum);
        let root = b.block(vec![], vec![], vec![first, second]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);

        let block = root_block(&ast);
        let sym = ast.interner.get("x").unwrap();
        let value = ast.block(block).variables[&sym];
        let flags: Vec<bool> = ast
            .value(value)
            .live_references()
            .map(|r| match ast.node(r).kind {
                NodeKind::ValueRef { is_write, .. } => is_write,
                ref other => panic!("non-reference in reference list: {:?}", other),
            })
            .collect();
        assert_eq!(flags, vec![true, false, true]);
    }
}

mod scope_tests {
    use super::*;

    #[test]
    fn nested_block_literal_opens_its_own_scope() {
        let mut b = TreeBuilder::new();
        let read = b.name_str("x");
        let inner = b.block(vec![], vec!["x"], vec![read]);
        let outer = b.block(vec![], vec!["x"], vec![inner]);
        let tree = b.finish(outer);
        let (ast, ok, _) = build(&tree);
        assert!(ok);
        assert_eq!(ast.blocks.len(), 2);

        let outer_block = root_block(&ast);
        let sym = ast.interner.get("x").unwrap();
        let outer_value = ast.block(outer_block).variables[&sym];
        // The read inside the nested block resolved to the inner value.
        assert_eq!(ast.value(outer_value).live_references().count(), 0);

        let inner_block = match ast.node(statement(&ast, outer_block, 0)).kind {
            NodeKind::Block(inner) => inner,
            ref other => panic!("expected nested block, got {:?}", other),
        };
        let inner_value = ast.block(inner_block).variables[&sym];
        assert_eq!(ast.value(inner_value).live_references().count(), 1);
    }

    #[test]
    fn duplicate_local_in_same_block_is_reported() {
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let root = b.block(vec!["x"], vec!["x"], vec![one]);
        let tree = b.finish(root);
        let (_, ok, sink) = build(&tree);
        assert!(!ok);
        assert!(matches!(
            sink.diagnostics()[0].kind,
            DiagnosticKind::DuplicateDeclaration { .. }
        ));
    }

    #[test]
    fn independent_errors_accumulate_in_one_pass() {
        let mut b = TreeBuilder::new();
        let ghost = b.name_str("ghost");
        let phantom = b.name_str("phantom");
        let root = b.block(vec![], vec![], vec![ghost, phantom]);
        let tree = b.finish(root);
        let (_, ok, sink) = build(&tree);
        assert!(!ok);
        assert_eq!(sink.len(), 2);
    }
}

mod control_tests {
    use super::*;

    fn while_tree() -> ParseTree {
        // while({ a < 10 }, { a = a + 1 })
        let mut b = TreeBuilder::new();
        let a1 = b.name_str("a");
        let ten = b.int(10);
        let cmp = b.binop("<", a1, ten);
        let cond = b.block(vec![], vec![], vec![cmp]);
        let a2 = b.name_str("a");
        let one = b.int(1);
        let sum = b.binop("+", a2, one);
        let incr = b.assign("a", sum);
        let action = b.block(vec![], vec![], vec![incr]);
        let w = b.call("while", None, vec![cond, action]);
        let root = b.block(vec![], vec!["a"], vec![w]);
        b.finish(root)
    }

    #[test]
    fn while_builds_inline_blocks_without_new_scopes() {
        let tree = while_tree();
        let (ast, ok, sink) = build(&tree);
        assert!(ok, "{:?}", sink.diagnostics());
        // Only the enclosing block exists; neither body opened a scope.
        assert_eq!(ast.blocks.len(), 1);

        let block = root_block(&ast);
        let node = ast.node(statement(&ast, block, 0));
        assert_eq!(node.value_kind, ValueKind::Nil);
        match node.kind {
            NodeKind::While { condition, action } => {
                assert!(matches!(ast.node(condition).kind, NodeKind::InlineBlock { .. }));
                assert!(matches!(ast.node(action).kind, NodeKind::InlineBlock { .. }));
            }
            ref other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn loop_variable_resolves_against_the_enclosing_block() {
        let tree = while_tree();
        let (ast, ok, _) = build(&tree);
        assert!(ok);
        let block = root_block(&ast);
        let sym = ast.interner.get("a").unwrap();
        let value = ast.block(block).variables[&sym];
        // Condition read, action read, action write.
        assert_eq!(ast.value(value).live_references().count(), 3);
    }

    #[test]
    fn while_with_wrong_arity_is_malformed() {
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let cmp = b.block(vec![], vec![], vec![one]);
        let w = b.call("while", None, vec![cmp]);
        let root = b.block(vec![], vec![], vec![w]);
        let tree = b.finish(root);
        let (_, ok, sink) = build(&tree);
        assert!(!ok);
        assert!(matches!(
            sink.diagnostics()[0].kind,
            DiagnosticKind::MalformedConstruct { .. }
        ));
    }

    #[test]
    fn while_with_non_block_argument_is_malformed() {
        let mut b = TreeBuilder::new();
        let cond = b.int(1);
        let one = b.int(1);
        let action = b.block(vec![], vec![], vec![one]);
        let w = b.call("while", None, vec![cond, action]);
        let root = b.block(vec![], vec![], vec![w]);
        let tree = b.finish(root);
        let (_, ok, sink) = build(&tree);
        assert!(!ok);
        assert!(matches!(
            sink.diagnostics()[0].kind,
            DiagnosticKind::MalformedConstruct { .. }
        ));
    }

    #[test]
    fn control_keyword_shadows_user_selectors() {
        // A well-shaped call to `while` is control flow even though the
        // selector could name a user method.
        let mut b = TreeBuilder::new();
        let t = b.literal(Literal::Boolean(true));
        let cond = b.block(vec![], vec![], vec![t]);
        let one = b.int(1);
        let body = b.block(vec![], vec![], vec![one]);
        let w = b.call("while", None, vec![cond, body]);
        let root = b.block(vec![], vec![], vec![w]);
        let tree = b.finish(root);
        let (ast, ok, _) = build(&tree);
        assert!(ok);
        let block = root_block(&ast);
        assert!(matches!(
            ast.node(statement(&ast, block, 0)).kind,
            NodeKind::While { .. }
        ));
    }
}

mod class_tests {
    use super::*;
    use crate::ast::ClassRef;

    fn point_tree() -> ParseTree {
        let mut b = TreeBuilder::new();
        // getX() { ^x }
        let x = b.name_str("x");
        let ret = b.ret(x);
        let get_x = b.block(vec![], vec![], vec![ret]);
        // origin() { ^zero } (class method reading a class variable)
        let zero = b.name_str("zero");
        let ret_zero = b.ret(zero);
        let origin = b.block(vec![], vec![], vec![ret_zero]);
        let root = b.class_decl(
            "Point",
            Some("Object"),
            vec!["x", "y"],
            vec!["zero"],
            vec![("dimensions", Literal::Integer(2))],
            vec![("getX", false, get_x), ("origin", true, origin)],
        );
        b.finish(root)
    }

    fn root_class(ast: &Ast) -> ClassRef {
        match ast.node(ast.root.unwrap()).kind {
            NodeKind::Class(class) => class,
            ref other => panic!("expected class root, got {:?}", other),
        }
    }

    #[test]
    fn members_and_names_are_registered() {
        let tree = point_tree();
        let (ast, ok, sink) = build(&tree);
        assert!(ok, "{:?}", sink.diagnostics());

        let class = ast.class(root_class(&ast));
        assert_eq!(class.name, "Point");
        assert_eq!(class.variables.len(), 2);
        assert_eq!(class.class_variables.len(), 1);
        assert_eq!(class.constants.len(), 1);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.class_methods.len(), 1);

        let dims = ast.interner.get("dimensions").unwrap();
        assert_eq!(class.constants[&dims], Literal::Integer(2));
        assert_eq!(class.names[&dims], "dimensions");
        let get_x = ast.interner.get("getX").unwrap();
        assert_eq!(class.names[&get_x], "getX");
    }

    #[test]
    fn method_bodies_resolve_fields_implicitly() {
        let tree = point_tree();
        let (ast, ok, _) = build(&tree);
        assert!(ok);

        let class = ast.class(root_class(&ast));
        let x = ast.interner.get("x").unwrap();
        let field = class.variables[&x];
        assert_eq!(ast.value(field).live_references().count(), 1);

        let zero = ast.interner.get("zero").unwrap();
        let shared = class.class_variables[&zero];
        assert_eq!(ast.value(shared).live_references().count(), 1);
    }

    #[test]
    fn duplicate_member_fails_the_build() {
        let mut b = TreeBuilder::new();
        let root = b.class_decl("Bad", None, vec!["x", "x"], vec![], vec![], vec![]);
        let tree = b.finish(root);
        let (_, ok, sink) = build(&tree);
        assert!(!ok);
        assert!(matches!(
            sink.diagnostics()[0].kind,
            DiagnosticKind::DuplicateDeclaration { .. }
        ));
    }

    #[test]
    fn class_in_expression_position_is_malformed() {
        let mut b = TreeBuilder::new();
        let class = b.class_decl("Nested", None, vec![], vec![], vec![], vec![]);
        let root = b.block(vec![], vec![], vec![class]);
        let tree = b.finish(root);
        let (_, ok, sink) = build(&tree);
        assert!(!ok);
        assert!(matches!(
            sink.diagnostics()[0].kind,
            DiagnosticKind::MalformedConstruct { .. }
        ));
    }
}
