use semantics::{
    build_ast, to_three_address_form, Ast, DiagnosticSink, LoweringFault, ParseTree,
};

/// Analysis session that serves as the central context for the front end.
///
/// This structure owns the state shared between the analysis phases: the
/// diagnostic sink that accumulates user-facing errors and the AST produced
/// by the build phase. It drives the two phases in order and keeps their
/// results available for inspection afterwards.
pub struct SyntaxAnalyzer {
    sink: DiagnosticSink,
    ast: Option<Ast>,
}

impl SyntaxAnalyzer {
    /// Create a new analysis session with an empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            sink: DiagnosticSink::new(),
            ast: None,
        }
    }

    /// Build an AST from a parse tree, resolving every identifier.
    ///
    /// Returns true when the build produced no diagnostics. The AST is
    /// retained either way, so callers can inspect partial results of a
    /// failed build through `ast()`.
    pub fn build_ast(&mut self, tree: &ParseTree) -> bool {
        let (ast, ok) = build_ast(tree, &mut self.sink);
        self.ast = Some(ast);
        ok
    }

    /// Lower the built AST to three-address form in place.
    ///
    /// Must follow a successful `build_ast`; running it without one, or
    /// after a failed build, reports a fault rather than producing
    /// half-lowered output.
    pub fn to_three_address_form(&mut self) -> Result<(), LoweringFault> {
        if self.sink.has_errors() {
            return Err(LoweringFault::build_failed());
        }
        match self.ast.as_mut() {
            Some(ast) => to_three_address_form(ast),
            None => Err(LoweringFault::build_failed()),
        }
    }

    /// Run both phases: build the AST, then lower it when the build was
    /// clean. Returns the build's success flag; a false result means the
    /// diagnostics explain why lowering was skipped.
    pub fn analyze(&mut self, tree: &ParseTree) -> Result<bool, LoweringFault> {
        if !self.build_ast(tree) {
            return Ok(false);
        }
        self.to_three_address_form()?;
        Ok(true)
    }

    /// The AST of the most recent build, if any.
    pub fn ast(&self) -> Option<&Ast> {
        self.ast.as_ref()
    }

    /// Diagnostics accumulated so far, in report order.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.sink
    }
}

impl Default for SyntaxAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantics::{NodeKind, TreeBuilder};

    #[test]
    fn analyze_runs_both_phases() {
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let three = b.int(3);
        let sum = b.binop("+", one, two);
        let product = b.binop("*", sum, three);
        let stmt = b.assign("x", product);
        let root = b.block(vec![], vec![], vec![stmt]);
        let tree = b.finish(root);

        let mut analyzer = SyntaxAnalyzer::new();
        assert!(analyzer.analyze(&tree).unwrap());
        assert!(analyzer.diagnostics().is_empty());

        let ast = analyzer.ast().unwrap();
        let block = match ast.node(ast.root.unwrap()).kind {
            NodeKind::Block(block) => block,
            ref other => panic!("expected block root, got {:?}", other),
        };
        // The nested calculation was hoisted in front of the assignment.
        let statements = &ast.block(block).statements;
        assert_eq!(statements.len(), 2);
        assert!(matches!(ast.node(statements[0]).kind, NodeKind::Assign { .. }));
        assert!(matches!(ast.node(statements[1]).kind, NodeKind::Assign { .. }));
    }

    #[test]
    fn failed_build_skips_lowering() {
        let mut b = TreeBuilder::new();
        let ghost = b.name_str("ghost");
        let root = b.block(vec![], vec![], vec![ghost]);
        let tree = b.finish(root);

        let mut analyzer = SyntaxAnalyzer::new();
        assert_eq!(analyzer.analyze(&tree), Ok(false));
        assert_eq!(analyzer.diagnostics().len(), 1);
        // The partial AST is still available for inspection.
        assert!(analyzer.ast().is_some());
        // Explicitly requesting lowering after a failed build is a fault.
        assert!(analyzer.to_three_address_form().is_err());
    }

    #[test]
    fn lowering_before_any_build_is_a_fault() {
        let mut analyzer = SyntaxAnalyzer::default();
        assert!(analyzer.to_three_address_form().is_err());
    }
}
