//! # Semantic Analysis Module
//!
//! This module implements semantic analysis for the Zen programming
//! language: the borrow analysis and the move analysis that enforce the
//! language's ownership discipline, plus the symbol table and diagnostic
//! plumbing they share.

pub mod borrow;
pub mod diagnostics;
pub mod moves;
pub mod symbol_table;

use crate::parser::ast::Node;

pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use symbol_table::{SymbolTable, TypeRegistry};

/// Aggregate result of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub borrow_violations: usize,
    pub move_violations: usize,
}

impl AnalysisSummary {
    pub fn is_clean(&self) -> bool {
        self.borrow_violations == 0 && self.move_violations == 0
    }
}

/// Main semantic analyzer.
///
/// Runs two passes: first collect top-level type information (structs,
/// enums, aliases, trait impls), then the two ownership analyses over
/// every function.
pub struct SemanticAnalyzer {
    registry: TypeRegistry,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
        }
    }

    /// Analyze a translation unit, accumulating diagnostics into `sink`.
    pub fn analyze(&mut self, root: &Node, sink: &mut DiagnosticSink) -> AnalysisSummary {
        // Pass 1: collect top-level symbols
        self.registry.collect(root);

        // Pass 2: per-function dataflow analyses
        let borrow_violations = borrow::check_borrows(root, sink);
        let move_violations = moves::check_moves(root, &self.registry, sink);

        AnalysisSummary {
            borrow_violations,
            move_violations,
        }
    }

    /// The collected type registry (available after [`Self::analyze`]).
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    #[test]
    fn clean_program_reports_nothing() {
        let tokens = Lexer::new("fn main() { let x: int = 1; let y: int = x; }")
            .tokenize()
            .unwrap();
        let root = Parser::new(tokens).parse().unwrap();
        let mut sink = DiagnosticSink::new("main.zen");
        let summary = SemanticAnalyzer::new().analyze(&root, &mut sink);
        assert!(summary.is_clean());
        assert!(sink.is_clean());
    }

    #[test]
    fn both_analyses_contribute_diagnostics() {
        let source = "struct S { f: int }\n\
                      fn main() {\n\
                      let mut x: int = 0;\n\
                      let a: &mut int = &mut x;\n\
                      let b: &mut int = &mut x;\n\
                      let s: S = make();\n\
                      let t: S = s;\n\
                      consume(s);\n\
                      }";
        let tokens = Lexer::new(source).tokenize().unwrap();
        let root = Parser::new(tokens).parse().unwrap();
        let mut sink = DiagnosticSink::new("main.zen");
        let summary = SemanticAnalyzer::new().analyze(&root, &mut sink);
        assert_eq!(summary.borrow_violations, 1);
        assert_eq!(summary.move_violations, 1);
        assert_eq!(sink.error_count(), 2);
    }
}
