//! # Borrow Analysis
//!
//! Lexically scoped tracking of active references. For each
//! `let r: &[mut] T = &[mut] x` binding the analyzer records an active
//! borrow of `x` by `r` at the current scope depth, checks it against the
//! aliasing rules, and releases it when the creating scope exits. It also
//! guards assignments: writing to a borrowed variable, or writing through
//! an immutable reference, is rejected.

use super::diagnostics::DiagnosticSink;
use crate::lexer::Token;
use crate::parser::ast::Node;

/// An active borrow
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowEntry {
    /// Variable being borrowed
    pub var_name: String,
    /// Variable holding the reference
    pub borrower_name: String,
    /// `true` for `&mut`, `false` for `&`
    pub mutable: bool,
    /// Scope depth where the borrow was created
    pub scope_depth: usize,
    /// Source location for error reporting
    pub token: Token,
}

/// Borrow analyzer.
///
/// Tracks active borrows and enforces the aliasing rules:
/// - multiple `&T` borrows may coexist,
/// - only one `&mut T` borrow at a time,
/// - `&T` and `&mut T` never coexist on the same variable.
pub struct BorrowAnalyzer<'a> {
    sink: &'a mut DiagnosticSink,
    active_borrows: Vec<BorrowEntry>,
    scope_depth: usize,
    violations: usize,
}

/// Run borrow analysis over a whole translation unit.
///
/// Returns the total violation count.
pub fn check_borrows(root: &Node, sink: &mut DiagnosticSink) -> usize {
    let mut analyzer = BorrowAnalyzer::new(sink);
    analyzer.check(root)
}

impl<'a> BorrowAnalyzer<'a> {
    pub fn new(sink: &'a mut DiagnosticSink) -> Self {
        Self {
            sink,
            active_borrows: Vec::new(),
            scope_depth: 0,
            violations: 0,
        }
    }

    /// Walk the tree rooted at `node` and return the violation count.
    pub fn check(&mut self, node: &Node) -> usize {
        self.check_node(node);
        self.violations
    }

    /// Number of currently active borrows.
    pub fn active_borrow_count(&self) -> usize {
        self.active_borrows.len()
    }

    fn error(&mut self, token: &Token, message: String) {
        self.sink.report(token, message, &[]);
        self.violations += 1;
    }

    /// Drop every borrow created at `depth` or deeper.
    fn release_scope(&mut self, depth: usize) {
        self.active_borrows.retain(|e| e.scope_depth < depth);
    }

    /// Check whether a new borrow of `var_name` is allowed.
    ///
    /// Rules:
    /// - requesting `&mut`: no existing borrows of any kind allowed
    /// - requesting `&`: no existing `&mut` borrows allowed
    fn borrow_allowed(&mut self, var_name: &str, mutable: bool, token: &Token) -> bool {
        let mut first_mutable: Option<Token> = None;
        let mut first_immutable: Option<Token> = None;

        for entry in &self.active_borrows {
            if entry.var_name != var_name {
                continue;
            }
            let slot = if entry.mutable {
                &mut first_mutable
            } else {
                &mut first_immutable
            };
            if slot.is_none() {
                *slot = Some(entry.token.clone());
            }
        }

        if mutable {
            if let Some(existing) = first_mutable {
                self.error(
                    token,
                    format!(
                        "Cannot borrow '{}' as mutable more than once at a time \
                         (previous mutable borrow at line {})",
                        var_name, existing.line
                    ),
                );
                return false;
            }
            if let Some(existing) = first_immutable {
                self.error(
                    token,
                    format!(
                        "Cannot borrow '{}' as mutable while it is borrowed as immutable \
                         (immutable borrow at line {})",
                        var_name, existing.line
                    ),
                );
                return false;
            }
        } else if let Some(existing) = first_mutable {
            self.error(
                token,
                format!(
                    "Cannot borrow '{}' as immutable while it is borrowed as mutable \
                     (mutable borrow at line {})",
                    var_name, existing.line
                ),
            );
            return false;
        }

        true
    }

    /// Whether `var_name` is currently borrowed by anyone (mutation guard).
    fn is_borrowed(&self, var_name: &str) -> bool {
        self.active_borrows.iter().any(|e| e.var_name == var_name)
    }

    /// Whether `borrower_name` holds an immutable reference (write guard).
    fn is_immutable_ref(&self, borrower_name: &str) -> bool {
        self.active_borrows
            .iter()
            .rev()
            .find(|e| e.borrower_name == borrower_name)
            .map(|e| !e.mutable)
            .unwrap_or(false)
    }

    fn check_block(&mut self, statements: &[Node]) {
        self.scope_depth += 1;
        for stmt in statements {
            self.check_node(stmt);
        }
        let depth = self.scope_depth;
        self.release_scope(depth);
        self.scope_depth -= 1;
    }

    fn check_var_decl(&mut self, node: &Node) {
        let Node::VarDecl {
            name,
            declared_type,
            init,
            token,
            ..
        } = node
        else {
            return;
        };
        let Some(init) = init else {
            return;
        };

        // A borrow binding: let r: &T = &x;
        if let Some(borrowed_var) = init.borrowed_var() {
            // Mutability comes from the declared reference type, not the
            // operator spelling.
            let mutable = declared_type
                .as_ref()
                .and_then(|t| t.ref_mutability())
                .unwrap_or(false);

            let borrowed_var = borrowed_var.to_string();
            if self.borrow_allowed(&borrowed_var, mutable, token) {
                self.active_borrows.push(BorrowEntry {
                    var_name: borrowed_var,
                    borrower_name: name.clone(),
                    mutable,
                    scope_depth: self.scope_depth,
                    token: token.clone(),
                });
            }
        }

        self.check_node(init);
    }

    fn check_binary(&mut self, op: &str, left: &Node, right: &Node, token: &Token) {
        self.check_node(left);
        self.check_node(right);

        if op != "=" {
            return;
        }

        // Deref assignment: *r = value
        if let Some(ref_name) = left.deref_var() {
            if self.is_immutable_ref(ref_name) {
                self.error(
                    token,
                    format!(
                        "Cannot assign through immutable reference '{}' \
                         (use &mut for mutable borrow)",
                        ref_name
                    ),
                );
            }
        }

        // Direct assignment to a borrowed variable: x = value
        if let Node::VarRef { name, .. } = left {
            if self.is_borrowed(name) {
                self.error(
                    token,
                    format!("Cannot assign to '{}' while it is borrowed", name),
                );
            }
        }
    }

    /// Each function gets a clean borrow state; the caller's is restored
    /// on exit.
    fn check_function_like(&mut self, body: &Node) {
        let saved_borrows = std::mem::take(&mut self.active_borrows);
        let saved_depth = std::mem::replace(&mut self.scope_depth, 0);

        self.check_node(body);

        self.active_borrows = saved_borrows;
        self.scope_depth = saved_depth;
    }

    fn check_node(&mut self, node: &Node) {
        match node {
            Node::Root { children, .. } => {
                for child in children {
                    self.check_node(child);
                }
            }
            Node::Block { statements, .. } => self.check_block(statements),
            Node::VarDecl { .. } => self.check_var_decl(node),
            Node::Function { body, .. } | Node::Test { body, .. } => {
                self.check_function_like(body);
            }
            Node::ImplBlock { methods, .. } => {
                for method in methods {
                    self.check_node(method);
                }
            }
            Node::Binary {
                op,
                left,
                right,
                token,
            } => self.check_binary(op, left, right, token),
            Node::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                self.check_node(condition);

                // Both arms are blocks, so each arm's borrows die at its
                // own scope exit before the other arm is walked.
                self.check_node(then_body);
                if let Some(else_body) = else_body {
                    self.check_node(else_body);
                }
            }
            Node::While {
                condition, body, ..
            } => {
                self.check_node(condition);
                self.check_node(body);
            }
            Node::For {
                init,
                condition,
                step,
                body,
                ..
            } => {
                self.scope_depth += 1;
                if let Some(init) = init {
                    self.check_node(init);
                }
                if let Some(condition) = condition {
                    self.check_node(condition);
                }
                if let Some(step) = step {
                    self.check_node(step);
                }
                self.check_node(body);
                let depth = self.scope_depth;
                self.release_scope(depth);
                self.scope_depth -= 1;
            }
            Node::Loop { body, .. } => self.check_node(body),
            Node::Return { value, .. } => {
                if let Some(value) = value {
                    self.check_node(value);
                }
            }
            Node::Call { callee, args, .. } => {
                self.check_node(callee);
                for arg in args {
                    self.check_node(arg);
                }
            }
            Node::Unary { operand, .. } => self.check_node(operand),
            Node::FieldAccess { object, .. } => self.check_node(object),
            Node::Index { object, index, .. } => {
                self.check_node(object);
                self.check_node(index);
            }
            Node::Match {
                scrutinee, cases, ..
            } => {
                self.check_node(scrutinee);
                for case in cases {
                    self.check_node(case);
                }
            }
            Node::MatchCase { body, .. } => self.check_node(body),
            // Variable uses are not themselves borrow events.
            Node::VarRef { .. }
            | Node::Literal { .. }
            | Node::StructDecl { .. }
            | Node::EnumDecl { .. }
            | Node::AliasDecl { .. }
            | Node::Break { .. }
            | Node::Continue { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn analyze(source: &str) -> (usize, Vec<String>) {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let root = Parser::new(tokens).parse().unwrap();
        let mut sink = DiagnosticSink::new("test.zen");
        let count = check_borrows(&root, &mut sink);
        let messages = sink
            .into_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        (count, messages)
    }

    #[test]
    fn double_mutable_borrow_is_rejected() {
        let (count, messages) = analyze(
            "fn main() { let mut x: int = 0;\n\
             let a: &mut int = &mut x;\n\
             let b: &mut int = &mut x; }",
        );
        assert_eq!(count, 1);
        assert_eq!(
            messages[0],
            "Cannot borrow 'x' as mutable more than once at a time \
             (previous mutable borrow at line 2)"
        );
    }

    #[test]
    fn mutable_while_immutable_is_rejected() {
        let (count, messages) = analyze(
            "fn main() { let mut x: int = 0;\n\
             let r: &int = &x;\n\
             let m: &mut int = &mut x; }",
        );
        assert_eq!(count, 1);
        assert_eq!(
            messages[0],
            "Cannot borrow 'x' as mutable while it is borrowed as immutable \
             (immutable borrow at line 2)"
        );
    }

    #[test]
    fn immutable_while_mutable_is_rejected() {
        let (count, messages) = analyze(
            "fn main() { let mut x: int = 0;\n\
             let m: &mut int = &mut x;\n\
             let r: &int = &x; }",
        );
        assert_eq!(count, 1);
        assert_eq!(
            messages[0],
            "Cannot borrow 'x' as immutable while it is borrowed as mutable \
             (mutable borrow at line 2)"
        );
    }

    #[test]
    fn shared_borrows_coexist() {
        let (count, _) = analyze(
            "fn main() { let x: int = 0;\n\
             let a: &int = &x;\n\
             let b: &int = &x; }",
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn write_through_immutable_reference_is_rejected() {
        let (count, messages) = analyze(
            "fn main() { let x: int = 0;\n\
             let r: &int = &x;\n\
             *r = 5; }",
        );
        assert_eq!(count, 1);
        assert_eq!(
            messages[0],
            "Cannot assign through immutable reference 'r' \
             (use &mut for mutable borrow)"
        );
    }

    #[test]
    fn write_through_mutable_reference_is_allowed() {
        let (count, _) = analyze(
            "fn main() { let mut x: int = 0;\n\
             let r: &mut int = &mut x;\n\
             *r = 5; }",
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn assignment_to_borrowed_variable_is_rejected() {
        let (count, messages) = analyze(
            "fn main() { let mut x: int = 0;\n\
             let r: &int = &x;\n\
             x = 7; }",
        );
        assert_eq!(count, 1);
        assert_eq!(messages[0], "Cannot assign to 'x' while it is borrowed");
    }

    #[test]
    fn scope_exit_releases_borrows() {
        let (count, _) = analyze(
            "fn main() { let mut x: int = 0;\n\
             { let r: &mut int = &mut x; }\n\
             let s: &mut int = &mut x; }",
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn for_scope_releases_borrows() {
        let (count, _) = analyze(
            "fn main() { let mut x: int = 0;\n\
             for (let i: int = 0; i < 3; i = i + 1) { let r: &mut int = &mut x; }\n\
             let s: &mut int = &mut x; }",
        );
        // The loop-body borrow dies with its block; the second &mut is fine.
        assert_eq!(count, 0);
    }

    #[test]
    fn functions_get_fresh_borrow_state() {
        let (count, _) = analyze(
            "fn first() { let mut x: int = 0; let a: &mut int = &mut x; }\n\
             fn second() { let mut x: int = 0; let b: &mut int = &mut x; }\n\
             test scoped { let mut x: int = 0; let c: &mut int = &mut x; }",
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn if_arms_do_not_see_each_others_borrows() {
        let (count, _) = analyze(
            "fn main() { let mut x: int = 0;\n\
             if c { let a: &mut int = &mut x; } else { let b: &mut int = &mut x; } }",
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn conflict_inside_one_arm_is_still_rejected() {
        let (count, _) = analyze(
            "fn main() { let mut x: int = 0;\n\
             if c { let a: &mut int = &mut x; let b: &mut int = &mut x; } }",
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn rejected_borrow_is_not_registered() {
        // The second &mut fails, so the follow-up assignment only conflicts
        // with the first borrow, not a phantom second one.
        let (count, _) = analyze(
            "fn main() { let mut x: int = 0;\n\
             let a: &int = &x;\n\
             let b: &mut int = &mut x;\n\
             let c: &int = &x; }",
        );
        // b is rejected and unregistered; c only sees the immutable a.
        assert_eq!(count, 1);
    }

    #[test]
    fn field_borrows_are_not_registered() {
        let (count, _) = analyze(
            "fn main() { let mut x: S = make();\n\
             let a: &mut int = &mut x.f;\n\
             let b: &mut int = &mut x.f; }",
        );
        // Non-trivial borrow expressions are outside the tracked pattern.
        assert_eq!(count, 0);
    }

    #[test]
    fn borrow_set_is_empty_after_analysis() {
        let tokens = Lexer::new(
            "fn main() { let mut x: int = 0; let r: &mut int = &mut x; \
             { let s: &int = &y; } }",
        )
        .tokenize()
        .unwrap();
        let root = Parser::new(tokens).parse().unwrap();
        let mut sink = DiagnosticSink::new("test.zen");
        let mut analyzer = BorrowAnalyzer::new(&mut sink);
        analyzer.check(&root);
        assert_eq!(analyzer.active_borrow_count(), 0);
    }

    #[test]
    fn borrow_free_function_passes() {
        let (count, _) = analyze("fn main() { let x: int = 1; let y: int = x + 2; }");
        assert_eq!(count, 0);
    }
}
