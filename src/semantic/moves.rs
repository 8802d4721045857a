//! # Move Analysis
//!
//! Flow-sensitive per-symbol ownership tracking. Each symbol is `Valid`,
//! `Moved`, or `MaybeMoved` at every program point; states are cloned at
//! control-flow forks, mutated independently per branch, and merged at
//! joins. The Copy/Drop classification decides whether a use transfers
//! ownership at all.

use super::diagnostics::DiagnosticSink;
use super::symbol_table::{NamedKind, SymbolTable, TypeRegistry};
use crate::lexer::Token;
use crate::parser::ast::{Node, Param, TypeExpr};
use indexmap::IndexMap;

/// Status of a symbol in a specific flow path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    Valid,
    Moved,
    /// Produced when merging diverging paths that disagree; an error on use.
    MaybeMoved,
}

/// Tracked state for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEntry {
    pub status: MoveStatus,
    /// Location of the move that established a non-`Valid` status
    pub moved_at: Option<Token>,
}

/// The set of moves observed along one control-flow path.
///
/// Symbols never recorded default to `Valid`. `mark_valid` overwrites any
/// prior entry, so a re-assignment masks an earlier move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveState {
    entries: IndexMap<String, MoveEntry>,
}

impl MoveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The effective status of `name`; unrecorded symbols are `Valid`.
    pub fn status(&self, name: &str) -> MoveStatus {
        self.entries
            .get(name)
            .map(|e| e.status)
            .unwrap_or(MoveStatus::Valid)
    }

    pub fn entry(&self, name: &str) -> Option<&MoveEntry> {
        self.entries.get(name)
    }

    pub fn mark_moved(&mut self, name: &str, at: Token) {
        self.entries.insert(
            name.to_string(),
            MoveEntry {
                status: MoveStatus::Moved,
                moved_at: Some(at),
            },
        );
    }

    pub fn mark_valid(&mut self, name: &str) {
        self.entries.insert(
            name.to_string(),
            MoveEntry {
                status: MoveStatus::Valid,
                moved_at: None,
            },
        );
    }

    /// Join two per-branch states into `self` (the pre-fork state).
    ///
    /// For each symbol recorded in either branch:
    /// - `Valid` + `Valid` -> `Valid`
    /// - `Moved` + `Moved` -> `Moved` (first branch's move location)
    /// - disagreement -> `MaybeMoved`
    pub fn merge_from(&mut self, a: &MoveState, b: &MoveState) {
        let names: Vec<&String> = a
            .entries
            .keys()
            .chain(b.entries.keys().filter(|k| !a.entries.contains_key(*k)))
            .collect();

        for name in names {
            let status = Self::join(a.status(name), b.status(name));
            let moved_at = match status {
                MoveStatus::Valid => None,
                _ => a
                    .entry(name)
                    .and_then(|e| e.moved_at.clone())
                    .or_else(|| b.entry(name).and_then(|e| e.moved_at.clone())),
            };
            self.entries
                .insert(name.clone(), MoveEntry { status, moved_at });
        }
    }

    /// Convenience constructor for a fresh merged state.
    pub fn merged(a: &MoveState, b: &MoveState) -> MoveState {
        let mut out = MoveState::new();
        out.merge_from(a, b);
        out
    }

    fn join(a: MoveStatus, b: MoveStatus) -> MoveStatus {
        match (a, b) {
            (MoveStatus::Valid, MoveStatus::Valid) => MoveStatus::Valid,
            (MoveStatus::Moved, MoveStatus::Moved) => MoveStatus::Moved,
            _ => MoveStatus::MaybeMoved,
        }
    }
}

/// Whether values of `ty` may be duplicated by assignment without
/// invalidating the source.
pub fn type_is_copy(registry: &TypeRegistry, ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Int
        | TypeExpr::I8
        | TypeExpr::I16
        | TypeExpr::I32
        | TypeExpr::I64
        | TypeExpr::U8
        | TypeExpr::U16
        | TypeExpr::U32
        | TypeExpr::U64
        | TypeExpr::F32
        | TypeExpr::F64
        | TypeExpr::Bool
        | TypeExpr::Char
        | TypeExpr::Void
        | TypeExpr::Pointer(_)
        | TypeExpr::Function(_, _)
        | TypeExpr::BitInt(_)
        | TypeExpr::UBitInt(_)
        | TypeExpr::Ref { .. }
        | TypeExpr::RefSlice { .. } => true,

        TypeExpr::Array(inner) => type_is_copy(registry, inner),

        TypeExpr::Named(name) => match registry.classify(name) {
            NamedKind::Enum => true,
            // Opaque aliases are Copy; transparent ones follow the underlying type.
            NamedKind::Alias { inner: None } => true,
            NamedKind::Alias { inner: Some(inner) } => type_is_copy(registry, &inner),
            NamedKind::Struct => {
                if registry.has_impl("Copy", name) {
                    return true;
                }
                // Unknown to the checker and not Drop: permissive fallback.
                if registry.find_struct(name).is_none() && !registry.has_impl("Drop", name) {
                    return true;
                }
                false
            }
        },
    }
}

const MOVE_HINTS: &[&str] = &[
    "This type owns resources and cannot be implicitly copied",
    "Consider using a reference ('&') to borrow the value instead",
];

/// Move analyzer.
///
/// The four primitives (`is_copy`, `mark_moved`, `mark_valid`, `check_use`)
/// accept an optional flow state; when none is threaded the analyzer falls
/// back to the per-symbol `is_moved` flag, which keeps it usable from
/// passes that do not maintain flow state.
pub struct MoveAnalyzer<'a> {
    registry: &'a TypeRegistry,
    sink: &'a mut DiagnosticSink,
    symbols: SymbolTable,
    violations: usize,
}

/// Run move analysis over a whole translation unit.
///
/// Returns the total violation count.
pub fn check_moves(root: &Node, registry: &TypeRegistry, sink: &mut DiagnosticSink) -> usize {
    let mut analyzer = MoveAnalyzer::new(registry, sink);
    analyzer.check(root)
}

impl<'a> MoveAnalyzer<'a> {
    pub fn new(registry: &'a TypeRegistry, sink: &'a mut DiagnosticSink) -> Self {
        Self {
            registry,
            sink,
            symbols: SymbolTable::new(),
            violations: 0,
        }
    }

    /// Analyze every function in the tree independently and return the
    /// violation count.
    pub fn check(&mut self, root: &Node) -> usize {
        let Node::Root { children, .. } = root else {
            return self.violations;
        };
        for item in children {
            match item {
                Node::Function { params, body, .. } => self.analyze_function(params, body),
                Node::Test { body, .. } => self.analyze_function(&[], body),
                Node::ImplBlock { methods, .. } => {
                    for method in methods {
                        if let Node::Function { params, body, .. } = method {
                            self.analyze_function(params, body);
                        }
                    }
                }
                _ => {}
            }
        }
        self.violations
    }

    // ** Primitives **

    /// Per-type Copy classification.
    pub fn is_copy(&self, ty: &TypeExpr) -> bool {
        type_is_copy(self.registry, ty)
    }

    /// Transition a symbol to `Moved` at `at`. Copy-typed symbols never
    /// leave `Valid`.
    pub fn mark_moved(&mut self, state: Option<&mut MoveState>, name: &str, at: &Token) {
        let Some(sym) = self.symbols.lookup(name) else {
            return;
        };
        if type_is_copy(self.registry, &sym.ty) {
            return;
        }
        match state {
            Some(state) => state.mark_moved(name, at.clone()),
            None => {
                if let Some(sym) = self.symbols.lookup_mut(name) {
                    sym.is_moved = true;
                }
            }
        }
    }

    /// Transition a symbol to `Valid` (initialization or re-assignment).
    pub fn mark_valid(&mut self, state: Option<&mut MoveState>, name: &str) {
        let Some(sym) = self.symbols.lookup_mut(name) else {
            return;
        };
        sym.is_moved = false;
        if let Some(state) = state {
            state.mark_valid(name);
        }
    }

    /// Report a use of a symbol whose effective status is not `Valid`.
    pub fn check_use(&mut self, state: Option<&MoveState>, name: &str, at: &Token) {
        let Some(sym) = self.symbols.lookup(name) else {
            return;
        };
        let status = match state {
            Some(state) => state.status(name),
            None => {
                if sym.is_moved {
                    MoveStatus::Moved
                } else {
                    MoveStatus::Valid
                }
            }
        };
        if status != MoveStatus::Valid {
            self.sink
                .report(at, format!("Use of moved value '{}'", name), MOVE_HINTS);
            self.violations += 1;
        }
    }

    // ** Flow walk **

    fn analyze_function(&mut self, params: &[Param], body: &Node) {
        self.symbols.enter_scope();
        for param in params {
            self.symbols
                .declare(&param.name, param.param_type.clone(), false);
        }
        let mut state = MoveState::new();
        self.analyze_node(body, &mut state);
        self.symbols.exit_scope();
    }

    fn analyze_node(&mut self, node: &Node, state: &mut MoveState) {
        match node {
            Node::Block { statements, .. } => {
                self.symbols.enter_scope();
                for stmt in statements {
                    self.analyze_node(stmt, state);
                }
                self.symbols.exit_scope();
            }
            Node::VarDecl {
                name,
                mutable,
                declared_type,
                init,
                ..
            } => {
                if let Some(init) = init {
                    self.analyze_value(init, state);
                }
                let ty = declared_type
                    .clone()
                    .or_else(|| self.infer_type(init.as_deref()));
                if let Some(ty) = ty {
                    self.symbols.declare(name, ty, *mutable);
                    self.mark_valid(Some(state), name);
                }
            }
            Node::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                self.analyze_value(condition, state);

                let mut then_state = state.clone();
                self.analyze_node(then_body, &mut then_state);

                let mut else_state = state.clone();
                if let Some(else_body) = else_body {
                    self.analyze_node(else_body, &mut else_state);
                }

                state.merge_from(&then_state, &else_state);
            }
            Node::While {
                condition, body, ..
            } => {
                self.analyze_value(condition, state);

                // The body may run; a move inside it is at least MaybeMoved
                // after the loop.
                let pre = state.clone();
                let mut body_state = state.clone();
                self.analyze_node(body, &mut body_state);
                state.merge_from(&body_state, &pre);
            }
            Node::For {
                init,
                condition,
                step,
                body,
                ..
            } => {
                self.symbols.enter_scope();
                if let Some(init) = init {
                    self.analyze_node(init, state);
                }
                if let Some(condition) = condition {
                    self.analyze_value(condition, state);
                }

                let pre = state.clone();
                let mut body_state = state.clone();
                self.analyze_node(body, &mut body_state);
                if let Some(step) = step {
                    self.analyze_value(step, &mut body_state);
                }
                state.merge_from(&body_state, &pre);
                self.symbols.exit_scope();
            }
            Node::Loop { body, .. } => {
                let pre = state.clone();
                let mut body_state = state.clone();
                self.analyze_node(body, &mut body_state);
                state.merge_from(&body_state, &pre);
            }
            Node::Match {
                scrutinee, cases, ..
            } => {
                self.analyze_value(scrutinee, state);

                let pre = state.clone();
                let mut merged: Option<MoveState> = None;
                for case in cases {
                    let Node::MatchCase { body, .. } = case else {
                        continue;
                    };
                    let mut case_state = pre.clone();
                    self.analyze_node(body, &mut case_state);
                    merged = Some(match merged {
                        None => case_state,
                        Some(acc) => {
                            let mut joined = pre.clone();
                            joined.merge_from(&acc, &case_state);
                            joined
                        }
                    });
                }
                if let Some(merged) = merged {
                    *state = merged;
                }
            }
            Node::Return { value, .. } => {
                if let Some(value) = value {
                    self.analyze_value(value, state);
                }
            }
            // Expression statements
            Node::Binary { .. }
            | Node::Unary { .. }
            | Node::VarRef { .. }
            | Node::FieldAccess { .. }
            | Node::Index { .. }
            | Node::Call { .. }
            | Node::Literal { .. } => self.analyze_value(node, state),
            _ => {}
        }
    }

    /// Analyze an expression in value position: a bare variable reference
    /// here is a use, and transfers ownership for non-Copy types.
    fn analyze_value(&mut self, node: &Node, state: &mut MoveState) {
        match node {
            Node::VarRef { name, token } => {
                self.check_use(Some(state), name, token);
                self.mark_moved(Some(state), name, token);
            }
            Node::Literal { .. } => {}
            Node::Unary { op, operand, .. } => match op.as_str() {
                // Borrowing or dereferencing reads the place without
                // transferring ownership.
                "&" | "&mut" | "*" => self.analyze_place(operand, state),
                _ => self.analyze_value(operand, state),
            },
            Node::Binary {
                op, left, right, ..
            } => {
                if op == "=" {
                    self.analyze_value(right, state);
                    if let Node::VarRef { name, .. } = left.as_ref() {
                        self.mark_valid(Some(state), name);
                    } else {
                        self.analyze_place(left, state);
                    }
                } else {
                    self.analyze_value(left, state);
                    self.analyze_value(right, state);
                }
            }
            Node::Call { callee, args, .. } => {
                // Free function names are not tracked symbols, so walking
                // the callee only ever checks local function values.
                self.analyze_value(callee, state);
                for arg in args {
                    self.analyze_value(arg, state);
                }
            }
            Node::FieldAccess { object, .. } => {
                // Partial moves are not tracked; reading a field checks the
                // root variable without consuming it.
                self.analyze_place(object, state);
            }
            Node::Index { object, index, .. } => {
                self.analyze_place(object, state);
                self.analyze_value(index, state);
            }
            _ => self.analyze_node(node, state),
        }
    }

    /// Analyze an expression in place position (borrow or deref target):
    /// the symbol is checked but not consumed.
    fn analyze_place(&mut self, node: &Node, state: &mut MoveState) {
        match node {
            Node::VarRef { name, token } => {
                self.check_use(Some(state), name, token);
            }
            Node::Unary { op, operand, .. } if op == "&" || op == "&mut" || op == "*" => {
                self.analyze_place(operand, state);
            }
            Node::FieldAccess { object, .. } => self.analyze_place(object, state),
            Node::Index { object, index, .. } => {
                self.analyze_place(object, state);
                self.analyze_value(index, state);
            }
            _ => self.analyze_value(node, state),
        }
    }

    /// Minimal initializer-driven inference for un-annotated declarations.
    fn infer_type(&self, init: Option<&Node>) -> Option<TypeExpr> {
        use crate::parser::ast::LiteralValue;
        match init? {
            Node::Literal { value, .. } => match value {
                LiteralValue::Integer(_) => Some(TypeExpr::Int),
                LiteralValue::Float(_) => Some(TypeExpr::F64),
                LiteralValue::Bool(_) => Some(TypeExpr::Bool),
                LiteralValue::Char(_) => Some(TypeExpr::Char),
                LiteralValue::Str(_) => None,
            },
            Node::VarRef { name, .. } => self.symbols.lookup(name).map(|s| s.ty.clone()),
            Node::Unary { op, operand, .. } if op == "&" || op == "&mut" => {
                if let Node::VarRef { name, .. } = operand.as_ref() {
                    let inner = self.symbols.lookup(name)?.ty.clone();
                    Some(TypeExpr::Ref {
                        inner: Box::new(inner),
                        mutable: op == "&mut",
                    })
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
