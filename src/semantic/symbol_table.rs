//! # Symbol Table Implementation
//!
//! This module implements the symbol table used during semantic analysis,
//! together with the type registry the ownership analyses consult for
//! Copy/Drop classification.

use crate::parser::ast::{Field, Node, TypeExpr};
use indexmap::{IndexMap, IndexSet};

/// Information about a variable binding
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeExpr,
    pub is_mutable: bool,
    /// Fallback move flag, consulted only when no flow state is threaded.
    pub is_moved: bool,
}

/// Symbol table for managing scopes and symbol resolution
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Stack of scopes (function scope at bottom)
    scopes: Vec<IndexMap<String, Symbol>>,
}

impl SymbolTable {
    /// Create a symbol table with a single root scope
    pub fn new() -> Self {
        Self {
            scopes: vec![IndexMap::new()],
        }
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Exit the current scope
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a variable in the current scope, shadowing any outer binding
    pub fn declare(&mut self, name: &str, ty: TypeExpr, is_mutable: bool) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        scope.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                ty,
                is_mutable,
                is_moved: false,
            },
        );
    }

    /// Look up a variable in all scopes (innermost first)
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Look up a variable mutably in all scopes (innermost first)
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }
}

/// How a bare type name resolves against the registry
#[derive(Debug, Clone, PartialEq)]
pub enum NamedKind {
    Enum,
    Alias { inner: Option<TypeExpr> },
    /// A struct reference; the definition may or may not be known.
    Struct,
}

/// Registry of top-level type information consumed by the analyses:
/// struct definitions, trait impls, and type aliases.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    structs: IndexMap<String, Vec<Field>>,
    enums: IndexMap<String, Vec<String>>,
    /// Alias name to underlying type; `None` marks an opaque alias.
    aliases: IndexMap<String, Option<TypeExpr>>,
    /// `(trait, type)` pairs from `impl Trait for Type` blocks
    impls: IndexSet<(String, String)>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection pass: record every top-level struct, enum, alias, and
    /// impl before per-function analysis begins.
    pub fn collect(&mut self, root: &Node) {
        let Node::Root { children, .. } = root else {
            return;
        };
        for item in children {
            match item {
                Node::StructDecl { name, fields, .. } => {
                    self.structs.insert(name.clone(), fields.clone());
                }
                Node::EnumDecl { name, variants, .. } => {
                    self.enums.insert(name.clone(), variants.clone());
                }
                Node::AliasDecl { name, inner, .. } => {
                    self.aliases.insert(name.clone(), inner.clone());
                }
                Node::ImplBlock {
                    trait_name,
                    type_name,
                    ..
                } => {
                    self.impls
                        .insert((trait_name.clone(), type_name.clone()));
                }
                _ => {}
            }
        }
    }

    /// Whether `impl Trait for Type` was declared
    pub fn has_impl(&self, trait_name: &str, type_name: &str) -> bool {
        self.impls
            .contains(&(trait_name.to_string(), type_name.to_string()))
    }

    /// Look up a struct definition by name
    pub fn find_struct(&self, name: &str) -> Option<&[Field]> {
        self.structs.get(name).map(|fields| fields.as_slice())
    }

    /// Classify a bare type name
    pub fn classify(&self, name: &str) -> NamedKind {
        if let Some(inner) = self.aliases.get(name) {
            return NamedKind::Alias {
                inner: inner.clone(),
            };
        }
        if self.enums.contains_key(name) {
            return NamedKind::Enum;
        }
        NamedKind::Struct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn registry_for(source: &str) -> TypeRegistry {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let root = Parser::new(tokens).parse().unwrap();
        let mut registry = TypeRegistry::new();
        registry.collect(&root);
        registry
    }

    #[test]
    fn scoping_shadows_and_restores() {
        let mut table = SymbolTable::new();
        table.declare("x", TypeExpr::Int, false);

        table.enter_scope();
        table.declare("x", TypeExpr::Bool, true);
        assert_eq!(table.lookup("x").unwrap().ty, TypeExpr::Bool);

        table.exit_scope();
        assert_eq!(table.lookup("x").unwrap().ty, TypeExpr::Int);
    }

    #[test]
    fn collects_structs_impls_and_aliases() {
        let registry = registry_for(
            "struct S { x: int }\n\
             enum Color { Red, Green }\n\
             impl Copy for Point { }\n\
             type Meters = int;\n\
             type Handle;",
        );

        assert!(registry.find_struct("S").is_some());
        assert!(registry.find_struct("Point").is_none());
        assert!(registry.has_impl("Copy", "Point"));
        assert!(!registry.has_impl("Drop", "Point"));
        assert_eq!(registry.classify("Color"), NamedKind::Enum);
        assert_eq!(
            registry.classify("Meters"),
            NamedKind::Alias {
                inner: Some(TypeExpr::Int)
            }
        );
        assert_eq!(registry.classify("Handle"), NamedKind::Alias { inner: None });
        assert_eq!(registry.classify("S"), NamedKind::Struct);
    }
}
