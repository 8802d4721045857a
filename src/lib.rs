//! # Zen Programming Language
//!
//! A systems programming language with ownership semantics and
//! ahead-of-time compilation.
//!
//! ## Architecture
//!
//! The front end is structured in phases:
//! 1. **Lexical Analysis** - Convert source text into tokens
//! 2. **Parsing** - Build Abstract Syntax Tree (AST) from tokens
//! 3. **Semantic Analysis** - Borrow analysis and move analysis over the AST
//!
//! ## Modules

pub mod cli;
pub mod lexer;
pub mod parser;
pub mod semantic;

// Re-export commonly used types
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use semantic::{AnalysisSummary, Diagnostic, DiagnosticSink, SemanticAnalyzer};

/// Main compiler error type
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error("Lexical error: {0}")]
    LexicalError(#[from] lexer::LexerError),

    #[error("Parse error: {0}")]
    ParseError(#[from] parser::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for compiler operations
pub type CompilerResult<T> = Result<T, CompilerError>;

/// Outcome of checking one translation unit
#[derive(Debug)]
pub struct CheckReport {
    pub summary: AnalysisSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.summary.is_clean()
    }
}

/// Compiler configuration options
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Enable verbose output
    pub verbose: bool,
    /// Emit diagnostics as JSON instead of human-readable text
    pub json_diagnostics: bool,
}

/// Main compiler struct that orchestrates the front-end phases
pub struct Compiler {
    /// Source file path
    pub source_path: Option<std::path::PathBuf>,
    /// Compilation options
    pub options: CompilerOptions,
}

impl Compiler {
    /// Create a new compiler instance
    pub fn new() -> Self {
        Self {
            source_path: None,
            options: CompilerOptions::default(),
        }
    }

    /// Create a compiler with custom options
    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            source_path: None,
            options,
        }
    }

    /// Set the source file path
    pub fn source_file<P: Into<std::path::PathBuf>>(mut self, path: P) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Lex and parse a source string
    pub fn parse_source(&self, source: &str) -> CompilerResult<parser::ast::Node> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;

        let mut parser = Parser::new(tokens);
        Ok(parser.parse()?)
    }

    /// Run the full front end over a source string
    pub fn check_string(&self, file_name: &str, source: &str) -> CompilerResult<CheckReport> {
        let ast = self.parse_source(source)?;

        let mut sink = DiagnosticSink::new(file_name);
        let mut analyzer = SemanticAnalyzer::new();
        let summary = analyzer.analyze(&ast, &mut sink);

        Ok(CheckReport {
            summary,
            diagnostics: sink.into_diagnostics(),
        })
    }

    /// Run the full front end over the configured source file
    pub fn check_file(&self) -> CompilerResult<CheckReport> {
        let source_path = self.source_path.as_ref().ok_or_else(|| {
            CompilerError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "No source file specified",
            ))
        })?;

        let source = std::fs::read_to_string(source_path)?;
        let file_name = source_path.display().to_string();
        self.check_string(&file_name, &source)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const LANGUAGE_NAME: &str = "Zen";
