//! # Lexical Analysis Module
//!
//! This module implements the lexer (tokenizer) for the Zen programming language.
//! It converts source code text into a stream of tokens that can be processed by the parser.

use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token types for the Zen language
#[derive(Logos, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum TokenType {
    // Keywords - Definitions
    #[token("fn")]
    Fn,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("impl")]
    Impl,
    #[token("let")]
    Let,
    #[token("mut")]
    Mut,
    #[token("type")]
    Type,
    #[token("test")]
    Test,

    // Keywords - Control Flow
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("match")]
    Match,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("loop")]
    Loop,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,

    // Keywords - Special
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Identifiers and Literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_owned())]
    Identifier(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntegerLiteral(Option<i64>),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(Option<f64>),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_owned() // Remove quotes
    })]
    StringLiteral(String),

    #[regex(r"'([^'\\]|\\.)'", |lex| {
        let s = lex.slice();
        s.chars().nth(1) // Get character between quotes
    })]
    CharLiteral(Option<char>),

    // Operators - Arithmetic
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Operators - Comparison
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,

    // Operators - Logical
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,

    // Operators - Assignment
    #[token("=")]
    Assign,

    // Delimiters
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,

    // Punctuation
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("&")]
    Ampersand,
    #[token("_", priority = 3)]
    Underscore,

    // End of file, appended by the lexer after the last real token
    Eof,
}

/// A token with position information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub span: std::ops::Range<usize>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// A token carrying only a source position, used for synthesized nodes.
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            token_type: TokenType::Eof,
            span: 0..0,
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}:{}", self.token_type, self.line, self.column)
    }
}

/// Lexer for the Zen language
pub struct Lexer<'a> {
    input: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in input.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { input, line_starts }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        let mut lexer = TokenType::lexer(self.input);

        while let Some(token_type) = lexer.next() {
            let span = lexer.span();
            let (line, column) = self.position_to_line_col(span.start);

            match token_type {
                Ok(token_type) => {
                    tokens.push(Token {
                        token_type,
                        span,
                        line,
                        column,
                    });
                }
                Err(_) => {
                    return Err(LexerError::InvalidToken {
                        position: span.start,
                        line,
                        column,
                    });
                }
            }
        }

        // Add EOF token
        let (line, column) = self.position_to_line_col(self.input.len());
        tokens.push(Token {
            token_type: TokenType::Eof,
            span: self.input.len()..self.input.len(),
            line,
            column,
        });

        Ok(tokens)
    }

    /// Convert byte position to 1-based line and column
    fn position_to_line_col(&self, position: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&position) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line_idx + 1, position - self.line_starts[line_idx] + 1)
    }
}

/// Lexer error types
#[derive(Debug, thiserror::Error)]
pub enum LexerError {
    #[error("Invalid token at line {line}, column {column} (position {position})")]
    InvalidToken {
        position: usize,
        line: usize,
        column: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_declaration() {
        let mut lexer = Lexer::new("let mut x: int = 0;");
        let tokens = lexer.tokenize().unwrap();
        let types: Vec<_> = tokens.iter().map(|t| &t.token_type).collect();
        assert_eq!(
            types,
            vec![
                &TokenType::Let,
                &TokenType::Mut,
                &TokenType::Identifier("x".to_string()),
                &TokenType::Colon,
                &TokenType::Identifier("int".to_string()),
                &TokenType::Assign,
                &TokenType::IntegerLiteral(Some(0)),
                &TokenType::Semicolon,
                &TokenType::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let mut lexer = Lexer::new("let a = 1;\nlet b = 2;");
        let tokens = lexer.tokenize().unwrap();
        let b_decl = tokens
            .iter()
            .find(|t| t.token_type == TokenType::Identifier("b".to_string()))
            .unwrap();
        assert_eq!(b_decl.line, 2);
        assert_eq!(b_decl.column, 5);
    }

    #[test]
    fn skips_comments() {
        let mut lexer = Lexer::new("// a comment\nlet x = 1; /* block */");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Let);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn rejects_unknown_characters() {
        let mut lexer = Lexer::new("let x = @;");
        assert!(lexer.tokenize().is_err());
    }
}
