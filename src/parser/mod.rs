//! # Parser Module
//!
//! This module implements the parser for the Zen programming language.
//! It converts a stream of tokens into an Abstract Syntax Tree (AST).

pub mod ast;

use crate::lexer::{Token, TokenType};
use ast::*;

/// Parser for the Zen language
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

/// Parser error types
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: Token },

    #[error("Unexpected end of input (expected {expected})")]
    UnexpectedEof { expected: String },
}

impl Parser {
    /// Create a new parser with the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parse the tokens into an AST rooted at [`Node::Root`]
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        let root_token = self.peek().clone();
        let mut children = Vec::new();

        while !self.is_at_end() {
            children.push(self.parse_item()?);
        }

        Ok(Node::Root {
            children,
            token: root_token,
        })
    }

    /// Parse a top-level item (function, struct, impl, etc.)
    fn parse_item(&mut self) -> Result<Node, ParseError> {
        match &self.peek().token_type {
            TokenType::Fn => self.parse_function(),
            TokenType::Struct => self.parse_struct(),
            TokenType::Enum => self.parse_enum(),
            TokenType::Impl => self.parse_impl(),
            TokenType::Type => self.parse_alias(),
            TokenType::Test => self.parse_test(),
            _ => Err(self.unexpected("item declaration")),
        }
    }

    fn parse_function(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Fn, "'fn'")?;
        let (name, _) = self.expect_identifier("function name")?;

        self.expect(TokenType::LeftParen, "'('")?;
        let mut params = Vec::new();
        while !self.check(&TokenType::RightParen) {
            let (param_name, param_token) = self.expect_identifier("parameter name")?;
            self.expect(TokenType::Colon, "':'")?;
            let param_type = self.parse_type()?;
            params.push(Param {
                name: param_name,
                param_type,
                token: param_token,
            });
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RightParen, "')'")?;

        let return_type = if self.match_token(&TokenType::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;

        Ok(Node::Function {
            name,
            params,
            return_type,
            body: Box::new(body),
            token,
        })
    }

    fn parse_test(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Test, "'test'")?;
        let (name, _) = self.expect_identifier("test name")?;
        let body = self.parse_block()?;
        Ok(Node::Test {
            name,
            body: Box::new(body),
            token,
        })
    }

    fn parse_struct(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Struct, "'struct'")?;
        let (name, _) = self.expect_identifier("struct name")?;
        self.expect(TokenType::LeftBrace, "'{'")?;

        let mut fields = Vec::new();
        while !self.check(&TokenType::RightBrace) {
            let (field_name, _) = self.expect_identifier("field name")?;
            self.expect(TokenType::Colon, "':'")?;
            let field_type = self.parse_type()?;
            fields.push(Field {
                name: field_name,
                field_type,
            });
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RightBrace, "'}'")?;

        Ok(Node::StructDecl {
            name,
            fields,
            token,
        })
    }

    fn parse_enum(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Enum, "'enum'")?;
        let (name, _) = self.expect_identifier("enum name")?;
        self.expect(TokenType::LeftBrace, "'{'")?;

        let mut variants = Vec::new();
        while !self.check(&TokenType::RightBrace) {
            let (variant, _) = self.expect_identifier("enum variant")?;
            variants.push(variant);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RightBrace, "'}'")?;

        Ok(Node::EnumDecl {
            name,
            variants,
            token,
        })
    }

    /// `impl Trait for Type { methods }`
    fn parse_impl(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Impl, "'impl'")?;
        let (trait_name, _) = self.expect_identifier("trait name")?;
        self.expect(TokenType::For, "'for'")?;
        let (type_name, _) = self.expect_identifier("type name")?;
        self.expect(TokenType::LeftBrace, "'{'")?;

        let mut methods = Vec::new();
        while !self.check(&TokenType::RightBrace) {
            methods.push(self.parse_function()?);
        }
        self.expect(TokenType::RightBrace, "'}'")?;

        Ok(Node::ImplBlock {
            trait_name,
            type_name,
            methods,
            token,
        })
    }

    /// `type Name = T;` or the opaque form `type Name;`
    fn parse_alias(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Type, "'type'")?;
        let (name, _) = self.expect_identifier("alias name")?;
        let inner = if self.match_token(&TokenType::Assign) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenType::Semicolon, "';'")?;
        Ok(Node::AliasDecl { name, inner, token })
    }

    fn parse_block(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::LeftBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenType::RightBrace, "'}'")?;
        Ok(Node::Block { statements, token })
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match &self.peek().token_type {
            TokenType::Let => self.parse_var_decl(),
            TokenType::Return => {
                let token = self.advance();
                let value = if self.check(&TokenType::Semicolon) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.expect(TokenType::Semicolon, "';'")?;
                Ok(Node::Return { value, token })
            }
            TokenType::If => self.parse_if(),
            TokenType::While => {
                let token = self.advance();
                let condition = self.parse_expression()?;
                let body = self.parse_block()?;
                Ok(Node::While {
                    condition: Box::new(condition),
                    body: Box::new(body),
                    token,
                })
            }
            TokenType::For => self.parse_for(),
            TokenType::Loop => {
                let token = self.advance();
                let body = self.parse_block()?;
                Ok(Node::Loop {
                    body: Box::new(body),
                    token,
                })
            }
            TokenType::Match => self.parse_match(),
            TokenType::Break => {
                let token = self.advance();
                self.expect(TokenType::Semicolon, "';'")?;
                Ok(Node::Break { token })
            }
            TokenType::Continue => {
                let token = self.advance();
                self.expect(TokenType::Semicolon, "';'")?;
                Ok(Node::Continue { token })
            }
            TokenType::LeftBrace => self.parse_block(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenType::Semicolon, "';'")?;
                Ok(expr)
            }
        }
    }

    fn parse_var_decl(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Let, "'let'")?;
        let mutable = self.match_token(&TokenType::Mut);
        let (name, _) = self.expect_identifier("variable name")?;

        let declared_type = if self.match_token(&TokenType::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.match_token(&TokenType::Assign) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect(TokenType::Semicolon, "';'")?;

        Ok(Node::VarDecl {
            name,
            mutable,
            declared_type,
            init,
            token,
        })
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::If, "'if'")?;
        let condition = self.parse_expression()?;
        let then_body = self.parse_block()?;

        let else_body = if self.match_token(&TokenType::Else) {
            if self.check(&TokenType::If) {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(Node::If {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_body,
            token,
        })
    }

    /// C-style `for (init; condition; step) { ... }`
    fn parse_for(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::For, "'for'")?;
        self.expect(TokenType::LeftParen, "'('")?;

        let init = if self.check(&TokenType::Let) {
            // The declaration consumes its own ';'
            Some(Box::new(self.parse_var_decl()?))
        } else if self.match_token(&TokenType::Semicolon) {
            None
        } else {
            let expr = self.parse_expression()?;
            self.expect(TokenType::Semicolon, "';'")?;
            Some(Box::new(expr))
        };

        let condition = if self.check(&TokenType::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenType::Semicolon, "';'")?;

        let step = if self.check(&TokenType::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenType::RightParen, "')'")?;

        let body = self.parse_block()?;

        Ok(Node::For {
            init,
            condition,
            step,
            body: Box::new(body),
            token,
        })
    }

    fn parse_match(&mut self) -> Result<Node, ParseError> {
        let token = self.expect(TokenType::Match, "'match'")?;
        let scrutinee = self.parse_expression()?;
        self.expect(TokenType::LeftBrace, "'{'")?;

        let mut cases = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            let case_token = self.peek().clone();
            let pattern = self.parse_pattern()?;
            self.expect(TokenType::FatArrow, "'=>'")?;
            let body = if self.check(&TokenType::LeftBrace) {
                self.parse_block()?
            } else {
                self.parse_expression()?
            };
            self.match_token(&TokenType::Comma);
            cases.push(Node::MatchCase {
                pattern,
                body: Box::new(body),
                token: case_token,
            });
        }
        self.expect(TokenType::RightBrace, "'}'")?;

        Ok(Node::Match {
            scrutinee: Box::new(scrutinee),
            cases,
            token,
        })
    }

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.peek().token_type.clone() {
            TokenType::Underscore => {
                self.advance();
                Ok(Pattern::Wildcard)
            }
            TokenType::IntegerLiteral(Some(n)) => {
                self.advance();
                Ok(Pattern::Integer(n))
            }
            TokenType::True => {
                self.advance();
                Ok(Pattern::Bool(true))
            }
            TokenType::False => {
                self.advance();
                Ok(Pattern::Bool(false))
            }
            TokenType::Identifier(_) => {
                let mut segments = Vec::new();
                let (first, _) = self.expect_identifier("pattern")?;
                segments.push(first);
                while self.match_token(&TokenType::DoubleColon) {
                    let (seg, _) = self.expect_identifier("path segment")?;
                    segments.push(seg);
                }
                Ok(Pattern::Path(segments))
            }
            _ => Err(self.unexpected("pattern")),
        }
    }

    // ** Expressions **

    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        self.parse_assignment()
    }

    /// Assignment is right-associative and lowest-precedence.
    fn parse_assignment(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_logic_or()?;

        if self.check(&TokenType::Assign) {
            let token = self.advance();
            let right = self.parse_assignment()?;
            return Ok(Node::Binary {
                op: "=".to_string(),
                left: Box::new(left),
                right: Box::new(right),
                token,
            });
        }

        Ok(left)
    }

    fn parse_logic_or(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_logic_and()?;
        while self.check(&TokenType::Or) {
            let token = self.advance();
            let right = self.parse_logic_and()?;
            left = Node::Binary {
                op: "||".to_string(),
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_logic_and(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenType::And) {
            let token = self.advance();
            let right = self.parse_equality()?;
            left = Node::Binary {
                op: "&&".to_string(),
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Equal => "==",
                TokenType::NotEqual => "!=",
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_comparison()?;
            left = Node::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Less => "<",
                TokenType::LessEqual => "<=",
                TokenType::Greater => ">",
                TokenType::GreaterEqual => ">=",
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_additive()?;
            left = Node::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Plus => "+",
                TokenType::Minus => "-",
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_multiplicative()?;
            left = Node::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Star => "*",
                TokenType::Slash => "/",
                TokenType::Percent => "%",
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_unary()?;
            left = Node::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        let op = match self.peek().token_type {
            TokenType::Ampersand => {
                let token = self.advance();
                let op = if self.match_token(&TokenType::Mut) {
                    "&mut"
                } else {
                    "&"
                };
                let operand = self.parse_unary()?;
                return Ok(Node::Unary {
                    op: op.to_string(),
                    operand: Box::new(operand),
                    token,
                });
            }
            TokenType::Star => "*",
            TokenType::Minus => "-",
            TokenType::Not => "!",
            _ => return self.parse_postfix(),
        };
        let token = self.advance();
        let operand = self.parse_unary()?;
        Ok(Node::Unary {
            op: op.to_string(),
            operand: Box::new(operand),
            token,
        })
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek().token_type {
                TokenType::LeftParen => {
                    let token = self.advance();
                    let mut args = Vec::new();
                    while !self.check(&TokenType::RightParen) {
                        args.push(self.parse_expression()?);
                        if !self.match_token(&TokenType::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenType::RightParen, "')'")?;
                    expr = Node::Call {
                        callee: Box::new(expr),
                        args,
                        token,
                    };
                }
                TokenType::Dot => {
                    let token = self.advance();
                    let (field, _) = self.expect_identifier("field name")?;
                    expr = Node::FieldAccess {
                        object: Box::new(expr),
                        field,
                        token,
                    };
                }
                TokenType::LeftBracket => {
                    let token = self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenType::RightBracket, "']'")?;
                    expr = Node::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        token,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let token = self.peek().clone();
        match token.token_type.clone() {
            TokenType::IntegerLiteral(Some(n)) => {
                self.advance();
                Ok(Node::Literal {
                    value: LiteralValue::Integer(n),
                    token,
                })
            }
            TokenType::FloatLiteral(Some(f)) => {
                self.advance();
                Ok(Node::Literal {
                    value: LiteralValue::Float(f),
                    token,
                })
            }
            TokenType::StringLiteral(s) => {
                self.advance();
                Ok(Node::Literal {
                    value: LiteralValue::Str(s),
                    token,
                })
            }
            TokenType::CharLiteral(Some(c)) => {
                self.advance();
                Ok(Node::Literal {
                    value: LiteralValue::Char(c),
                    token,
                })
            }
            TokenType::True => {
                self.advance();
                Ok(Node::Literal {
                    value: LiteralValue::Bool(true),
                    token,
                })
            }
            TokenType::False => {
                self.advance();
                Ok(Node::Literal {
                    value: LiteralValue::Bool(false),
                    token,
                })
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(Node::VarRef { name, token })
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenType::RightParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    // ** Types **

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        match self.peek().token_type.clone() {
            TokenType::Ampersand => {
                self.advance();
                let mutable = self.match_token(&TokenType::Mut);
                if self.match_token(&TokenType::LeftBracket) {
                    let inner = self.parse_type()?;
                    self.expect(TokenType::RightBracket, "']'")?;
                    Ok(TypeExpr::RefSlice {
                        inner: Box::new(inner),
                        mutable,
                    })
                } else {
                    let inner = self.parse_type()?;
                    Ok(TypeExpr::Ref {
                        inner: Box::new(inner),
                        mutable,
                    })
                }
            }
            TokenType::Star => {
                self.advance();
                let inner = self.parse_type()?;
                Ok(TypeExpr::Pointer(Box::new(inner)))
            }
            TokenType::LeftBracket => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(TokenType::Semicolon, "';'")?;
                // Array length is not used by analysis; accept and discard
                match self.peek().token_type {
                    TokenType::IntegerLiteral(_) => {
                        self.advance();
                    }
                    _ => return Err(self.unexpected("array length")),
                }
                self.expect(TokenType::RightBracket, "']'")?;
                Ok(TypeExpr::Array(Box::new(inner)))
            }
            TokenType::Fn => {
                self.advance();
                self.expect(TokenType::LeftParen, "'('")?;
                let mut params = Vec::new();
                while !self.check(&TokenType::RightParen) {
                    params.push(self.parse_type()?);
                    if !self.match_token(&TokenType::Comma) {
                        break;
                    }
                }
                self.expect(TokenType::RightParen, "')'")?;
                self.expect(TokenType::Arrow, "'->'")?;
                let ret = self.parse_type()?;
                Ok(TypeExpr::Function(params, Box::new(ret)))
            }
            TokenType::Identifier(_) => {
                let (name, _) = self.expect_identifier("type name")?;
                Ok(Self::named_type(&name))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    /// Map a type name to a primitive, a bit-width integer, or a named type.
    fn named_type(name: &str) -> TypeExpr {
        match name {
            "int" => TypeExpr::Int,
            "i8" => TypeExpr::I8,
            "i16" => TypeExpr::I16,
            "i32" => TypeExpr::I32,
            "i64" => TypeExpr::I64,
            "u8" => TypeExpr::U8,
            "u16" => TypeExpr::U16,
            "u32" => TypeExpr::U32,
            "u64" => TypeExpr::U64,
            "f32" => TypeExpr::F32,
            "f64" => TypeExpr::F64,
            "bool" => TypeExpr::Bool,
            "char" => TypeExpr::Char,
            "void" => TypeExpr::Void,
            _ => {
                if let Some(width) = Self::bit_width(name, 'i') {
                    TypeExpr::BitInt(width)
                } else if let Some(width) = Self::bit_width(name, 'u') {
                    TypeExpr::UBitInt(width)
                } else {
                    TypeExpr::Named(name.to_string())
                }
            }
        }
    }

    /// `i24` / `u24` style arbitrary-width integers.
    fn bit_width(name: &str, prefix: char) -> Option<u32> {
        let rest = name.strip_prefix(prefix)?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }

    // ** Helpers **

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, token_type: &TokenType) -> bool {
        &self.peek().token_type == token_type
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType, expected: &str) -> Result<Token, ParseError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else if self.is_at_end() {
            Err(ParseError::UnexpectedEof {
                expected: expected.to_string(),
            })
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<(String, Token), ParseError> {
        if let TokenType::Identifier(name) = self.peek().token_type.clone() {
            let token = self.advance();
            Ok((name, token))
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.peek().clone(),
        }
    }
}
