use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use crate::types::{Node, Sexpr};
use std::iter::Peekable;
use std::vec::IntoIter;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected token `{found}`, expected {expected}")]
    UnexpectedToken { found: Token, expected: String },
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(String),
    #[error(transparent)]
    Lexer(#[from] LexerError),
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // We iterate over owned Tokens, consuming them.
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    /// Parses a single S-expression from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Node> {
        let token = self.next_token();
        self.parse_expr_with_token(token)
    }

    fn parse_expr_with_token(&mut self, token: Option<Token>) -> ParseResult<Node> {
        match token {
            Some(Token {
                kind: TokenKind::LParen,
                span,
            }) => self.parse_list(span),
            Some(Token {
                kind: TokenKind::Quote,
                span,
            }) => {
                // 'expr is reader sugar for (quote expr)
                let quoted = self.parse_expr()?;
                Ok(Node::new_quote(quoted, span))
            }
            Some(token) => self.parse_atom(token),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    /// Parses an atomic expression (symbol, integer, boolean).
    fn parse_atom(&mut self, token: Token) -> ParseResult<Node> {
        Ok(Node::new(
            match token.kind {
                TokenKind::Symbol(s) => Sexpr::Symbol(s),
                TokenKind::Integer(n) => Sexpr::Integer(n),
                TokenKind::Boolean(b) => Sexpr::Boolean(b),
                other => Err(ParseError::UnexpectedToken {
                    found: Token {
                        kind: other,
                        span: token.span,
                    },
                    expected: "an atom, '(' or '''".to_string(),
                })?,
            },
            token.span,
        ))
    }

    /// Parses the elements of a list after its opening paren. `()` is the
    /// empty-list atom, not a zero-element list.
    fn parse_list(&mut self, lparen_span: Span) -> ParseResult<Node> {
        let mut items = Vec::new();
        loop {
            match self.next_token() {
                Some(Token {
                    kind: TokenKind::RParen,
                    span,
                }) => {
                    return Ok(Node::new_list(items, lparen_span.merge(span)));
                }
                Some(token) => items.push(self.parse_expr_with_token(Some(token))?),
                None => return Err(ParseError::UnexpectedEof("')'".to_string())),
            }
        }
    }

    /// Parses exactly one top-level expression and rejects trailing tokens.
    pub fn parse(mut self) -> ParseResult<Node> {
        let expr = self.parse_expr()?;
        if let Some(found) = self.next_token() {
            Err(ParseError::UnexpectedToken {
                found,
                expected: "end of input".to_string(),
            })
        } else {
            Ok(expr)
        }
    }

    /// Parses every top-level expression until the tokens run out.
    pub fn parse_all(mut self) -> ParseResult<Vec<Node>> {
        let mut forms = Vec::new();
        while self.peek_token().is_some() {
            forms.push(self.parse_expr()?);
        }
        Ok(forms)
    }
}

// Helper function to lex and parse a string directly (useful for tests and REPL)
pub fn parse_str(input: &str) -> ParseResult<Node> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}

/// Lexes and parses a whole source file into its top-level forms.
pub fn parse_program(input: &str) -> ParseResult<Vec<Node>> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse_all()
}
