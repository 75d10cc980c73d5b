use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(skip r";[^\n\r]*")] // Skip comments
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    Quote,
    // Bare numerals are i64, the language's only numeric type. The priority
    // wins ties against the symbol rule for all-digit slices.
    #[regex(r"[-+]?[0-9]+", |lex| {
        let slice = lex.slice();
        slice
            .parse::<i64>()
            .map_err(|_| LexerErrorKind::IntegerOutOfRange(slice.to_string()))
    }, priority = 3)]
    Integer(i64),
    #[token("#t", |_| true)]
    #[token("#f", |_| false)]
    Boolean(bool), // #t, #f
    #[regex(r"[a-zA-Z0-9!#$%&*/:<=>?~_^+.-]+", |lex| lex.slice().to_string())]
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

// Implement Display for easy printing
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            TokenKind::Symbol(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Error)]
pub enum LexerErrorKind {
    #[error("integer literal `{0}` does not fit in an i64")]
    IntegerOutOfRange(String),
    #[default]
    #[error("unrecognised token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerResult<T> = Result<T, LexerError>;

// Helper function to tokenize a string directly (useful for tests and parser)
pub fn tokenize(input: &str) -> LexerResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| match result {
            Ok(kind) => Ok(Token {
                kind,
                span: Span {
                    start: range.start,
                    end: range.end,
                },
            }),
            Err(kind) => Err(LexerError {
                kind,
                span: Span {
                    start: range.start,
                    end: range.end,
                },
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to simplify testing token sequences
    fn assert_tokens(input: &str, expected: Vec<TokenKind>) {
        match tokenize(input) {
            Ok(tokens) => {
                let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
                assert_eq!(kinds, expected, "Input: '{}'", input);
            }
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e),
        }
    }

    // Helper to simplify testing for lexer errors
    fn assert_lexer_error(input: &str, expected_error_variant: LexerErrorKind) {
        match tokenize(input) {
            Ok(tokens) => panic!(
                "Expected lexing to fail for input '{}', but got tokens: {:?}",
                input, tokens
            ),
            Err(e) => {
                assert_eq!(
                    std::mem::discriminant(&e.kind),
                    std::mem::discriminant(&expected_error_variant),
                    "Input: '{}', Expected error variant like {:?}, got: {:?}",
                    input,
                    expected_error_variant,
                    e
                );
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert_tokens("", vec![]);
    }

    #[test]
    fn test_parentheses_and_quote() {
        assert_tokens("()", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens("( )", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens(" ' ", vec![TokenKind::Quote]);
        assert_tokens(
            "'(1)",
            vec![
                TokenKind::Quote,
                TokenKind::LParen,
                TokenKind::Integer(1),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_integers() {
        assert_tokens("123", vec![TokenKind::Integer(123)]);
        assert_tokens("-45", vec![TokenKind::Integer(-45)]);
        assert_tokens("+10", vec![TokenKind::Integer(10)]);
        assert_tokens("0", vec![TokenKind::Integer(0)]);
        assert_tokens(
            "9223372036854775807",
            vec![TokenKind::Integer(i64::MAX)],
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        assert_lexer_error(
            "9223372036854775808",
            LexerErrorKind::IntegerOutOfRange(String::new()),
        );
    }

    #[test]
    fn test_booleans() {
        assert_tokens("#t", vec![TokenKind::Boolean(true)]);
        assert_tokens("#f", vec![TokenKind::Boolean(false)]);
        assert_tokens(
            "(#t)",
            vec![
                TokenKind::LParen,
                TokenKind::Boolean(true),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_symbols() {
        assert_tokens("foo", vec![TokenKind::Symbol("foo".to_string())]);
        assert_tokens("+", vec![TokenKind::Symbol("+".to_string())]);
        assert_tokens("-", vec![TokenKind::Symbol("-".to_string())]);
        assert_tokens("*", vec![TokenKind::Symbol("*".to_string())]);
        assert_tokens("/", vec![TokenKind::Symbol("/".to_string())]);
        assert_tokens(">", vec![TokenKind::Symbol(">".to_string())]);
        assert_tokens("mod", vec![TokenKind::Symbol("mod".to_string())]);
        assert_tokens(
            "a-symbol-with-hyphens",
            vec![TokenKind::Symbol("a-symbol-with-hyphens".to_string())],
        );
        assert_tokens("sym123", vec![TokenKind::Symbol("sym123".to_string())]);
    }

    // Slices that look numeric but are not valid i64 literals fall back to
    // the symbol rule via longest match.
    #[test]
    fn test_number_like_symbols() {
        assert_tokens("1-2", vec![TokenKind::Symbol("1-2".to_string())]);
        assert_tokens("12a", vec![TokenKind::Symbol("12a".to_string())]);
        assert_tokens("+-", vec![TokenKind::Symbol("+-".to_string())]);
        assert_tokens("--5", vec![TokenKind::Symbol("--5".to_string())]);
    }

    // Only exactly #t and #f are booleans.
    #[test]
    fn test_boolean_like_symbols() {
        assert_tokens("#true", vec![TokenKind::Symbol("#true".to_string())]);
        assert_tokens("#false", vec![TokenKind::Symbol("#false".to_string())]);
        assert_tokens("#t1", vec![TokenKind::Symbol("#t1".to_string())]);
    }

    #[test]
    fn test_sequences_and_whitespace() {
        assert_tokens(
            "(+ 1 2)",
            vec![
                TokenKind::LParen,
                TokenKind::Symbol("+".to_string()),
                TokenKind::Integer(1),
                TokenKind::Integer(2),
                TokenKind::RParen,
            ],
        );
        assert_tokens(
            "  ( define x 10 )  ",
            vec![
                TokenKind::LParen,
                TokenKind::Symbol("define".to_string()),
                TokenKind::Symbol("x".to_string()),
                TokenKind::Integer(10),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_comments() {
        let input = "
            (define x 10) ; Define x
            ; Another comment line
              (+ x 5)  ; Add 5 to x
              ; Final comment";
        assert_tokens(
            input,
            vec![
                TokenKind::LParen,
                TokenKind::Symbol("define".to_string()),
                TokenKind::Symbol("x".to_string()),
                TokenKind::Integer(10),
                TokenKind::RParen,
                TokenKind::LParen,
                TokenKind::Symbol("+".to_string()),
                TokenKind::Symbol("x".to_string()),
                TokenKind::Integer(5),
                TokenKind::RParen,
            ],
        );
        assert_tokens("; only comment", vec![]);
        assert_tokens(
            "token ; then comment",
            vec![TokenKind::Symbol("token".to_string())],
        );
    }

    #[test]
    fn test_tokenize_spans() {
        let input = "(+ 1)";
        let tokens = tokenize(input).expect("Should tokenize successfully");

        assert_eq!(tokens.len(), 4);

        assert_eq!(tokens[0].kind, TokenKind::LParen);
        assert_eq!(tokens[0].span, Span { start: 0, end: 1 });

        assert_eq!(tokens[1].kind, TokenKind::Symbol("+".to_string()));
        assert_eq!(tokens[1].span, Span { start: 1, end: 2 });

        assert_eq!(tokens[2].kind, TokenKind::Integer(1));
        assert_eq!(tokens[2].span, Span { start: 3, end: 4 });

        assert_eq!(tokens[3].kind, TokenKind::RParen);
        assert_eq!(tokens[3].span, Span { start: 4, end: 5 });
    }

    #[test]
    fn test_full_program() {
        let input = r#"
(define fib
  ; the nth Fibonacci number
  (lambda (n)
    (if (> 2 n)
        n
        (+ (fib (- n 1))
           (fib (- n 2))))))
(fib 10)
"#;
        match tokenize(input) {
            Ok(tokens) => assert_eq!(tokens.len(), 42, "Input: '{}'", input),
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e),
        }
    }
}
