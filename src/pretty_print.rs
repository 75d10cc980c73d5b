use crate::{EnvError, EvalError, ParseError};
use ariadne::{Label, Report, ReportKind, Source};

impl EvalError {
    pub fn pretty_print(&self, source_name: &str, input: &str) {
        let range = self.span().to_range();
        let report = Report::build(ReportKind::Error, (source_name, range.clone()))
            .with_message(self.to_string())
            .with_label(Label::new((source_name, range)).with_message(match self {
                EvalError::Env(EnvError::UnboundSymbol(..)) => {
                    "this symbol is not defined in the current scope"
                }
                EvalError::Env(EnvError::AlreadyBound(..)) => {
                    "this scope already binds the symbol"
                }
                EvalError::Arity { .. } => "wrong number of arguments in this form",
                EvalError::Type { .. } => "this operand has the wrong type",
                EvalError::Index { .. } => "the list here has no elements",
                EvalError::DivisionByZero(_) => "the divisor evaluates to zero",
                EvalError::Overflow { .. } => "the result does not fit in an integer",
            }));
        report
            .finish()
            .print((source_name, Source::from(input)))
            .unwrap();
    }
}

impl ParseError {
    pub fn pretty_print(&self, source_name: &str, input: &str) {
        let report = match self {
            ParseError::UnexpectedToken { found, expected } => {
                Report::build(ReportKind::Error, (source_name, found.span.to_range()))
                    .with_message(format!("Unexpected token: {}", found.kind))
                    .with_label(
                        Label::new((source_name, found.span.to_range()))
                            .with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::UnexpectedEof(expected) => {
                let idx = input.len();
                Report::build(ReportKind::Error, (source_name, idx..idx))
                    .with_message("Unexpected end of input")
                    .with_label(
                        Label::new((source_name, idx..idx))
                            .with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::Lexer(lex_err) => {
                Report::build(ReportKind::Error, (source_name, lex_err.span.to_range()))
                    .with_message("Lexer Error")
                    .with_label(
                        Label::new((source_name, lex_err.span.to_range()))
                            .with_message(lex_err.kind.to_string()),
                    )
            }
        };
        report
            .finish()
            .print((source_name, Source::from(input)))
            .unwrap();
    }
}
