use crate::environment::Environment;
use crate::source::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Sexpr, // The actual S-expression data
    pub span: Span,  // The source span it covers
}

impl Node {
    pub fn new(kind: Sexpr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_integer(n: i64, span: Span) -> Self {
        Node::new(Sexpr::Integer(n), span)
    }

    pub fn new_bool(b: bool, span: Span) -> Self {
        Node::new(Sexpr::Boolean(b), span)
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Node::new(Sexpr::Symbol(name.into()), span)
    }

    pub fn new_nil(span: Span) -> Self {
        Node::new(Sexpr::Nil, span)
    }

    pub fn new_list(items: Vec<Node>, span: Span) -> Self {
        if items.is_empty() {
            Node::new_nil(span)
        } else {
            Node::new(Sexpr::List(items), span)
        }
    }

    /// Builds the `(quote expr)` form the reader sugar `'expr` expands to.
    pub fn new_quote(quoted: Node, quote_span: Span) -> Self {
        let span = quote_span.merge(quoted.span);
        Node::new(
            Sexpr::List(vec![Node::new_symbol("quote", quote_span), quoted]),
            span,
        )
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to Sexpr's Display implementation
        write!(f, "{}", self.kind)
    }
}

/// An S-expression: the core data structure for both code (AST) and the
/// values evaluation produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Symbol(String),   // e.g., +, variable-name, quote
    Integer(i64),     // Bare numerals; the only numeric type
    Boolean(bool),    // #t or #f
    List(Vec<Node>),  // e.g., (+ 1 2); never empty in parsed trees
    Nil,              // The empty list '()
    Lambda(Closure),  // Produced by `lambda`, never written directly
}

impl Sexpr {
    /// Anything that is not a list counts as an atom; `Nil` is atom-like.
    pub fn is_atom(&self) -> bool {
        !matches!(self, Sexpr::List(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Sexpr::Symbol(_) => "symbol",
            Sexpr::Integer(_) => "integer",
            Sexpr::Boolean(_) => "boolean",
            Sexpr::List(_) => "list",
            Sexpr::Nil => "nil",
            Sexpr::Lambda(_) => "closure",
        }
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::Integer(n) => write!(f, "{}", n),
            Sexpr::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Sexpr::List(items) => {
                write!(f, "(")?;
                let mut first = true;
                for item in items {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                    first = false;
                }
                write!(f, ")")
            }
            Sexpr::Nil => write!(f, "()"),
            Sexpr::Lambda(closure) => write!(f, "{}", closure),
        }
    }
}

/// A deferred function value: parameter names, a body expression, and the
/// environment captured at the `lambda` site (lexical scoping).
#[derive(Clone)]
pub struct Closure {
    pub env: Rc<RefCell<Environment>>,
    pub params: Vec<String>,
    pub body: Rc<Node>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured environment may reference this closure; printing it
        // would not terminate.
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<closure/{}>", self.params.len())
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.env, &other.env)
            && self.params == other.params
            && self.body == other.body
    }
}
