use crate::source::Span;
use crate::types::Node;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("unbound symbol `{0}`")]
    UnboundSymbol(String, Span), // Symbol name, span where lookup happened
    #[error("symbol `{0}` is already defined in this scope")]
    AlreadyBound(String, Span), // Symbol name, span of the offending define
}

impl EnvError {
    pub fn span(&self) -> Span {
        match self {
            EnvError::UnboundSymbol(_, span) | EnvError::AlreadyBound(_, span) => *span,
        }
    }
}

/// One binding frame in the scope chain. Frames are write-once: `define`
/// refuses to rebind a symbol that this frame already holds, so there is no
/// mutation after definition and nothing to roll back on error.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    // Rc<RefCell<...>> so closures can share their captured frame with the
    // evaluator while `define` still works on the global frame.
    parent: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Node>,
}

impl Environment {
    /// Creates a new, top-level (global) environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            parent: None,
            bindings: HashMap::new(),
        }))
    }

    /// Looks up a symbol, walking up the parent chain on a miss.
    ///
    /// `span` is the location where the symbol was referenced, used for
    /// error reporting.
    pub fn lookup(&self, name: &str, span: Span) -> Result<Node, EnvError> {
        if let Some(value) = self.bindings.get(name) {
            Ok(value.clone())
        } else {
            match &self.parent {
                Some(parent) => parent.borrow().lookup(name, span),
                None => Err(EnvError::UnboundSymbol(name.to_string(), span)),
            }
        }
    }

    /// Binds a symbol in *this* frame. Frames are single-assignment:
    /// rebinding a symbol this frame already holds is an error, shadowing a
    /// parent binding is not.
    pub fn define(&mut self, name: &str, value: Node, span: Span) -> Result<(), EnvError> {
        if self.bindings.contains_key(name) {
            return Err(EnvError::AlreadyBound(name.to_string(), span));
        }
        self.bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns a new child frame layering `bindings` over `parent`. The
    /// parent is never touched; lookup falls through to it on a miss.
    pub fn extend(
        parent: Rc<RefCell<Environment>>,
        bindings: HashMap<String, Node>,
    ) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            parent: Some(parent),
            bindings,
        }))
    }

    /// Every identifier bound in this frame or an ancestor (REPL completion).
    pub fn identifiers(&self) -> HashSet<String> {
        let mut names: HashSet<String> = self.bindings.keys().cloned().collect();
        if let Some(parent) = &self.parent {
            names.extend(parent.borrow().identifiers());
        }
        names
    }
}
