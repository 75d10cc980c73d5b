use crate::environment::{EnvError, Environment};
use crate::source::Span;
use crate::types::{Closure, Node, Sexpr};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError), // Unbound symbol / already bound, from the environment
    #[error("`{form}` expects {expected} arguments, got {actual}")]
    Arity {
        form: String,
        expected: usize,
        actual: usize,
        span: Span,
    },
    #[error("`{form}` expects {expected}, got {found}")]
    Type {
        form: &'static str,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
    #[error("`{form}` on an empty list")]
    Index { form: &'static str, span: Span },
    #[error("division by zero")]
    DivisionByZero(Span),
    #[error("`{form}` result does not fit in an integer")]
    Overflow { form: &'static str, span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::Env(env_error) => env_error.span(),
            EvalError::Arity { span, .. }
            | EvalError::Type { span, .. }
            | EvalError::Index { span, .. }
            | EvalError::Overflow { span, .. }
            | EvalError::DivisionByZero(span) => *span,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Node> = Result<T, EvalError>;

/// The fixed set of forms with their own evaluation rules. Dispatching
/// through an exhaustive match (rather than string-keyed handler tables)
/// makes a missing case a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Quote,
    Atom,
    Eq,
    If,
    Define,
    Lambda,
    Cons,
    Head,
    Tail,
    Empty,
}

impl SpecialForm {
    pub fn from_symbol(name: &str) -> Option<SpecialForm> {
        match name {
            "+" => Some(SpecialForm::Add),
            "-" => Some(SpecialForm::Sub),
            "*" => Some(SpecialForm::Mul),
            "/" => Some(SpecialForm::Div),
            "mod" => Some(SpecialForm::Mod),
            ">" => Some(SpecialForm::Gt),
            "quote" => Some(SpecialForm::Quote),
            "atom" => Some(SpecialForm::Atom),
            "eq" => Some(SpecialForm::Eq),
            "if" => Some(SpecialForm::If),
            "define" => Some(SpecialForm::Define),
            "lambda" => Some(SpecialForm::Lambda),
            "cons" => Some(SpecialForm::Cons),
            "head" => Some(SpecialForm::Head),
            "tail" => Some(SpecialForm::Tail),
            "empty" => Some(SpecialForm::Empty),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::Add => "+",
            SpecialForm::Sub => "-",
            SpecialForm::Mul => "*",
            SpecialForm::Div => "/",
            SpecialForm::Mod => "mod",
            SpecialForm::Gt => ">",
            SpecialForm::Quote => "quote",
            SpecialForm::Atom => "atom",
            SpecialForm::Eq => "eq",
            SpecialForm::If => "if",
            SpecialForm::Define => "define",
            SpecialForm::Lambda => "lambda",
            SpecialForm::Cons => "cons",
            SpecialForm::Head => "head",
            SpecialForm::Tail => "tail",
            SpecialForm::Empty => "empty",
        }
    }

}

const ALL_SPECIAL_FORMS: [SpecialForm; 16] = [
    SpecialForm::Add,
    SpecialForm::Sub,
    SpecialForm::Mul,
    SpecialForm::Div,
    SpecialForm::Mod,
    SpecialForm::Gt,
    SpecialForm::Quote,
    SpecialForm::Atom,
    SpecialForm::Eq,
    SpecialForm::If,
    SpecialForm::Define,
    SpecialForm::Lambda,
    SpecialForm::Cons,
    SpecialForm::Head,
    SpecialForm::Tail,
    SpecialForm::Empty,
];

/// The special form names, for REPL completion.
pub fn special_form_identifiers() -> HashSet<String> {
    ALL_SPECIAL_FORMS
        .iter()
        .map(|form| form.name().to_string())
        .collect()
}

// --- Evaluate Function ---

/// Evaluates a given AST Node within the specified environment.
///
/// The input tree is never mutated; a reduced head is threaded as a local
/// and the result is a freshly built `Node`.
pub fn evaluate(node: Node, env: Rc<RefCell<Environment>>) -> EvalResult {
    match &node.kind {
        // 1. Self-evaluating atoms: integers, booleans, the empty list,
        //    and closures flowing back through an outer evaluation.
        Sexpr::Integer(_) | Sexpr::Boolean(_) | Sexpr::Nil | Sexpr::Lambda(_) => Ok(node),

        // 2. Symbols: one environment lookup, then the bound value is
        //    itself evaluated in the *current* environment. Bindings may
        //    hold quoted forms that are forced lazily here.
        Sexpr::Symbol(name) => {
            let bound = env.borrow().lookup(name, node.span)?;
            evaluate(bound, env)
        }

        // 3. Lists: special forms, applications, or literal data.
        Sexpr::List(elements) => {
            let [first, operands @ ..] = &elements[..] else {
                // Parsed trees never hold an empty List ('()' is Nil), but
                // evaluation results can be fed back in.
                return Ok(Node::new_nil(node.span));
            };

            // A head that is itself a list reduces first, so immediately
            // invoked lambdas like ((lambda (x) x) 5) work.
            let head = if matches!(first.kind, Sexpr::List(_)) {
                evaluate(first.clone(), env.clone())?
            } else {
                first.clone()
            };

            if let Sexpr::Symbol(name) = &head.kind
                && let Some(form) = SpecialForm::from_symbol(name)
            {
                return eval_special_form(form, operands, env, node.span);
            }

            // Raw-symbol heads resolve through the environment; anything
            // else is expected to reduce to a closure.
            let callee = evaluate(head, env.clone())?;
            match callee.kind {
                Sexpr::Lambda(closure) => apply_closure(&closure, operands, env, node.span),
                // Unmatched lists are literal data: evaluate every element
                // and keep the list shape.
                _ => {
                    let mut items = Vec::with_capacity(elements.len());
                    items.push(callee);
                    for operand in operands {
                        items.push(evaluate(operand.clone(), env.clone())?);
                    }
                    Ok(Node::new(Sexpr::List(items), node.span))
                }
            }
        }
    }
}

fn eval_special_form(
    form: SpecialForm,
    operands: &[Node],
    env: Rc<RefCell<Environment>>,
    span: Span,
) -> EvalResult {
    match form {
        SpecialForm::Add
        | SpecialForm::Sub
        | SpecialForm::Mul
        | SpecialForm::Div
        | SpecialForm::Mod
        | SpecialForm::Gt => eval_arithmetic(form, operands, env, span),

        // quote suppresses evaluation entirely: the operand comes back as
        // written.
        SpecialForm::Quote => {
            let [operand] = operands else {
                return Err(arity_error(form, 1, operands.len(), span));
            };
            Ok(operand.clone())
        }

        SpecialForm::Atom => {
            let [operand] = operands else {
                return Err(arity_error(form, 1, operands.len(), span));
            };
            let value = evaluate(operand.clone(), env)?;
            Ok(Node::new_bool(value.kind.is_atom(), span))
        }

        // eq is value equality on atoms; lists never compare equal.
        SpecialForm::Eq => {
            let [left, right] = operands else {
                return Err(arity_error(form, 2, operands.len(), span));
            };
            let left = evaluate(left.clone(), env.clone())?;
            let right = evaluate(right.clone(), env)?;
            let equal = left.kind.is_atom() && right.kind.is_atom() && left.kind == right.kind;
            Ok(Node::new_bool(equal, span))
        }

        // Exactly one branch is evaluated; everything but #f is truthy.
        SpecialForm::If => {
            let [condition, consequent, alternate] = operands else {
                return Err(arity_error(form, 3, operands.len(), span));
            };
            let condition = evaluate(condition.clone(), env.clone())?;
            if matches!(condition.kind, Sexpr::Boolean(false)) {
                evaluate(alternate.clone(), env)
            } else {
                evaluate(consequent.clone(), env)
            }
        }

        SpecialForm::Define => {
            let [name, value] = operands else {
                return Err(arity_error(form, 2, operands.len(), span));
            };
            let Sexpr::Symbol(name_str) = &name.kind else {
                return Err(EvalError::Type {
                    form: "define",
                    expected: "a symbol",
                    found: name.kind.type_name(),
                    span: name.span,
                });
            };
            let value = evaluate(value.clone(), env.clone())?;
            env.borrow_mut().define(name_str, value, name.span)?;
            Ok(Node::new_nil(span))
        }

        SpecialForm::Lambda => {
            let [params, body] = operands else {
                return Err(arity_error(form, 2, operands.len(), span));
            };
            let params = parameter_names(params)?;
            Ok(Node::new(
                Sexpr::Lambda(Closure {
                    env, // capture the defining environment
                    params,
                    body: Rc::new(body.clone()),
                }),
                span,
            ))
        }

        SpecialForm::Cons => {
            let [item, rest] = operands else {
                return Err(arity_error(form, 2, operands.len(), span));
            };
            let item = evaluate(item.clone(), env.clone())?;
            let rest = evaluate(rest.clone(), env)?;
            let items = match rest.kind {
                Sexpr::Nil => vec![item],
                Sexpr::List(mut items) => {
                    items.insert(0, item);
                    items
                }
                other => {
                    return Err(EvalError::Type {
                        form: "cons",
                        expected: "a list",
                        found: other.type_name(),
                        span: rest.span,
                    });
                }
            };
            Ok(Node::new(Sexpr::List(items), span))
        }

        SpecialForm::Head => {
            let items = eval_list_operand(form, operands, env, span)?;
            match items.first() {
                Some(first) => Ok(first.clone()),
                None => Err(EvalError::Index { form: "head", span }),
            }
        }

        SpecialForm::Tail => {
            let items = eval_list_operand(form, operands, env, span)?;
            if items.is_empty() {
                return Err(EvalError::Index { form: "tail", span });
            }
            Ok(Node::new_list(items[1..].to_vec(), span))
        }

        SpecialForm::Empty => {
            let items = eval_list_operand(form, operands, env, span)?;
            Ok(Node::new_bool(items.is_empty(), span))
        }
    }
}

fn eval_arithmetic(
    form: SpecialForm,
    operands: &[Node],
    env: Rc<RefCell<Environment>>,
    span: Span,
) -> EvalResult {
    let [left, right] = operands else {
        return Err(arity_error(form, 2, operands.len(), span));
    };
    let left = expect_integer(form, evaluate(left.clone(), env.clone())?)?;
    let right = expect_integer(form, evaluate(right.clone(), env)?)?;
    // Checked ops throughout: a `None` here is an i64 overflow, distinct
    // from a zero divisor (`i64::MIN / -1` overflows with a nonzero
    // divisor).
    let result = match form {
        SpecialForm::Add => left.checked_add(right),
        SpecialForm::Sub => left.checked_sub(right),
        SpecialForm::Mul => left.checked_mul(right),
        SpecialForm::Div | SpecialForm::Mod if right == 0 => {
            return Err(EvalError::DivisionByZero(span));
        }
        SpecialForm::Div => left.checked_div(right),
        SpecialForm::Mod => left.checked_rem(right),
        SpecialForm::Gt => return Ok(Node::new_bool(left > right, span)),
        _ => unreachable!("eval_arithmetic only receives arithmetic forms"),
    };
    match result {
        Some(n) => Ok(Node::new_integer(n, span)),
        None => Err(EvalError::Overflow {
            form: form.name(),
            span,
        }),
    }
}

fn expect_integer(form: SpecialForm, node: Node) -> EvalResult<i64> {
    match node.kind {
        Sexpr::Integer(n) => Ok(n),
        other => Err(EvalError::Type {
            form: form.name(),
            expected: "an integer",
            found: other.type_name(),
            span: node.span,
        }),
    }
}

fn eval_list_operand(
    form: SpecialForm,
    operands: &[Node],
    env: Rc<RefCell<Environment>>,
    span: Span,
) -> EvalResult<Vec<Node>> {
    let [operand] = operands else {
        return Err(arity_error(form, 1, operands.len(), span));
    };
    let value = evaluate(operand.clone(), env)?;
    match value.kind {
        Sexpr::Nil => Ok(vec![]),
        Sexpr::List(items) => Ok(items),
        other => Err(EvalError::Type {
            form: form.name(),
            expected: "a list",
            found: other.type_name(),
            span: value.span,
        }),
    }
}

fn parameter_names(params: &Node) -> EvalResult<Vec<String>> {
    let items: &[Node] = match &params.kind {
        Sexpr::Nil => &[],
        Sexpr::List(items) => items,
        other => {
            return Err(EvalError::Type {
                form: "lambda",
                expected: "a parameter list",
                found: other.type_name(),
                span: params.span,
            });
        }
    };
    items
        .iter()
        .map(|item| match &item.kind {
            Sexpr::Symbol(name) => Ok(name.clone()),
            other => Err(EvalError::Type {
                form: "lambda",
                expected: "a symbol",
                found: other.type_name(),
                span: item.span,
            }),
        })
        .collect()
}

fn apply_closure(
    closure: &Closure,
    arguments: &[Node],
    env: Rc<RefCell<Environment>>,
    span: Span,
) -> EvalResult {
    if arguments.len() != closure.params.len() {
        return Err(EvalError::Arity {
            form: format!("{}", Sexpr::Lambda(closure.clone())),
            expected: closure.params.len(),
            actual: arguments.len(),
            span,
        });
    }
    // Arguments evaluate left-to-right in the caller's environment; the
    // parameter frame extends the closure's captured environment.
    let mut bindings = HashMap::with_capacity(arguments.len());
    for (param, argument) in closure.params.iter().zip(arguments) {
        bindings.insert(param.clone(), evaluate(argument.clone(), env.clone())?);
    }
    let frame = Environment::extend(closure.env.clone(), bindings);
    evaluate(closure.body.as_ref().clone(), frame)
}

fn arity_error(form: SpecialForm, expected: usize, actual: usize, span: Span) -> EvalError {
    EvalError::Arity {
        form: form.name().to_string(),
        expected,
        actual,
        span,
    }
}
