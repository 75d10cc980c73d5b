use std::cell::RefCell;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

use lusp::{
    Environment,
    evaluator::{evaluate, special_form_identifiers},
    lexer::{TokenKind, tokenize},
    parser::parse_program,
};

const HISTORY_FILE: &str = "lusp_history.txt";

/// Completes the symbol under the cursor from the bound identifiers plus
/// the special form names.
struct SymbolCompleter {
    env: Rc<RefCell<Environment>>,
}

impl rustyline::completion::Completer for SymbolCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok((
            pos,
            match tokenize(&line[..pos]) {
                Ok(tokens) => {
                    if let Some(TokenKind::Symbol(prefix)) = tokens.last().map(|t| t.kind.clone()) {
                        self.env
                            .borrow()
                            .identifiers()
                            .union(&special_form_identifiers())
                            .filter_map(|id| {
                                id.strip_prefix(&prefix).map(|suffix| suffix.to_string())
                            })
                            .collect()
                    } else {
                        vec![]
                    }
                }
                Err(_) => vec![],
            },
        ))
    }
}

/// Keeps reading lines until every open paren has closed, so multi-line
/// forms work at the prompt.
struct BalanceValidator;

impl Validator for BalanceValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth: i64 = 0;
        let mut in_comment = false;
        for (i, c) in ctx.input().chars().enumerate() {
            match c {
                '\n' => in_comment = false,
                _ if in_comment => {}
                ';' => in_comment = true,
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Ok(ValidationResult::Invalid(Some(format!(
                            "  - Unmatched ')' at position {}",
                            i
                        ))));
                    }
                }
                _ => {}
            }
        }
        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: BalanceValidator,
    #[rustyline(Completer)]
    completer: SymbolCompleter,
}

fn main() -> rustyline::Result<()> {
    println!("lusp v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let global_env = Environment::new();
    let helper = ReplHelper {
        validator: BalanceValidator,
        completer: SymbolCompleter {
            env: global_env.clone(),
        },
    };
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }

    loop {
        let readline = rl.readline("lusp> ");
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match parse_program(input) {
                    Ok(forms) => {
                        for form in forms {
                            match evaluate(form, global_env.clone()) {
                                Ok(value) => println!("{}", value),
                                Err(e) => {
                                    e.pretty_print("repl", input);
                                    break;
                                }
                            }
                        }
                    }
                    Err(parse_err) => parse_err.pretty_print("repl", input),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(HISTORY_FILE)
}
