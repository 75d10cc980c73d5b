use std::fs;
use std::process::ExitCode;

use lusp::environment::Environment;
use lusp::evaluator::evaluate;
use lusp::parser::parse_program;

/// Runs each file from the command line against one global environment,
/// printing the value of every top-level form.
fn main() -> ExitCode {
    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        eprintln!("usage: lusp FILE...");
        return ExitCode::FAILURE;
    }

    let global_env = Environment::new();
    for path in files {
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("lusp: {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        };
        let forms = match parse_program(&source) {
            Ok(forms) => forms,
            Err(e) => {
                e.pretty_print(&path, &source);
                return ExitCode::FAILURE;
            }
        };
        for form in forms {
            match evaluate(form, global_env.clone()) {
                Ok(value) => println!("{}", value),
                Err(e) => {
                    e.pretty_print(&path, &source);
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}
