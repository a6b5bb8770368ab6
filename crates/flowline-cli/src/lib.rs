//! Shared shell for the two solver executables.
//!
//! Each tool reads one document from standard input, writes exactly one
//! document plus a trailing newline to standard output, and reserves
//! standard error for diagnostics. Exit codes: 0 for any well-formed answer
//! (feasible or not), 1 for malformed input, 2 for solver or verifier
//! failure.

use std::io::Read;
use std::process::ExitCode;

/// Exit code for malformed input documents.
pub const EXIT_BAD_INPUT: u8 = 1;
/// Exit code for solver or verification failures.
pub const EXIT_SOLVER_FAILURE: u8 = 2;

/// Drive one solver: read stdin, run, print. `run` returns the answer
/// document or an error plus whether that error was the input's fault.
pub fn drive<F>(tool: &str, run: F) -> ExitCode
where
    F: FnOnce(&str) -> Result<String, (String, bool)>,
{
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("{tool}: failed to read stdin: {e}");
        return ExitCode::from(EXIT_BAD_INPUT);
    }
    match run(&input) {
        Ok(document) => {
            println!("{document}");
            ExitCode::SUCCESS
        }
        Err((message, input_error)) => {
            eprintln!("{tool}: {message}");
            if input_error {
                ExitCode::from(EXIT_BAD_INPUT)
            } else {
                ExitCode::from(EXIT_SOLVER_FAILURE)
            }
        }
    }
}
