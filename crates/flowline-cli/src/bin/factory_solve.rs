//! `factory-solve`: factory steady-state solver over stdin/stdout.

use std::process::ExitCode;

fn main() -> ExitCode {
    flowline_cli::drive("factory-solve", |input| {
        flowline_factory::run_document(input)
            .map_err(|e| (e.to_string(), e.is_input_error()))
    })
}
