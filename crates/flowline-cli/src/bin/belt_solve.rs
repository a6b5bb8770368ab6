//! `belt-solve`: bounded-flow belt solver over stdin/stdout.

use std::process::ExitCode;

fn main() -> ExitCode {
    flowline_cli::drive("belt-solve", |input| {
        flowline_belts::run_document(input)
            .map_err(|e| (e.to_string(), e.is_input_error()))
    })
}
