//! FILENAME: app/src/main.rs
// PURPOSE: Console entry point. Logs go to the configured unified log file.
// FORMAT: seq|level|category|message

use std::process::ExitCode;

fn main() -> ExitCode {
    match accounting_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("accounting: {}", e);
            ExitCode::FAILURE
        }
    }
}
