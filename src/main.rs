//! pole - Utility pole configuration editor

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = pole_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
