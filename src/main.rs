//! tinyscript - demo of dependency-linked tasks

use std::process::ExitCode;

use tinyscript::exitcode;

fn main() -> ExitCode {
    match tinyscript::cli::run() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exitcode::SOFTWARE as u8)
        }
    }
}
