//! Binary entrypoint serving the instruct web page.

use std::process::ExitCode;

use instruct_web::start;

fn main() -> ExitCode {
    start::run()
}
