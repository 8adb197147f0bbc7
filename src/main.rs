//! Provides the main entry point to the program.
use human_panic::setup_panic;
use incentives::cli::run_cli;
use incentives::log;
use std::process::ExitCode;

fn main() -> ExitCode {
    setup_panic!();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Errors are logged if we got as far as starting the logger
            if log::is_logger_initialised() {
                ::log::error!("{err:?}");
            } else {
                eprintln!("Error: {err:?}");
            }
            ExitCode::FAILURE
        }
    }
}
