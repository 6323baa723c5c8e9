//! Provides the main entry point to the program.
use ::log::error;
use buildopt::cli::run_cli;
use buildopt::log::is_logger_initialised;
use human_panic::{metadata, setup_panic};

fn main() {
    setup_panic!(metadata!().homepage("https://github.com/building-energy-systems/buildopt"));

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }
}
