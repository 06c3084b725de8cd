use glu::error::as_glu_error;
use glu::{cli, logger, ui};

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logger::init() {
        eprintln!("Failed to initialize logger: {e}");
    }

    match cli::main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match as_glu_error(&e) {
                Some(glu_error) => ui::print_error(&glu_error.to_string()),
                None => ui::print_error(&format!("{e:#}")),
            }
            ExitCode::FAILURE
        }
    }
}
