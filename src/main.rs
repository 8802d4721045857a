//! # Zen Compiler
//!
//! Main entry point for the Zen compiler front end.

use std::process;
use zenc_lib::cli::CliApp;

fn main() {
    let app = CliApp::new();

    match app.run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
