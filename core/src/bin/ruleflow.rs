//! ruleflow CLI
//!
//! Evaluates workflow definition files against JSON input without writing any host code.
//! Useful for trying out rules and validating definition files in CI.

use ruleflow_core::cli;

fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
