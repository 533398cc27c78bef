//! Toolentry CLI entry point
//!
//! Parses arguments, sets up logging, runs the command and maps its result
//! onto the process exit status.

use clap::Parser;
use toolentry_cli::cli;
use toolentry_cli::core::error::user_friendly_error;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    config.init_logging();

    match cli.execute_with_config(config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
