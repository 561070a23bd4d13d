// src/main.rs

use encore::errors::EncoreError;
use encore::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level, args.format) {
        eprintln!("encore error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(()) => {}
        Err(EncoreError::Cancelled) => {
            // Interrupted sessions exit cleanly.
            eprintln!("Execution cancelled");
        }
        Err(err @ EncoreError::ConfigError(_)) => {
            eprintln!("encore error: {err}");
            eprintln!("run `encore --help` for usage");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("encore error: {err:?}");
            std::process::exit(1);
        }
    }
}
