use pull_core::logging;

mod cli;

#[tokio::main]
async fn main() {
    // Log to the state file; fall back to stderr if it cannot be opened.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli::run_from_args().await {
        eprintln!("pull error: {:#}", err);
        std::process::exit(1);
    }
}
