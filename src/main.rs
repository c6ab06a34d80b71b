// src/main.rs

use fanout::types::RunStatus;
use fanout::{cli, logging, run};

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(status) => status.exit_code(),
        Err(err) => {
            eprintln!("fanout error: {err}");
            err.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run_main() -> fanout::errors::Result<RunStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
