use clap::Parser;
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vmrename::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vmrename=info,info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {error}");
    }

    let cli = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting vmrename");

    match cli::run(cli).await {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(response) => {
            warn!(
                error_code = %response.error_code,
                message = %response.message,
                "vmrename failed"
            );
            match serde_json::to_string_pretty(&response) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{}: {}", response.error_code, response.message),
            }
            ExitCode::FAILURE
        }
    }
}
