use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use chunk_pool::cli::{execute_count_evens, Cli, Commands, CountEvensOptions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CountEvens {
            items,
            workers,
            timeout_ms,
            fail_chunk,
            blocking,
            json,
        } => {
            let options = CountEvensOptions {
                items,
                workers,
                timeout: timeout_ms.map(Duration::from_millis),
                fail_chunk,
                blocking,
            };
            if let Err(error) = execute_count_evens(options, json).await {
                eprintln!("❌ エラー: {error:#}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
