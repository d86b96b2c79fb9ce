use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chunk_pool")]
#[command(about = "Run batches through a bounded pool of chunk workers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count even numbers in 0..ITEMS, one chunk per worker
    CountEvens {
        /// Number of integers to generate
        #[arg(short, long, default_value = "1000000")]
        items: u64,

        /// Maximum number of concurrent workers (defaults to the CPU count)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Abort the batch after this many milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Make the chunk with this index fail
        #[arg(long)]
        fail_chunk: Option<usize>,

        /// Run the transform on the blocking thread pool
        #[arg(long)]
        blocking: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
