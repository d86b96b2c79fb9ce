//! 上限付きワーカープールでチャンク単位の並列処理を行うライブラリ
//!
//! 入力を最大 `max_workers` 個のチャンクへ分割し、呼び出し側の変換関数を
//! 並列に適用する。結果とエラーの集約、統計、協調的キャンセルを提供する。
//!
//! ```no_run
//! use chunk_pool::{ChunkProcessor, ChunkProcessorConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let processor = ChunkProcessor::new(ChunkProcessorConfig::new().with_max_workers(4))?;
//! let token = CancellationToken::new();
//!
//! let summary = processor
//!     .process_in_chunks(&token, (0..100u64).collect(), |chunk| async move {
//!         Ok::<_, anyhow::Error>(chunk.iter().sum::<u64>())
//!     })
//!     .await?;
//! assert_eq!(summary.results().sum::<u64>(), 4950);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod processing;

pub use processing::{
    BatchSummary, ChunkError, ChunkOutcome, ChunkProcessor, ChunkProcessorConfig,
    ChunkProcessorError, MetricsSnapshot, NoOpProgressReporter, ProgressReporter,
    TracingProgressReporter,
};
pub use tokio_util::sync::CancellationToken;
