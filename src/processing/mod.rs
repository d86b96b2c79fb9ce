// チャンク並列処理のモジュール
// 機能別フォルダ構造によるアーキテクチャ

// コアモジュール
pub mod error;        // エラー型定義
pub mod types;        // データ構造定義
pub mod config;       // 設定管理
pub mod partition;    // チャンク分割
pub mod metrics;      // 処理統計

// 機能モジュール
pub mod reporting;          // 進捗報告
pub mod parallel_execution; // 並列実行

// 公開API - 各機能から再エクスポート
pub use config::{ChunkProcessorConfig, ErrorHandler, ResultHandler};
pub use error::{ChunkError, ChunkProcessorError, ProcessorResult};
pub use metrics::{MetricsSnapshot, ProcessorMetrics};
pub use parallel_execution::ChunkProcessor;
pub use reporting::{NoOpProgressReporter, ProgressReporter, TracingProgressReporter};
pub use types::{BatchSummary, ChunkOutcome};
