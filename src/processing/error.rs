// Custom error types for chunk processing
// バッチ全体のエラーとチャンク単位のエラーを分けて定義

use thiserror::Error;

/// バッチ処理全体に関わるエラー型
///
/// チャンク単位の失敗はここには含まれない。
/// 個々の失敗は `ChunkError` としてハンドラーと `BatchSummary` に渡される。
#[derive(Error, Debug)]
pub enum ChunkProcessorError {
    #[error("処理がキャンセルされました")]
    Cancelled,

    #[error("処理がタイムアウトしました: {timeout_ms}ms")]
    DeadlineExceeded { timeout_ms: u64 },

    #[error("設定エラー: {field} - {reason}")]
    ConfigurationError { field: String, reason: String },

    #[error("ワーカープールが閉じられています")]
    PoolClosed,
}

impl ChunkProcessorError {
    /// タイムアウトエラーの作成
    pub fn deadline_exceeded(timeout: std::time::Duration) -> Self {
        Self::DeadlineExceeded {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// 設定エラーの作成
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// キャンセルまたはタイムアウトによる中断かどうか
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }
}

/// 単一チャンクの失敗
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("チャンク{index}の変換エラー: {source}")]
    Transform {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("チャンク{index}の処理中にパニックが発生しました: {message}")]
    Panicked { index: usize, message: String },
}

impl ChunkError {
    /// 変換エラーの作成
    pub fn transform(index: usize, source: impl Into<anyhow::Error>) -> Self {
        Self::Transform {
            index,
            source: source.into(),
        }
    }

    /// パニックペイロードからエラーを作成
    pub fn panicked(index: usize, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked { index, message }
    }

    /// 失敗したチャンクのインデックス
    pub fn chunk_index(&self) -> usize {
        match self {
            Self::Transform { index, .. } | Self::Panicked { index, .. } => *index,
        }
    }
}

pub type ProcessorResult<T> = std::result::Result<T, ChunkProcessorError>;
