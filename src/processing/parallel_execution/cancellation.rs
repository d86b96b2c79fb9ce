// Cancellation - 中断シグナルの待機

use crate::processing::error::ChunkProcessorError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// バッチに適用される期限
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    /// 現在時刻から `timeout` 後の期限を作成
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// キャンセルまたは期限到達まで待機し、対応するエラーを返す
///
/// 両方が同時に成立している場合はキャンセルを優先する。
pub async fn wait_for_cancellation(
    cancel: &CancellationToken,
    deadline: Option<Deadline>,
) -> ChunkProcessorError {
    match deadline {
        Some(deadline) => tokio::select! {
            biased;
            _ = cancel.cancelled() => ChunkProcessorError::Cancelled,
            _ = tokio::time::sleep_until(deadline.at) => {
                ChunkProcessorError::deadline_exceeded(deadline.timeout)
            }
        },
        None => {
            cancel.cancelled().await;
            ChunkProcessorError::Cancelled
        }
    }
}
