// Worker - 単一チャンクの実行と結果記録

use crate::processing::{
    config::{ErrorHandler, ResultHandler},
    error::ChunkError,
    metrics::ProcessorMetrics,
    reporting::ProgressReporter,
    types::ChunkOutcome,
};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit};

/// バッチ内の全ワーカーで共有される状態
pub(crate) struct WorkerContext<R> {
    pub(crate) metrics: Arc<ProcessorMetrics>,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) result_handler: Option<ResultHandler<R>>,
    pub(crate) reporter: Arc<dyn ProgressReporter>,
    pub(crate) outcomes: mpsc::Sender<ChunkOutcome<R>>,
}

/// 単一チャンクを処理
///
/// パーミットは変換処理の終了後に必ず返却される（パニック時も含む）。
/// その後で統計とハンドラーに結果を記録する。
/// ハンドラーがパニックしても結果は必ず送信される。
pub(crate) async fn run_chunk<T, R, F, Fut, E>(
    context: Arc<WorkerContext<R>>,
    index: usize,
    chunk: Vec<T>,
    permit: OwnedSemaphorePermit,
    transform: Arc<F>,
) where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send,
    E: Into<anyhow::Error>,
{
    let len = chunk.len();

    let result = {
        let _active = context.metrics.track_active_worker();
        let execution = AssertUnwindSafe(async move { transform(chunk).await }).catch_unwind();
        match execution.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(ChunkError::transform(index, error)),
            Err(payload) => Err(ChunkError::panicked(index, payload)),
        }
    };
    drop(permit);

    match &result {
        Ok(value) => {
            context.metrics.record_completed();
            if let Some(handler) = &context.result_handler {
                call_handler(index, "result", || handler(value));
            }
        }
        Err(error) => {
            context.metrics.record_failed();
            tracing::warn!(index, error = %error, "chunk failed");
            if let Some(handler) = &context.error_handler {
                call_handler(index, "error", || handler(error));
            }
        }
    }
    context.reporter.report_chunk_finished(index, result.is_ok());

    // バッファはチャンク数ちょうどなので満杯にはならない。
    // 受信側が既に閉じている場合（キャンセル後）は結果を捨てる。
    if context
        .outcomes
        .try_send(ChunkOutcome { index, len, result })
        .is_err()
    {
        tracing::debug!(index, "outcome dropped after batch was abandoned");
    }
}

/// 呼び出し側のハンドラーを実行し、パニックはログに残して握りつぶす
fn call_handler(index: usize, kind: &'static str, handler: impl FnOnce()) {
    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(handler)) {
        let panic = ChunkError::panicked(index, payload);
        tracing::warn!(index, handler = kind, error = %panic, "chunk handler panicked");
    }
}
