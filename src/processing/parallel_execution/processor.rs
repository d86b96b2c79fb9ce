// ChunkProcessor - 上限付きワーカープールによるチャンク並列処理

use super::cancellation::{wait_for_cancellation, Deadline};
use super::worker::{run_chunk, WorkerContext};
use crate::processing::{
    config::ChunkProcessorConfig,
    error::{ChunkProcessorError, ProcessorResult},
    metrics::{MetricsSnapshot, ProcessorMetrics},
    partition,
    types::BatchSummary,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// 入力を最大 `max_workers` 個のチャンクに分割し、並列に変換するプロセッサー
///
/// セマフォと統計は全バッチで共有される。同じインスタンスを複数のバッチに
/// 同時に使った場合も、同時実行数は `max_workers` を超えない。
///
/// キャンセルはパーミット待機時と完了待機時にのみ確認される。
/// 実行中の変換処理は中断されず、キャンセル後もバックグラウンドで完了まで走る。
pub struct ChunkProcessor<R> {
    config: ChunkProcessorConfig<R>,
    semaphore: Arc<Semaphore>,
    metrics: Arc<ProcessorMetrics>,
}

/// 破棄時に起動済みワーカーを中断せず切り離す `JoinSet`
///
/// 呼び出し側が `process_in_chunks` の Future を途中で破棄しても、
/// 実行中のチャンクは最後まで走り、統計とハンドラーに記録される。
struct DetachOnDrop(JoinSet<()>);

impl Drop for DetachOnDrop {
    fn drop(&mut self) {
        if !self.0.is_empty() {
            tracing::debug!(in_flight = self.0.len(), "detaching workers of a dropped batch");
        }
        self.0.detach_all();
    }
}

/// チャンク送出ループの結果
enum Dispatch {
    Completed,
    Interrupted {
        error: ChunkProcessorError,
        dispatched: usize,
    },
}

impl<R> ChunkProcessor<R>
where
    R: Send + 'static,
{
    /// 設定を検証してプロセッサーを作成
    pub fn new(config: ChunkProcessorConfig<R>) -> ProcessorResult<Self> {
        config.validate()?;

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_workers())),
            metrics: Arc::new(ProcessorMetrics::new()),
            config,
        })
    }

    /// デフォルト設定（論理CPU数のワーカー）でプロセッサーを作成
    pub fn with_defaults() -> ProcessorResult<Self> {
        Self::new(ChunkProcessorConfig::default())
    }

    pub fn config(&self) -> &ChunkProcessorConfig<R> {
        &self.config
    }

    pub fn max_workers(&self) -> usize {
        self.config.max_workers()
    }

    /// 現在空いているワーカー枠の数
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// 統計のスナップショットを取得
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 非同期の変換関数で入力をチャンク単位に処理
    ///
    /// 一部のチャンクが失敗しても `Ok` を返す。失敗は `BatchSummary`、
    /// エラーハンドラー、統計から確認する。
    /// 設定にタイムアウトがあればバッチ全体に適用される。
    pub async fn process_in_chunks<T, F, Fut, E>(
        &self,
        cancel: &CancellationToken,
        items: Vec<T>,
        transform: F,
    ) -> ProcessorResult<BatchSummary<R>>
    where
        T: Send + 'static,
        F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let deadline = self.config.timeout().map(Deadline::after);
        self.run_batch(cancel, items, deadline, transform).await
    }

    /// タイムアウト付きでチャンク処理
    ///
    /// 期限に達した場合はキャンセルと同様に扱い、`DeadlineExceeded` を返す。
    pub async fn process_in_chunks_with_timeout<T, F, Fut, E>(
        &self,
        cancel: &CancellationToken,
        items: Vec<T>,
        timeout: Duration,
        transform: F,
    ) -> ProcessorResult<BatchSummary<R>>
    where
        T: Send + 'static,
        F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        self.run_batch(cancel, items, Some(Deadline::after(timeout)), transform)
            .await
    }

    /// CPUバウンドな同期変換関数でチャンク処理
    ///
    /// 各チャンクは `spawn_blocking` 上で実行される。
    pub async fn process_in_chunks_blocking<T, F, E>(
        &self,
        cancel: &CancellationToken,
        items: Vec<T>,
        transform: F,
    ) -> ProcessorResult<BatchSummary<R>>
    where
        T: Send + 'static,
        F: Fn(Vec<T>) -> Result<R, E> + Send + Sync + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let transform = Arc::new(transform);
        let blocking = move |chunk: Vec<T>| {
            let transform = transform.clone();
            async move {
                match tokio::task::spawn_blocking(move || transform(chunk)).await {
                    Ok(result) => result.map_err(Into::<anyhow::Error>::into),
                    // パニックはワーカー側で捕捉させるため再送出する
                    Err(join_error) => match join_error.try_into_panic() {
                        Ok(payload) => std::panic::resume_unwind(payload),
                        Err(join_error) => Err(anyhow::Error::new(join_error)),
                    },
                }
            }
        };

        let deadline = self.config.timeout().map(Deadline::after);
        self.run_batch(cancel, items, deadline, blocking).await
    }

    async fn run_batch<T, F, Fut, E>(
        &self,
        cancel: &CancellationToken,
        items: Vec<T>,
        deadline: Option<Deadline>,
        transform: F,
    ) -> ProcessorResult<BatchSummary<R>>
    where
        T: Send + 'static,
        F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        if items.is_empty() {
            return Ok(BatchSummary::empty());
        }

        let start_time = Instant::now();
        let total_items = items.len();
        let max_workers = self.config.max_workers();
        let chunk_size = partition::chunk_size(total_items, max_workers);
        let chunks = partition::split_into_chunks(items, max_workers);
        let total_chunks = chunks.len();

        self.metrics.record_batch();
        self.config
            .reporter()
            .report_started(total_chunks, chunk_size);
        tracing::debug!(total_items, total_chunks, chunk_size, "dispatching batch");

        // 全ワーカーが待たずに送信できるようチャンク数分のバッファを確保
        let (outcome_tx, mut outcome_rx) = mpsc::channel(total_chunks);
        let context = Arc::new(WorkerContext {
            metrics: self.metrics.clone(),
            error_handler: self.config.error_handler().cloned(),
            result_handler: self.config.result_handler().cloned(),
            reporter: self.config.reporter().clone(),
            outcomes: outcome_tx,
        });
        let transform = Arc::new(transform);
        let mut workers = DetachOnDrop(JoinSet::new());

        let dispatch = self
            .dispatch_chunks(cancel, deadline, chunks, &context, &transform, &mut workers.0)
            .await;
        // ワーカーが保持する送信側だけを残す
        drop(context);

        if let Dispatch::Interrupted { error, dispatched } = dispatch {
            return Err(self.abandon(&mut workers.0, error, dispatched, total_chunks));
        }

        let joined = tokio::select! {
            biased;
            _ = join_all(&mut workers.0) => None,
            error = wait_for_cancellation(cancel, deadline) => Some(error),
        };
        if let Some(error) = joined {
            return Err(self.abandon(&mut workers.0, error, total_chunks, total_chunks));
        }

        let mut outcomes = Vec::with_capacity(total_chunks);
        while let Some(outcome) = outcome_rx.recv().await {
            outcomes.push(outcome);
        }

        self.config.reporter().report_completed(&self.metrics());

        Ok(BatchSummary {
            total_items,
            total_chunks,
            chunk_size,
            outcomes,
            elapsed: start_time.elapsed(),
        })
    }

    /// 入力順にパーミットを取得し、チャンクごとにワーカーを起動
    async fn dispatch_chunks<T, F, Fut, E>(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Deadline>,
        chunks: Vec<Vec<T>>,
        context: &Arc<WorkerContext<R>>,
        transform: &Arc<F>,
        workers: &mut JoinSet<()>,
    ) -> Dispatch
    where
        T: Send + 'static,
        F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        for (index, chunk) in chunks.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                error = wait_for_cancellation(cancel, deadline) => {
                    return Dispatch::Interrupted { error, dispatched: index };
                }
                permit = self.semaphore.clone().acquire_owned() => permit,
            };

            let permit = match permit {
                Ok(permit) => permit,
                // セマフォは閉じないため通常は到達しない
                Err(_) => {
                    return Dispatch::Interrupted {
                        error: ChunkProcessorError::PoolClosed,
                        dispatched: index,
                    };
                }
            };

            workers.spawn(run_chunk(
                context.clone(),
                index,
                chunk,
                permit,
                transform.clone(),
            ));
        }

        Dispatch::Completed
    }

    /// 中断されたバッチを手放す
    ///
    /// 起動済みのワーカーは中断せず切り離す。パーミットはワーカー終了時に非同期で返却される。
    fn abandon(
        &self,
        workers: &mut JoinSet<()>,
        error: ChunkProcessorError,
        dispatched: usize,
        total_chunks: usize,
    ) -> ChunkProcessorError {
        let in_flight = workers.len();
        workers.detach_all();

        tracing::info!(
            dispatched,
            total_chunks,
            in_flight,
            reason = %error,
            "batch abandoned"
        );
        self.config
            .reporter()
            .report_cancelled(dispatched, total_chunks);

        error
    }
}

impl<R> std::fmt::Debug for ChunkProcessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkProcessor")
            .field("config", &self.config)
            .field("available_permits", &self.semaphore.available_permits())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// 全ワーカーの終了を待機
async fn join_all(workers: &mut JoinSet<()>) {
    while let Some(joined) = workers.join_next().await {
        if let Err(error) = joined {
            // 変換処理とハンドラーのパニックはワーカー内で捕捉済み
            tracing::warn!(error = %error, "chunk worker terminated abnormally");
        }
    }
}
