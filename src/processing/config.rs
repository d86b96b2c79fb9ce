// チャンクプロセッサーの設定管理
//
// 設定は構築時に確定し、以後は変更できない。

use super::error::{ChunkError, ChunkProcessorError, ProcessorResult};
use super::reporting::{NoOpProgressReporter, ProgressReporter};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// 失敗したチャンクごとに呼ばれるハンドラー
pub type ErrorHandler = Arc<dyn Fn(&ChunkError) + Send + Sync>;

/// 成功したチャンクごとに呼ばれるハンドラー
pub type ResultHandler<R> = Arc<dyn Fn(&R) + Send + Sync>;

/// チャンクプロセッサーの設定
pub struct ChunkProcessorConfig<R> {
    max_workers: usize,
    error_handler: Option<ErrorHandler>,
    result_handler: Option<ResultHandler<R>>,
    reporter: Arc<dyn ProgressReporter>,
    timeout: Option<Duration>,
}

impl<R> ChunkProcessorConfig<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ChunkError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_result_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.result_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_reporter<P>(mut self, reporter: P) -> Self
    where
        P: ProgressReporter + 'static,
    {
        self.reporter = Arc::new(reporter);
        self
    }

    /// 全バッチに適用するタイムアウト
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    pub fn result_handler(&self) -> Option<&ResultHandler<R>> {
        self.result_handler.as_ref()
    }

    pub fn reporter(&self) -> &Arc<dyn ProgressReporter> {
        &self.reporter
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// 設定値の検証
    pub fn validate(&self) -> ProcessorResult<()> {
        if self.max_workers == 0 {
            return Err(ChunkProcessorError::configuration(
                "max_workers",
                "ワーカー数は1以上である必要があります",
            ));
        }

        if self.timeout == Some(Duration::ZERO) {
            return Err(ChunkProcessorError::configuration(
                "timeout",
                "タイムアウトは0より大きい必要があります",
            ));
        }

        Ok(())
    }
}

impl<R> Default for ChunkProcessorConfig<R> {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get().max(1),
            error_handler: None,
            result_handler: None,
            reporter: Arc::new(NoOpProgressReporter::new()),
            timeout: None,
        }
    }
}

impl<R> Clone for ChunkProcessorConfig<R> {
    fn clone(&self) -> Self {
        Self {
            max_workers: self.max_workers,
            error_handler: self.error_handler.clone(),
            result_handler: self.result_handler.clone(),
            reporter: self.reporter.clone(),
            timeout: self.timeout,
        }
    }
}

impl<R> fmt::Debug for ChunkProcessorConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkProcessorConfig")
            .field("max_workers", &self.max_workers)
            .field("error_handler", &self.error_handler.is_some())
            .field("result_handler", &self.result_handler.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
