// 進捗報告の具象実装

use super::traits::ProgressReporter;
use crate::processing::metrics::MetricsSnapshot;

/// tracingイベントとして進捗を出力する実装
#[derive(Debug, Default, Clone)]
pub struct TracingProgressReporter;

impl TracingProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for TracingProgressReporter {
    fn report_started(&self, total_chunks: usize, chunk_size: usize) {
        tracing::info!(total_chunks, chunk_size, "batch started");
    }

    fn report_chunk_finished(&self, index: usize, succeeded: bool) {
        tracing::debug!(index, succeeded, "chunk finished");
    }

    fn report_completed(&self, snapshot: &MetricsSnapshot) {
        tracing::info!(
            completed = snapshot.completed,
            failed = snapshot.failed,
            peak_active_workers = snapshot.peak_active_workers,
            "batch completed"
        );
    }

    fn report_cancelled(&self, dispatched: usize, total_chunks: usize) {
        tracing::info!(dispatched, total_chunks, "batch cancelled");
    }
}

/// 何もしない進捗報告実装（デフォルト）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NoOpProgressReporter {
    fn report_started(&self, _total_chunks: usize, _chunk_size: usize) {}

    fn report_chunk_finished(&self, _index: usize, _succeeded: bool) {}

    fn report_completed(&self, _snapshot: &MetricsSnapshot) {}

    fn report_cancelled(&self, _dispatched: usize, _total_chunks: usize) {}
}
