// Metrics - ロックフリーな処理統計

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// プロセッサーの累積統計
///
/// 全てのフィールドはアトミックで、ワーカーから同時に更新される。
/// カウンタはバッチ間でリセットされない。
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    completed: AtomicU64,
    failed: AtomicU64,
    active_workers: AtomicUsize,
    peak_active_workers: AtomicUsize,
    batches: AtomicU64,
}

impl ProcessorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功したチャンクを記録
    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// 失敗したチャンクを記録
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// 空でないバッチの開始を記録
    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// 実行中ワーカー数を増やし、ドロップ時に減らすガードを返す
    pub fn track_active_worker(&self) -> ActiveWorkerGuard<'_> {
        let active = self.active_workers.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_active_workers.fetch_max(active, Ordering::Relaxed);
        ActiveWorkerGuard { metrics: self }
    }

    /// 現時点のスナップショットを取得
    ///
    /// 各フィールドは個別に読み取るため、フィールド間の厳密な一貫性は保証しない。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            active_workers: self.active_workers.load(Ordering::Acquire),
            peak_active_workers: self.peak_active_workers.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }
}

/// 実行中ゲージを管理するRAIIガード
///
/// 変換処理がパニックしてもゲージが戻るようにドロップで減算する。
pub struct ActiveWorkerGuard<'a> {
    metrics: &'a ProcessorMetrics,
}

impl Drop for ActiveWorkerGuard<'_> {
    fn drop(&mut self) {
        self.metrics.active_workers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// 統計のスナップショット
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub active_workers: usize,
    pub peak_active_workers: usize,
    pub batches: u64,
}

impl MetricsSnapshot {
    /// 終了したチャンクの合計
    pub fn finished(&self) -> u64 {
        self.completed + self.failed
    }

    /// 以前のスナップショットからの差分を計算
    ///
    /// バッチ単位の統計が必要な場合は実行前後のスナップショットを比較する。
    /// ゲージ系のフィールドは現在値をそのまま保持する。
    pub fn delta_since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            completed: self.completed.saturating_sub(earlier.completed),
            failed: self.failed.saturating_sub(earlier.failed),
            active_workers: self.active_workers,
            peak_active_workers: self.peak_active_workers,
            batches: self.batches.saturating_sub(earlier.batches),
        }
    }
}
