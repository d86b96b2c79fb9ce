// 進捗報告のトレイト定義

use crate::processing::metrics::MetricsSnapshot;
use mockall::automock;

/// バッチ進捗の報告を抽象化するトレイト
///
/// `report_chunk_finished` はワーカータスクから呼ばれるため、
/// 実装は長時間ブロックしてはならない。
#[automock]
pub trait ProgressReporter: Send + Sync {
    /// バッチ開始時の報告
    fn report_started(&self, total_chunks: usize, chunk_size: usize);

    /// チャンク終了時の報告
    fn report_chunk_finished(&self, index: usize, succeeded: bool);

    /// バッチ完了時の報告
    fn report_completed(&self, snapshot: &MetricsSnapshot);

    /// キャンセル時の報告
    fn report_cancelled(&self, dispatched: usize, total_chunks: usize);
}
