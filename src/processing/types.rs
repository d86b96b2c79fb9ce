// チャンク処理のデータ構造定義

use super::error::ChunkError;
use std::time::Duration;

/// 単一チャンクの処理結果
#[derive(Debug)]
pub struct ChunkOutcome<R> {
    /// 入力順でのチャンク番号
    pub index: usize,
    /// チャンクに含まれる要素数
    pub len: usize,
    pub result: Result<R, ChunkError>,
}

impl<R> ChunkOutcome<R> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// バッチ処理のサマリー
///
/// `outcomes` は完了順に並ぶ。入力順が必要な場合は `sort_by_index` を使う。
#[derive(Debug)]
pub struct BatchSummary<R> {
    pub total_items: usize,
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub outcomes: Vec<ChunkOutcome<R>>,
    pub elapsed: Duration,
}

impl<R> BatchSummary<R> {
    /// 空入力に対するサマリー
    pub fn empty() -> Self {
        Self {
            total_items: 0,
            total_chunks: 0,
            chunk_size: 0,
            outcomes: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// 成功した結果への参照
    pub fn results(&self) -> impl Iterator<Item = &R> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// 失敗したチャンクのエラーへの参照
    pub fn errors(&self) -> impl Iterator<Item = &ChunkError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// 結果を入力順に並べ替える
    pub fn sort_by_index(&mut self) {
        self.outcomes.sort_by_key(|o| o.index);
    }

    /// 成功した結果を取り出す
    pub fn into_results(self) -> Vec<R> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect()
    }
}
