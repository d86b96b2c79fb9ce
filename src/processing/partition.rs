// Partition - 入力列をチャンクへ分割する機能

use std::ops::Range;

/// チャンクサイズを計算（切り上げ除算）
///
/// `max_workers` は構築時に1以上であることが検証済み。
pub fn chunk_size(len: usize, max_workers: usize) -> usize {
    len.div_ceil(max_workers.max(1))
}

/// 各チャンクが担当する範囲を計算
///
/// 最後のチャンク以外は全て同じサイズになる。
pub fn chunk_ranges(len: usize, max_workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }

    let size = chunk_size(len, max_workers);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// 所有権付きでチャンクへ分割
///
/// 各チャンクはワーカータスクへ移動されるため、要素をコピーせずに分割する。
pub fn split_into_chunks<T>(items: Vec<T>, max_workers: usize) -> Vec<Vec<T>> {
    let ranges = chunk_ranges(items.len(), max_workers);
    let mut chunks = Vec::with_capacity(ranges.len());
    let mut iter = items.into_iter();

    for range in ranges {
        chunks.push(iter.by_ref().take(range.len()).collect());
    }

    chunks
}
