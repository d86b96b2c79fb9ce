// チャンク処理の統合テスト
#[path = "../fixtures/mod.rs"]
mod fixtures;

use chunk_pool::{CancellationToken, ChunkProcessor, ChunkProcessorConfig};
use fixtures::{count_evens, ConcurrencyTracker, Recorder};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_million_items_five_workers() {
    let results = Recorder::new();
    let sink = results.clone();
    let config = ChunkProcessorConfig::new()
        .with_max_workers(5)
        .with_result_handler(move |count: &u64| sink.push(*count));
    let processor = ChunkProcessor::new(config).unwrap();
    let token = CancellationToken::new();

    let summary = processor
        .process_in_chunks(&token, (0..1_000_000u64).collect(), count_evens)
        .await
        .unwrap();

    assert_eq!(summary.total_items, 1_000_000);
    assert_eq!(summary.total_chunks, 5);
    assert!(summary.outcomes.iter().all(|o| o.len == 200_000));
    assert_eq!(summary.results().sum::<u64>(), 500_000);

    assert_eq!(results.len(), 5);
    assert_eq!(results.entries().iter().sum::<u64>(), 500_000);

    let metrics = processor.metrics();
    assert_eq!(metrics.completed, 5);
    assert_eq!(metrics.failed, 0);
    assert_eq!(metrics.active_workers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_max_workers() {
    for max_workers in [1usize, 2, 3, 8] {
        let processor = ChunkProcessor::<usize>::new(
            ChunkProcessorConfig::new().with_max_workers(max_workers),
        )
        .unwrap();
        let tracker = ConcurrencyTracker::new();
        let token = CancellationToken::new();

        let worker_tracker = tracker.clone();
        let summary = processor
            .process_in_chunks(&token, (0..50u32).collect(), move |chunk| {
                let tracker = worker_tracker.clone();
                async move {
                    let _guard = tracker.enter();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok::<_, anyhow::Error>(chunk.len())
                }
            })
            .await
            .unwrap();

        assert!(tracker.high_water() <= max_workers);
        assert_eq!(tracker.calls(), summary.total_chunks);
        assert_eq!(summary.results().sum::<usize>(), 50);
    }
}

#[tokio::test]
async fn test_outcomes_can_be_restored_to_input_order() {
    let processor =
        ChunkProcessor::<Vec<String>>::new(ChunkProcessorConfig::new().with_max_workers(4)).unwrap();
    let token = CancellationToken::new();
    let items: Vec<String> = (0..13).map(|i| format!("item-{i}")).collect();

    let mut summary = processor
        .process_in_chunks(&token, items.clone(), |chunk: Vec<String>| async move {
            // 短いチャンクほど早く終わる
            let delay = chunk.len() as u64 * 5;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, anyhow::Error>(chunk)
        })
        .await
        .unwrap();

    summary.sort_by_index();
    let indices: Vec<usize> = summary.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    let rebuilt: Vec<String> = summary.into_results().into_iter().flatten().collect();
    assert_eq!(rebuilt, items);
}

#[tokio::test]
async fn test_processor_reused_across_batches() {
    let processor =
        ChunkProcessor::<u64>::new(ChunkProcessorConfig::new().with_max_workers(2)).unwrap();
    let token = CancellationToken::new();

    let mut last = processor.metrics();
    for size in [0u64, 1, 7, 100] {
        let before = processor.metrics();
        let summary = processor
            .process_in_chunks(&token, (0..size).collect(), count_evens)
            .await
            .unwrap();
        let after = processor.metrics();

        assert_eq!(after.delta_since(&before).completed as usize, summary.total_chunks);
        assert!(after.completed >= last.completed);
        assert!(after.failed >= last.failed);
        last = after;
    }

    // 空のバッチはカウントされない
    assert_eq!(processor.metrics().batches, 3);
    assert_eq!(processor.metrics().completed, 1 + 2 + 2);
    assert_eq!(processor.available_permits(), 2);
}
