// エラーハンドリングの統合テスト
#[path = "../fixtures/mod.rs"]
mod fixtures;

use chunk_pool::{
    CancellationToken, ChunkError, ChunkProcessor, ChunkProcessorConfig, ChunkProcessorError,
};
use fixtures::Recorder;

#[derive(Debug, thiserror::Error)]
#[error("negative value: {0}")]
struct NegativeValue(i64);

fn error_recording_processor(
    max_workers: usize,
    errors: &Recorder<usize>,
    results: &Recorder<i64>,
) -> ChunkProcessor<i64> {
    let error_sink = errors.clone();
    let result_sink = results.clone();
    let config = ChunkProcessorConfig::new()
        .with_max_workers(max_workers)
        .with_error_handler(move |error: &ChunkError| error_sink.push(error.chunk_index()))
        .with_result_handler(move |sum: &i64| result_sink.push(*sum));
    ChunkProcessor::new(config).unwrap()
}

#[test]
fn test_zero_workers_is_rejected() {
    let result = ChunkProcessor::<()>::new(ChunkProcessorConfig::new().with_max_workers(0));
    let error = result.unwrap_err();

    assert!(matches!(error, ChunkProcessorError::ConfigurationError { .. }));
    assert!(error.to_string().contains("max_workers"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_partial_failure_still_returns_ok() {
    let errors = Recorder::new();
    let results = Recorder::new();
    let processor = error_recording_processor(4, &errors, &results);
    let token = CancellationToken::new();

    // 2番目のチャンクだけ負の値を含む
    let items: Vec<i64> = vec![1, 2, 3, -4, 5, 6, 7, 8];
    let summary = processor
        .process_in_chunks(&token, items, |chunk: Vec<i64>| async move {
            if let Some(negative) = chunk.iter().find(|v| **v < 0) {
                return Err(NegativeValue(*negative));
            }
            Ok(chunk.iter().sum::<i64>())
        })
        .await
        .expect("a failed chunk must not fail the batch");

    assert_eq!(summary.total_chunks, 4);
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.failed(), 1);

    assert_eq!(errors.entries(), vec![1]);
    let mut sums = results.entries();
    sums.sort();
    assert_eq!(sums, vec![3, 11, 15]);

    let error = summary.errors().next().unwrap();
    assert!(error.to_string().contains("negative value: -4"));

    let metrics = processor.metrics();
    assert_eq!(metrics.completed, 3);
    assert_eq!(metrics.failed, 1);
    assert_eq!(metrics.finished(), summary.total_chunks as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_chunk_failing() {
    let errors = Recorder::new();
    let results = Recorder::new();
    let processor = error_recording_processor(3, &errors, &results);
    let token = CancellationToken::new();

    let summary = processor
        .process_in_chunks(&token, vec![-1i64; 9], |_chunk: Vec<i64>| async move {
            Err::<i64, _>(anyhow::anyhow!("always fails"))
        })
        .await
        .unwrap();

    assert_eq!(summary.failed(), 3);
    assert_eq!(results.len(), 0);
    let mut indices = errors.entries();
    indices.sort();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(processor.metrics().failed, 3);
    assert_eq!(processor.metrics().completed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panicking_chunk_is_isolated() {
    let errors = Recorder::new();
    let results = Recorder::new();
    let processor = error_recording_processor(3, &errors, &results);
    let token = CancellationToken::new();

    let summary = processor
        .process_in_chunks(&token, vec![1i64, 2, 3], |chunk: Vec<i64>| async move {
            if chunk[0] == 2 {
                panic!("unexpected value");
            }
            Ok::<_, anyhow::Error>(chunk[0])
        })
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 2);
    assert!(summary
        .errors()
        .any(|e| matches!(e, ChunkError::Panicked { index: 1, message } if message == "unexpected value")));
    assert_eq!(errors.entries(), vec![1]);

    // パニック後もパーミットとゲージは元に戻る
    assert_eq!(processor.available_permits(), 3);
    assert_eq!(processor.metrics().active_workers, 0);
    assert_eq!(processor.metrics().finished(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_transform_errors() {
    let errors = Recorder::new();
    let results = Recorder::new();
    let processor = error_recording_processor(2, &errors, &results);
    let token = CancellationToken::new();

    let summary = processor
        .process_in_chunks_blocking(&token, vec![5i64, -5], |chunk| {
            if chunk[0] < 0 {
                Err(NegativeValue(chunk[0]))
            } else {
                Ok(chunk[0])
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(errors.entries(), vec![1]);
    assert_eq!(results.entries(), vec![5]);
}
