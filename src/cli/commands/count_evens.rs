use crate::processing::{
    partition, ChunkError, ChunkProcessor, ChunkProcessorConfig, MetricsSnapshot,
    TracingProgressReporter,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// count-evensコマンドの実行オプション
#[derive(Debug, Clone, Default)]
pub struct CountEvensOptions {
    pub items: u64,
    pub workers: Option<usize>,
    pub timeout: Option<Duration>,
    pub fail_chunk: Option<usize>,
    pub blocking: bool,
}

/// count-evensコマンドの実行結果
#[derive(Debug, Serialize)]
pub struct CountEvensReport {
    pub total_items: usize,
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub even_count: u64,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub metrics: MetricsSnapshot,
}

/// 1チャンク分の偶数を数える
///
/// 入力は 0..N の連番なので、先頭要素からチャンク番号を逆算できる。
fn count_chunk(chunk: Vec<u64>, chunk_size: usize, fail_chunk: Option<usize>) -> Result<u64> {
    let index = chunk.first().map(|first| *first as usize / chunk_size.max(1));
    if index.is_some() && index == fail_chunk {
        anyhow::bail!("chunk {} rejected by --fail-chunk", index.unwrap_or_default());
    }
    Ok(chunk.into_iter().filter(|n| n % 2 == 0).count() as u64)
}

/// 偶数カウントのバッチを実行してレポートを返す
pub async fn run_count_evens(
    options: &CountEvensOptions,
    cancel: &CancellationToken,
) -> Result<CountEvensReport> {
    let mut config = ChunkProcessorConfig::new()
        .with_reporter(TracingProgressReporter::new())
        .with_error_handler(|error: &ChunkError| {
            tracing::warn!(chunk = error.chunk_index(), %error, "chunk failed");
        })
        .with_result_handler(|count: &u64| {
            tracing::debug!(count, "chunk counted");
        });
    if let Some(workers) = options.workers {
        config = config.with_max_workers(workers);
    }
    if let Some(timeout) = options.timeout {
        config = config.with_timeout(timeout);
    }

    let processor = ChunkProcessor::new(config).context("プロセッサーの作成に失敗しました")?;

    let total_items = usize::try_from(options.items).context("要素数が大きすぎます")?;
    let items: Vec<u64> = (0..options.items).collect();
    let chunk_size = partition::chunk_size(total_items, processor.max_workers());
    let fail_chunk = options.fail_chunk;

    let summary = if options.blocking {
        processor
            .process_in_chunks_blocking(cancel, items, move |chunk| {
                count_chunk(chunk, chunk_size, fail_chunk)
            })
            .await?
    } else {
        processor
            .process_in_chunks(cancel, items, move |chunk| async move {
                count_chunk(chunk, chunk_size, fail_chunk)
            })
            .await?
    };

    Ok(CountEvensReport {
        total_items: summary.total_items,
        total_chunks: summary.total_chunks,
        chunk_size: summary.chunk_size,
        even_count: summary.results().sum(),
        succeeded: summary.succeeded(),
        failed: summary.failed(),
        elapsed_ms: summary.elapsed.as_millis() as u64,
        metrics: processor.metrics(),
    })
}

/// count-evensコマンドを実行して結果を出力
///
/// Ctrl-Cでバッチをキャンセルする。
pub async fn execute_count_evens(options: CountEvensOptions, json: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling batch");
            canceller.cancel();
        }
    });

    let report = run_count_evens(&options, &cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("✅ 処理完了!");
    println!("📊 処理結果:");
    println!("   - 要素数: {}", report.total_items);
    println!(
        "   - チャンク数: {} (サイズ {})",
        report.total_chunks, report.chunk_size
    );
    println!("   - 偶数の個数: {}", report.even_count);
    println!("   - 成功チャンク: {}", report.succeeded);
    println!("   - 失敗チャンク: {}", report.failed);
    println!("   - 最大同時実行数: {}", report.metrics.peak_active_workers);
    println!("   - 処理時間: {}ms", report.elapsed_ms);

    if report.failed > 0 {
        println!("⚠️  {}個のチャンクでエラーが発生しました", report.failed);
    }

    Ok(())
}
