//! Main execution logic for the CC-News fetcher

use std::process::ExitCode;

use anyhow::Context;

use ccnews_core::progress::SharedProgress;
use ccnews_core::{cleanup_tmp_files, fmt_num, is_shutdown_requested};

use crate::config::RunConfig;
use crate::stats::{self, RunSummary};
use crate::{index, sink, worker};

/// Run the whole pipeline: resolve the index, process segments across the
/// worker pool, finalize the dataset, report the summary.
pub fn run(config: &RunConfig, progress: SharedProgress) -> anyhow::Result<ExitCode> {
    std::fs::create_dir_all(&config.output_dir).context("Cannot create output folder")?;
    std::fs::create_dir_all(&config.scratch_dir).context("Cannot create scratch directory")?;
    cleanup_tmp_files(&config.output_dir).context("Failed to clean stale tmp files")?;

    log::info!(
        "cc-news-fetcher starting: workers={}, output={}, scratch={}",
        config.workers,
        config.output_dir.display(),
        config.scratch_dir.display()
    );

    log::info!("Resolving WARC segment listing...");
    let mut segments = index::resolve(&config.warc_date_range, &config.base_url)
        .context("Cannot enumerate the archive")?;
    if let Some(max) = config.max_segments {
        if segments.len() > max {
            log::info!("limiting run to the first {max} of {} segments", segments.len());
            segments.truncate(max);
        }
    }
    let total = segments.len();
    if total == 0 {
        log::warn!(
            "no WARC segments match the requested collection-date range; the dataset will be empty"
        );
    } else {
        log::info!("{} segments to process", fmt_num(total));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .context("Failed to create thread pool")?;

    let (sink, writer) = sink::spawn_dataset_writer(&config.output_dir, config.zstd_level)
        .context("Failed to start dataset writer")?;

    let (segment_stats, failures) =
        pool.install(|| worker::process_segments(segments, config, &sink, &progress));

    // Drop the last sender → channel closes → writer flushes and finalizes
    drop(sink);
    let rows_written = match writer.join() {
        Ok(Ok(rows)) => rows,
        Ok(Err(e)) => anyhow::bail!("dataset write failed: {e}"),
        Err(_) => anyhow::bail!("dataset writer panicked"),
    };

    let summary = RunSummary::from_segments(&segment_stats, total, failures.len(), rows_written);
    if progress.is_tty() {
        progress.println(summary.format_table());
        if !failures.is_empty() {
            progress.println(stats::format_failures(&failures));
        }
    } else {
        summary.log();
        for f in &failures {
            log::error!("segment failed: {}: {}", f.location, f.cause);
        }
    }

    if is_shutdown_requested() {
        log::warn!("shutdown requested; dataset holds the segments finished so far");
        return Ok(ExitCode::from(130));
    }

    if !failures.is_empty() {
        log::warn!(
            "{} of {} segments failed; their records are missing from the dataset",
            failures.len(),
            total
        );
    }
    log::info!(
        "cc-news-fetcher completed: {} records at {}",
        fmt_num(rows_written),
        config.output_dir.display()
    );
    Ok(ExitCode::SUCCESS)
}
