//! Segment processing: download, parse, filter, emit

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use std::time::Instant;

use indicatif::ProgressBar;

use ccnews_core::progress::SharedProgress;
use ccnews_core::{
    ScratchFile, SegmentError, WorkQueue, fmt_num, retry_with_backoff, shutdown_flag, stream,
    upgrade_to_bar,
};

use crate::config::RunConfig;
use crate::extract;
use crate::filter::FilterSpec;
use crate::index::SegmentRef;
use crate::sink::SinkHandle;
use crate::stats::{SegmentFailure, SegmentStats};
use crate::warc::WarcReader;

/// Download copy chunk (1 MiB)
const DOWNLOAD_CHUNK: usize = 1024 * 1024;

/// Records between progress-bar refreshes
const UPDATE_INTERVAL: usize = 200;

/// Run fetch→parse→filter for every segment across the worker pool.
///
/// Returns per-segment stats for completed segments and the failure causes
/// for segments that never produced output. A failed segment never affects
/// the others.
pub fn process_segments(
    segments: Vec<SegmentRef>,
    config: &RunConfig,
    sink: &SinkHandle,
    progress: &SharedProgress,
) -> (Vec<SegmentStats>, Vec<SegmentFailure>) {
    let queue = WorkQueue::new(segments);
    let stats: Mutex<Vec<SegmentStats>> = Mutex::new(Vec::new());
    let failures: Mutex<Vec<SegmentFailure>> = Mutex::new(Vec::new());
    let is_tty = progress.is_tty();

    rayon::scope(|s| {
        for _ in 0..config.workers {
            s.spawn(|_| {
                while let Some(segment) = queue.next() {
                    if shutdown_flag().load(Ordering::Relaxed) {
                        break;
                    }
                    if sink.is_poisoned() {
                        break;
                    }
                    let pb = progress.segment_bar(segment.file_stem());
                    pb.set_message("connecting...");

                    match process_segment(segment, config, sink, &pb) {
                        Ok(segment_stats) => {
                            pb.finish_and_clear();
                            if !is_tty {
                                segment_stats.log();
                            }
                            stats
                                .lock()
                                .expect("worker thread panicked")
                                .push(segment_stats);
                        }
                        Err(e) => {
                            pb.finish_and_clear();
                            failures.lock().expect("worker thread panicked").push(
                                SegmentFailure {
                                    location: segment.location.clone(),
                                    cause: e.to_string(),
                                },
                            );
                        }
                    }
                }
            });
        }
    });

    (
        stats.into_inner().expect("worker thread panicked"),
        failures.into_inner().expect("worker thread panicked"),
    )
}

/// Process one segment with retry on transient failures.
fn process_segment(
    segment: &SegmentRef,
    config: &RunConfig,
    sink: &SinkHandle,
    pb: &ProgressBar,
) -> Result<SegmentStats, SegmentError> {
    retry_with_backoff(segment.file_stem(), pb, || {
        attempt_segment(segment, config, sink, pb)
    })
}

fn attempt_segment(
    segment: &SegmentRef,
    config: &RunConfig,
    sink: &SinkHandle,
    pb: &ProgressBar,
) -> Result<SegmentStats, SegmentError> {
    let start = Instant::now();

    // The guard removes the scratch file on every exit path below
    let scratch = ScratchFile::create(&config.scratch_dir, &segment.location)?;
    let url = format!("{}{}", config.base_url, segment.location);
    download_segment(&url, scratch.path(), pb)?;

    pb.set_message("parsing...");
    let mut stats = process_local_segment(scratch.path(), segment, &config.filter, sink, pb)?;
    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// Stream one segment to its scratch file.
fn download_segment(url: &str, dest: &Path, pb: &ProgressBar) -> Result<u64, SegmentError> {
    let (mut reader, counter, total_bytes) = stream::open_byte_reader(url)?;
    if let Some(total) = total_bytes {
        upgrade_to_bar(pb, total);
    }
    pb.set_message("downloading...");

    let mut out = BufWriter::new(File::create(dest)?);
    let mut chunk = vec![0u8; DOWNLOAD_CHUNK];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        out.write_all(&chunk[..n])?;
        pb.set_position(counter.load(Ordering::Relaxed));
    }
    out.flush()?;
    Ok(counter.load(Ordering::Relaxed))
}

/// Walk a downloaded segment: extract each HTML response, filter, emit.
///
/// One malformed page never aborts the rest of the segment; a malformed
/// WARC frame does, surfacing as this segment's failure.
pub fn process_local_segment(
    path: &Path,
    segment: &SegmentRef,
    filter: &FilterSpec,
    sink: &SinkHandle,
    pb: &ProgressBar,
) -> Result<SegmentStats, SegmentError> {
    let start = Instant::now();
    let mut warc = WarcReader::open(path)?;

    let mut extract_errors = 0usize;
    let mut filtered_out = 0usize;
    let mut accepted = 0usize;
    let mut seen = 0usize;

    while let Some(raw) = warc.next_response()? {
        seen += 1;
        if seen % UPDATE_INTERVAL == 0 {
            pb.set_message(format!("{} accepted", fmt_num(accepted)));
        }

        match extract::extract_article(&raw, segment.collection_timestamp) {
            Err(e) => {
                extract_errors += 1;
                log::debug!("{}: dropping {}: {e}", segment.file_stem(), raw.url);
            }
            Ok(article) => {
                if filter.accept(&article) {
                    sink.accept(article).map_err(SegmentError::Io)?;
                    accepted += 1;
                } else {
                    filtered_out += 1;
                }
            }
        }
    }

    Ok(SegmentStats {
        location: segment.location.clone(),
        responses_scanned: warc.responses_seen(),
        skipped_non_html: warc.skipped_non_html(),
        extract_errors,
        filtered_out,
        accepted,
        elapsed: start.elapsed(),
    })
}
