//! Dataset sink: a dedicated writer thread turning accepted records into
//! rotating Parquet shards
//!
//! Workers hold cloned [`SinkHandle`]s and may call
//! [`accept`](SinkHandle::accept) concurrently; the bounded channel
//! serializes arrival. The writer owns the accumulator and the current
//! shard, so the dataset holds every accepted record exactly once no matter
//! how completion interleaves across workers. Closing the channel (dropping
//! every handle) is what finalizes the dataset.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::thread::JoinHandle;

use ccnews_core::{Accumulator, ErrorFlag, ParquetSink};

use crate::schema;
use crate::transform::{ArticleRecord, ArticlesAccumulator};

/// Rows per output shard before rotating to the next file
const SHARD_MAX_ROWS: usize = 100_000;

/// Records in flight across all workers before senders block
const CHANNEL_CAPACITY: usize = 4096;

/// Cloneable sender half of the dataset sink.
#[derive(Clone)]
pub struct SinkHandle {
    sender: SyncSender<ArticleRecord>,
    error_flag: ErrorFlag,
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle").finish_non_exhaustive()
    }
}

impl SinkHandle {
    /// Queue one accepted record for writing.
    pub fn accept(&self, record: ArticleRecord) -> io::Result<()> {
        // Fast-fail: check if the writer already errored
        if self.error_flag.load(Ordering::Relaxed) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "dataset writer failed",
            ));
        }
        self.sender.send(record).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "dataset channel closed")
        })
    }

    /// Whether the writer has already failed (workers stop claiming work).
    pub fn is_poisoned(&self) -> bool {
        self.error_flag.load(Ordering::Relaxed)
    }
}

/// Receives records from worker threads and writes Parquet shards.
///
/// Runs on a dedicated thread. On error, sets the shared error flag so
/// `SinkHandle` instances fast-fail.
pub struct DatasetWriter {
    rx: Receiver<ArticleRecord>,
    output_dir: PathBuf,
    zstd_level: i32,
    error_flag: ErrorFlag,
}

impl DatasetWriter {
    pub fn run(self) -> io::Result<usize> {
        let result = self.write_loop();
        if result.is_err() {
            self.error_flag.store(true, Ordering::Relaxed);
        }
        result
    }

    fn write_loop(&self) -> io::Result<usize> {
        let mut acc = ArticlesAccumulator::new();
        let mut shard_idx = 0usize;
        let mut current: Option<ParquetSink> = None;
        let mut total_rows = 0usize;

        for record in self.rx.iter() {
            acc.push(record);
            if acc.is_full() {
                total_rows += self.flush(&mut acc, &mut current, &mut shard_idx)?;
            }
        }

        // Final flush on channel close (all senders dropped)
        if !acc.is_empty() {
            total_rows += self.flush(&mut acc, &mut current, &mut shard_idx)?;
        }
        if let Some(sink) = current.take() {
            sink.finalize()?;
        } else if total_rows == 0 {
            // No accepted records still produces a valid (empty) dataset
            let sink = self.new_shard(0)?;
            sink.finalize()?;
        }

        Ok(total_rows)
    }

    fn flush(
        &self,
        acc: &mut ArticlesAccumulator,
        current: &mut Option<ParquetSink>,
        shard_idx: &mut usize,
    ) -> io::Result<usize> {
        let batch = acc.take_batch().map_err(io::Error::other)?;
        let rows = batch.num_rows();

        let sink = match current {
            Some(sink) => sink,
            None => current.insert(self.new_shard(*shard_idx)?),
        };
        sink.write_batch(&batch)?;

        if sink.row_count() >= SHARD_MAX_ROWS {
            let full = current.take().expect("shard sink present after write");
            let rows_in_shard = full.finalize()?;
            log::debug!("articles_{shard_idx:04}: {rows_in_shard} rows");
            *shard_idx += 1;
        }
        Ok(rows)
    }

    fn new_shard(&self, shard_idx: usize) -> io::Result<ParquetSink> {
        ParquetSink::new(
            "articles",
            shard_idx,
            &self.output_dir,
            schema::articles(),
            self.zstd_level,
        )
    }
}

/// Spawn the dataset writer thread; returns the sender handle and the
/// thread handle whose join yields the total rows written.
pub fn spawn_dataset_writer(
    output_dir: &Path,
    zstd_level: i32,
) -> io::Result<(SinkHandle, JoinHandle<io::Result<usize>>)> {
    let (sender, rx) = std::sync::mpsc::sync_channel(CHANNEL_CAPACITY);
    let error_flag: ErrorFlag = Arc::new(AtomicBool::new(false));

    let writer = DatasetWriter {
        rx,
        output_dir: output_dir.to_path_buf(),
        zstd_level,
        error_flag: error_flag.clone(),
    };
    let handle = std::thread::Builder::new()
        .name("dataset-writer".into())
        .spawn(move || writer.run())?;

    Ok((SinkHandle { sender, error_flag }, handle))
}
