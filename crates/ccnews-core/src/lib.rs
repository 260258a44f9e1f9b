//! ccnews-core - Common infrastructure for archive ingestion pipelines
//!
//! This crate provides reusable components for downloading, parsing,
//! and storing web-archive data: HTTP streaming with stall detection,
//! scratch-file management, retry, work distribution, Parquet output,
//! and progress/logging plumbing.

pub mod accumulator;
pub mod error;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod scratch;
pub mod shutdown;
pub mod sink;
pub mod stream;
pub mod work_queue;

// Re-exports for convenience
pub use accumulator::{Accumulator, DEFAULT_BATCH_SIZE};
pub use error::SegmentError;
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num, upgrade_to_bar};
pub use retry::{MAX_RETRIES, retry_with_backoff};
pub use scratch::ScratchFile;
pub use shutdown::{
    install_signal_handlers, is_shutdown_requested, request_shutdown, shutdown_flag,
};
pub use sink::{ErrorFlag, ParquetSink, cleanup_tmp_files, is_valid_parquet};
pub use stream::{
    ByteCounter, GzipReader, SegmentReader, StreamError, open_byte_reader, open_gzip_reader,
};
pub use work_queue::WorkQueue;
