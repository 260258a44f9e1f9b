//! ccnews-fetcher - CC-News article dataset pipeline
//!
//! This crate discovers WARC segments in the Common Crawl CC-News archive
//! by collection date, downloads and parses them concurrently, filters the
//! extracted articles by host, publish date and language, and assembles
//! the accepted records into a Parquet dataset.

pub mod cli;
pub mod config;
pub mod extract;
pub mod filter;
pub mod index;
pub mod runner;
pub mod schema;
pub mod sink;
pub mod stats;
pub mod transform;
pub mod warc;
pub mod worker;

// Re-exports
pub use cli::Cli;
pub use config::{DateRange, RunConfig};
pub use filter::FilterSpec;
pub use index::SegmentRef;
pub use runner::run;
pub use transform::ArticleRecord;
