//! Run configuration resolved from CLI arguments

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use rustc_hash::FxHashSet;

use crate::cli::Cli;
use crate::filter::FilterSpec;

/// Default base URL for Common Crawl data objects
pub const CC_DATA_BASE_URL: &str = "https://data.commoncrawl.org/";

/// Inclusive calendar-date range; either bound may be open.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> anyhow::Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            anyhow::ensure!(s <= e, "date range start {s} is after end {e}");
        }
        Ok(Self { start, end })
    }

    /// Whether `date` falls inside the range (open bounds always match).
    pub fn contains(&self, date: NaiveDate) -> bool {
        if self.start.is_some_and(|s| date < s) {
            return false;
        }
        if self.end.is_some_and(|e| date > e) {
            return false;
        }
        true
    }

    /// Whether any bound is set at all.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Runtime configuration for one pipeline run. Built once, immutable after.
#[derive(Debug)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub warc_date_range: DateRange,
    pub filter: FilterSpec,
    pub workers: usize,
    pub zstd_level: i32,
    pub max_segments: Option<usize>,
    pub base_url: String,
}

impl TryFrom<Cli> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let warc_date_range = DateRange::new(cli.warc_start_date, cli.warc_end_date)
            .context("invalid WARC date range")?;
        let article_date_range = DateRange::new(cli.article_start_date, cli.article_end_date)
            .context("invalid article date range")?;

        if cli.warc_start_date.is_none() {
            log::warn!(
                "no --warc-start-date: scanning from the first CC-News month; this can be costly"
            );
        }
        if cli.warc_end_date.is_none() {
            log::warn!("no --warc-end-date: scanning up to the current month; this can be costly");
        }

        if cli.output_folder.exists() {
            let mut entries = std::fs::read_dir(&cli.output_folder)
                .with_context(|| format!("cannot read {}", cli.output_folder.display()))?;
            anyhow::ensure!(
                entries.next().is_none(),
                "output folder {} already contains files",
                cli.output_folder.display()
            );
        }

        let scratch_dir = cli
            .temp_warc_dir
            .unwrap_or_else(|| std::env::temp_dir().join("cc-news-fetcher"));

        let filter = FilterSpec {
            include_hosts: normalize_hosts(&cli.include_hosts),
            exclude_hosts: normalize_hosts(&cli.exclude_hosts),
            article_date_range,
            strict_date: cli.article_strict_date,
            language: cli.language.map(|l| l.trim().to_ascii_lowercase()),
        };

        Ok(Self {
            output_dir: cli.output_folder,
            scratch_dir,
            warc_date_range,
            filter,
            workers: cli.num_workers,
            zstd_level: cli.zstd_level,
            max_segments: cli.max_segments,
            base_url: CC_DATA_BASE_URL.to_string(),
        })
    }
}

fn normalize_hosts(hosts: &[String]) -> FxHashSet<String> {
    hosts
        .iter()
        .map(|h| h.trim().trim_start_matches("www.").to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}
