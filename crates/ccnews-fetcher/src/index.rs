//! Archive index: resolves a collection-date range into WARC segment refs
//!
//! CC-News publishes one `warc.paths.gz` listing per month under
//! `crawl-data/CC-NEWS/<YYYY>/<MM>/`. Each line is the path of one segment,
//! whose collection timestamp is encoded in the file name
//! (`CC-NEWS-YYYYMMDDHHMMSS-NNNNN.warc.gz`).

use std::io::BufRead;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};

use ccnews_core::stream::{self, StreamError};

use crate::config::DateRange;

/// First month with CC-News data
const CC_NEWS_EPOCH: (i32, u32) = (2016, 8);

const INDEX_MAX_RETRIES: u32 = 5;
const INDEX_BASE_DELAY: Duration = Duration::from_secs(2);

/// One WARC segment in the archive. Immutable once resolved; consumed by
/// exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub collection_timestamp: NaiveDateTime,
    pub location: String,
}

impl SegmentRef {
    /// Short display name, e.g. `CC-NEWS-20200101023937-00123`
    pub fn file_stem(&self) -> &str {
        let name = self.location.rsplit('/').next().unwrap_or(&self.location);
        name.strip_suffix(".warc.gz").unwrap_or(name)
    }
}

/// Error resolving the archive index
#[derive(Debug)]
pub enum IndexError {
    /// The archive listing could not be retrieved after retries. Fatal.
    Unavailable(String),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "archive index unavailable: {msg}"),
        }
    }
}

impl std::error::Error for IndexError {}

/// Resolve a collection-date range into the ordered list of segments.
///
/// Returns segments sorted ascending by collection timestamp; an empty list
/// is not an error (the caller produces an empty dataset).
pub fn resolve(range: &DateRange, base_url: &str) -> Result<Vec<SegmentRef>, IndexError> {
    let epoch = NaiveDate::from_ymd_opt(CC_NEWS_EPOCH.0, CC_NEWS_EPOCH.1, 1)
        .expect("valid epoch date");
    let start = range.start.unwrap_or(epoch).max(epoch);
    let end = range.end.unwrap_or_else(|| Utc::now().date_naive());
    if start > end {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for (year, month) in months_between(start, end) {
        let Some(lines) = fetch_month_listing(base_url, year, month)? else {
            log::debug!("no listing for {year}-{month:02} (gap in the archive)");
            continue;
        };
        let before = segments.len();
        segments.extend(lines.iter().filter_map(|l| parse_segment_path(l)));
        log::debug!(
            "{year}-{month:02}: {} segments listed",
            segments.len() - before
        );
    }

    Ok(filter_and_sort(segments, range))
}

/// Enumerate (year, month) pairs between two dates, inclusive
fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    let (end_year, end_month) = (end.year(), end.month());
    while (year, month) <= (end_year, end_month) {
        months.push((year, month));
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    months
}

/// Fetch one monthly listing with retry; `None` when the month has no
/// listing (404; the archive has gaps).
fn fetch_month_listing(
    base_url: &str,
    year: i32,
    month: u32,
) -> Result<Option<Vec<String>>, IndexError> {
    let url = format!("{base_url}crawl-data/CC-NEWS/{year}/{month:02}/warc.paths.gz");
    for attempt in 0..INDEX_MAX_RETRIES {
        match fetch_listing(&url) {
            Ok(lines) => return Ok(Some(lines)),
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) if e.is_retryable() && attempt < INDEX_MAX_RETRIES - 1 => {
                let delay = INDEX_BASE_DELAY * 2u32.pow(attempt);
                log::warn!(
                    "listing {year}-{month:02} failed ({e}), retry {}/{} in {delay:?}",
                    attempt + 1,
                    INDEX_MAX_RETRIES,
                );
                std::thread::sleep(delay);
            }
            Err(e) => return Err(IndexError::Unavailable(format!("{url}: {e}"))),
        }
    }
    Err(IndexError::Unavailable(format!(
        "{url}: {INDEX_MAX_RETRIES} attempts exhausted"
    )))
}

fn fetch_listing(url: &str) -> Result<Vec<String>, StreamError> {
    let (reader, _, _) = stream::open_gzip_reader(url)?;
    let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
    Ok(lines)
}

/// Parse one listing line into a segment ref; `None` for lines that do not
/// follow the CC-News naming scheme.
pub fn parse_segment_path(line: &str) -> Option<SegmentRef> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let name = line.rsplit('/').next()?;
    let stem = name.strip_suffix(".warc.gz")?;
    let digits = stem.strip_prefix("CC-NEWS-")?.get(..14)?;
    let collection_timestamp = NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok()?;
    Some(SegmentRef {
        collection_timestamp,
        location: line.to_string(),
    })
}

/// Keep segments whose collection date falls in the range, ascending order
fn filter_and_sort(mut segments: Vec<SegmentRef>, range: &DateRange) -> Vec<SegmentRef> {
    segments.retain(|s| range.contains(s.collection_timestamp.date()));
    segments.sort_by(|a, b| {
        (a.collection_timestamp, &a.location).cmp(&(b.collection_timestamp, &b.location))
    });
    segments.dedup_by(|a, b| a.location == b.location);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parse_valid_path() {
        let seg = parse_segment_path(
            "crawl-data/CC-NEWS/2020/01/CC-NEWS-20200101023937-00123.warc.gz",
        )
        .unwrap();
        assert_eq!(
            seg.collection_timestamp,
            NaiveDateTime::parse_from_str("20200101023937", "%Y%m%d%H%M%S").unwrap()
        );
        assert_eq!(seg.file_stem(), "CC-NEWS-20200101023937-00123");
    }

    #[test]
    fn parse_rejects_foreign_lines() {
        assert!(parse_segment_path("").is_none());
        assert!(parse_segment_path("   ").is_none());
        assert!(parse_segment_path("crawl-data/CC-NEWS/2020/01/README.txt").is_none());
        assert!(parse_segment_path("crawl-data/CC-MAIN/other-20200101-00000.warc.gz").is_none());
        assert!(parse_segment_path("CC-NEWS-notadate-00123.warc.gz").is_none());
    }

    #[test]
    fn months_between_spans_year_boundary() {
        let months = months_between(d("2019-11-15"), d("2020-02-01"));
        assert_eq!(months, vec![(2019, 11), (2019, 12), (2020, 1), (2020, 2)]);
    }

    #[test]
    fn months_between_single_month() {
        assert_eq!(months_between(d("2020-06-01"), d("2020-06-30")), vec![(2020, 6)]);
    }

    #[test]
    fn filter_and_sort_orders_and_bounds() {
        let mk = |line: &str| parse_segment_path(line).unwrap();
        let segments = vec![
            mk("crawl-data/CC-NEWS/2020/01/CC-NEWS-20200103000000-00002.warc.gz"),
            mk("crawl-data/CC-NEWS/2020/01/CC-NEWS-20200101000000-00001.warc.gz"),
            mk("crawl-data/CC-NEWS/2019/12/CC-NEWS-20191231000000-00099.warc.gz"),
        ];
        let range = DateRange::new(Some(d("2020-01-01")), Some(d("2020-01-31"))).unwrap();

        let sorted = filter_and_sort(segments, &range);
        assert_eq!(sorted.len(), 2);
        assert!(sorted[0].collection_timestamp < sorted[1].collection_timestamp);
        assert!(sorted.iter().all(|s| range.contains(s.collection_timestamp.date())));
    }

    #[test]
    fn filter_and_sort_dedups_repeated_locations() {
        let mk = |line: &str| parse_segment_path(line).unwrap();
        let segments = vec![
            mk("crawl-data/CC-NEWS/2020/01/CC-NEWS-20200101000000-00001.warc.gz"),
            mk("crawl-data/CC-NEWS/2020/01/CC-NEWS-20200101000000-00001.warc.gz"),
        ];
        let sorted = filter_and_sort(segments, &DateRange::default());
        assert_eq!(sorted.len(), 1);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let range = DateRange::new(Some(d("2020-01-01")), Some(d("2020-01-31"))).unwrap();
        let sorted = filter_and_sort(Vec::new(), &range);
        assert!(sorted.is_empty());
    }
}
