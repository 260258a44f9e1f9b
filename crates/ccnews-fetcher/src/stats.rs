//! Statistics collection and reporting for the ingestion run.
//!
//! Processing flow: each worker returns one `SegmentStats` (or one
//! `SegmentFailure`) per claimed segment; the coordinator merges them into
//! a `RunSummary` after the pool drains. Workers never touch shared
//! counters directly.

use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use ccnews_core::fmt_num;

/// Per-segment statistics, collected while parsing one WARC file.
#[derive(Debug, Clone, Default)]
pub struct SegmentStats {
    pub location: String,
    /// HTTP response records encountered in the segment
    pub responses_scanned: usize,
    /// Responses skipped for not being a usable HTML page
    pub skipped_non_html: usize,
    /// Pages where article extraction failed
    pub extract_errors: usize,
    /// Extracted articles rejected by the filter chain
    pub filtered_out: usize,
    /// Articles sent to the dataset sink
    pub accepted: usize,
    /// Processing time for this segment (download + parse)
    pub elapsed: Duration,
}

impl SegmentStats {
    fn file_stem(&self) -> &str {
        let name = self.location.rsplit('/').next().unwrap_or(&self.location);
        name.strip_suffix(".warc.gz").unwrap_or(name)
    }

    /// Log segment completion (non-TTY mode only).
    pub fn log(&self) {
        log::info!(
            "{}: {} / {} ({:.1}%) [{:.1}s]",
            self.file_stem(),
            fmt_num(self.accepted),
            fmt_num(self.responses_scanned),
            pct(self.accepted, self.responses_scanned),
            self.elapsed.as_secs_f64()
        );
    }
}

/// One segment that never produced output, with its cause.
#[derive(Debug, Clone)]
pub struct SegmentFailure {
    pub location: String,
    pub cause: String,
}

/// Aggregated statistics for the whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total_segments: usize,
    pub completed_segments: usize,
    pub failed_segments: usize,
    pub responses_scanned: usize,
    pub skipped_non_html: usize,
    pub extract_errors: usize,
    pub filtered_out: usize,
    pub accepted: usize,
    pub rows_written: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Aggregate from individual segment stats.
    pub fn from_segments(
        segments: &[SegmentStats],
        total: usize,
        failed: usize,
        rows_written: usize,
    ) -> Self {
        let mut summary = Self {
            total_segments: total,
            completed_segments: segments.len(),
            failed_segments: failed,
            rows_written,
            ..Default::default()
        };
        for s in segments {
            summary.responses_scanned += s.responses_scanned;
            summary.skipped_non_html += s.skipped_non_html;
            summary.extract_errors += s.extract_errors;
            summary.filtered_out += s.filtered_out;
            summary.accepted += s.accepted;
            summary.elapsed = summary.elapsed.max(s.elapsed); // wall-clock approx
        }
        summary
    }

    /// Format summary table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Run Summary")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
                Cell::new("%").fg(Color::Cyan),
            ]);

        table.add_row(vec![
            Cell::new("Segments"),
            Cell::new(format!(
                "{}/{} ({} failed)",
                self.completed_segments, self.total_segments, self.failed_segments
            )),
            Cell::new(""),
        ]);
        table.add_row(vec![
            Cell::new("Responses scanned"),
            Cell::new(fmt_num(self.responses_scanned)),
            Cell::new(""),
        ]);
        table.add_row(vec![
            Cell::new("Non-HTML skipped"),
            Cell::new(fmt_num(self.skipped_non_html)),
            Cell::new(format!(
                "{:.1}",
                pct(self.skipped_non_html, self.responses_scanned)
            )),
        ]);
        table.add_row(vec![
            Cell::new("Extraction errors"),
            Cell::new(fmt_num(self.extract_errors)),
            Cell::new(format!(
                "{:.1}",
                pct(self.extract_errors, self.responses_scanned)
            )),
        ]);
        table.add_row(vec![
            Cell::new("Filtered out"),
            Cell::new(fmt_num(self.filtered_out)),
            Cell::new(format!(
                "{:.1}",
                pct(self.filtered_out, self.responses_scanned)
            )),
        ]);
        table.add_row(vec![
            Cell::new("Accepted").fg(Color::Green),
            Cell::new(fmt_num(self.accepted)).fg(Color::Green),
            Cell::new(format!("{:.1}", pct(self.accepted, self.responses_scanned)))
                .fg(Color::Green),
        ]);
        table.add_row(vec![
            Cell::new("Rows written"),
            Cell::new(fmt_num(self.rows_written)),
            Cell::new(""),
        ]);

        format!("\n{table}")
    }

    /// Log minimal summary (non-TTY mode).
    pub fn log(&self) {
        log::info!(
            "run complete: {} accepted of {} responses, {}/{} segments ({} failed)",
            fmt_num(self.accepted),
            fmt_num(self.responses_scanned),
            self.completed_segments,
            self.total_segments,
            self.failed_segments
        );
    }
}

/// Format the per-segment failure causes as a table.
pub fn format_failures(failures: &[SegmentFailure]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Failed segment").fg(Color::Red),
            Cell::new("Cause").fg(Color::Red),
        ]);
    for f in failures {
        table.add_row(vec![Cell::new(&f.location), Cell::new(&f.cause)]);
    }
    format!("\n{table}")
}

/// Calculate percentage safely.
fn pct(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_zero_total() {
        assert_eq!(pct(100, 0), 0.0);
    }

    #[test]
    fn pct_normal() {
        assert!((pct(25, 100) - 25.0).abs() < 0.001);
    }

    #[test]
    fn summary_from_segments_empty() {
        let summary = RunSummary::from_segments(&[], 10, 2, 0);
        assert_eq!(summary.total_segments, 10);
        assert_eq!(summary.completed_segments, 0);
        assert_eq!(summary.failed_segments, 2);
        assert_eq!(summary.accepted, 0);
    }

    #[test]
    fn summary_from_segments_aggregates() {
        let segments = vec![
            SegmentStats {
                location: "crawl-data/CC-NEWS/2020/01/CC-NEWS-20200101000000-00001.warc.gz"
                    .to_string(),
                responses_scanned: 1000,
                skipped_non_html: 100,
                extract_errors: 5,
                filtered_out: 800,
                accepted: 95,
                elapsed: Duration::from_secs(10),
            },
            SegmentStats {
                location: "crawl-data/CC-NEWS/2020/01/CC-NEWS-20200102000000-00002.warc.gz"
                    .to_string(),
                responses_scanned: 2000,
                skipped_non_html: 300,
                extract_errors: 10,
                filtered_out: 1500,
                accepted: 190,
                elapsed: Duration::from_secs(15),
            },
        ];

        let summary = RunSummary::from_segments(&segments, 5, 1, 285);

        assert_eq!(summary.total_segments, 5);
        assert_eq!(summary.completed_segments, 2);
        assert_eq!(summary.failed_segments, 1);
        assert_eq!(summary.responses_scanned, 3000);
        assert_eq!(summary.skipped_non_html, 400);
        assert_eq!(summary.extract_errors, 15);
        assert_eq!(summary.filtered_out, 2300);
        assert_eq!(summary.accepted, 285);
        assert_eq!(summary.rows_written, 285);
        // elapsed is max of all segments
        assert_eq!(summary.elapsed, Duration::from_secs(15));
    }

    #[test]
    fn failure_table_lists_causes() {
        let failures = vec![SegmentFailure {
            location: "crawl-data/CC-NEWS/2020/01/CC-NEWS-20200101000000-00001.warc.gz"
                .to_string(),
            cause: "HTTP 500: server error".to_string(),
        }];
        let out = format_failures(&failures);
        assert!(out.contains("CC-NEWS-20200101000000-00001"));
        assert!(out.contains("HTTP 500"));
    }
}
