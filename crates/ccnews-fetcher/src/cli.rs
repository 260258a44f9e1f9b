//! CLI argument definitions (clap derive)

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "cc-news-fetcher",
    about = "Assemble a news-article dataset from the Common Crawl CC-News archive"
)]
pub struct Cli {
    /// Directory for the finished dataset (must not already hold one)
    #[arg(long)]
    pub output_folder: PathBuf,

    /// Scratch directory for in-flight WARC downloads
    #[arg(long)]
    pub temp_warc_dir: Option<PathBuf>,

    /// Only keep articles from these hosts (takes precedence over --exclude-hosts)
    #[arg(long, num_args = 1..)]
    pub include_hosts: Vec<String>,

    /// Drop articles from these hosts
    #[arg(long, num_args = 1..)]
    pub exclude_hosts: Vec<String>,

    /// Earliest article publish date to keep (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub article_start_date: Option<NaiveDate>,

    /// Latest article publish date to keep (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub article_end_date: Option<NaiveDate>,

    /// Drop articles whose publish date could not be determined
    #[arg(long)]
    pub article_strict_date: bool,

    /// Earliest WARC collection date to scan (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub warc_start_date: Option<NaiveDate>,

    /// Latest WARC collection date to scan (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub warc_end_date: Option<NaiveDate>,

    /// Only keep articles declared in this language (e.g. "en")
    #[arg(long)]
    pub language: Option<String>,

    /// Number of parallel segment workers
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub num_workers: usize,

    /// Cap the number of segments to process (for trial runs)
    #[arg(long)]
    pub max_segments: Option<usize>,

    /// ZSTD compression level for dataset shards (1-22)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(i32).range(1..=22))]
    pub zstd_level: i32,

    /// Suppress info logs (only warnings and errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging (includes per-record skip reasons)
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_valid() {
        assert_eq!(
            parse_date("2020-01-31"),
            Ok(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap())
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("01/31/2020").is_err());
        assert!(parse_date("2020-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["cc-news-fetcher", "--output-folder", "/tmp/out"]);
        assert_eq!(cli.num_workers, 1);
        assert_eq!(cli.zstd_level, 3);
        assert!(!cli.article_strict_date);
        assert!(cli.include_hosts.is_empty());
    }

    #[test]
    fn host_lists_take_multiple_values() {
        let cli = Cli::parse_from([
            "cc-news-fetcher",
            "--output-folder",
            "/tmp/out",
            "--include-hosts",
            "example.com",
            "news.example.org",
        ]);
        assert_eq!(cli.include_hosts.len(), 2);
    }
}
