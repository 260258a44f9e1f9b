//! Article extraction boundary
//!
//! Wraps the external extraction libraries (`readability` for the
//! title and main text, `scraper` for declared page metadata) and
//! normalizes their loosely-typed output into an [`ArticleRecord`] right
//! here, so nothing untyped crosses into filtering or the sink.

use std::io::Cursor;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rustc_hash::FxHashMap;
use scraper::{Html, Selector};
use url::Url;

use crate::transform::ArticleRecord;
use crate::warc::RawRecord;

/// Extraction failed for one page; the record is skipped, the segment
/// continues.
#[derive(Debug)]
pub enum ExtractError {
    EmptyBody,
    Content(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "empty response body"),
            Self::Content(msg) => write!(f, "content extraction failed: {msg}"),
        }
    }
}

impl std::error::Error for ExtractError {}

static META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("valid selector"));
static HTML_TAG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("html").expect("valid selector"));
static TIME_TAG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time[datetime]").expect("valid selector"));

/// Extract one article from a captured HTTP response.
pub fn extract_article(
    raw: &RawRecord,
    collection_timestamp: NaiveDateTime,
) -> Result<ArticleRecord, ExtractError> {
    if raw.body.is_empty() {
        return Err(ExtractError::EmptyBody);
    }
    let html = String::from_utf8_lossy(&raw.body);

    let parsed_url = Url::parse(&raw.url)
        .unwrap_or_else(|_| Url::parse("http://localhost/").expect("valid fallback URL"));
    let mut cursor = Cursor::new(html.as_bytes());
    let product = readability::extractor::extract(&mut cursor, &parsed_url)
        .map_err(|e| ExtractError::Content(e.to_string()))?;

    let document = Html::parse_document(&html);
    let meta = meta_map(&document);

    let title = if product.title.is_empty() {
        meta.get("og:title").cloned().unwrap_or_default()
    } else {
        product.title
    };
    let description = meta
        .get("description")
        .or_else(|| meta.get("og:description"))
        .cloned()
        .unwrap_or_default();
    let author = meta
        .get("author")
        .or_else(|| meta.get("article:author"))
        .cloned()
        .filter(|a| !a.is_empty());

    Ok(ArticleRecord {
        uuid: record_id(&raw.url),
        url: raw.url.clone(),
        host: raw.host.clone(),
        title,
        description,
        body_text: product.text,
        author,
        language: declared_language(&document, &meta),
        publish_date: declared_publish_date(&document, &meta),
        fetch_timestamp: raw.fetch_timestamp,
        collection_timestamp,
    })
}

/// Stable per-article id: first 32 hex chars of the URL's content hash
pub fn record_id(url: &str) -> String {
    blake3::hash(url.as_bytes()).to_hex()[..32].to_string()
}

/// Collect `<meta>` name/property/http-equiv → content pairs, lowercased keys
fn meta_map(document: &Html) -> FxHashMap<String, String> {
    let mut map = FxHashMap::default();
    for element in document.select(&META) {
        let v = element.value();
        let Some(content) = v.attr("content") else {
            continue;
        };
        let Some(key) = v
            .attr("name")
            .or_else(|| v.attr("property"))
            .or_else(|| v.attr("http-equiv"))
        else {
            continue;
        };
        map.entry(key.to_ascii_lowercase())
            .or_insert_with(|| content.trim().to_string());
    }
    map
}

/// Declared page language: `<html lang>`, then meta declarations.
/// Normalized to the lowercase primary subtag ("en-US" → "en").
fn declared_language(document: &Html, meta: &FxHashMap<String, String>) -> Option<String> {
    if let Some(html_elem) = document.select(&HTML_TAG).next() {
        if let Some(lang) = html_elem.value().attr("lang") {
            if let Some(tag) = primary_subtag(lang) {
                return Some(tag);
            }
        }
    }
    meta.get("content-language")
        .or_else(|| meta.get("language"))
        .or_else(|| meta.get("og:locale"))
        .and_then(|l| primary_subtag(l))
}

fn primary_subtag(tag: &str) -> Option<String> {
    let sub = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
    let valid = (2..=3).contains(&sub.len()) && sub.chars().all(|c| c.is_ascii_alphabetic());
    valid.then_some(sub)
}

/// Declared publish date: `article:published_time` and friends, then the
/// first `<time datetime>` element.
fn declared_publish_date(document: &Html, meta: &FxHashMap<String, String>) -> Option<NaiveDate> {
    if let Some(date) = meta
        .get("article:published_time")
        .or_else(|| meta.get("datepublished"))
        .or_else(|| meta.get("date"))
        .and_then(|d| parse_date(d))
    {
        return Some(date);
    }
    document
        .select(&TIME_TAG)
        .filter_map(|t| t.value().attr("datetime"))
        .find_map(parse_date)
}

/// Parse an ISO-ish date string: full RFC 3339 first, then a bare date prefix
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(url: &str, html: &str) -> RawRecord {
        RawRecord {
            url: url.to_string(),
            host: "example.com".to_string(),
            body: html.as_bytes().to_vec(),
            fetch_timestamp: None,
        }
    }

    fn collection_ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("20200101023937", "%Y%m%d%H%M%S").unwrap()
    }

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en-US">
<head>
  <title>Quake shakes coastal town</title>
  <meta name="description" content="A strong earthquake struck on Sunday.">
  <meta name="author" content="A. Reporter">
  <meta property="article:published_time" content="2020-01-05T08:30:00+01:00">
</head>
<body>
  <article>
    <h1>Quake shakes coastal town</h1>
    <p>A strong earthquake struck the coastal town early on Sunday, residents
    said, toppling chimneys and cutting power to thousands of homes.</p>
    <p>Authorities reported no casualties but warned of aftershocks over the
    coming days while inspections continue.</p>
  </article>
</body>
</html>"#;

    #[test]
    fn extracts_metadata_and_text() {
        let record = extract_article(&raw("https://example.com/quake", PAGE), collection_ts())
            .unwrap();
        assert_eq!(record.url, "https://example.com/quake");
        assert_eq!(record.language.as_deref(), Some("en"));
        assert_eq!(
            record.publish_date,
            NaiveDate::from_ymd_opt(2020, 1, 5)
        );
        assert_eq!(record.author.as_deref(), Some("A. Reporter"));
        assert!(record.title.contains("Quake"));
        assert!(record.description.contains("earthquake"));
        assert_eq!(record.uuid.len(), 32);
    }

    #[test]
    fn empty_body_is_error() {
        let record = raw("https://example.com/empty", "");
        assert!(matches!(
            extract_article(&record, collection_ts()),
            Err(ExtractError::EmptyBody)
        ));
    }

    #[test]
    fn missing_metadata_yields_unknowns() {
        let html = "<html><head><title>Bare</title></head><body><p>text</p></body></html>";
        let record = extract_article(&raw("https://example.com/bare", html), collection_ts())
            .unwrap();
        assert_eq!(record.language, None);
        assert_eq!(record.publish_date, None);
        assert_eq!(record.author, None);
    }

    #[test]
    fn publish_date_from_time_element() {
        let html = r#"<html><head><title>T</title></head>
            <body><time datetime="2019-12-31">yesterday</time><p>text</p></body></html>"#;
        let record = extract_article(&raw("https://example.com/t", html), collection_ts())
            .unwrap();
        assert_eq!(record.publish_date, NaiveDate::from_ymd_opt(2019, 12, 31));
    }

    #[test]
    fn primary_subtag_normalizes() {
        assert_eq!(primary_subtag("en-US"), Some("en".to_string()));
        assert_eq!(primary_subtag("pt_BR"), Some("pt".to_string()));
        assert_eq!(primary_subtag("DE"), Some("de".to_string()));
        assert_eq!(primary_subtag(""), None);
        assert_eq!(primary_subtag("x"), None);
        assert_eq!(primary_subtag("12-34"), None);
    }

    #[test]
    fn parse_date_variants() {
        assert_eq!(
            parse_date("2020-01-05T08:30:00Z"),
            NaiveDate::from_ymd_opt(2020, 1, 5)
        );
        assert_eq!(parse_date("2020-01-05"), NaiveDate::from_ymd_opt(2020, 1, 5));
        assert_eq!(parse_date("last Tuesday"), None);
    }

    #[test]
    fn record_id_is_stable_and_distinct() {
        let a = record_id("https://example.com/a");
        let b = record_id("https://example.com/b");
        assert_eq!(a.len(), 32);
        assert_eq!(a, record_id("https://example.com/a"));
        assert_ne!(a, b);
    }
}
