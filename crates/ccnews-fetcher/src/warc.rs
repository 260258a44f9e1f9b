//! Forward-only WARC record walker for CC-News segments
//!
//! A CC-News segment is a multi-member gzip file: every WARC record sits in
//! its own member, so the walker reads through [`MultiGzDecoder`]. Only
//! `WARC-Type: response` records carrying an HTML HTTP payload are surfaced;
//! everything else (warcinfo, requests, metadata, binary payloads) is
//! consumed and skipped. The walk is single-pass and bound to the open
//! segment file; re-parsing means reopening the file.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use flate2::bufread::MultiGzDecoder;

use ccnews_core::SegmentError;

/// One captured HTTP response, before article extraction. Ephemeral: lives
/// only while its segment is being processed.
#[derive(Debug)]
pub struct RawRecord {
    pub url: String,
    pub host: String,
    pub body: Vec<u8>,
    pub fetch_timestamp: Option<NaiveDateTime>,
}

/// Reader stack for an on-disk segment file
pub type SegmentFileReader = BufReader<MultiGzDecoder<BufReader<File>>>;

/// Forward-only walker over the records of one WARC segment.
pub struct WarcReader<R> {
    reader: R,
    responses_seen: usize,
    skipped_non_html: usize,
}

impl WarcReader<SegmentFileReader> {
    /// Open a gzipped segment file from disk.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = BufReader::new(File::open(path)?);
        let gz = MultiGzDecoder::new(file);
        Ok(Self::new(BufReader::new(gz)))
    }
}

impl<R: BufRead> WarcReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            responses_seen: 0,
            skipped_non_html: 0,
        }
    }

    /// HTTP response records encountered so far (HTML or not)
    pub fn responses_seen(&self) -> usize {
        self.responses_seen
    }

    /// Response records skipped for not being a usable HTML page
    pub fn skipped_non_html(&self) -> usize {
        self.skipped_non_html
    }

    /// Advance to the next HTML response record.
    ///
    /// Returns `Ok(None)` at end of segment. A malformed record frame
    /// (missing length, truncated content) aborts the remainder of the
    /// segment; a malformed HTTP payload inside a well-formed record only
    /// skips that record.
    pub fn next_response(&mut self) -> Result<Option<RawRecord>, SegmentError> {
        loop {
            let Some(header) = self.read_record_header()? else {
                return Ok(None);
            };

            let length = header
                .content_length
                .ok_or_else(|| SegmentError::Archive("record without Content-Length".into()))?;
            let mut content = vec![0u8; length];
            self.reader.read_exact(&mut content).map_err(|e| {
                SegmentError::Archive(format!("truncated record content: {e}"))
            })?;

            if header.warc_type.as_deref() != Some("response") {
                continue;
            }
            if !header
                .content_type
                .as_deref()
                .is_some_and(|t| t.contains("application/http"))
            {
                continue;
            }
            let Some(url) = header.target_uri else {
                continue;
            };
            self.responses_seen += 1;

            let Some(payload) = parse_http_response(&content) else {
                self.skipped_non_html += 1;
                continue;
            };
            if !payload.is_html || !(200..300).contains(&payload.status) {
                self.skipped_non_html += 1;
                continue;
            }

            let host = host_of(&url);
            return Ok(Some(RawRecord {
                url,
                host,
                body: payload.body,
                fetch_timestamp: header.date,
            }));
        }
    }

    /// Read one record's WARC header block. `Ok(None)` at clean EOF.
    fn read_record_header(&mut self) -> Result<Option<RecordHeader>, SegmentError> {
        // Skip the CRLF pair separating records
        let version = loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if !line.is_empty() {
                break line;
            }
        };
        if !version.starts_with("WARC/") {
            return Err(SegmentError::Archive(format!(
                "expected WARC version line, got '{}'",
                version.chars().take(32).collect::<String>()
            )));
        }

        let mut header = RecordHeader::default();
        loop {
            let Some(line) = self.read_line()? else {
                return Err(SegmentError::Archive("EOF inside record header".into()));
            };
            if line.is_empty() {
                return Ok(Some(header));
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim() {
                n if n.eq_ignore_ascii_case("WARC-Type") => {
                    header.warc_type = Some(value.to_string());
                }
                n if n.eq_ignore_ascii_case("WARC-Target-URI") => {
                    // Some writers wrap the URI in angle brackets
                    let uri = value.trim_start_matches('<').trim_end_matches('>');
                    header.target_uri = Some(uri.to_string());
                }
                n if n.eq_ignore_ascii_case("WARC-Date") => {
                    header.date = DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|dt| dt.naive_utc());
                }
                n if n.eq_ignore_ascii_case("Content-Length") => {
                    header.content_length = value.parse().ok();
                }
                n if n.eq_ignore_ascii_case("Content-Type") => {
                    header.content_type = Some(value.to_string());
                }
                _ => {}
            }
        }
    }

    /// Read one header line, tolerating non-UTF8 bytes. `None` at EOF.
    fn read_line(&mut self) -> Result<Option<String>, SegmentError> {
        let mut buf = Vec::with_capacity(128);
        let n = self.reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[derive(Default)]
struct RecordHeader {
    warc_type: Option<String>,
    target_uri: Option<String>,
    date: Option<NaiveDateTime>,
    content_length: Option<usize>,
    content_type: Option<String>,
}

struct HttpPayload {
    status: u16,
    is_html: bool,
    body: Vec<u8>,
}

/// Split an embedded HTTP response into status, content type and body.
/// `None` when the payload cannot be parsed as an HTTP response.
fn parse_http_response(content: &[u8]) -> Option<HttpPayload> {
    let (head, body) = split_head_body(content)?;
    let head = String::from_utf8_lossy(head);
    let mut lines = head.lines();

    let status_line = lines.next()?;
    if !status_line.starts_with("HTTP/") {
        return None;
    }
    let status: u16 = status_line.split_whitespace().nth(1)?.parse().ok()?;

    let mut content_type = None;
    let mut chunked = false;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("Content-Type") {
            content_type = Some(value.to_ascii_lowercase());
        } else if name.eq_ignore_ascii_case("Transfer-Encoding") {
            chunked = value.to_ascii_lowercase().contains("chunked");
        }
    }

    let is_html = content_type
        .as_deref()
        .is_some_and(|t| t.contains("html"));
    let body = if chunked {
        dechunk(body)?
    } else {
        body.to_vec()
    };

    Some(HttpPayload {
        status,
        is_html,
        body,
    })
}

fn split_head_body(content: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(i) = find(content, b"\r\n\r\n") {
        return Some((&content[..i], &content[i + 4..]));
    }
    find(content, b"\n\n").map(|i| (&content[..i], &content[i + 2..]))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode a chunked transfer-encoded body. `None` on malformed framing.
fn dechunk(mut data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    loop {
        let line_end = find(data, b"\r\n")?;
        let size_str = std::str::from_utf8(&data[..line_end]).ok()?;
        let size_str = size_str.split(';').next()?.trim();
        let size = usize::from_str_radix(size_str, 16).ok()?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        if data.len() < size {
            return None;
        }
        out.extend_from_slice(&data[..size]);
        data = data.get(size + 2..)?; // skip chunk body and its CRLF
    }
}

/// Lowercased registered host of a URL, without a leading `www.`
fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .map(|h| h.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}
