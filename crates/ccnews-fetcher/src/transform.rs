//! Article record type and its Arrow batch accumulator

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch, StringArray};
use arrow::error::ArrowError;
use chrono::{NaiveDate, NaiveDateTime};

use ccnews_core::{Accumulator, DEFAULT_BATCH_SIZE};

use crate::schema;

/// One extracted, normalized news article, the unit of output.
///
/// `url` is never empty; the other textual fields may be empty when
/// extraction only partially succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub uuid: String,
    pub url: String,
    pub host: String,
    pub title: String,
    pub description: String,
    pub body_text: String,
    pub author: Option<String>,
    pub language: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub fetch_timestamp: Option<NaiveDateTime>,
    pub collection_timestamp: NaiveDateTime,
}

/// Accumulator for article rows: collects columns then produces `RecordBatch`
pub struct ArticlesAccumulator {
    uuid: Vec<String>,
    url: Vec<String>,
    source_domain: Vec<String>,
    title: Vec<String>,
    description: Vec<String>,
    maintext: Vec<String>,
    author: Vec<Option<String>>,
    language: Vec<Option<String>>,
    date_publish: Vec<Option<String>>,
    date_download: Vec<Option<String>>,
    date_collected: Vec<String>,
}

impl Default for ArticlesAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticlesAccumulator {
    pub fn new() -> Self {
        Self {
            uuid: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            url: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            source_domain: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            title: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            description: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            maintext: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            author: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            language: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            date_publish: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            date_download: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            date_collected: Vec::with_capacity(DEFAULT_BATCH_SIZE),
        }
    }
}

impl Accumulator for ArticlesAccumulator {
    type Row = ArticleRecord;

    fn push(&mut self, row: ArticleRecord) {
        self.uuid.push(row.uuid);
        self.url.push(row.url);
        self.source_domain.push(row.host);
        self.title.push(row.title);
        self.description.push(row.description);
        self.maintext.push(row.body_text);
        self.author.push(row.author);
        self.language.push(row.language);
        self.date_publish
            .push(row.publish_date.map(|d| d.format("%Y-%m-%d").to_string()));
        self.date_download
            .push(row.fetch_timestamp.map(fmt_timestamp));
        self.date_collected
            .push(fmt_timestamp(row.collection_timestamp));
    }

    fn len(&self) -> usize {
        self.uuid.len()
    }

    fn take_batch(&mut self) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(std::mem::take(&mut self.uuid))),
            Arc::new(StringArray::from(std::mem::take(&mut self.url))),
            Arc::new(StringArray::from(std::mem::take(&mut self.source_domain))),
            Arc::new(StringArray::from(std::mem::take(&mut self.title))),
            Arc::new(StringArray::from(std::mem::take(&mut self.description))),
            Arc::new(StringArray::from(std::mem::take(&mut self.maintext))),
            Arc::new(StringArray::from(std::mem::take(&mut self.author))),
            Arc::new(StringArray::from(std::mem::take(&mut self.language))),
            Arc::new(StringArray::from(std::mem::take(&mut self.date_publish))),
            Arc::new(StringArray::from(std::mem::take(&mut self.date_download))),
            Arc::new(StringArray::from(std::mem::take(&mut self.date_collected))),
        ];
        RecordBatch::try_new(schema::articles().clone(), columns)
    }
}

fn fmt_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}
