//! Article filter chain: host → language → publish date

use rustc_hash::FxHashSet;

use crate::config::DateRange;
use crate::transform::ArticleRecord;

/// User-specified acceptance criteria. Built once at startup, shared
/// read-only by all workers.
///
/// Host sets hold normalized hosts (lowercase, no leading `www.`), matching
/// how record hosts are derived from their URLs.
#[derive(Debug, Default)]
pub struct FilterSpec {
    pub include_hosts: FxHashSet<String>,
    pub exclude_hosts: FxHashSet<String>,
    pub article_date_range: DateRange,
    pub strict_date: bool,
    pub language: Option<String>,
}

impl FilterSpec {
    /// Evaluate the predicates in fixed order, short-circuiting on the
    /// first failure. Cheapest checks run first; reordering would only be
    /// observable through early-exit counts, never through which records
    /// are accepted.
    pub fn accept(&self, article: &ArticleRecord) -> bool {
        self.accept_host(&article.host)
            && self.accept_language(article.language.as_deref())
            && self.accept_publish_date(article)
    }

    /// When the include list is non-empty it alone decides; the exclude
    /// list is ignored. Otherwise a non-empty exclude list rejects its
    /// members.
    fn accept_host(&self, host: &str) -> bool {
        if !self.include_hosts.is_empty() {
            return self.include_hosts.contains(host);
        }
        if !self.exclude_hosts.is_empty() {
            return !self.exclude_hosts.contains(host);
        }
        true
    }

    /// With a target language set, an unknown language is a rejection.
    fn accept_language(&self, language: Option<&str>) -> bool {
        match &self.language {
            None => true,
            Some(target) => language.is_some_and(|l| l == target),
        }
    }

    /// Unknown publish date: rejected under strict mode, passes otherwise
    /// (it cannot be date-filtered, but is not discarded). A known date
    /// must fall inside the inclusive range.
    fn accept_publish_date(&self, article: &ArticleRecord) -> bool {
        match article.publish_date {
            None => !self.strict_date,
            Some(date) => self.article_date_range.contains(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn article(host: &str, language: Option<&str>, publish_date: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            uuid: "0".repeat(32),
            url: format!("https://{host}/story"),
            host: host.to_string(),
            title: "t".to_string(),
            description: String::new(),
            body_text: String::new(),
            author: None,
            language: language.map(String::from),
            publish_date: publish_date
                .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            fetch_timestamp: None,
            collection_timestamp: NaiveDateTime::parse_from_str(
                "20200101000000",
                "%Y%m%d%H%M%S",
            )
            .unwrap(),
        }
    }

    fn hosts(names: &[&str]) -> FxHashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_spec_accepts_everything() {
        let spec = FilterSpec::default();
        assert!(spec.accept(&article("example.com", None, None)));
    }

    #[test]
    fn include_list_is_exclusive_membership() {
        let spec = FilterSpec {
            include_hosts: hosts(&["example.com"]),
            ..Default::default()
        };
        assert!(spec.accept(&article("example.com", None, None)));
        assert!(!spec.accept(&article("other.org", None, None)));
    }

    #[test]
    fn exclude_list_rejects_members() {
        let spec = FilterSpec {
            exclude_hosts: hosts(&["spam.example"]),
            ..Default::default()
        };
        assert!(!spec.accept(&article("spam.example", None, None)));
        assert!(spec.accept(&article("example.com", None, None)));
    }

    #[test]
    fn include_wins_over_exclude() {
        // Host on both lists: include-list precedence means acceptance
        let spec = FilterSpec {
            include_hosts: hosts(&["example.com"]),
            exclude_hosts: hosts(&["example.com", "other.org"]),
            ..Default::default()
        };
        assert!(spec.accept(&article("example.com", None, None)));
        assert!(!spec.accept(&article("other.org", None, None)));
    }

    #[test]
    fn language_must_match_exactly() {
        let spec = FilterSpec {
            language: Some("en".to_string()),
            ..Default::default()
        };
        assert!(spec.accept(&article("example.com", Some("en"), None)));
        assert!(!spec.accept(&article("example.com", Some("de"), None)));
    }

    #[test]
    fn unknown_language_rejected_when_target_set() {
        let spec = FilterSpec {
            language: Some("en".to_string()),
            ..Default::default()
        };
        assert!(!spec.accept(&article("example.com", None, None)));
    }

    #[test]
    fn strict_date_rejects_unknown_publish_date() {
        let spec = FilterSpec {
            strict_date: true,
            ..Default::default()
        };
        assert!(!spec.accept(&article("example.com", None, None)));
    }

    #[test]
    fn lenient_date_passes_unknown_publish_date() {
        let spec = FilterSpec {
            article_date_range: DateRange::new(Some(d("2020-01-01")), Some(d("2020-01-31")))
                .unwrap(),
            strict_date: false,
            ..Default::default()
        };
        assert!(spec.accept(&article("example.com", None, None)));
    }

    #[test]
    fn known_date_must_be_in_range() {
        let spec = FilterSpec {
            article_date_range: DateRange::new(Some(d("2020-01-01")), Some(d("2020-01-31")))
                .unwrap(),
            ..Default::default()
        };
        assert!(spec.accept(&article("example.com", None, Some("2020-01-01"))));
        assert!(spec.accept(&article("example.com", None, Some("2020-01-31"))));
        assert!(!spec.accept(&article("example.com", None, Some("2019-12-31"))));
        assert!(!spec.accept(&article("example.com", None, Some("2020-02-01"))));
    }

    #[test]
    fn host_failure_short_circuits() {
        // Host check fails first even though the date would also fail
        let spec = FilterSpec {
            include_hosts: hosts(&["example.com"]),
            strict_date: true,
            ..Default::default()
        };
        assert!(!spec.accept(&article("other.org", None, None)));
    }
}
