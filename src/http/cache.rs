//! HTTP cache validation module
//!
//! `ETag` and `Last-Modified` validators plus conditional request handling.
//! `If-None-Match` takes precedence over `If-Modified-Since` (RFC 9110).

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

/// IMF-fixdate layout used by `Last-Modified` / `If-Modified-Since`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Validators computed for a served file
#[derive(Debug, Clone)]
pub struct Validators {
    pub etag: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Validators {
    pub fn new(content: &[u8], modified: Option<SystemTime>) -> Self {
        Self {
            etag: generate_etag(content),
            last_modified: modified.map(truncate_to_seconds),
        }
    }

    /// `Last-Modified` header value, if the file's mtime is known
    pub fn last_modified_header(&self) -> Option<String> {
        self.last_modified.map(format_http_date)
    }

    /// Whether the client's cached copy is still valid (respond 304)
    pub fn is_not_modified(&self, if_none_match: Option<&str>, if_modified_since: Option<&str>) -> bool {
        if let Some(client_etags) = if_none_match {
            return etag_matches(client_etags, &self.etag);
        }

        match (if_modified_since.and_then(parse_http_date), self.last_modified) {
            (Some(since), Some(modified)) => modified <= since,
            _ => false,
        }
    }
}

/// Generate a quoted `ETag` from the file content
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// Match an `If-None-Match` list (`"a", "b"` or `*`) against an `ETag`
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an IMF-fixdate; obsolete date formats are treated as absent
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// HTTP dates have second precision, so compare file times the same way
fn truncate_to_seconds(time: SystemTime) -> DateTime<Utc> {
    let time: DateTime<Utc> = time.into();
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn validators_at(secs: u64) -> Validators {
        Validators::new(b"<html></html>", Some(UNIX_EPOCH + Duration::from_millis(secs * 1000 + 250)))
    }

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(b"hello world");
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag, generate_etag(b"hello world"));
        assert_ne!(etag, generate_etag(b"hello there"));
    }

    #[test]
    fn test_http_date_round_trip() {
        let date = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(date.timestamp(), 784_111_777);
        assert_eq!(format_http_date(date), "Sun, 06 Nov 1994 08:49:37 GMT");
        assert!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT").is_none());
    }

    #[test]
    fn test_last_modified_is_truncated() {
        let v = validators_at(784_111_777);
        assert_eq!(
            v.last_modified_header().as_deref(),
            Some("Sun, 06 Nov 1994 08:49:37 GMT")
        );
    }

    #[test]
    fn test_if_none_match() {
        let v = validators_at(0);
        let etag = v.etag.clone();
        assert!(v.is_not_modified(Some(&etag), None));
        assert!(v.is_not_modified(Some(&format!("\"other\", {etag}")), None));
        assert!(v.is_not_modified(Some(&format!("W/{etag}")), None));
        assert!(v.is_not_modified(Some("*"), None));
        assert!(!v.is_not_modified(Some("\"other\""), None));
    }

    #[test]
    fn test_if_modified_since() {
        let v = validators_at(784_111_777);
        assert!(v.is_not_modified(None, Some("Sun, 06 Nov 1994 08:49:37 GMT")));
        assert!(v.is_not_modified(None, Some("Mon, 07 Nov 1994 00:00:00 GMT")));
        assert!(!v.is_not_modified(None, Some("Sun, 06 Nov 1994 08:49:36 GMT")));
        assert!(!v.is_not_modified(None, Some("garbage")));
        assert!(!v.is_not_modified(None, None));
    }

    #[test]
    fn test_etag_takes_precedence() {
        let v = validators_at(784_111_777);
        // Date alone would say "not modified", the mismatching ETag wins
        assert!(!v.is_not_modified(
            Some("\"stale\""),
            Some("Mon, 07 Nov 1994 00:00:00 GMT")
        ));
    }
}
