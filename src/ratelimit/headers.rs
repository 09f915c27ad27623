//! Rate limit response headers.

use http::header::{HeaderMap, HeaderName, HeaderValue};

use super::window::Quota;
use crate::error::{Result, TollgateError};

/// Capacity of the window.
pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
/// Capacity left after the decision.
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
/// Capacity consumed after the decision.
pub const X_RATELIMIT_USED: &str = "x-ratelimit-used";
/// Window end in whole seconds since the Unix epoch.
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

impl Quota {
    /// Write all four rate limit headers, replacing any existing values.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        let fields = [
            (X_RATELIMIT_LIMIT, HeaderValue::from(self.limit)),
            (X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining)),
            (X_RATELIMIT_USED, HeaderValue::from(self.used)),
            (X_RATELIMIT_RESET, HeaderValue::from(self.reset)),
        ];
        for (name, value) in fields {
            headers.insert(HeaderName::from_static(name), value);
        }
    }

    /// Read a quota back from response headers.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        Ok(Self {
            limit: parse_header(headers, X_RATELIMIT_LIMIT)?,
            remaining: parse_header(headers, X_RATELIMIT_REMAINING)?,
            used: parse_header(headers, X_RATELIMIT_USED)?,
            reset: parse_header(headers, X_RATELIMIT_RESET)?,
        })
    }
}

fn parse_header<T>(headers: &HeaderMap, name: &'static str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = headers.get(name).ok_or_else(|| TollgateError::Header {
        name,
        reason: "missing".to_string(),
    })?;
    let text = value.to_str().map_err(|e| TollgateError::Header {
        name,
        reason: e.to_string(),
    })?;
    text.trim().parse().map_err(|e: T::Err| TollgateError::Header {
        name,
        reason: format!("{:?}: {}", text, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota() -> Quota {
        Quota {
            limit: 10,
            remaining: 3,
            used: 7,
            reset: 1_700_000_060,
        }
    }

    #[test]
    fn test_apply_sets_all_headers() {
        let mut headers = HeaderMap::new();
        quota().apply_to(&mut headers);

        assert_eq!(headers[X_RATELIMIT_LIMIT], "10");
        assert_eq!(headers[X_RATELIMIT_REMAINING], "3");
        assert_eq!(headers[X_RATELIMIT_USED], "7");
        assert_eq!(headers[X_RATELIMIT_RESET], "1700000060");
    }

    #[test]
    fn test_apply_overwrites_existing_values() {
        let mut headers = HeaderMap::new();
        headers.insert(X_RATELIMIT_USED, HeaderValue::from_static("999"));
        headers.append(X_RATELIMIT_USED, HeaderValue::from_static("998"));

        quota().apply_to(&mut headers);
        assert_eq!(headers.get_all(X_RATELIMIT_USED).iter().count(), 1);
        assert_eq!(headers[X_RATELIMIT_USED], "7");
    }

    #[test]
    fn test_from_headers_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            ("X-Ratelimit-Limit", "2"),
            ("X-Ratelimit-Remaining", "0"),
            ("X-Ratelimit-Used", "2"),
            ("X-Ratelimit-Reset", "1700000001"),
        ] {
            let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
            headers.insert(name, HeaderValue::from_static(value));
        }

        let parsed = Quota::from_headers(&headers).unwrap();
        assert_eq!(parsed.limit, 2);
        assert_eq!(parsed.used, 2);
        assert_eq!(parsed.reset, 1_700_000_001);
    }

    #[test]
    fn test_from_headers_reports_missing_header() {
        let mut headers = HeaderMap::new();
        quota().apply_to(&mut headers);
        headers.remove(X_RATELIMIT_RESET);

        let err = Quota::from_headers(&headers).unwrap_err();
        assert!(matches!(err, TollgateError::Header { name, .. } if name == X_RATELIMIT_RESET));
    }

    #[test]
    fn test_from_headers_reports_garbage() {
        let mut headers = HeaderMap::new();
        quota().apply_to(&mut headers);
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from_static("lots"));

        let err = Quota::from_headers(&headers).unwrap_err();
        assert!(matches!(err, TollgateError::Header { name, .. } if name == X_RATELIMIT_REMAINING));
    }
}
