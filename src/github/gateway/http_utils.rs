//! Header and body helpers shared by the gateway.

use std::time::Duration;

use http::HeaderMap;
use http::header::RETRY_AFTER;

/// Parses `Retry-After` when it carries delta-seconds.
pub(super) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|raw| raw.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Extracts the `message` field of a GitHub REST-style error body.
pub(super) fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::{HeaderMap, HeaderValue};
    use rstest::rstest;

    use super::{extract_github_message, retry_after};

    #[rstest]
    #[case::seconds("30", Some(Duration::from_secs(30)))]
    #[case::padded(" 5 ", Some(Duration::from_secs(5)))]
    #[case::http_date("Wed, 21 Oct 2015 07:28:00 GMT", None)]
    fn parses_retry_after_seconds(#[case] raw: &'static str, #[case] expected: Option<Duration>) {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static(raw));
        assert_eq!(retry_after(&headers), expected);
    }

    #[rstest]
    fn extracts_message_from_error_body() {
        let body = r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com"}"#;
        assert_eq!(
            extract_github_message(body).as_deref(),
            Some("Bad credentials")
        );
        assert_eq!(extract_github_message("<html>"), None);
    }
}
