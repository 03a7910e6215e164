//! Page-level features read straight from the raw HTML, independent of the
//! component pipeline.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RESULT_STATS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div id="result-stats">(.*?)</div>"#).unwrap());
static RESULT_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([\d][\d,.\s]*)\s+results?").unwrap());
static RESULT_TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([\d.]+) seconds?\)").unwrap());
static LANGUAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<html[^>]*?\slang="([^"]+)""#).unwrap());
static NO_RESULTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Your search - .*? - did not match any documents\.").unwrap());
static SHORTENED_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"was ignored because we limit queries to \d+ words").unwrap());
static SERVER_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)internal server error while processing your request").unwrap());
static INFINITY_SCROLL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="RVQdVd">More results</span>"#).unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerpFeatures {
    pub result_estimate_count: Option<u64>,
    pub result_estimate_time: Option<f64>,
    pub language: Option<String>,
    pub notice_no_results: bool,
    pub notice_shortened_query: bool,
    pub notice_server_error: bool,
    pub infinity_scroll: bool,
}

pub fn extract_features(html: &str) -> SerpFeatures {
    let stats = RESULT_STATS.captures(html).map(|c| c[1].to_string());
    let (count, time) = match stats.as_deref() {
        Some(stats) => (result_count(stats), result_time(stats)),
        None => (None, None),
    };
    SerpFeatures {
        result_estimate_count: count,
        result_estimate_time: time,
        language: LANGUAGE.captures(html).map(|c| c[1].to_string()),
        notice_no_results: NO_RESULTS.is_match(html),
        notice_shortened_query: SHORTENED_QUERY.is_match(html),
        notice_server_error: SERVER_ERROR.is_match(html),
        infinity_scroll: INFINITY_SCROLL.is_match(html),
    }
}

/// "About 1,230,000 results": separators vary by locale, so keep digits only.
fn result_count(stats: &str) -> Option<u64> {
    let raw = RESULT_COUNT.captures(stats)?;
    let digits: String = raw[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn result_time(stats: &str) -> Option<f64> {
    RESULT_TIME.captures(stats)?[1].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_stats() {
        let html = r#"<html lang="en-GB"><body><div id="result-stats">About 1,230,000 results<nobr> (0.45 seconds)&nbsp;</nobr></div></body></html>"#;
        let features = extract_features(html);
        assert_eq!(features.result_estimate_count, Some(1_230_000));
        assert_eq!(features.result_estimate_time, Some(0.45));
        assert_eq!(features.language.as_deref(), Some("en-GB"));
        assert!(!features.notice_no_results);
        assert!(!features.infinity_scroll);
    }

    #[test]
    fn single_result() {
        let html = r#"<div id="result-stats">1 result (0.2 seconds)</div>"#;
        let features = extract_features(html);
        assert_eq!(features.result_estimate_count, Some(1));
        assert_eq!(features.language, None);
    }

    #[test]
    fn notices() {
        let html = concat!(
            "<p>Your search - <b>qwzxv</b> - did not match any documents.</p>",
            "<p>\"extra\" (and any subsequent words) was ignored because we limit queries to 32 words.</p>",
            r#"<span class="RVQdVd">More results</span>"#,
        );
        let features = extract_features(html);
        assert!(features.notice_no_results);
        assert!(features.notice_shortened_query);
        assert!(!features.notice_server_error);
        assert!(features.infinity_scroll);
    }

    #[test]
    fn empty_page_has_defaults() {
        assert_eq!(extract_features(""), SerpFeatures::default());
    }
}
