use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty};
use crate::dom::{find, find_all, get_text, sel};
use crate::parser::error::{ParseError, Result};

static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));

/// Query notice kinds, matched by the notice's leading text.
const NOTICE_TYPES: &[(&str, &[&str])] = &[
    ("query_edit_no_results", &["No results found for"]),
    ("query_edit", &["Showing results for", "Including results for", "Search instead for"]),
    ("query_suggestion", &["Did you mean", "Are you looking for"]),
    ("location", &["Results for", "Results near", "Showing results near"]),
    ("language_tip", &["Search for English results only", "Tip:"]),
];

fn notice_type(text: &str) -> Option<&'static str> {
    NOTICE_TYPES
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| text.starts_with(p)))
        .map(|(name, _)| *name)
}

/// Spelling, location and language notices above the results. Query edits
/// keep the corrected query in `title` and the original in `details`.
pub fn parse(elem: ElementRef<'_>) -> Result<Value> {
    let text = non_empty(get_text(elem, " ")).ok_or(ParseError::Missing("notice text"))?;
    let sub_type = notice_type(&text);
    let links: Vec<ElementRef<'_>> = find_all(elem, &LINK);

    let (title, url, original) = match sub_type {
        Some("query_edit") => {
            let corrected = links.first().map(|a| get_text(*a, " "));
            let original = links.get(1).map(|a| get_text(*a, " "));
            (corrected, links.first().and_then(|a| link_url(*a)), original)
        }
        Some("query_suggestion") | Some("query_edit_no_results") => {
            let suggestion = links.first().map(|a| get_text(*a, " "));
            (suggestion, links.first().and_then(|a| link_url(*a)), None)
        }
        _ => (None, links.first().and_then(|a| link_url(*a)), None),
    };

    Ok(json!({
        "sub_type": sub_type,
        "title": title,
        "url": url,
        "text": text,
        "details": { "original": original },
    }))
}

/// "Some results may have been omitted" footer notice, with the link that
/// repeats the search unfiltered.
pub fn parse_omitted(elem: ElementRef<'_>) -> Result<Value> {
    let text = non_empty(get_text(elem, " ")).ok_or(ParseError::Missing("omitted notice text"))?;
    let url = find(elem, &LINK).and_then(link_url);
    Ok(json!({ "sub_type": "omitted_results", "text": text, "url": url }))
}
