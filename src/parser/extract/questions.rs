use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty, parse_cards};
use crate::dom::{find, find_all, get_text, sel, text_of};
use crate::parser::error::{ParseError, Result};

static QUESTION: LazyLock<Selector> = LazyLock::new(|| sel("div.related-question-pair, div.wQiwMc"));
static QUESTION_TEXT: LazyLock<Selector> =
    LazyLock::new(|| sel("div.JlqpRe span, span.CSkcDe, div[role=button] span, div[role=button]"));
static ANSWER_LINK: LazyLock<Selector> = LazyLock::new(|| sel("div.yuRUbf a, a[href^=http]"));
static ANSWER_CITE: LazyLock<Selector> = LazyLock::new(|| sel("cite"));
static RELATED_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a.k8XOCe, div.s75CSd, a[href*=\"q=\"]"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| sel("h2, h3, div[role=heading]"));

/// "People also ask": one record per question. Answers are loaded lazily by
/// the page, so only an already expanded question carries a source link.
pub fn parse(elem: ElementRef<'_>) -> Result<Value> {
    parse_cards(elem, &QUESTION, "question", |pair| {
        let question = pair
            .value()
            .attr("data-q")
            .map(str::to_string)
            .or_else(|| text_of(pair, &QUESTION_TEXT))?;
        Some(json!({
            "sub_type": "question",
            "title": question,
            "url": find(pair, &ANSWER_LINK).and_then(link_url),
            "cite": text_of(pair, &ANSWER_CITE),
        }))
    })
}

/// Related searches: a single record listing every suggested query.
pub fn parse_related(elem: ElementRef<'_>) -> Result<Value> {
    let mut seen = HashSet::new();
    let searches: Vec<String> = find_all(elem, &RELATED_LINK)
        .into_iter()
        .filter_map(|link| non_empty(get_text(link, " ")))
        .filter(|text| seen.insert(text.clone()))
        .collect();
    if searches.is_empty() {
        return Err(ParseError::Missing("related search link"));
    }
    Ok(json!({
        "title": text_of(elem, &HEADING),
        "text": searches.join(", "),
        "details": { "searches": searches },
    }))
}
