use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty};
use crate::dom::{find, find_all, get_text, sel, text_of};
use crate::parser::error::{ParseError, Result};

static HEADER: LazyLock<Selector> = LazyLock::new(|| sel("g-link, div.DOqJne, h3"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| sel("h3, div[role=heading]"));
static CITE: LazyLock<Selector> = LazyLock::new(|| sel("cite"));
static CARD: LazyLock<Selector> = LazyLock::new(|| sel("g-inner-card"));
static CARD_TEXT: LazyLock<Selector> = LazyLock::new(|| sel("div.xcQxib, div.Jwxy4d, div[role=heading]"));
static CARD_TIME: LazyLock<Selector> = LazyLock::new(|| sel("span.f, div.ZE0LJd span, span.OSrXXb"));
static SNIPPET: LazyLock<Selector> = LazyLock::new(|| sel("div.VwiC3b, div.IsZvec, span.aCOpRe"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));

/// Tweet carousel: a header record for the account, then one record per tweet.
pub fn parse_cards(elem: ElementRef<'_>) -> Result<Value> {
    let header = find(elem, &HEADER).ok_or(ParseError::Missing("twitter header"))?;
    let mut items = vec![json!({
        "sub_type": "header",
        "title": text_of(elem, &HEADING).or_else(|| non_empty(get_text(header, " "))),
        "url": link_url(header),
        "cite": text_of(elem, &CITE),
    })];
    for card in find_all(elem, &CARD) {
        let Some(text) = text_of(card, &CARD_TEXT).or_else(|| non_empty(get_text(card, " "))) else {
            continue;
        };
        items.push(json!({
            "sub_type": "card",
            "text": text,
            "url": link_url(card),
            "details": { "timestamp": text_of(card, &CARD_TIME) },
        }));
    }
    Ok(Value::Array(items))
}

/// A single profile or tweet shown as an organic result.
pub fn parse_result(elem: ElementRef<'_>) -> Result<Value> {
    let title = text_of(elem, &HEADING).ok_or(ParseError::Missing("twitter result title"))?;
    Ok(json!({
        "title": title,
        "url": find(elem, &TITLE_LINK).and_then(link_url),
        "cite": text_of(elem, &CITE),
        "text": text_of(elem, &SNIPPET),
    }))
}
