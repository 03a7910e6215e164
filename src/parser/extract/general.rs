use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty, parse_cards};
use crate::dom::{find, find_all, get_text, has, has_any_class, is_within, sel, text_of};
use crate::parser::error::Result;

static RESULT: LazyLock<Selector> = LazyLock::new(|| sel("div.g, div.Ww4FFb"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| sel("h3"));
static CITE: LazyLock<Selector> = LazyLock::new(|| sel("cite"));
static SNIPPET: LazyLock<Selector> =
    LazyLock::new(|| sel("div.VwiC3b, span.aCOpRe, div.IsZvec, div[data-sncf], div.ITZIwc"));
static SITELINKS: LazyLock<Selector> = LazyLock::new(|| sel("div.HiHjCd a, table.jmjoTe a, div.usJj9c a"));
static ACCORDION: LazyLock<Selector> = LazyLock::new(|| sel("g-accordion"));
static ACCORDION_Q: LazyLock<Selector> =
    LazyLock::new(|| sel("g-accordion div[role=button], g-accordion div.d8lRkd, g-accordion span.CSkcDe"));
static FORUM_CARD: LazyLock<Selector> = LazyLock::new(|| sel("div.LJ7wUe, div.yz8Bae, g-inner-card"));
static FORUM_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("div[role=heading], h3, a"));
static FORUM_SOURCE: LazyLock<Selector> = LazyLock::new(|| sel("span.VuuXrf, cite, span.LbKnXb"));
static FORUM_META: LazyLock<Selector> = LazyLock::new(|| sel("span.YrbPuc, div.Pqkn2e span"));
static SCHOLAR: LazyLock<Selector> = LazyLock::new(|| sel("div.gs_ri, div.g, div.rwPpb"));
static SCHOLAR_CITED: LazyLock<Selector> = LazyLock::new(|| sel("a[href*=\"cites=\"]"));

/// Organic results. A result fused with an FAQ accordion is relabelled
/// `general_questions` on its own record.
pub fn parse(elem: ElementRef<'_>) -> Result<Value> {
    let results = outermost(elem, find_all(elem, &RESULT));
    if results.is_empty() {
        return Ok(Value::Array(general_item(elem).into_iter().collect()));
    }
    Ok(Value::Array(results.into_iter().filter_map(general_item).collect()))
}

pub fn parse_general_questions(elem: ElementRef<'_>) -> Result<Value> {
    let mut item = general_item(elem).unwrap_or_else(|| json!({ "type": "general_questions" }));
    item["type"] = json!("general_questions");
    Ok(item)
}

pub fn parse_discussions(elem: ElementRef<'_>) -> Result<Value> {
    parse_cards(elem, &FORUM_CARD, "forum card", |card| {
        let title = text_of(card, &FORUM_TITLE).or_else(|| non_empty(get_text(card, " ")))?;
        Some(json!({
            "sub_type": "forum_post",
            "title": title,
            "url": link_url(card),
            "cite": text_of(card, &FORUM_SOURCE),
            "details": { "meta": text_of(card, &FORUM_META) },
        }))
    })
}

pub fn parse_scholarly(elem: ElementRef<'_>) -> Result<Value> {
    let articles = outermost(elem, find_all(elem, &SCHOLAR));
    let items = articles
        .into_iter()
        .filter_map(|article| {
            let title = text_of(article, &TITLE).or_else(|| text_of(article, &FORUM_TITLE))?;
            let cited_by = text_of(article, &SCHOLAR_CITED);
            Some(json!({
                "title": title,
                "url": link_url(article),
                "cite": text_of(article, &CITE),
                "text": text_of(article, &SNIPPET),
                "details": { "cited_by": cited_by },
            }))
        })
        .collect();
    Ok(Value::Array(items))
}

/// Drop entries nested inside another entry of the same list.
fn outermost<'a>(root: ElementRef<'a>, found: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    found
        .iter()
        .copied()
        .filter(|e| {
            !found
                .iter()
                .any(|other| other.id() != e.id() && other.id() != root.id() && is_within(*e, *other))
        })
        .collect()
}

/// Nearest `a` around `elem`, stopping at `root`.
fn enclosing_link<'a>(elem: ElementRef<'a>, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
    elem.ancestors()
        .take_while(|a| a.id() != root.id())
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
}

fn general_item(result: ElementRef<'_>) -> Option<Value> {
    let title = text_of(result, &TITLE);
    let url = find(result, &TITLE)
        .and_then(|h| enclosing_link(h, result))
        .and_then(link_url)
        .or_else(|| link_url(result));
    if title.is_none() && url.is_none() {
        return None;
    }

    let sitelinks: Vec<Value> = find_all(result, &SITELINKS)
        .into_iter()
        .filter_map(|a| {
            let title = non_empty(get_text(a, " "))?;
            Some(json!({ "title": title, "url": link_url(a) }))
        })
        .collect();
    let questions: Vec<String> = find_all(result, &ACCORDION_Q)
        .into_iter()
        .filter_map(|q| non_empty(get_text(q, " ")))
        .collect();
    let hybrid = has(result, &ACCORDION) || has_any_class(result, &["ifM9O"]);

    let sub_type = if !sitelinks.is_empty() { "subresult" } else { "standard" };
    let mut item = json!({
        "sub_type": sub_type,
        "title": title,
        "url": url,
        "cite": text_of(result, &CITE),
        "text": text_of(result, &SNIPPET),
    });
    let mut details = serde_json::Map::new();
    if !sitelinks.is_empty() {
        details.insert("sitelinks".into(), Value::Array(sitelinks));
    }
    if hybrid {
        item["type"] = json!("general_questions");
        details.insert("questions".into(), json!(questions));
    }
    if !details.is_empty() {
        item["details"] = Value::Object(details);
    }
    Some(item)
}
