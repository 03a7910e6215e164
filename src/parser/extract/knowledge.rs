use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Map, Value};

use super::{link_url, non_empty, parse_cards};
use crate::dom::{find, find_all, get_text, has, heading_text, sel, text_of};
use crate::parser::error::{ParseError, Result};

static FEATURED: LazyLock<Selector> = LazyLock::new(|| sel("div.xpdopen, div.ifM9O, span.hgKElc"));
static FINANCE: LazyLock<Selector> =
    LazyLock::new(|| sel("div#knowledge-finance-wholepage__entity-summary"));
static PANEL: LazyLock<Selector> =
    LazyLock::new(|| sel("div.knowledge-panel, div.kp-wholepage, div.kp-blk, div.kp-wholepage-osrp"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| {
    sel("h2[data-attrid=title], div[data-attrid=title], div.kno-ecr-pt, h1.VW3apb, div[role=heading], h2, h3")
});
static SUBTITLE: LazyLock<Selector> = LazyLock::new(|| sel("div[data-attrid=subtitle], div.wwUB2c"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    sel("div.kno-rdesc span, div.LGOjhe span, span.hgKElc, div[data-attrid=\"wa:/description\"] span, div.IZ6rdc")
});
static SOURCE_LINK: LazyLock<Selector> = LazyLock::new(|| sel("div.kno-rdesc a[href], a.ruhjFe, div.yuRUbf a"));
static FACT: LazyLock<Selector> = LazyLock::new(|| sel("div.rVusze, div[data-attrid^=\"kc:/\"]"));
static FACT_LABEL: LazyLock<Selector> = LazyLock::new(|| sel("span.w8qArf, span.w8qArf a"));
static FACT_VALUE: LazyLock<Selector> = LazyLock::new(|| sel("span.LrzXr, span.kno-fv"));
static IMG: LazyLock<Selector> = LazyLock::new(|| sel("img[src]"));
static BANNER_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("div.v3jTId, div[role=heading]"));
static BANNER_TEXT: LazyLock<Selector> = LazyLock::new(|| sel("div.Cy9gW, div.uzjuFc span"));
static PROVIDER: LazyLock<Selector> = LazyLock::new(|| sel("div.Cbbd9c a, a.JkUS4b"));
static PROVIDER_NAME: LazyLock<Selector> = LazyLock::new(|| sel("div.i3LlFf, div.ellip"));
static PROVIDER_PRICE: LazyLock<Selector> = LazyLock::new(|| sel("div.V8fWH, div.rsj3fb"));

/// Knowledge blocks in the main column: featured snippets, entity panels
/// and finance cards.
pub fn parse(elem: ElementRef<'_>) -> Result<Value> {
    let sub_type = if has(elem, &FINANCE) {
        "finance"
    } else if has(elem, &FEATURED) {
        "featured_snippet"
    } else if has(elem, &PANEL) {
        "panel"
    } else {
        "description"
    };
    knowledge_item(elem, sub_type)
}

/// The right-hand knowledge panel.
pub fn parse_rhs(elem: ElementRef<'_>) -> Result<Value> {
    let mut item = knowledge_item(elem, "panel_rhs")?;
    let facts = facts(elem);
    if !facts.is_empty() {
        item["details"]["facts"] = Value::Object(facts);
    }
    Ok(item)
}

fn knowledge_item(elem: ElementRef<'_>, sub_type: &str) -> Result<Value> {
    let title = text_of(elem, &TITLE);
    let text = text_of(elem, &DESCRIPTION);
    if title.is_none() && text.is_none() {
        return Err(ParseError::Missing("knowledge title or description"));
    }
    let url = find(elem, &SOURCE_LINK).and_then(link_url);
    let images: Vec<String> = find_all(elem, &IMG)
        .into_iter()
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| src.starts_with("http"))
        .map(str::to_string)
        .collect();
    Ok(json!({
        "sub_type": sub_type,
        "title": title,
        "url": url,
        "text": text,
        "details": {
            "subtitle": text_of(elem, &SUBTITLE),
            "heading": heading_text(elem, 2),
            "img_urls": images,
        },
    }))
}

/// `label: value` pairs listed under an entity panel.
fn facts(elem: ElementRef<'_>) -> Map<String, Value> {
    let mut facts = Map::new();
    for fact in find_all(elem, &FACT) {
        let Some(label) = text_of(fact, &FACT_LABEL) else {
            continue;
        };
        let label = label.trim_end_matches(':').trim().to_string();
        if let Some(value) = text_of(fact, &FACT_VALUE) {
            facts.entry(label).or_insert(Value::String(value));
        }
    }
    facts
}

pub fn parse_banner(elem: ElementRef<'_>) -> Result<Value> {
    let title = text_of(elem, &BANNER_TITLE);
    let text = text_of(elem, &BANNER_TEXT).or_else(|| non_empty(get_text(elem, " ")));
    Ok(json!({ "title": title, "text": text, "url": link_url(elem) }))
}

/// Streaming and store providers offering the entity.
pub fn parse_available_on(elem: ElementRef<'_>) -> Result<Value> {
    parse_cards(elem, &PROVIDER, "provider", |provider| {
        let name = text_of(provider, &PROVIDER_NAME).or_else(|| non_empty(get_text(provider, " ")))?;
        Some(json!({
            "title": name,
            "url": link_url(provider),
            "text": text_of(provider, &PROVIDER_PRICE),
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn with_root<T>(body: &str, f: impl FnOnce(ElementRef<'_>) -> T) -> T {
        let html = Html::parse_document(&format!(r#"<div id="root">{body}</div>"#));
        let root = html.select(&sel("div#root")).next().unwrap();
        f(root)
    }

    #[test]
    fn featured_snippet() {
        let out = with_root(
            r#"<div class="ifM9O"><h2>Featured snippet from the web</h2>
                <span class="hgKElc">Rust is a general-purpose programming language.</span>
                <div class="yuRUbf"><a href="https://en.wikipedia.org/wiki/Rust"><h3>Rust - Wikipedia</h3></a></div></div>"#,
            |e| parse(e).unwrap(),
        );
        assert_eq!(out["sub_type"], "featured_snippet");
        assert_eq!(out["text"], "Rust is a general-purpose programming language.");
        assert_eq!(out["url"], "https://en.wikipedia.org/wiki/Rust");
        assert_eq!(out["details"]["heading"], "Featured snippet from the web");
    }

    #[test]
    fn rhs_panel_facts() {
        let out = with_root(
            r#"<div class="kp-wholepage"><h2 data-attrid="title">Ferris</h2>
                <div data-attrid="subtitle">Crab</div>
                <div class="kno-rdesc"><span>The unofficial Rust mascot.</span></div>
                <div class="rVusze"><span class="w8qArf">Species: </span><span class="LrzXr">Crab</span></div>
                <div class="rVusze"><span class="w8qArf">Colour:</span><span class="LrzXr">Orange</span></div></div>"#,
            |e| parse_rhs(e).unwrap(),
        );
        assert_eq!(out["sub_type"], "panel_rhs");
        assert_eq!(out["title"], "Ferris");
        assert_eq!(out["details"]["subtitle"], "Crab");
        assert_eq!(out["details"]["facts"], json!({ "Species": "Crab", "Colour": "Orange" }));
    }

    #[test]
    fn empty_panel_is_an_error() {
        assert!(with_root("<div><img src=\"x.png\"></div>", parse).is_err());
    }

    #[test]
    fn providers() {
        let out = with_root(
            r#"<div class="Cbbd9c"><a href="https://stream.a"><div class="i3LlFf">StreamA</div><div class="V8fWH">Subscription</div></a>
               <a href="https://store.b"><div class="i3LlFf">StoreB</div><div class="V8fWH">$3.99</div></a></div>"#,
            |e| parse_available_on(e).unwrap(),
        );
        assert_eq!(out[1], json!({ "title": "StoreB", "url": "https://store.b", "text": "$3.99" }));
    }
}
