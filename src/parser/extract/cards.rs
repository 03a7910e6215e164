//! Carousel and card-grid components: news, posts, image strips.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty, parse_cards};
use crate::dom::{find, find_all, get_text, sel, text_of};
use crate::parser::error::{ParseError, Result};

static NEWS_CARD: LazyLock<Selector> =
    LazyLock::new(|| sel("g-inner-card, div.JJZKK, div.IJl0Z, div.MkXWrd, a.WlydOe"));
static CARD_TITLE: LazyLock<Selector> =
    LazyLock::new(|| sel("div[role=heading], div.mCBkyc, div.n0jPhd, h3, h4"));
static CARD_SOURCE: LazyLock<Selector> =
    LazyLock::new(|| sel("div.CEMjEf span, div.MgUUmf span, g-img + span, cite, span.VuuXrf"));
static CARD_TIME: LazyLock<Selector> =
    LazyLock::new(|| sel("span.OSrXXb, div.OSrXXb span, span.r0bn4c, span.f, div.ZE0LJd span"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| sel("h2, h3, div[role=heading], g-tray-header"));
static QUOTE_CARD: LazyLock<Selector> = LazyLock::new(|| sel("g-inner-card, div.KSKLjb, div.Ww4FFb"));
static QUOTE_TEXT: LazyLock<Selector> = LazyLock::new(|| sel("div.eBqdbd, div.yrsbHe, q"));
static CAROUSEL_ITEM: LazyLock<Selector> =
    LazyLock::new(|| sel("g-scrolling-carousel a, div[role=listitem], div.eA0Zlc"));
static IMG: LazyLock<Selector> = LazyLock::new(|| sel("img"));
static IMG_CARD: LazyLock<Selector> = LazyLock::new(|| sel("div.C7r6Ue, div.g, div.d9AdDb"));
static IMAGE: LazyLock<Selector> =
    LazyLock::new(|| sel("div[data-lpage], div.eA0Zlc, g-img"));
static IMAGE_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static IMAGE_BOX: LazyLock<Selector> = LazyLock::new(|| sel("div#imagebox_bigimages, div#iur"));

/// One news-style card: heading, link, source and age.
fn news_card(card: ElementRef<'_>, sub_type: &str) -> Option<Value> {
    let title = text_of(card, &CARD_TITLE).or_else(|| non_empty(get_text(card, " ")))?;
    Some(json!({
        "sub_type": sub_type,
        "title": title,
        "url": link_url(card),
        "cite": text_of(card, &CARD_SOURCE),
        "details": { "timestamp": text_of(card, &CARD_TIME) },
    }))
}

fn news_cards(elem: ElementRef<'_>, sub_type: &'static str) -> Result<Value> {
    parse_cards(elem, &NEWS_CARD, "news card", |card| news_card(card, sub_type))
}

pub fn parse_top_stories(elem: ElementRef<'_>) -> Result<Value> {
    news_cards(elem, "top_stories")
}

pub fn parse_perspectives(elem: ElementRef<'_>) -> Result<Value> {
    news_cards(elem, "perspectives")
}

pub fn parse_recent_posts(elem: ElementRef<'_>) -> Result<Value> {
    news_cards(elem, "recent_posts")
}

pub fn parse_local_news(elem: ElementRef<'_>) -> Result<Value> {
    news_cards(elem, "local_news")
}

/// "Latest from <site>" carousels. The site name in the heading is kept on every card.
pub fn parse_latest_from(elem: ElementRef<'_>) -> Result<Value> {
    let site = text_of(elem, &HEADING)
        .map(|h| h.trim_start_matches("Latest from").trim().to_string())
        .filter(|s| !s.is_empty());
    let mut cards = news_cards(elem, "latest_from")?;
    if let Some(site) = site {
        for card in cards.as_array_mut().into_iter().flatten() {
            card["details"]["site"] = json!(site);
        }
    }
    Ok(cards)
}

/// The single "View more news" link under a news block.
pub fn parse_view_more_news(elem: ElementRef<'_>) -> Result<Value> {
    let url = link_url(elem).ok_or(ParseError::Missing("view more link"))?;
    Ok(json!({ "title": non_empty(get_text(elem, " ")), "url": url }))
}

pub fn parse_news_quotes(elem: ElementRef<'_>) -> Result<Value> {
    parse_cards(elem, &QUOTE_CARD, "quote card", |card| {
        let quote = text_of(card, &QUOTE_TEXT).or_else(|| non_empty(get_text(card, " ")))?;
        Some(json!({
            "text": quote,
            "url": link_url(card),
            "cite": text_of(card, &CARD_SOURCE),
            "details": { "timestamp": text_of(card, &CARD_TIME) },
        }))
    })
}

pub fn parse_discover_more(elem: ElementRef<'_>) -> Result<Value> {
    let mut seen = HashSet::new();
    let items: Vec<Value> = find_all(elem, &CAROUSEL_ITEM)
        .into_iter()
        .filter_map(|item| non_empty(get_text(item, " ")))
        .filter(|text| seen.insert(text.clone()))
        .map(|text| json!({ "text": text }))
        .collect();
    Ok(Value::Array(items))
}

pub fn parse_img_cards(elem: ElementRef<'_>) -> Result<Value> {
    let heading = text_of(elem, &HEADING);
    parse_cards(elem, &IMG_CARD, "image card", |card| {
        let title = non_empty(get_text(card, " "))?;
        Some(json!({
            "title": title,
            "url": link_url(card),
            "details": { "heading": heading, "img_alt": img_alt(card) },
        }))
    })
}

/// Image strips. `data-lpage` carries the landing page when the anchor is
/// only a thumbnail viewer link.
pub fn parse_images(elem: ElementRef<'_>) -> Result<Value> {
    let scope = find(elem, &IMAGE_BOX).unwrap_or(elem);
    let images = find_all(scope, &IMAGE);
    if images.is_empty() {
        return Err(ParseError::Missing("image"));
    }
    let mut seen = HashSet::new();
    let items = images
        .into_iter()
        .filter_map(|img| {
            let url = img
                .value()
                .attr("data-lpage")
                .map(str::to_string)
                .or_else(|| link_url(img))?;
            seen.insert(url.clone()).then(|| {
                json!({
                    "sub_type": "image",
                    "title": img_alt(img),
                    "url": url,
                })
            })
        })
        .collect();
    Ok(Value::Array(items))
}

pub fn parse_top_image_carousel(elem: ElementRef<'_>) -> Result<Value> {
    let heading = text_of(elem, &HEADING);
    parse_cards(elem, &CAROUSEL_ITEM, "carousel item", |item| {
        let title = img_alt(item).or_else(|| non_empty(get_text(item, " ")))?;
        let url = link_url(item).or_else(|| find(item, &IMAGE_LINK).and_then(link_url));
        Some(json!({
            "title": title,
            "url": url,
            "details": { "heading": heading },
        }))
    })
}

fn img_alt(elem: ElementRef<'_>) -> Option<String> {
    let img = if elem.value().name() == "img" { Some(elem) } else { find(elem, &IMG) };
    img.and_then(|i| i.value().attr("alt"))
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
}
