use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty, parse_cards};
use crate::dom::{find, find_all, get_text, sel, text_of};
use crate::parser::error::{ParseError, Result};

static PLACE: LazyLock<Selector> =
    LazyLock::new(|| sel("div.VkpGBb, div[jscontroller=AtSb], div.rllt__details"));
static PLACE_NAME: LazyLock<Selector> =
    LazyLock::new(|| sel("div.dbg0pd, span.OSrXXb, div[role=heading]"));
static WEBSITE: LazyLock<Selector> = LazyLock::new(|| sel("a.yYlJEf, a[aria-label=Website]"));
static DIRECTIONS: LazyLock<Selector> = LazyLock::new(|| sel("a[href*=\"/maps/dir\"]"));
static MAP_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href*=\"/maps\"]"));
static MAP_IMG: LazyLock<Selector> = LazyLock::new(|| sel("img[src]"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| sel("h2, h3, div[role=heading]"));

static RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d(?:\.\d)?)\s*\(([\d.,]+[KkM]?)\)").unwrap());

/// Local pack entries: name, rating, review count and the remaining lines
/// (category, address, hours) as shown.
pub fn parse(elem: ElementRef<'_>) -> Result<Value> {
    parse_cards(elem, &PLACE, "local result", |place| {
        let name = text_of(place, &PLACE_NAME)?;
        let text = get_text(place, "<|>");
        let lines: Vec<&str> = text
            .split("<|>")
            .filter(|line| *line != name && !line.chars().all(|c| c == '·' || c.is_whitespace()))
            .collect();
        let (rating, n_reviews) = rating(&get_text(place, ""));
        Some(json!({
            "sub_type": "local_result",
            "title": name,
            "url": find(place, &WEBSITE).and_then(link_url),
            "details": {
                "rating": rating,
                "n_reviews": n_reviews,
                "lines": lines,
                "directions": find(place, &DIRECTIONS).and_then(link_url),
            },
        }))
    })
}

/// The standalone map block above a local pack.
pub fn parse_map(elem: ElementRef<'_>) -> Result<Value> {
    let link = find(elem, &MAP_LINK).ok_or(ParseError::Missing("map link"))?;
    let img = find_all(elem, &MAP_IMG)
        .into_iter()
        .find_map(|img| img.value().attr("src").map(str::to_string));
    Ok(json!({
        "sub_type": "map",
        "title": text_of(elem, &HEADING).or_else(|| non_empty(get_text(link, " "))),
        "url": link_url(link),
        "details": { "img_src": img },
    }))
}

fn rating(text: &str) -> (Option<f64>, Option<u64>) {
    let Some(caps) = RATING.captures(text) else {
        return (None, None);
    };
    let rating = caps[1].parse::<f64>().ok();
    (rating, review_count(&caps[2]))
}

/// "1,234" and "1.2K" style review counts.
fn review_count(raw: &str) -> Option<u64> {
    let (digits, scale) = match raw.chars().last()? {
        'K' | 'k' => (&raw[..raw.len() - 1], 1_000.0),
        'M' => (&raw[..raw.len() - 1], 1_000_000.0),
        _ => (raw, 1.0),
    };
    if scale > 1.0 {
        let value: f64 = digits.replace(',', ".").parse().ok()?;
        Some((value * scale).round() as u64)
    } else {
        digits.replace([',', '.'], "").parse().ok()
    }
}
