use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty};
use crate::dom::{find_all, get_text, sel, text_of};
use crate::parser::error::{ParseError, Result};

static VIDEO: LazyLock<Selector> = LazyLock::new(|| sel("video-voyager, div.RzdJxc, div[data-vid]"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| sel("div[role=heading], h3, div.fc9yUc, span.cHaqb"));
static SOURCE: LazyLock<Selector> = LazyLock::new(|| sel("cite, span.pcJO7e, div.Zg1NU"));
static DURATION: LazyLock<Selector> = LazyLock::new(|| sel("div.J1mWY, span.k1U36b, div.c8rnLc span"));
static AGE: LazyLock<Selector> = LazyLock::new(|| sel("span.P7xzyf, div.hMJ0yc span"));
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));

/// Video results. Falls back to bare YouTube watch links when the page
/// uses no known video container.
pub fn parse(elem: ElementRef<'_>) -> Result<Value> {
    let videos = find_all(elem, &VIDEO);
    if videos.is_empty() {
        return watch_links(elem);
    }
    let items = videos
        .into_iter()
        .filter_map(|video| {
            let title = text_of(video, &TITLE)?;
            Some(json!({
                "title": title,
                "url": link_url(video),
                "cite": text_of(video, &SOURCE),
                "details": {
                    "duration": text_of(video, &DURATION),
                    "timestamp": text_of(video, &AGE),
                },
            }))
        })
        .collect();
    Ok(Value::Array(items))
}

fn watch_links(elem: ElementRef<'_>) -> Result<Value> {
    let mut seen = HashSet::new();
    let items: Vec<Value> = find_all(elem, &LINK)
        .into_iter()
        .filter_map(|a| {
            let url = link_url(a).filter(|u| u.contains("youtube.com/watch"))?;
            seen.insert(url.clone())
                .then(|| json!({ "title": non_empty(get_text(a, " ")), "url": url }))
        })
        .collect();
    if items.is_empty() {
        return Err(ParseError::Missing("video"));
    }
    Ok(Value::Array(items))
}

/// Short-form videos (YouTube Shorts, TikTok): one record per distinct link.
pub fn parse_short(elem: ElementRef<'_>) -> Result<Value> {
    let mut seen = HashSet::new();
    let items = find_all(elem, &LINK)
        .into_iter()
        .filter_map(|a| {
            let url = link_url(a).filter(|u| u.contains("/shorts/") || u.contains("tiktok.com/"))?;
            if !seen.insert(url.clone()) {
                return None;
            }
            let title = a
                .value()
                .attr("aria-label")
                .map(str::to_string)
                .or_else(|| non_empty(get_text(a, " ")));
            let platform = if url.contains("tiktok.com/") { "tiktok" } else { "youtube" };
            Some(json!({ "title": title, "url": url, "details": { "platform": platform } }))
        })
        .collect();
    Ok(Value::Array(items))
}
