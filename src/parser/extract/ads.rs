use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::{json, Value};

use super::{link_url, non_empty};
use crate::dom::{find_all, get_text, sel, text_of};
use crate::parser::error::Result;

static AD: LazyLock<Selector> = LazyLock::new(|| sel("div.uEierd, div[data-text-ad], li.ads-ad"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| sel("div[role=heading] span, div.CCgQ5 span, h3, div[role=heading]"));
static CITE: LazyLock<Selector> = LazyLock::new(|| sel("span.x2VHCd, span.qzEoUe, cite, span.VuuXrf"));
static TEXT: LazyLock<Selector> = LazyLock::new(|| sel("div.MUxGbd, div.yDYNvb, div.Va3FIb"));
static SUBMENU: LazyLock<Selector> = LazyLock::new(|| sel("div.bOeY0b a, div.MhgNwc a, ul.OkkX2d a"));

/// Text ads. A container with no recognisable ad blocks is read as one ad.
pub fn parse(elem: ElementRef<'_>) -> Result<Value> {
    let ads = find_all(elem, &AD);
    if ads.is_empty() {
        return Ok(Value::Array(ad_item(elem).into_iter().collect()));
    }
    Ok(Value::Array(ads.into_iter().filter_map(ad_item).collect()))
}

fn ad_item(ad: ElementRef<'_>) -> Option<Value> {
    let title = text_of(ad, &TITLE);
    let url = link_url(ad);
    if title.is_none() && url.is_none() {
        return None;
    }
    let submenu: Vec<Value> = find_all(ad, &SUBMENU)
        .into_iter()
        .filter_map(|a| {
            let text = non_empty(get_text(a, " "))?;
            Some(json!({ "title": text, "url": link_url(a) }))
        })
        .collect();
    let sub_type = if submenu.is_empty() { "standard" } else { "submenu" };
    let mut item = json!({
        "sub_type": sub_type,
        "title": title,
        "url": url,
        "cite": text_of(ad, &CITE),
        "text": text_of(ad, &TEXT),
    });
    if !submenu.is_empty() {
        item["details"] = json!({ "submenu": submenu });
    }
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn parse_html(body: &str) -> Value {
        let html = Html::parse_document(body);
        let div = html.select(&sel("div#tads")).next().unwrap();
        parse(div).unwrap()
    }

    #[test]
    fn standard_and_submenu_ads() {
        let out = parse_html(
            r#"<div id="tads">
                <div class="uEierd"><a href="https://shop.example"><div role="heading"><span>Shop Now</span></div></a>
                    <span class="x2VHCd">shop.example</span><div class="MUxGbd">Great deals.</div></div>
                <div class="uEierd"><a href="https://b.example"><div role="heading"><span>B</span></div></a>
                    <div class="bOeY0b"><a href="https://b.example/1">One</a><a href="https://b.example/2">Two</a></div></div>
            </div>"#,
        );
        let ads = out.as_array().unwrap();
        assert_eq!(ads.len(), 2);
        assert_eq!(ads[0]["sub_type"], "standard");
        assert_eq!(ads[0]["title"], "Shop Now");
        assert_eq!(ads[0]["cite"], "shop.example");
        assert_eq!(ads[0]["text"], "Great deals.");
        assert_eq!(ads[1]["sub_type"], "submenu");
        assert_eq!(ads[1]["details"]["submenu"][1]["url"], "https://b.example/2");
    }

    #[test]
    fn bare_container_is_one_ad() {
        let out = parse_html(r#"<div id="tads"><a href="https://x.example"><h3>Sponsored</h3></a></div>"#);
        assert_eq!(out.as_array().unwrap().len(), 1);
        assert_eq!(out[0]["url"], "https://x.example");
    }
}
