//! Per-type component parsers.
//!
//! Each parser reads one classified component and returns loose JSON: an
//! object for a single record or a list of objects. The dispatcher validates
//! and normalizes whatever comes back, so parsers only report what they find.

pub mod ads;
pub mod cards;
pub mod general;
pub mod knowledge;
pub mod local;
pub mod notices;
pub mod questions;
pub mod twitter;
pub mod videos;

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::Value;
use url::Url;

use super::dispatch::ParserFn;
use super::error::{ParseError, Result};
use super::types::ComponentType;
use crate::dom::{find, find_all, sel};

/// Built-in parser table. Types left out go through the not-implemented stub.
pub static PARSERS: &[(ComponentType, ParserFn)] = &[
    (ComponentType::Ad, ads::parse),
    (ComponentType::AvailableOn, knowledge::parse_available_on),
    (ComponentType::Banner, knowledge::parse_banner),
    (ComponentType::DiscoverMore, cards::parse_discover_more),
    (ComponentType::DiscussionsAndForums, general::parse_discussions),
    (ComponentType::General, general::parse),
    (ComponentType::GeneralQuestions, general::parse_general_questions),
    (ComponentType::Images, cards::parse_images),
    (ComponentType::ImgCards, cards::parse_img_cards),
    (ComponentType::Knowledge, knowledge::parse),
    (ComponentType::KnowledgeRhs, knowledge::parse_rhs),
    (ComponentType::LatestFrom, cards::parse_latest_from),
    (ComponentType::LocalNews, cards::parse_local_news),
    (ComponentType::LocalResults, local::parse),
    (ComponentType::MapResults, local::parse_map),
    (ComponentType::NewsQuotes, cards::parse_news_quotes),
    (ComponentType::Notice, notices::parse),
    (ComponentType::OmittedNotice, notices::parse_omitted),
    (ComponentType::PeopleAlsoAsk, questions::parse),
    (ComponentType::Perspectives, cards::parse_perspectives),
    (ComponentType::RecentPosts, cards::parse_recent_posts),
    (ComponentType::ScholarlyArticles, general::parse_scholarly),
    (ComponentType::SearchesRelated, questions::parse_related),
    (ComponentType::ShortVideos, videos::parse_short),
    (ComponentType::TopImageCarousel, cards::parse_top_image_carousel),
    (ComponentType::TopStories, cards::parse_top_stories),
    (ComponentType::TwitterCards, twitter::parse_cards),
    (ComponentType::TwitterResult, twitter::parse_result),
    (ComponentType::Videos, videos::parse),
    (ComponentType::ViewMoreNews, cards::parse_view_more_news),
];

static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static SEARCH_BASE: LazyLock<Url> = LazyLock::new(|| Url::parse("https://www.google.com").unwrap());

/// Resolve a result href, unwrapping `/url?q=` redirects. Anything else is
/// returned as written.
pub fn clean_url(href: &str) -> String {
    redirect_target(href).unwrap_or_else(|| href.to_string())
}

/// Decoded `q` or `url` parameter of a search engine redirect.
fn redirect_target(href: &str) -> Option<String> {
    let url = SEARCH_BASE.join(href).ok()?;
    if url.path() != "/url" || !url.host_str()?.contains("google") {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "q" || key == "url")
        .map(|(_, target)| target.into_owned())
        .filter(|target| !target.is_empty())
}

/// Cleaned `href` of `elem` itself when it is a link, else of its first link.
pub fn link_url(elem: ElementRef<'_>) -> Option<String> {
    let href = match elem.value().attr("href") {
        Some(href) => href,
        None => find(elem, &LINK)?.value().attr("href")?,
    };
    Some(clean_url(href)).filter(|u| !u.is_empty() && !u.starts_with('#'))
}

/// Run `item` over every match of `selector`, keeping the items it accepts.
/// No match at all is reported as a missing element.
pub fn parse_cards<F>(elem: ElementRef<'_>, selector: &Selector, what: &'static str, item: F) -> Result<Value>
where
    F: Fn(ElementRef<'_>) -> Option<Value>,
{
    let cards = find_all(elem, selector);
    if cards.is_empty() {
        return Err(ParseError::Missing(what));
    }
    Ok(Value::Array(cards.into_iter().filter_map(item).collect()))
}

/// Trimmed text of `elem`, `None` when blank.
pub fn non_empty(text: String) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn redirects_are_unwrapped() {
        assert_eq!(clean_url("/url?q=https://a.com/x&sa=U"), "https://a.com/x");
        assert_eq!(clean_url("/url?sa=t&url=https://b.org"), "https://b.org");
        assert_eq!(clean_url("https://c.net"), "https://c.net");
        assert_eq!(clean_url("/search?q=rust"), "/search?q=rust");
    }

    #[test]
    fn redirect_targets_are_decoded() {
        assert_eq!(
            clean_url("/url?q=https://a.com/page%3Fid%3D1%26x%3Dy&sa=U"),
            "https://a.com/page?id=1&x=y"
        );
        assert_eq!(
            clean_url("https://www.google.com/url?sa=t&url=https%3A%2F%2Fb.org%2Fa%20b"),
            "https://b.org/a b"
        );
    }

    #[test]
    fn link_url_skips_fragments() {
        let html = Html::parse_document(r##"<div id="t"><a href="#">x</a></div><a id="u" href="/url?q=https://d.io">d</a>"##);
        let div = html.select(&sel("div#t")).next().unwrap();
        assert_eq!(link_url(div), None);
        let a = html.select(&sel("a#u")).next().unwrap();
        assert_eq!(link_url(a).as_deref(), Some("https://d.io"));
    }

    #[test]
    fn table_has_no_duplicates() {
        let mut kinds: Vec<_> = PARSERS.iter().map(|(k, _)| *k).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), PARSERS.len());
    }
}
