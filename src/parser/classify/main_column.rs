use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::{header_text, when, Rule};
use crate::dom::{find_all, has, has_any_class, sel, text_of};
use crate::parser::types::ComponentType;

/// Main column chain. Order is significant: `general` sits ahead of the
/// narrower rules after it and claims anything carrying a result block.
pub static RULES: &[Rule] = &[
    Rule::new("header_text", header_text::classify),
    Rule::new("news_quotes", news_quotes),
    Rule::new("img_cards", img_cards),
    Rule::new("images", images),
    Rule::new("knowledge_panel", knowledge_panel),
    Rule::new("banner", banner),
    Rule::new("finance_panel", finance_panel),
    Rule::new("map_results", map_results),
    Rule::new("local_results", local_results),
    Rule::new("general_questions", general_questions),
    Rule::new("twitter", twitter),
    Rule::new("general", general),
    Rule::new("people_also_ask", people_also_ask),
    Rule::new("knowledge_block", knowledge_block),
    Rule::new("short_videos", short_videos),
    Rule::new("available_on", available_on),
    Rule::new("top_stories", top_stories),
    Rule::new("videos", videos),
];

static TRAY_HEADER: LazyLock<Selector> = LazyLock::new(|| sel("g-tray-header"));
static IMG_CARD: LazyLock<Selector> = LazyLock::new(|| sel("div.C7r6Ue"));
static IMG: LazyLock<Selector> = LazyLock::new(|| sel("img"));
static IMAGE_BOX: LazyLock<Selector> = LazyLock::new(|| sel("div#imagebox_bigimages, div#iur"));
static KNOWLEDGE: LazyLock<Selector> = LazyLock::new(|| {
    sel("h1.VW3apb, div.knowledge-panel, div.knavi, div.kp-blk, div.kp-wholepage-osrp, \
         div.obcontainer, div[aria-label=\"Featured results\"][role=complementary]")
});
static BANNER: LazyLock<Selector> = LazyLock::new(|| sel("div.uzjuFc"));
static FINANCE: LazyLock<Selector> =
    LazyLock::new(|| sel("div#knowledge-finance-wholepage__entity-summary"));
static MAP: LazyLock<Selector> = LazyLock::new(|| sel("div.lu_map_section, div.H93uF"));
static LOCAL: LazyLock<Selector> =
    LazyLock::new(|| sel("div.VkpGBb, div.Qq3Lb, div[jscontroller=AtSb]"));
static HYBRID: LazyLock<Selector> = LazyLock::new(|| sel("div.ifM9O"));
static ACCORDION: LazyLock<Selector> = LazyLock::new(|| sel("g-accordion"));
static SECTION_WITH_HEADER: LazyLock<Selector> = LazyLock::new(|| sel("g-section-with-header"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| sel("h2, h3, div[role=heading]"));
static CITE: LazyLock<Selector> = LazyLock::new(|| sel("cite"));
static GENERAL: LazyLock<Selector> = LazyLock::new(|| sel("div.g, div.Ww4FFb"));
static QUESTION: LazyLock<Selector> =
    LazyLock::new(|| sel("div.related-question-pair, div.wQiwMc"));
static KNOWLEDGE_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    sel("div.kno-rdesc, div.LGOjhe, div[data-attrid=\"wa:/description\"], div.ifM9O")
});
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static AVAILABLE_ON: LazyLock<Selector> = LazyLock::new(|| sel("div.Cbbd9c"));
static CAROUSEL: LazyLock<Selector> = LazyLock::new(|| sel("g-scrolling-carousel"));
static INNER_CARD: LazyLock<Selector> = LazyLock::new(|| sel("g-inner-card"));
static TOP_STORIES: LazyLock<Selector> =
    LazyLock::new(|| sel("div[aria-label=\"Top stories\"], div.JJZKK"));
static VIDEO: LazyLock<Selector> = LazyLock::new(|| sel("video-voyager, div.RzdJxc, div[data-vid]"));

fn news_quotes(elem: ElementRef<'_>) -> ComponentType {
    let is_quotes = text_of(elem, &TRAY_HEADER).is_some_and(|t| t.starts_with("Quotes in the news"));
    when(is_quotes, ComponentType::NewsQuotes)
}

fn img_cards(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &IMG_CARD) && has(elem, &IMG), ComponentType::ImgCards)
}

fn images(elem: ElementRef<'_>) -> ComponentType {
    let own_id = matches!(elem.value().id(), Some("imagebox_bigimages" | "iur"));
    when(own_id || has(elem, &IMAGE_BOX), ComponentType::Images)
}

fn knowledge_panel(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &KNOWLEDGE), ComponentType::Knowledge)
}

fn banner(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &BANNER), ComponentType::Banner)
}

fn finance_panel(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &FINANCE), ComponentType::Knowledge)
}

fn map_results(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &MAP), ComponentType::MapResults)
}

fn local_results(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &LOCAL), ComponentType::LocalResults)
}

/// A general result fused with an FAQ accordion.
fn general_questions(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &HYBRID) && has(elem, &ACCORDION), ComponentType::GeneralQuestions)
}

fn twitter(elem: ElementRef<'_>) -> ComponentType {
    let heading = text_of(elem, &HEADING).unwrap_or_default();
    let mentions_twitter = heading.contains("Twitter") || heading.ends_with("on X");
    if has(elem, &SECTION_WITH_HEADER) && mentions_twitter {
        return ComponentType::TwitterCards;
    }
    let cites_twitter = text_of(elem, &CITE)
        .is_some_and(|c| c.contains("twitter.com") || c.starts_with("x.com"));
    when(cites_twitter, ComponentType::TwitterResult)
}

fn general(elem: ElementRef<'_>) -> ComponentType {
    let own_class = has_any_class(elem, &["g", "hlcw0c", "PmEWq"]);
    when(own_class || has(elem, &GENERAL), ComponentType::General)
}

fn people_also_ask(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &QUESTION), ComponentType::PeopleAlsoAsk)
}

fn knowledge_block(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &KNOWLEDGE_BLOCK), ComponentType::Knowledge)
}

fn short_videos(elem: ElementRef<'_>) -> ComponentType {
    let shorts = find_all(elem, &LINK)
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("/shorts/") || href.contains("tiktok.com/"))
        .count();
    when(shorts >= 2, ComponentType::ShortVideos)
}

fn available_on(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &AVAILABLE_ON), ComponentType::AvailableOn)
}

fn top_stories(elem: ElementRef<'_>) -> ComponentType {
    let carousel = has(elem, &CAROUSEL) && has(elem, &INNER_CARD);
    when(carousel || has(elem, &TOP_STORIES), ComponentType::TopStories)
}

fn videos(elem: ElementRef<'_>) -> ComponentType {
    let youtube_heavy = find_all(elem, &LINK)
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("youtube.com/watch"))
        .count()
        >= 2;
    when(has(elem, &VIDEO) || youtube_heavy, ComponentType::Videos)
}

pub fn classify(elem: ElementRef<'_>) -> ComponentType {
    super::run_chain(RULES, elem)
}
