use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::{when, Rule};
use crate::dom::{find_all, get_text, has, sel};
use crate::parser::types::ComponentType;

pub static RULES: &[Rule] = &[
    Rule::new("top_image_carousel", top_image_carousel),
    Rule::new("notice", notice),
];

static CAROUSEL: LazyLock<Selector> = LazyLock::new(|| sel("g-scrolling-carousel"));
static SRC: LazyLock<Selector> = LazyLock::new(|| sel("[src]"));

const NOTICE_PREFIXES: &[&str] = &[
    "Showing results for",
    "Including results for",
    "Did you mean",
    "Search instead for",
    "No results found for",
    "Results for",
    "Search for English results only",
];

/// A real image is one whose `src` is set eagerly, not deferred through `data-src`.
pub fn has_real_image(elem: ElementRef<'_>) -> bool {
    find_all(elem, &SRC)
        .into_iter()
        .any(|e| e.value().attr("data-src").is_none())
}

fn top_image_carousel(elem: ElementRef<'_>) -> ComponentType {
    when(has(elem, &CAROUSEL) && has_real_image(elem), ComponentType::TopImageCarousel)
}

fn notice(elem: ElementRef<'_>) -> ComponentType {
    let text = get_text(elem, " ");
    let is_notice = elem.value().id() == Some("oFNiHe")
        || NOTICE_PREFIXES.iter().any(|p| text.starts_with(p));
    when(is_notice, ComponentType::Notice)
}
