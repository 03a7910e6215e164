use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::trace;

use super::{main_column, run_chain, when, Rule};
use crate::dom::{get_text, has, has_class, sel, text_of};
use crate::parser::types::ComponentType;

/// Footer-only patterns, tried before falling back to the main chain.
pub static RULES: &[Rule] = &[
    Rule::new("discover_more", discover_more),
    Rule::new("img_cards", img_cards),
    Rule::new("searches_related", searches_related),
    Rule::new("omitted_notice", omitted_notice),
];

const RELATED_LABELS: &[&str] = &[
    "Related",
    "Related searches",
    "People also search for",
    "Related to this search",
    "Searches related to",
];

static CAROUSEL: LazyLock<Selector> = LazyLock::new(|| sel("g-scrolling-carousel"));
static IMG: LazyLock<Selector> = LazyLock::new(|| sel("img"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| sel("h2, h3, div[role=heading]"));
static RELATED_LINKS: LazyLock<Selector> = LazyLock::new(|| sel("div.s75CSd, a.k8XOCe"));
static OMITTED: LazyLock<Selector> = LazyLock::new(|| sel("p#ofr"));
static H2: LazyLock<Selector> = LazyLock::new(|| sel("h2"));

pub fn classify(elem: ElementRef<'_>) -> ComponentType {
    let ty = run_chain(RULES, elem);
    if !ty.is_unknown() {
        return ty;
    }
    trace!("footer patterns missed, trying main chain");
    run_chain(main_column::RULES, elem)
}

fn discover_more(elem: ElementRef<'_>) -> ComponentType {
    let is_discover = has(elem, &CAROUSEL) && get_text(elem, " ").contains("Discover more");
    when(is_discover, ComponentType::DiscoverMore)
}

fn img_cards(elem: ElementRef<'_>) -> ComponentType {
    when(has_class(elem, "g") && has(elem, &IMG), ComponentType::ImgCards)
}

fn searches_related(elem: ElementRef<'_>) -> ComponentType {
    let labelled = text_of(elem, &HEADING)
        .is_some_and(|h| RELATED_LABELS.iter().any(|label| h.starts_with(label)));
    let is_related = elem.value().id() == Some("brs") || labelled || has(elem, &RELATED_LINKS);
    when(is_related, ComponentType::SearchesRelated)
}

fn omitted_notice(elem: ElementRef<'_>) -> ComponentType {
    let is_omitted = has_class(elem, "ClPXac")
        || has(elem, &OMITTED)
        || text_of(elem, &H2).is_some_and(|h| h == "Notices about Filtered Results");
    when(is_omitted, ComponentType::OmittedNotice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn classify_html(body: &str) -> ComponentType {
        let html = Html::parse_document(body);
        let div = html.select(&sel("body > div")).next().unwrap();
        classify(div)
    }

    #[test]
    fn footer_patterns() {
        assert_eq!(
            classify_html(r#"<div id="brs"><a href="/search?q=a">a</a></div>"#),
            ComponentType::SearchesRelated
        );
        assert_eq!(
            classify_html(r#"<div><p id="ofr"><i>In order to show you the most relevant results...</i></p></div>"#),
            ComponentType::OmittedNotice
        );
        assert_eq!(
            classify_html(r#"<div><h3>Discover more</h3><g-scrolling-carousel><a>x</a></g-scrolling-carousel></div>"#),
            ComponentType::DiscoverMore
        );
    }

    #[test]
    fn falls_back_to_main_chain() {
        let body = r#"<div class="MjjYud"><div class="g"><a href="https://a.com"><h3>A</h3></a></div></div>"#;
        assert_eq!(classify_html(body), ComponentType::General);
    }

    #[test]
    fn footer_rules_take_priority_over_main() {
        // A `g` block with an image is `general` in the main chain, but the
        // footer checks `img_cards` first.
        let body = r#"<div class="g"><img src="a.png"><a href="https://a.com"><h3>A</h3></a></div>"#;
        assert_eq!(classify_html(body), ComponentType::ImgCards);
        let html = Html::parse_document(body);
        let div = html.select(&sel("body > div")).next().unwrap();
        assert_eq!(main_column::classify(div), ComponentType::General);
    }
}
