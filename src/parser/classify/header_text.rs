use scraper::ElementRef;

use crate::dom::heading_text;
use crate::parser::types::ComponentType::{self, *};

/// Prefixes of level-2 headings, checked top to bottom.
const H2_PREFIXES: &[(ComponentType, &[&str])] = &[
    (Directions, &["Directions"]),
    (DiscussionsAndForums, &["Discussions and forums"]),
    (General, &["Complementary Results", "Web Result with Site Links", "Web results"]),
    (Images, &["Images"]),
    (Jobs, &["Jobs"]),
    (
        Knowledge,
        &[
            "Calculator Result",
            "Featured snippet from the web",
            "Finance Results",
            "From sources across the web",
            "Knowledge Result",
            "Resultado de traducción",
            "Translation Result",
            "Unit Converter",
            "Weather Result",
        ],
    ),
    (LocalNews, &["Local news"]),
    (
        LocalResults,
        &["Local Results", "Locations", "Places", "Businesses", "Find results on", "Local results"],
    ),
    (MapResults, &["Map Results", "Choice Hotels"]),
    (NewsQuotes, &["Quotes in the news"]),
    (PeopleAlsoAsk, &["People also ask"]),
    (Perspectives, &["Perspectives & opinions", "Perspectives"]),
    (Products, &["Popular products"]),
    (RecentPosts, &["Recent posts"]),
    (ScholarlyArticles, &["Scholarly articles for"]),
    (
        SearchesRelated,
        &[
            "Additional searches",
            "More searches",
            "Other searches",
            "People also search for",
            "Related",
            "Searches related to",
        ],
    ),
    (ShortVideos, &["Short videos"]),
    (TopImageCarousel, &["Top images"]),
    (TopStories, &["Top stories", "News", "Market news"]),
    (TwitterCards, &["Twitter Results"]),
    (Videos, &["Videos"]),
    (ViewMoreNews, &["View more"]),
];

const H3_PREFIXES: &[(ComponentType, &[&str])] = &[
    (DiscussionsAndForums, &["Discussions and forums"]),
    (Images, &["Images for"]),
    (LatestFrom, &["Latest from"]),
    (LocalResults, &["Locations"]),
    (NewsQuotes, &["Quotes in the news"]),
    (ScholarlyArticles, &["Scholarly articles for"]),
    (SearchesRelated, &["People also search for", "Related searches", "Searches related to"]),
    (TopStories, &["Top stories"]),
    (Videos, &["Videos"]),
    (ViewMoreNews, &["View more news"]),
];

/// Classify by the text of the component's first `h2`, then its first `h3`.
pub fn classify(elem: ElementRef<'_>) -> ComponentType {
    [(2, H2_PREFIXES), (3, H3_PREFIXES)]
        .into_iter()
        .filter_map(|(level, table)| heading_text(elem, level).map(|text| match_prefix(&text, table)))
        .find(|ty| !ty.is_unknown())
        .unwrap_or(Unknown)
}

fn match_prefix(text: &str, table: &[(ComponentType, &[&str])]) -> ComponentType {
    let text = text.trim();
    table
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| text.starts_with(p)))
        .map(|(ty, _)| *ty)
        .unwrap_or(Unknown)
}
