use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse position of a component on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Header,
    Main,
    Footer,
    Rhs,
    Unknown,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Main => "main",
            Section::Footer => "footer",
            Section::Rhs => "rhs",
            Section::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! component_types {
    ($($variant:ident => $name:literal,)+) => {
        /// Semantic type of a component. `Unknown` is the classifier default.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ComponentType {
            $($variant,)+
        }

        impl ComponentType {
            pub const ALL: &'static [ComponentType] = &[$(ComponentType::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(ComponentType::$variant => $name,)+
                }
            }
        }

        impl FromStr for ComponentType {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ComponentType::$variant),)+
                    other => Err(format!("unknown component type: {other}")),
                }
            }
        }
    };
}

component_types! {
    Ad => "ad",
    AvailableOn => "available_on",
    Banner => "banner",
    Directions => "directions",
    DiscoverMore => "discover_more",
    DiscussionsAndForums => "discussions_and_forums",
    General => "general",
    GeneralQuestions => "general_questions",
    Images => "images",
    ImgCards => "img_cards",
    Jobs => "jobs",
    Knowledge => "knowledge",
    KnowledgeRhs => "knowledge_rhs",
    LatestFrom => "latest_from",
    LocalNews => "local_news",
    LocalResults => "local_results",
    MapResults => "map_results",
    NewsQuotes => "news_quotes",
    Notice => "notice",
    OmittedNotice => "omitted_notice",
    PeopleAlsoAsk => "people_also_ask",
    Perspectives => "perspectives",
    Products => "products",
    RecentPosts => "recent_posts",
    ScholarlyArticles => "scholarly_articles",
    SearchesRelated => "searches_related",
    ShortVideos => "short_videos",
    TopImageCarousel => "top_image_carousel",
    TopStories => "top_stories",
    TwitterCards => "twitter_cards",
    TwitterResult => "twitter_result",
    Videos => "videos",
    ViewMoreNews => "view_more_news",
    Unknown => "unknown",
}

impl ComponentType {
    pub fn is_unknown(self) -> bool {
        self == ComponentType::Unknown
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde() {
        for ty in ComponentType::ALL {
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
            assert_eq!(ty.as_str().parse::<ComponentType>().unwrap(), *ty);
        }
    }

    #[test]
    fn unparseable_type() {
        assert!("carousel_of_doom".parse::<ComponentType>().is_err());
    }
}
