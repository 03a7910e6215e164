pub mod classify;
pub mod components;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod extract;
pub mod layout;
pub mod records;
pub mod segment;
pub mod types;

use std::sync::Arc;

use scraper::Html;
use serde::Serialize;
use tracing::debug;

use crate::features::{extract_features, SerpFeatures};
pub use components::{Component, ComponentList, Fragment, ParsedComponent, ParsedSerp};
pub use dispatch::{dispatch_and_parse, ParserFn, ParserRegistry};
pub use error::ParseError;
pub use export::export;
pub use layout::Layout;
pub use records::{SerpRecord, SubRecord};
pub use types::{ComponentType, Section};

/// A page to parse: raw markup or a document the caller already parsed.
#[derive(Debug)]
pub enum SerpInput {
    Html(String),
    Document(Html),
}

impl From<String> for SerpInput {
    fn from(html: String) -> Self {
        SerpInput::Html(html)
    }
}

impl From<&str> for SerpInput {
    fn from(html: &str) -> Self {
        SerpInput::Html(html.to_string())
    }
}

impl From<Html> for SerpInput {
    fn from(doc: Html) -> Self {
        SerpInput::Document(doc)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SerpOutput {
    pub layout: Layout,
    pub results: Vec<SerpRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<SerpFeatures>,
}

/// Four passes per page: segment the document into fragments, classify them
/// into ranked components, run each component's parser, export flat records.
///
/// Cheap to clone; clones share the parser registry.
#[derive(Debug, Clone)]
pub struct SerpParser {
    registry: Arc<ParserRegistry>,
}

impl Default for SerpParser {
    fn default() -> Self {
        SerpParser::new()
    }
}

impl SerpParser {
    /// Parser backed by the built-in registry.
    pub fn new() -> Self {
        SerpParser {
            registry: ParserRegistry::shared(),
        }
    }

    pub fn with_registry(registry: ParserRegistry) -> Self {
        SerpParser {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Segment and classify without parsing. Detaches the right-hand panel
    /// from `html`.
    pub fn segment_and_classify<'a>(&self, html: &'a mut Html) -> ComponentList<'a> {
        let segmentation = segment::segment(html);
        ComponentList::classify(segmentation.layout, segmentation.fragments)
    }

    pub fn parse<'a>(&self, components: ComponentList<'a>) -> ParsedSerp<'a> {
        let layout = components.layout();
        let components = components
            .into_components()
            .into_iter()
            .map(|component| ParsedComponent {
                records: dispatch_and_parse(&self.registry, &component),
                component,
            })
            .collect();
        ParsedSerp { layout, components }
    }

    pub fn process(&self, input: impl Into<SerpInput>, with_features: bool) -> SerpOutput {
        let (mut doc, raw) = match input.into() {
            SerpInput::Html(raw) => (Html::parse_document(&raw), Some(raw)),
            SerpInput::Document(doc) => (doc, None),
        };
        // Features read the markup before the right-hand panel is detached.
        let features = with_features.then(|| match &raw {
            Some(raw) => extract_features(raw),
            None => extract_features(&doc.html()),
        });

        let components = self.segment_and_classify(&mut doc);
        let parsed = self.parse(components);
        let results = export(&parsed);
        debug!(
            layout = %parsed.layout,
            components = parsed.components.len(),
            records = results.len(),
            "processed serp"
        );
        SerpOutput {
            layout: parsed.layout,
            results,
            features,
        }
    }
}

/// Parse a page into records with the built-in parsers.
pub fn parse_serp(html: &str) -> Vec<SerpRecord> {
    SerpParser::new().process(html, false).results
}

pub fn process(html: &str, with_features: bool) -> SerpOutput {
    SerpParser::new().process(html, with_features)
}
