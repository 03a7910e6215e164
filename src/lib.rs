//! Search results page parsing: layout detection, segmentation into
//! components, classification, per-type parsing and export into flat records.

pub mod dom;
pub mod features;
pub mod parser;

pub use features::{extract_features, SerpFeatures};
pub use parser::{
    parse_serp, process, Component, ComponentList, ComponentType, Layout, ParseError, ParsedSerp,
    ParserRegistry, Section, SerpInput, SerpOutput, SerpParser, SerpRecord, SubRecord,
};
