//! Type to parser dispatch.
//!
//! Every component goes through [`dispatch_and_parse`] and comes out as at
//! least one [`SubRecord`]. Parser errors, panics and malformed output are
//! contained here and turned into stub records so one bad block never costs
//! the rest of the page.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, LazyLock};

use scraper::ElementRef;
use serde_json::Value;
use tracing::{error, trace, warn};

use super::components::Component;
use super::error::Result;
use super::extract;
use super::records::{RawSubRecord, SubRecord};
use super::types::ComponentType;

pub type ParserFn = fn(ElementRef<'_>) -> Result<Value>;

pub const NOT_IMPLEMENTED: &str = "not implemented";
pub const NO_SUBCOMPONENTS: &str = "No subcomponents parsed";
pub const NO_DATA: &str = "parser returned no data";

thread_local! {
    static IN_PARSER: Cell<bool> = const { Cell::new(false) };
}

/// Whether a component parser is running on this thread. A panic hook can
/// use it to tell contained parser panics from real ones.
pub fn in_parser() -> bool {
    IN_PARSER.with(Cell::get)
}

static BUILTIN: LazyLock<Arc<ParserRegistry>> =
    LazyLock::new(|| Arc::new(ParserRegistry::builtin()));

/// Binding from component type to its parser.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<ComponentType, ParserFn>,
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.parsers.keys().collect();
        kinds.sort();
        f.debug_struct("ParserRegistry").field("types", &kinds).finish()
    }
}

impl ParserRegistry {
    pub fn empty() -> Self {
        ParserRegistry::default()
    }

    /// Registry holding every built-in parser.
    pub fn builtin() -> Self {
        let mut registry = ParserRegistry::empty();
        for (kind, parser) in extract::PARSERS {
            registry.register(*kind, *parser);
        }
        registry
    }

    /// Shared handle to the built-in registry, built on first use.
    pub fn shared() -> Arc<ParserRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Bind `parser` to `kind`, returning the parser it replaced.
    pub fn register(&mut self, kind: ComponentType, parser: ParserFn) -> Option<ParserFn> {
        self.parsers.insert(kind, parser)
    }

    pub fn get(&self, kind: ComponentType) -> Option<ParserFn> {
        self.parsers.get(&kind).copied()
    }

    pub fn contains(&self, kind: ComponentType) -> bool {
        self.parsers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

/// Parse one component into its sub-records. Never fails and never returns
/// an empty list.
pub fn dispatch_and_parse(registry: &ParserRegistry, cmpt: &Component<'_>) -> Vec<SubRecord> {
    if cmpt.kind.is_unknown() {
        return vec![SubRecord::stub(ComponentType::Unknown, cmpt.raw_text(), None)];
    }
    let Some(parser) = registry.get(cmpt.kind) else {
        trace!(cmpt_rank = cmpt.cmpt_rank, cmpt_type = %cmpt.kind, "no parser registered");
        return vec![SubRecord::stub(cmpt.kind, cmpt.raw_text(), Some(NOT_IMPLEMENTED.into()))];
    };

    let elem = cmpt.elem;
    IN_PARSER.with(|flag| flag.set(true));
    let outcome = catch_unwind(AssertUnwindSafe(|| parser(elem)));
    IN_PARSER.with(|flag| flag.set(false));
    let value = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => return failed(cmpt, err.to_string()),
        Err(payload) => return failed(cmpt, format!("parser panicked: {}", panic_message(&*payload))),
    };

    match normalize(value, cmpt.kind) {
        Ok(records) => records,
        Err(Failure::Empty(reason)) => {
            warn!(
                cmpt_rank = cmpt.cmpt_rank,
                section = %cmpt.section,
                cmpt_type = %cmpt.kind,
                "{reason}"
            );
            vec![SubRecord::stub(cmpt.kind, cmpt.raw_text(), Some(reason.into()))]
        }
        Err(Failure::Schema(reason)) => failed(cmpt, reason),
    }
}

enum Failure {
    Empty(&'static str),
    Schema(String),
}

fn failed(cmpt: &Component<'_>, reason: String) -> Vec<SubRecord> {
    error!(
        cmpt_rank = cmpt.cmpt_rank,
        section = %cmpt.section,
        cmpt_type = %cmpt.kind,
        error = %reason,
        "parser failed"
    );
    vec![SubRecord::stub(cmpt.kind, cmpt.raw_text(), Some(reason))]
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

/// Coerce parser output into validated records. Objects count as a one-item
/// list; a single bad item rejects the whole output.
fn normalize(value: Value, kind: ComponentType) -> std::result::Result<Vec<SubRecord>, Failure> {
    let items = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) if items.is_empty() => return Err(Failure::Empty(NO_SUBCOMPONENTS)),
        Value::Array(items) => items,
        _ => return Err(Failure::Empty(NO_DATA)),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            serde_json::from_value::<RawSubRecord>(item)
                .map(|raw| raw.normalize(position, kind))
                .map_err(|e| Failure::Schema(format!("invalid record at position {position}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::sel;
    use crate::parser::components::{ComponentList, Fragment};
    use crate::parser::error::ParseError;
    use crate::parser::layout::Layout;
    use crate::parser::types::Section;
    use scraper::Html;
    use serde_json::json;

    fn with_component<F>(kind: ComponentType, check: F)
    where
        F: FnOnce(&Component<'_>),
    {
        let html = Html::parse_document(r#"<div class="blk"><h3>Title</h3><span>body text</span></div>"#);
        let div = html.select(&sel("div.blk")).next().unwrap();
        let mut list = ComponentList::new(Layout::Standard);
        let cmpt = *list.push(Fragment::typed(div, Section::Main, kind));
        check(&cmpt);
    }

    fn run(parser: ParserFn) -> Vec<SubRecord> {
        let mut registry = ParserRegistry::empty();
        registry.register(ComponentType::General, parser);
        let mut out = Vec::new();
        with_component(ComponentType::General, |c| out = dispatch_and_parse(&registry, c));
        out
    }

    fn raw_text(rec: &SubRecord) -> Option<&str> {
        rec.details.as_ref()?.get("raw_text")?.as_str()
    }

    #[test]
    fn unknown_yields_error_free_stub() {
        let registry = ParserRegistry::builtin();
        with_component(ComponentType::Unknown, |c| {
            let records = dispatch_and_parse(&registry, c);
            assert_eq!(records.len(), 1);
            let rec = &records[0];
            assert_eq!(rec.kind, ComponentType::Unknown);
            assert_eq!(rec.sub_rank, 0);
            assert!(rec.error.is_none());
            assert!(rec.title.is_none() && rec.url.is_none() && rec.text.is_none());
            assert_eq!(raw_text(rec), Some("Title<|>body text"));
        });
    }

    #[test]
    fn missing_parser_is_not_implemented() {
        let registry = ParserRegistry::empty();
        with_component(ComponentType::Jobs, |c| {
            let records = dispatch_and_parse(&registry, c);
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].kind, ComponentType::Jobs);
            assert_eq!(records[0].error.as_deref(), Some(NOT_IMPLEMENTED));
        });
    }

    #[test]
    fn failing_parser_is_isolated() {
        fn always_fails(_: ElementRef<'_>) -> Result<Value> {
            Err(ParseError::Missing("title"))
        }
        let records = run(always_fails);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ComponentType::General);
        assert_eq!(records[0].error.as_deref(), Some("missing element: title"));
        assert_eq!(raw_text(&records[0]), Some("Title<|>body text"));
    }

    #[test]
    fn panicking_parser_is_isolated() {
        fn panics(_: ElementRef<'_>) -> Result<Value> {
            panic!("index out of range")
        }
        let records = run(panics);
        assert_eq!(records.len(), 1);
        let error = records[0].error.as_deref().unwrap();
        assert!(error.contains("index out of range"), "{error}");
    }

    #[test]
    fn parser_runs_are_flagged() {
        fn reports_flag(_: ElementRef<'_>) -> Result<Value> {
            Ok(json!({ "title": in_parser().to_string() }))
        }
        fn panics(_: ElementRef<'_>) -> Result<Value> {
            assert!(in_parser());
            panic!("boom")
        }
        assert!(!in_parser());
        assert_eq!(run(reports_flag)[0].title.as_deref(), Some("true"));
        assert!(!in_parser());
        let error = run(panics)[0].error.clone().unwrap();
        assert!(error.contains("boom"), "{error}");
        assert!(!in_parser());
    }

    #[test]
    fn empty_list_becomes_stub() {
        fn nothing(_: ElementRef<'_>) -> Result<Value> {
            Ok(json!([]))
        }
        let records = run(nothing);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error.as_deref(), Some(NO_SUBCOMPONENTS));
    }

    #[test]
    fn non_collection_output_becomes_stub() {
        fn scalar(_: ElementRef<'_>) -> Result<Value> {
            Ok(Value::Null)
        }
        assert_eq!(run(scalar)[0].error.as_deref(), Some(NO_DATA));
    }

    #[test]
    fn single_object_is_one_record() {
        fn one(_: ElementRef<'_>) -> Result<Value> {
            Ok(json!({ "title": "Title", "url": "https://a.com", "rating": 4.5 }))
        }
        let records = run(one);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("Title"));
        assert_eq!(records[0].details, Some(json!({ "rating": 4.5 })));
        assert!(records[0].error.is_none());
    }

    #[test]
    fn bad_item_fails_whole_component() {
        fn mixed(_: ElementRef<'_>) -> Result<Value> {
            Ok(json!([{ "title": "ok" }, { "title": 42 }]))
        }
        let records = run(mixed);
        assert_eq!(records.len(), 1);
        assert!(records[0].title.is_none());
        assert!(records[0].error.as_deref().unwrap().contains("position 1"));
    }

    #[test]
    fn records_keep_emission_order_and_relabels() {
        fn two(_: ElementRef<'_>) -> Result<Value> {
            Ok(json!([
                { "title": "a" },
                { "title": "b", "type": "general_questions" }
            ]))
        }
        let records = run(two);
        let got: Vec<_> = records.iter().map(|r| (r.sub_rank, r.kind)).collect();
        assert_eq!(
            got,
            vec![(0, ComponentType::General), (1, ComponentType::GeneralQuestions)]
        );
    }

    #[test]
    fn register_overrides_builtin() {
        fn custom(_: ElementRef<'_>) -> Result<Value> {
            Ok(json!({ "title": "custom" }))
        }
        let mut registry = ParserRegistry::builtin();
        assert!(registry.contains(ComponentType::General));
        assert!(registry.register(ComponentType::General, custom).is_some());
        with_component(ComponentType::General, |c| {
            assert_eq!(dispatch_and_parse(&registry, c)[0].title.as_deref(), Some("custom"));
        });
    }

    #[test]
    fn builtin_leaves_gaps_for_unparsed_types() {
        let registry = ParserRegistry::shared();
        for kind in [ComponentType::Directions, ComponentType::Jobs, ComponentType::Products] {
            assert!(!registry.contains(kind), "{kind}");
        }
        assert!(!registry.contains(ComponentType::Unknown));
    }
}
