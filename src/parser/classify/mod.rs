//! Ordered classifier chains.
//!
//! Each section owns a slice of [`Rule`]s evaluated in declaration order; the
//! first rule returning something other than [`ComponentType::Unknown`] wins.
//! Priority is position in the slice, not specificity, so an early broad rule
//! shadows a later narrow one. Rules only look at the fragment they are given.

pub mod footer;
pub mod header;
pub mod header_text;
pub mod main_column;

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::types::{ComponentType, Section};
use crate::dom::{has, sel};

pub type Classifier = fn(ElementRef<'_>) -> ComponentType;

/// A named classifier. The name only shows up in logs and tests.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub classify: Classifier,
}

impl Rule {
    pub const fn new(name: &'static str, classify: Classifier) -> Self {
        Rule { name, classify }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Run `rules` in order and stop at the first concrete type.
pub fn run_chain(rules: &[Rule], elem: ElementRef<'_>) -> ComponentType {
    rules
        .iter()
        .map(|rule| (rule.classify)(elem))
        .find(|ty| !ty.is_unknown())
        .unwrap_or(ComponentType::Unknown)
}

/// Like [`run_chain`] but also reports which rule fired.
pub fn run_chain_traced(rules: &[Rule], elem: ElementRef<'_>) -> Option<(&'static str, ComponentType)> {
    rules.iter().find_map(|rule| {
        let ty = (rule.classify)(elem);
        (!ty.is_unknown()).then_some((rule.name, ty))
    })
}

pub fn classify(elem: ElementRef<'_>, section: Section) -> ComponentType {
    match section {
        Section::Header => run_chain(header::RULES, elem),
        Section::Main => run_chain(main_column::RULES, elem),
        Section::Footer => footer::classify(elem),
        Section::Rhs | Section::Unknown => ComponentType::Unknown,
    }
}

/// `ty` when `cond` holds, `Unknown` otherwise.
pub(crate) fn when(cond: bool, ty: ComponentType) -> ComponentType {
    if cond {
        ty
    } else {
        ComponentType::Unknown
    }
}

static HIDDEN_MARKERS: LazyLock<Selector> =
    LazyLock::new(|| sel("promo-throttler, div.RTaUke, span.oUAcPd, div.L6Djkc"));

/// Invisible experiment placeholders: hidden surveys and similar blocks that
/// render nothing but still occupy a slot in the markup.
pub fn is_hidden(elem: ElementRef<'_>) -> bool {
    let display_none = elem
        .value()
        .attr("style")
        .is_some_and(|s| s.replace(' ', "").contains("display:none"));
    display_none || has(elem, &HIDDEN_MARKERS)
}
