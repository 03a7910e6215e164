use scraper::ElementRef;

use super::classify;
use super::layout::Layout;
use super::records::SubRecord;
use super::types::{ComponentType, Section};
use crate::dom::{get_text, RAW_TEXT_SEP};

/// A raw block cut out of the page by the segmenter.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    pub elem: ElementRef<'a>,
    pub section: Section,
    /// Type known from structure alone (ads, notices); skips classification.
    pub preset: Option<ComponentType>,
}

impl<'a> Fragment<'a> {
    pub fn new(elem: ElementRef<'a>, section: Section) -> Self {
        Fragment { elem, section, preset: None }
    }

    pub fn typed(elem: ElementRef<'a>, section: Section, kind: ComponentType) -> Self {
        Fragment { elem, section, preset: Some(kind) }
    }
}

/// A fragment with its rank and final type.
#[derive(Debug, Clone, Copy)]
pub struct Component<'a> {
    pub elem: ElementRef<'a>,
    pub section: Section,
    pub kind: ComponentType,
    pub cmpt_rank: usize,
}

impl<'a> Component<'a> {
    pub fn raw_text(&self) -> String {
        get_text(self.elem, RAW_TEXT_SEP)
    }
}

/// Classified components of one page, in report order.
#[derive(Debug, Clone)]
pub struct ComponentList<'a> {
    layout: Layout,
    components: Vec<Component<'a>>,
}

impl<'a> ComponentList<'a> {
    pub fn new(layout: Layout) -> Self {
        ComponentList { layout, components: Vec::new() }
    }

    /// Classify every fragment and rank it by its position in `fragments`.
    pub fn classify(layout: Layout, fragments: Vec<Fragment<'a>>) -> Self {
        let mut list = ComponentList::new(layout);
        for fragment in fragments {
            list.push(fragment);
        }
        list
    }

    /// Append a fragment. Its rank is the next value of the component counter.
    pub fn push(&mut self, fragment: Fragment<'a>) -> &Component<'a> {
        let kind = fragment
            .preset
            .unwrap_or_else(|| classify::classify(fragment.elem, fragment.section));
        let cmpt_rank = self.components.len();
        self.components.push(Component {
            elem: fragment.elem,
            section: fragment.section,
            kind,
            cmpt_rank,
        });
        &self.components[cmpt_rank]
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component<'a>> {
        self.components.iter()
    }

    pub fn into_components(self) -> Vec<Component<'a>> {
        self.components
    }
}

impl<'a, 'l> IntoIterator for &'l ComponentList<'a> {
    type Item = &'l Component<'a>;
    type IntoIter = std::slice::Iter<'l, Component<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

/// A component together with the records its parser produced.
#[derive(Debug, Clone)]
pub struct ParsedComponent<'a> {
    pub component: Component<'a>,
    pub records: Vec<SubRecord>,
}

/// Every parsed component of one page, ready for export.
#[derive(Debug, Clone)]
pub struct ParsedSerp<'a> {
    pub layout: Layout,
    pub components: Vec<ParsedComponent<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::sel;
    use scraper::Html;

    #[test]
    fn ranks_follow_append_order() {
        let html = Html::parse_document(
            r#"<div class="g"><h3>a</h3></div><div id="tads">ad</div><div><span>?</span></div>"#,
        );
        let divs: Vec<_> = html.select(&sel("body > div")).collect();
        let list = ComponentList::classify(
            Layout::Standard,
            vec![
                Fragment::new(divs[0], Section::Main),
                Fragment::typed(divs[1], Section::Main, ComponentType::Ad),
                Fragment::new(divs[2], Section::Footer),
            ],
        );
        let got: Vec<_> = list.iter().map(|c| (c.cmpt_rank, c.kind)).collect();
        assert_eq!(
            got,
            vec![
                (0, ComponentType::General),
                (1, ComponentType::Ad),
                (2, ComponentType::Unknown),
            ]
        );
        assert_eq!(list.layout(), Layout::Standard);
    }

    #[test]
    fn preset_skips_classifier() {
        let html = Html::parse_document(r#"<div class="g"><h3>a</h3></div>"#);
        let div = html.select(&sel("body > div")).next().unwrap();
        let mut list = ComponentList::new(Layout::Standard);
        let cmpt = list.push(Fragment::typed(div, Section::Header, ComponentType::Notice));
        assert_eq!(cmpt.kind, ComponentType::Notice);
        assert_eq!(cmpt.raw_text(), "a");
    }
}
