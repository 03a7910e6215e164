//! Page segmentation.
//!
//! Cuts the document into ordered fragments: right-hand panel (held aside),
//! header, main column, footer, then the held-aside panel last. The main
//! column rule depends on the detected [`Layout`].

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::classify::is_hidden;
use super::classify::header::has_real_image;
use super::components::Fragment;
use super::layout::{Layout, LayoutDivs};
use super::types::{ComponentType, Section};
use crate::dom::{attr_is, child_elements, find, find_all, get_text, has, has_class, is_within, sel};

static RHS: LazyLock<Selector> = LazyLock::new(|| sel("div#rhs"));
static RHS_KNOWLEDGE: LazyLock<Selector> =
    LazyLock::new(|| sel("div.kp-wholepage, div.knowledge-panel, div.TzHB6b"));
static APPBAR: LazyLock<Selector> = LazyLock::new(|| sel("div#appbar"));
static CAROUSEL: LazyLock<Selector> = LazyLock::new(|| sel("g-scrolling-carousel"));
static NOTICES: LazyLock<Selector> = LazyLock::new(|| sel("div#oFNiHe"));
static ADS_TOP: LazyLock<Selector> = LazyLock::new(|| sel("div#tads"));
static ADS_BOTTOM: LazyLock<Selector> = LazyLock::new(|| sel("div#tadsb"));
static BOTSTUFF: LazyLock<Selector> = LazyLock::new(|| sel("div#botstuff"));
static FOOTER_BLOCKS: LazyLock<Selector> = LazyLock::new(|| sel("div#bres, div#brs"));
static FOOTER_EXPAND: LazyLock<Selector> = LazyLock::new(|| sel("div.MjjYud"));
static OMITTED_NOTICE: LazyLock<Selector> = LazyLock::new(|| sel("div.ClPXac"));
static TAB_CARDS: LazyLock<Selector> = LazyLock::new(|| sel("div.TzHB6b"));
static RESULT_ROWS: LazyLock<Selector> = LazyLock::new(|| sel("div.sY1Rxc"));
static BANNER_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| sel("div[jscontroller=qTdDb], div[jscontroller=OWrb3e]"));
static NO_RSO_SECTIONS: LazyLock<Selector> = LazyLock::new(|| sel("div.UDZeY.OTFaAf"));
static NO_RSO_SECONDARY: LazyLock<Selector> = LazyLock::new(|| sel("div.WvKfwe.a3spGf"));
static H2: LazyLock<Selector> = LazyLock::new(|| sel("h2"));
static DIV: LazyLock<Selector> = LazyLock::new(|| sel("div"));
static SECTION_WITH_HEADER: LazyLock<Selector> = LazyLock::new(|| sel("g-section-with-header"));
static MORE_LINK: LazyLock<Selector> = LazyLock::new(|| sel("g-more-link"));
static FOOTER_MARKER: LazyLock<Selector> = LazyLock::new(|| sel("div.oIk2Cb"));
static GENERAL: LazyLock<Selector> = LazyLock::new(|| sel("div.g"));

const DROP_TAGS: &[&str] = &["script", "style"];
const DROP_TEXT: &[&str] = &["", "Main results", "Twitter Results"];

/// Ordered fragments of one page plus the layout that produced the main column.
#[derive(Debug, Clone)]
pub struct Segmentation<'a> {
    pub layout: Layout,
    pub fragments: Vec<Fragment<'a>>,
}

/// Segment `html`. The right-hand panel is detached from the tree first so
/// no later step can pick it up again; it is reported after the footer.
pub fn segment<'a>(html: &'a mut Html) -> Segmentation<'a> {
    let rhs_id = html.select(&RHS).next().map(|rhs| rhs.id());
    if let Some(id) = rhs_id {
        if let Some(mut node) = html.tree.get_mut(id) {
            node.detach();
        }
    }
    let html: &'a Html = html;
    let rhs = rhs_id
        .and_then(|id| html.tree.get(id))
        .and_then(ElementRef::wrap)
        .and_then(rhs_fragment);

    let mut segmenter = Segmenter::new(html);
    segmenter.extract_header();
    segmenter.extract_main();
    segmenter.extract_footer();
    if let Some(rhs) = rhs {
        debug!(rhs_type = %rhs.preset.unwrap_or(ComponentType::Unknown), "appending rhs");
        segmenter.fragments.push(rhs);
    }
    debug!(
        layout = %segmenter.layout,
        fragments = segmenter.fragments.len(),
        "segmented page"
    );

    Segmentation {
        layout: segmenter.layout,
        fragments: segmenter.fragments,
    }
}

fn rhs_fragment(rhs: ElementRef<'_>) -> Option<Fragment<'_>> {
    if !is_valid_component(rhs) {
        return None;
    }
    if attr_is(rhs, "role", "complementary") {
        return Some(Fragment::typed(rhs, Section::Rhs, ComponentType::KnowledgeRhs));
    }
    match find(rhs, &RHS_KNOWLEDGE) {
        Some(panel) => Some(Fragment::typed(panel, Section::Rhs, ComponentType::KnowledgeRhs)),
        None => Some(Fragment::new(rhs, Section::Rhs)),
    }
}

/// Visible, non-placeholder block.
pub fn is_valid_component(elem: ElementRef<'_>) -> bool {
    let text = get_text(elem, "");
    !DROP_TEXT.contains(&text.as_str()) && !is_hidden(elem)
}

struct Segmenter<'a> {
    html: &'a Html,
    layout: Layout,
    fragments: Vec<Fragment<'a>>,
    /// Containers already emitted whole; the column must not re-emit them.
    claimed: Vec<ElementRef<'a>>,
}

impl<'a> Segmenter<'a> {
    fn new(html: &'a Html) -> Self {
        Segmenter {
            html,
            layout: Layout::Standard,
            fragments: Vec::new(),
            claimed: Vec::new(),
        }
    }

    fn push(&mut self, fragment: Fragment<'a>) {
        self.fragments.push(fragment);
    }

    fn extract_header(&mut self) {
        if let Some(appbar) = self.html.select(&APPBAR).next() {
            if has(appbar, &CAROUSEL) && has_real_image(appbar) {
                self.push(Fragment::typed(appbar, Section::Header, ComponentType::TopImageCarousel));
            }
        }
        let notices: Vec<_> = self
            .html
            .select(&NOTICES)
            .filter(|n| !get_text(*n, "").is_empty())
            .collect();
        debug!(notices = notices.len(), "header notices");
        for notice in notices {
            self.push(Fragment::typed(notice, Section::Header, ComponentType::Notice));
        }
    }

    fn extract_main(&mut self) {
        self.extract_ads(&ADS_TOP);
        self.extract_main_column();
        self.extract_ads(&ADS_BOTTOM);
    }

    fn extract_ads(&mut self, selector: &Selector) {
        let Some(ads) = self.html.select(selector).next() else {
            return;
        };
        self.claimed.push(ads);
        if !get_text(ads, "").is_empty() {
            self.push(Fragment::typed(ads, Section::Main, ComponentType::Ad));
        }
    }

    fn extract_main_column(&mut self) {
        // Bottom ads may sit inside the main container; claim them up front.
        if let Some(ads) = self.html.select(&ADS_BOTTOM).next() {
            self.claimed.push(ads);
        }
        let divs = LayoutDivs::locate(self.html);
        self.layout = divs.layout();
        debug!(layout = %self.layout, "detected layout");

        let column = match self.layout {
            Layout::NoRso => self.column_no_rso(),
            Layout::LeftBar => self.column_left_bar(),
            Layout::TopBars => self.column_top_bars(&divs),
            _ => self.column_standard(&divs),
        };

        let before = self.fragments.len();
        for elem in column {
            if self.is_claimed(elem) || !is_valid_component(elem) {
                continue;
            }
            self.push(Fragment::new(elem, Section::Main));
        }
        debug!(components = self.fragments.len() - before, layout = %self.layout, "main column");
    }

    fn is_claimed(&self, elem: ElementRef<'_>) -> bool {
        self.claimed.iter().any(|c| is_within(elem, *c))
    }

    fn column_standard(&mut self, divs: &LayoutDivs<'a>) -> Vec<ElementRef<'a>> {
        let Some(rso) = divs.rso else {
            return Vec::new();
        };
        let column: Vec<_> = extract_children(rso)
            .into_iter()
            .filter(|c| !self.is_claimed(*c) && is_valid_component(*c))
            .collect();
        if !column.is_empty() {
            return column;
        }
        self.layout = Layout::StandardAlt;
        debug!("layout update: {}", self.layout);
        find_all(rso, &TAB_CARDS)
    }

    fn column_top_bars(&mut self, divs: &LayoutDivs<'a>) -> Vec<ElementRef<'a>> {
        let mut column = extract_top_bars(&divs.top_bars);
        let Some(rso) = divs.rso else {
            return column;
        };
        let rows: Vec<_> = find(rso, &RESULT_ROWS)
            .map(|r| child_elements(r).filter(|c| is_valid_component(*c)).collect())
            .unwrap_or_default();
        if rows.is_empty() {
            self.layout = Layout::TopBarsChildren;
            column.extend(extract_children(rso));
        } else {
            self.layout = Layout::TopBarsDivs;
            column.extend(rows);
        }
        debug!("layout update: {}", self.layout);
        column
    }

    fn column_left_bar(&mut self) -> Vec<ElementRef<'a>> {
        self.html.select(&TAB_CARDS).collect()
    }

    fn column_no_rso(&mut self) -> Vec<ElementRef<'a>> {
        let mut column = Vec::new();
        for section in self.html.select(&NO_RSO_SECTIONS) {
            let is_twitter = find(section, &H2).is_some_and(|h| get_text(h, " ") == "Twitter Results");
            if is_twitter {
                if let Some(block) = find(section, &DIV).and_then(parent_element) {
                    column.push(block);
                }
            } else if let Some(with_header) = find(section, &SECTION_WITH_HEADER) {
                column.extend(parent_element(with_header));
            } else if has(section, &MORE_LINK) {
                column.extend(child_elements(section));
            } else if has(section, &FOOTER_MARKER) {
                column.push(section);
            } else {
                column.extend(find_all(section, &GENERAL));
            }
        }
        if let Some(secondary) = self.html.select(&NO_RSO_SECONDARY).next() {
            column.extend(child_elements(secondary));
        }
        column.retain(|c| !DROP_TAGS.contains(&c.value().name()));
        column
    }

    fn extract_footer(&mut self) {
        let mut footer = Vec::new();
        if let Some(botstuff) = self.html.select(&BOTSTUFF).next() {
            for block in find_all(botstuff, &FOOTER_BLOCKS) {
                let expanded = find_all(block, &FOOTER_EXPAND);
                if expanded.len() > 1 {
                    footer.extend(expanded);
                } else {
                    footer.push(block);
                }
            }
        }
        if let Some(omitted) = self.html.select(&OMITTED_NOTICE).next() {
            if !footer.iter().any(|f: &ElementRef<'a>| f.id() == omitted.id()) {
                footer.push(omitted);
            }
        }
        footer.retain(|f| is_valid_component(*f));
        debug!(footer = footer.len(), "footer components");
        for elem in footer {
            self.push(Fragment::new(elem, Section::Footer));
        }
    }
}

fn parent_element(elem: ElementRef<'_>) -> Option<ElementRef<'_>> {
    elem.parent().and_then(ElementRef::wrap)
}

/// Element children of `elem` without script/style, with attribute-less
/// wrappers replaced by their own children.
fn extract_children(elem: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut children = Vec::new();
    for child in child_elements(elem) {
        if DROP_TAGS.contains(&child.value().name()) {
            continue;
        }
        if child.value().attrs().next().is_none() {
            children.extend(child_elements(child).filter(|c| !DROP_TAGS.contains(&c.value().name())));
        } else {
            children.push(child);
        }
    }
    children
}

/// `M8OgIe` banners hold several knowledge blocks; other bars are one block.
fn extract_top_bars<'a>(top_bars: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    let mut out = Vec::new();
    for bar in top_bars {
        if has_class(*bar, "M8OgIe") {
            let blocks: Vec<_> = find_all(*bar, &BANNER_BLOCKS)
                .into_iter()
                .filter(|b| !get_text(*b, "").is_empty())
                .collect();
            debug!(blocks = blocks.len(), "M8OgIe banner");
            out.extend(blocks);
        } else {
            out.push(*bar);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    fn summary(seg: &Segmentation<'_>) -> Vec<(Section, String)> {
        seg.fragments
            .iter()
            .map(|f| (f.section, get_text(f.elem, " ")))
            .collect()
    }

    #[test]
    fn standard_children_flatten_wrappers() {
        let mut html = page(
            r#"<div id="rso">
                <div class="g">one</div>
                <div><div class="g">two</div><div class="g">three</div></div>
                <script>var x;</script>
                <div class="hidden"><h2>Main results</h2></div>
            </div>"#,
        );
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::Standard);
        let texts: Vec<_> = summary(&seg).into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn standard_falls_back_to_tab_cards() {
        let mut html = page(
            r#"<div id="rso"><div class="x"><div class="TzHB6b">card a</div><div class="TzHB6b">card b</div></div></div>"#,
        );
        // The wrapper has an attribute and holds text, so it stays one block.
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::Standard);
        assert_eq!(seg.fragments.len(), 1);

        let mut html = page(r#"<div id="rso"><div class="x"><h2>Main results</h2></div></div><div class="TzHB6b">c</div>"#);
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::StandardAlt);
        assert!(seg.fragments.is_empty());

        let mut html = page(r#"<div id="rso"><div class="x" style="display:none"><div class="TzHB6b">card</div></div></div>"#);
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::StandardAlt);
        assert_eq!(summary(&seg), vec![(Section::Main, "card".to_string())]);
    }

    #[test]
    fn rhs_is_detached_and_reported_last() {
        let mut html = page(
            r#"<div id="rso">
                <div class="g">one</div>
                <div id="rhs" role="complementary"><div>Panel</div></div>
                <div class="g">two</div>
            </div>
            <div id="botstuff"><div id="brs"><h3>Related searches</h3><a href="/s?q=a">a</a></div></div>"#,
        );
        let seg = segment(&mut html);
        assert_eq!(
            summary(&seg),
            vec![
                (Section::Main, "one".to_string()),
                (Section::Main, "two".to_string()),
                (Section::Footer, "Related searches a".to_string()),
                (Section::Rhs, "Panel".to_string()),
            ]
        );
        assert_eq!(seg.fragments[3].preset, Some(ComponentType::KnowledgeRhs));
        assert!(html.select(&RHS).next().is_none());
    }

    #[test]
    fn ads_and_notices_are_typed() {
        let mut html = page(
            r#"<div id="appbar"><g-scrolling-carousel><img src="a.jpg"></g-scrolling-carousel><span>Top images</span></div>
            <div id="oFNiHe"><span>Showing results for</span> <a href="/s?q=x">x</a></div>
            <div id="oFNiHe"></div>
            <div id="tads"><div class="uEierd">Ad one</div></div>
            <div id="rso"><div class="g">one</div></div>
            <div id="tadsb"></div>"#,
        );
        let seg = segment(&mut html);
        let got: Vec<_> = seg.fragments.iter().map(|f| (f.section, f.preset)).collect();
        assert_eq!(
            got,
            vec![
                (Section::Header, Some(ComponentType::TopImageCarousel)),
                (Section::Header, Some(ComponentType::Notice)),
                (Section::Main, Some(ComponentType::Ad)),
                (Section::Main, None),
            ]
        );
    }

    #[test]
    fn ads_inside_rso_are_not_repeated() {
        let mut html = page(r#"<div id="rso"><div id="tads" class="ads">Ad</div><div class="g">one</div></div>"#);
        let seg = segment(&mut html);
        assert_eq!(seg.fragments.len(), 2);
        assert_eq!(seg.fragments[0].preset, Some(ComponentType::Ad));
        assert_eq!(get_text(seg.fragments[1].elem, ""), "one");
    }

    #[test]
    fn top_bars_with_result_rows() {
        let mut html = page(
            r#"<div class="M8OgIe"><div jscontroller="qTdDb">Knowledge block</div><div jscontroller="OWrb3e"></div></div>
            <div id="rso"><div class="sY1Rxc"><div class="a">row 1</div><div class="b">row 2</div></div></div>"#,
        );
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::TopBarsDivs);
        let texts: Vec<_> = summary(&seg).into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["Knowledge block", "row 1", "row 2"]);
    }

    #[test]
    fn top_bars_fall_back_to_children() {
        let mut html = page(
            r#"<div class="XqFnDf">Banner</div><div id="rso"><div class="g">one</div></div>"#,
        );
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::TopBarsChildren);
        assert_eq!(seg.fragments.len(), 2);
    }

    #[test]
    fn left_bar_finds_side_panels() {
        let mut html = page(
            r#"<div class="OeVqAd">filters</div><div id="rso"><div class="TzHB6b">a</div></div><div class="TzHB6b">b</div>"#,
        );
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::LeftBar);
        assert_eq!(seg.fragments.len(), 2);
    }

    #[test]
    fn no_rso_without_markers_is_empty() {
        let mut html = page("<div><p>Nothing recognisable</p></div>");
        let seg = segment(&mut html);
        assert_eq!(seg.layout, Layout::NoRso);
        assert!(seg.fragments.is_empty());
    }

    #[test]
    fn no_rso_sections() {
        let mut html = page(
            r#"<div class="UDZeY OTFaAf">
                <div class="g">general one</div><div class="g">general two</div>
            </div>
            <div class="UDZeY OTFaAf"><div class="w"><g-section-with-header>stories</g-section-with-header></div></div>
            <div class="UDZeY OTFaAf"><div>a</div><div>b</div><g-more-link>More</g-more-link></div>
            <div class="WvKfwe a3spGf"><div class="x">second block</div></div>"#,
        );
        let seg = segment(&mut html);
        let texts: Vec<_> = summary(&seg).into_iter().map(|(_, t)| t).collect();
        assert_eq!(
            texts,
            vec!["general one", "general two", "stories", "a", "b", "More", "second block"]
        );
    }

    #[test]
    fn footer_expands_nested_blocks_and_drops_hidden() {
        let mut html = page(
            r#"<div id="rso"><div class="g">one</div></div>
            <div id="botstuff">
                <div id="bres"><div class="MjjYud">r1</div><div class="MjjYud">r2</div></div>
                <div id="brs"><div class="MjjYud">only</div></div>
                <div class="ClPXac"><div class="RTaUke"></div></div>
            </div>"#,
        );
        let seg = segment(&mut html);
        let footer: Vec<_> = summary(&seg)
            .into_iter()
            .filter(|(s, _)| *s == Section::Footer)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(footer, vec!["r1", "r2", "only"]);
    }
}
