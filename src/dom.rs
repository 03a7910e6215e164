use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

static HEADINGS: LazyLock<[(Selector, Selector); 6]> = LazyLock::new(|| {
    std::array::from_fn(|i| {
        let level = i + 1;
        (sel(&format!("h{level}[role=heading]")), sel(&format!("h{level}")))
    })
});

/// Separator used when a component's raw text is preserved for debugging.
pub const RAW_TEXT_SEP: &str = "<|>";

/// Compile a selector literal. Only used for static selectors.
pub fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// First descendant matching `selector`, excluding `elem` itself.
pub fn find<'a>(elem: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    elem.select(selector).find(|e| e.id() != elem.id())
}

/// All descendants matching `selector` in document order, excluding `elem` itself.
pub fn find_all<'a>(elem: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    elem.select(selector).filter(|e| e.id() != elem.id()).collect()
}

pub fn has(elem: ElementRef<'_>, selector: &Selector) -> bool {
    find(elem, selector).is_some()
}

pub fn child_elements<'a>(elem: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    elem.children().filter_map(ElementRef::wrap)
}

pub fn has_class(elem: ElementRef<'_>, class: &str) -> bool {
    elem.value().classes().any(|c| c == class)
}

pub fn has_any_class(elem: ElementRef<'_>, classes: &[&str]) -> bool {
    elem.value().classes().any(|c| classes.contains(&c))
}

pub fn attr_is(elem: ElementRef<'_>, name: &str, value: &str) -> bool {
    elem.value().attr(name) == Some(value)
}

/// Visible text: stripped text nodes joined by `sep`, skipping script and style content.
pub fn get_text(elem: ElementRef<'_>, sep: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in elem.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_code = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| name == "script" || name == "style");
        if in_code {
            continue;
        }
        let t = text.trim();
        if !t.is_empty() {
            parts.push(t);
        }
    }
    parts.join(sep)
}

/// Text of the first descendant matching `selector`, `None` when absent or blank.
pub fn text_of(elem: ElementRef<'_>, selector: &Selector) -> Option<String> {
    find(elem, selector)
        .map(|e| get_text(e, " "))
        .filter(|t| !t.is_empty())
}

/// Attribute of the first descendant matching `selector`.
pub fn attr_of(elem: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    find(elem, selector)
        .and_then(|e| e.value().attr(attr))
        .map(str::to_string)
}

/// Whether `elem` is `ancestor` or sits inside it.
pub fn is_within(elem: ElementRef<'_>, ancestor: ElementRef<'_>) -> bool {
    elem.id() == ancestor.id() || elem.ancestors().any(|a| a.id() == ancestor.id())
}

/// Text of the first `h{level}`, preferring headings carrying `role="heading"`.
pub fn heading_text(elem: ElementRef<'_>, level: u8) -> Option<String> {
    let (with_role, plain) = HEADINGS.get(usize::from(level).checked_sub(1)?)?;
    find(elem, with_role)
        .or_else(|| find(elem, plain))
        .map(|h| get_text(h, " "))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn root(html: &Html) -> ElementRef<'_> {
        html.select(&sel("div#t")).next().unwrap()
    }

    #[test]
    fn text_skips_scripts_and_blanks() {
        let html = Html::parse_document(
            r#"<div id="t"> <span>One</span><script>var x = 1;</script><b> Two </b></div>"#,
        );
        assert_eq!(get_text(root(&html), "<|>"), "One<|>Two");
    }

    #[test]
    fn find_excludes_self() {
        let html = Html::parse_document(r#"<div id="t" class="g"><div class="g">in</div></div>"#);
        let found = find_all(root(&html), &sel("div.g"));
        assert_eq!(found.len(), 1);
        assert_eq!(get_text(found[0], ""), "in");
    }

    #[test]
    fn heading_prefers_role() {
        let html = Html::parse_document(
            r#"<div id="t"><h2>Plain</h2><h2 role="heading">Top stories</h2></div>"#,
        );
        assert_eq!(heading_text(root(&html), 2).as_deref(), Some("Top stories"));
        assert_eq!(heading_text(root(&html), 3), None);
    }

    #[test]
    fn within_checks_ancestry() {
        let html = Html::parse_document(r#"<div id="t"><p><a id="a">x</a></p></div><a id="b">y</a>"#);
        let t = root(&html);
        let a = html.select(&sel("a#a")).next().unwrap();
        let b = html.select(&sel("a#b")).next().unwrap();
        assert!(is_within(a, t));
        assert!(is_within(t, t));
        assert!(!is_within(b, t));
    }
}
