use super::components::ParsedSerp;
use super::records::SerpRecord;

/// Flatten a parsed page into page-level records. `serp_rank` is derived
/// from position on every call, so exporting twice gives the same output.
///
/// Panics when component ranks are not contiguous from zero.
pub fn export(parsed: &ParsedSerp<'_>) -> Vec<SerpRecord> {
    let mut out = Vec::new();
    for (expected, parsed_cmpt) in parsed.components.iter().enumerate() {
        let cmpt = &parsed_cmpt.component;
        assert_eq!(
            cmpt.cmpt_rank, expected,
            "component ranks must be contiguous from 0"
        );
        let mut records: Vec<_> = parsed_cmpt.records.iter().collect();
        records.sort_by_key(|r| r.sub_rank);
        for record in records {
            out.push(SerpRecord {
                section: cmpt.section,
                cmpt_rank: cmpt.cmpt_rank,
                serp_rank: out.len(),
                record: record.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::sel;
    use crate::parser::components::{Component, ParsedComponent};
    use crate::parser::layout::Layout;
    use crate::parser::records::SubRecord;
    use crate::parser::types::{ComponentType, Section};
    use scraper::Html;

    fn record(sub_rank: usize, title: &str) -> SubRecord {
        SubRecord {
            sub_rank,
            title: Some(title.to_string()),
            ..SubRecord::empty(ComponentType::General)
        }
    }

    #[test]
    fn serp_rank_is_running_position() {
        let html = Html::parse_document("<div>a</div><div>b</div>");
        let divs: Vec<_> = html.select(&sel("body > div")).collect();
        let cmpt = |i: usize, section| Component {
            elem: divs[i],
            section,
            kind: ComponentType::General,
            cmpt_rank: i,
        };
        let parsed = ParsedSerp {
            layout: Layout::Standard,
            components: vec![
                ParsedComponent {
                    component: cmpt(0, Section::Main),
                    records: vec![record(1, "second"), record(0, "first")],
                },
                ParsedComponent {
                    component: cmpt(1, Section::Footer),
                    records: vec![record(0, "third")],
                },
            ],
        };

        let first = export(&parsed);
        let got: Vec<_> = first
            .iter()
            .map(|r| (r.serp_rank, r.cmpt_rank, r.section, r.record.title.clone().unwrap()))
            .collect();
        assert_eq!(
            got,
            vec![
                (0, 0, Section::Main, "first".to_string()),
                (1, 0, Section::Main, "second".to_string()),
                (2, 1, Section::Footer, "third".to_string()),
            ]
        );
        assert_eq!(export(&parsed), first);
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn gap_in_component_ranks_panics() {
        let html = Html::parse_document("<div>a</div>");
        let div = html.select(&sel("body > div")).next().unwrap();
        let parsed = ParsedSerp {
            layout: Layout::Standard,
            components: vec![ParsedComponent {
                component: Component {
                    elem: div,
                    section: Section::Main,
                    kind: ComponentType::General,
                    cmpt_rank: 1,
                },
                records: vec![record(0, "x")],
            }],
        };
        export(&parsed);
    }
}
