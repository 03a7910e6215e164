use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::dom::sel;

static RSO: LazyLock<Selector> = LazyLock::new(|| sel("div#rso"));
static TOP_BARS: LazyLock<Selector> = LazyLock::new(|| sel("div.XqFnDf, div.M8OgIe"));
static LEFT_BAR: LazyLock<Selector> = LazyLock::new(|| sel("div.OeVqAd"));

/// Structural family of a results page. The `-alt`, `-divs` and `-children`
/// variants are refinements chosen while extracting the main column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    Standard,
    StandardAlt,
    TopBars,
    TopBarsDivs,
    TopBarsChildren,
    LeftBar,
    NoRso,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Standard => "standard",
            Layout::StandardAlt => "standard-alt",
            Layout::TopBars => "top-bars",
            Layout::TopBarsDivs => "top-bars-divs",
            Layout::TopBarsChildren => "top-bars-children",
            Layout::LeftBar => "left-bar",
            Layout::NoRso => "no-rso",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The marker containers layout detection looks at.
#[derive(Debug, Clone)]
pub struct LayoutDivs<'a> {
    pub rso: Option<ElementRef<'a>>,
    pub top_bars: Vec<ElementRef<'a>>,
    pub left_bar: Option<ElementRef<'a>>,
}

impl<'a> LayoutDivs<'a> {
    pub fn locate(html: &'a Html) -> Self {
        LayoutDivs {
            rso: html.select(&RSO).next(),
            top_bars: html.select(&TOP_BARS).collect(),
            left_bar: html.select(&LEFT_BAR).next(),
        }
    }

    /// First match wins: no main container, top bars, left bar, standard.
    pub fn layout(&self) -> Layout {
        if self.rso.is_none() {
            Layout::NoRso
        } else if !self.top_bars.is_empty() {
            Layout::TopBars
        } else if self.left_bar.is_some() {
            Layout::LeftBar
        } else {
            Layout::Standard
        }
    }
}

pub fn detect(html: &Html) -> Layout {
    LayoutDivs::locate(html).layout()
}
