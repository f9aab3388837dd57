// src/core/html.rs
//! Document-tree queries for episode pages.
//!
//! `specs::episode` only talks to [`EpisodeTree`]; [`ScrapedPage`] is the
//! implementation over `scraper::Html`. Swapping the HTML library means
//! writing another impl, not touching the extraction code.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Named structural lookups on a parsed episode page.
pub trait EpisodeTree {
    type Node<'a>: Copy
    where
        Self: 'a;

    /// The block holding the episode heading.
    fn find_title_block(&self) -> Option<Self::Node<'_>>;
    /// The heading element inside the title block.
    fn find_title_heading<'a>(&'a self, title_block: Self::Node<'a>) -> Option<Self::Node<'a>>;
    /// Nearest enclosing content container of `node`.
    fn find_ancestor_container<'a>(&'a self, node: Self::Node<'a>) -> Option<Self::Node<'a>>;
    /// Air-date text element inside the container's meta block.
    fn find_air_date<'a>(&'a self, container: Self::Node<'a>) -> Option<Self::Node<'a>>;
    fn find_description<'a>(&'a self, container: Self::Node<'a>) -> Option<Self::Node<'a>>;
    /// The anchor of the download action.
    fn find_download_link<'a>(&'a self, container: Self::Node<'a>) -> Option<Self::Node<'a>>;

    /// All descendant text, concatenated as-is.
    fn text(&self, node: Self::Node<'_>) -> String;
    fn attr(&self, node: Self::Node<'_>, name: &str) -> Option<String>;
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("bad built-in selector {css:?}: {e}"))
}

static TITLE_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div.episode-title"));
static TITLE_HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static META: LazyLock<Selector> = LazyLock::new(|| selector("div.meta"));
static AIR_DATE: LazyLock<Selector> =
    LazyLock::new(|| selector("div.field-name-field-radio-air-date span.date-display-single"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector("div.field-name-body"));
static ACTIONS: LazyLock<Selector> = LazyLock::new(|| selector("ul.actions"));
static DOWNLOAD: LazyLock<Selector> = LazyLock::new(|| selector("li.download a"));

const CONTAINER_CLASS: &str = "container";

pub struct ScrapedPage {
    doc: Html,
}

impl ScrapedPage {
    pub fn parse(html: &str) -> Self {
        Self { doc: Html::parse_document(html) }
    }
}

fn first<'a>(scope: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    scope.select(sel).next()
}

impl EpisodeTree for ScrapedPage {
    type Node<'a> = ElementRef<'a>;

    fn find_title_block(&self) -> Option<ElementRef<'_>> {
        self.doc.select(&TITLE_BLOCK).next()
    }

    fn find_title_heading<'a>(&'a self, title_block: ElementRef<'a>) -> Option<ElementRef<'a>> {
        first(title_block, &TITLE_HEADING)
    }

    fn find_ancestor_container<'a>(&'a self, node: ElementRef<'a>) -> Option<ElementRef<'a>> {
        node.ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| {
                el.value().name() == "div"
                    && el.value().classes().any(|c| c == CONTAINER_CLASS)
            })
    }

    fn find_air_date<'a>(&'a self, container: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let meta = first(container, &META)?;
        first(meta, &AIR_DATE)
    }

    fn find_description<'a>(&'a self, container: ElementRef<'a>) -> Option<ElementRef<'a>> {
        first(container, &DESCRIPTION)
    }

    fn find_download_link<'a>(&'a self, container: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let actions = first(container, &ACTIONS)?;
        first(actions, &DOWNLOAD)
    }

    fn text(&self, node: ElementRef<'_>) -> String {
        node.text().collect()
    }

    fn attr(&self, node: ElementRef<'_>, name: &str) -> Option<String> {
        node.value().attr(name).map(str::to_string)
    }
}
