use std::ops::Range;

use quote_core::LocateOutcome;
use quote_logging::{quote_debug, DOCUMENT};
use scraper::Html;

use crate::extract::{ArticleOrParagraphsExtractor, ExtractionSource, Extractor};
use crate::locate::{find_wrapping, strip_wrapping_quotes};
use crate::render::rendered_text;

/// Scroll position of a page, in chars of its rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    cursor: usize,
    highlight: Option<Range<usize>>,
}

impl Viewport {
    /// Offset the next search starts from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Range of the last located quote.
    pub fn highlight(&self) -> Option<Range<usize>> {
        self.highlight.clone()
    }

    fn scroll_to(&mut self, range: Range<usize>) {
        self.cursor = range.end;
        self.highlight = Some(range);
    }
}

/// A live page as seen from the document context.
///
/// The source is re-parsed on every request; only the viewport is mutable.
#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    html: String,
    viewport: Viewport,
}

impl Document {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            viewport: Viewport::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn extract_with(&self, extractor: &dyn Extractor) -> ExtractionSource {
        extractor.extract(&self.html)
    }

    /// Readable text of the page (article first, paragraphs otherwise).
    pub fn extract_text(&self) -> String {
        self.extract_with(&ArticleOrParagraphsExtractor).into_text()
    }

    /// Rendered text of the whole page, the space quotes are searched in.
    pub fn page_text(&self) -> String {
        let doc = Html::parse_document(&self.html);
        rendered_text(doc.root_element())
    }

    pub fn highlighted_text(&self) -> Option<String> {
        let range = self.viewport.highlight()?;
        Some(
            self.page_text()
                .chars()
                .skip(range.start)
                .take(range.len())
                .collect(),
        )
    }

    /// Searches forward from the viewport for `query`, wrapping around to the
    /// top of the page, and scrolls to it.
    ///
    /// A query wrapped in quotation marks is retried without them when the
    /// literal search fails.
    pub fn locate_quote(&mut self, query: &str) -> LocateOutcome {
        let query = query.trim();
        let page = self.page_text();
        let from = self.viewport.cursor;

        let found = find_wrapping(&page, query, from).or_else(|| {
            strip_wrapping_quotes(query).and_then(|inner| find_wrapping(&page, inner, from))
        });

        match found {
            Some(range) => {
                quote_debug!(ctx: DOCUMENT, "quote found at chars {:?} in {}", range, self.url);
                self.viewport.scroll_to(range);
                LocateOutcome::Found
            }
            None => {
                quote_debug!(ctx: DOCUMENT, "quote not found in {}", self.url);
                LocateOutcome::NotFound
            }
        }
    }
}
