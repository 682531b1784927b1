use scraper::{Html, Selector};

use crate::render::rendered_text;

/// Where the page text came from. Exactly one variant per extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Rendered text of the first `<article>` element.
    Article(String),
    /// Rendered text of every `<p>`, in document order, joined by `\n`.
    ParagraphJoin(String),
}

impl ExtractionSource {
    pub fn text(&self) -> &str {
        match self {
            ExtractionSource::Article(text) | ExtractionSource::ParagraphJoin(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ExtractionSource::Article(text) | ExtractionSource::ParagraphJoin(text) => text,
        }
    }
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> ExtractionSource;
}

/// Article-first extractor:
/// - returns the first `<article>`'s rendered text if present
/// - otherwise joins the rendered text of all `<p>` elements with newlines
/// - zero paragraphs yields an empty string, never an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArticleOrParagraphsExtractor;

impl Extractor for ArticleOrParagraphsExtractor {
    fn extract(&self, html: &str) -> ExtractionSource {
        let doc = Html::parse_document(html);
        let article_sel = Selector::parse("article").ok();
        let paragraph_sel = Selector::parse("p").ok();

        if let Some(article) = article_sel
            .as_ref()
            .and_then(|sel| doc.select(sel).next())
        {
            return ExtractionSource::Article(rendered_text(article));
        }

        let joined = paragraph_sel
            .as_ref()
            .map(|sel| {
                doc.select(sel)
                    .map(rendered_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        ExtractionSource::ParagraphJoin(joined)
    }
}
