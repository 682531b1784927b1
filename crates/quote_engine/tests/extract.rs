use pretty_assertions::assert_eq;
use quote_engine::{ArticleOrParagraphsExtractor, Document, ExtractionSource, Extractor};

#[test]
fn article_text_is_returned_verbatim() {
    let html = "<html><body><article>Hello world.</article></body></html>";
    let extracted = ArticleOrParagraphsExtractor.extract(html);
    assert_eq!(extracted, ExtractionSource::Article("Hello world.".to_string()));
}

#[test]
fn paragraphs_are_joined_with_newline_without_article() {
    let html = "<html><body><p>A.</p><div><p>B.</p></div></body></html>";
    let extracted = ArticleOrParagraphsExtractor.extract(html);
    assert_eq!(extracted, ExtractionSource::ParagraphJoin("A.\nB.".to_string()));
}

#[test]
fn article_takes_precedence_over_outside_paragraphs() {
    let html = r#"
    <html><body>
        <p>Navigation blurb.</p>
        <article><h1>Title</h1><p>First.</p><p>Second.</p></article>
        <p>Footer text.</p>
    </body></html>
    "#;
    let extracted = ArticleOrParagraphsExtractor.extract(html);
    assert_eq!(
        extracted,
        ExtractionSource::Article("Title\n\nFirst.\n\nSecond.".to_string())
    );
    assert!(!extracted.text().contains("Footer"));
}

#[test]
fn only_first_article_is_used() {
    let html = "<body><article>One</article><article>Two</article></body>";
    assert_eq!(ArticleOrParagraphsExtractor.extract(html).text(), "One");
}

#[test]
fn no_paragraphs_yields_empty_text() {
    let html = "<html><body><div>Just a div</div></body></html>";
    assert_eq!(
        ArticleOrParagraphsExtractor.extract(html),
        ExtractionSource::ParagraphJoin(String::new())
    );
}

#[test]
fn empty_paragraphs_still_contribute_separators() {
    let html = "<body><p>A.</p><p>   </p><p>B.</p></body>";
    assert_eq!(ArticleOrParagraphsExtractor.extract(html).text(), "A.\n\nB.");
}

#[test]
fn extraction_is_idempotent() {
    let doc = Document::new(
        "https://example.com",
        "<body><p>Some <em>styled</em> text.</p><p>More.</p></body>",
    );
    let first = doc.extract_text();
    let second = doc.extract_text();
    assert_eq!(first, "Some styled text.\nMore.");
    assert_eq!(first, second);
}
