use std::io;
use std::thread;

use quote_logging::{quote_debug, quote_info, quote_warn, DOCUMENT};
use tokio::sync::mpsc;

use crate::bridge::{BridgeRequest, BridgeResponse, Envelope};
use crate::document::Document;
use crate::extract::{ArticleOrParagraphsExtractor, ExtractionSource, Extractor};

/// Answers one request against the page.
pub fn handle_request(
    document: &mut Document,
    extractor: &dyn Extractor,
    request: BridgeRequest,
) -> BridgeResponse {
    match request {
        BridgeRequest::ExtractText => {
            let source = document.extract_with(extractor);
            let origin = match &source {
                ExtractionSource::Article(_) => "article",
                ExtractionSource::ParagraphJoin(_) => "paragraphs",
            };
            quote_debug!(
                ctx: DOCUMENT,
                "extracted {} chars from {}",
                source.text().chars().count(),
                origin
            );
            BridgeResponse::Text {
                text: source.into_text(),
            }
        }
        BridgeRequest::ScrollToQuote { query } => {
            BridgeResponse::Locate(document.locate_quote(&query).into())
        }
    }
}

/// Listener loop of a document context.
///
/// Every decodable request is answered exactly once; undecodable ones are
/// dropped unanswered. Returns the document when the inbox closes.
pub async fn serve(mut document: Document, mut inbox: mpsc::Receiver<Envelope>) -> Document {
    let extractor = ArticleOrParagraphsExtractor;
    quote_info!(ctx: DOCUMENT, "listening in {}", document.url());

    while let Some(envelope) = inbox.recv().await {
        let request: BridgeRequest = match serde_json::from_str(envelope.payload()) {
            Ok(request) => request,
            Err(err) => {
                quote_warn!(ctx: DOCUMENT, "ignoring undecodable message: {}", err);
                continue;
            }
        };

        let response = handle_request(&mut document, &extractor, request);
        match serde_json::to_string(&response) {
            Ok(payload) => {
                if !envelope.respond(payload) {
                    quote_debug!(ctx: DOCUMENT, "requester stopped waiting");
                }
            }
            Err(err) => quote_warn!(ctx: DOCUMENT, "failed to encode response: {}", err),
        }
    }

    quote_info!(ctx: DOCUMENT, "listener detached from {}", document.url());
    document
}

/// Runs [`serve`] on its own thread and single-threaded runtime, isolated
/// from the privileged context.
pub fn spawn_document_context(
    document: Document,
    inbox: mpsc::Receiver<Envelope>,
) -> io::Result<thread::JoinHandle<Document>> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    thread::Builder::new()
        .name("document-context".to_string())
        .spawn(move || runtime.block_on(serve(document, inbox)))
}
