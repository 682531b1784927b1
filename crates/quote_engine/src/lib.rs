//! Quote finder engine: document contexts, the message bridge between
//! contexts, the generation client and the privileged effect executor.
mod bridge;
mod credentials;
mod decode;
mod document;
mod engine;
mod extract;
mod generate;
mod locate;
mod page;
mod render;
mod types;

pub use bridge::{
    is_restricted_url, request_locate, request_text, Bridge, BridgeError, BridgeRequest,
    BridgeResponse, ChannelBridge, Envelope, LocateStatus, TabId, TabRegistry, Target,
    LISTENER_CAPACITY,
};
pub use credentials::{load_api_key, CredentialStore, MemoryCredentialStore, API_KEY_ENTRY};
pub use decode::{decode_page, load_page, DecodeError, DecodedPage};
pub use document::{Document, Viewport};
pub use engine::{EngineEvents, EngineHandle, EngineServices};
pub use extract::{ArticleOrParagraphsExtractor, ExtractionSource, Extractor};
pub use generate::{
    build_prompt, quotes_from_response, split_quotes, truncate_chars, GeminiClient,
    GenerationError, GenerationFailure, GeneratorSettings, QuoteGenerator, DEFAULT_ENDPOINT,
    MAX_PROMPT_CHARS, NO_RESPONSE_SENTINEL, QUOTE_DELIMITER,
};
pub use locate::{find_forward, find_wrapping};
pub use page::{handle_request, serve, spawn_document_context};
pub use render::rendered_text;
pub use types::EngineEvent;
