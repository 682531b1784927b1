use std::fmt;
use std::time::Duration;

use futures_util::StreamExt;
use quote_logging::{quote_debug, quote_info, quote_warn, GENERATOR};
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
/// Longest excerpt of page text sent in one prompt, in chars.
pub const MAX_PROMPT_CHARS: usize = 20_000;
pub const QUOTE_DELIMITER: char = '*';
/// Returned as the only quote when the service answers without text.
pub const NO_RESPONSE_SENTINEL: &str = "No response found.";
const GENERIC_FAILURE: &str = "Request failed";
const INSTRUCTION: &str = "Extract the most significant phrases or sentences from the \
following text. Copy each one exactly as it appears in the text, without rewording or \
changing punctuation, and return each one as a separate bullet starting with '*'.";

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub endpoint: String,
    pub temperature: f32,
    pub max_prompt_chars: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.2,
            max_prompt_chars: MAX_PROMPT_CHARS,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_response_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    InvalidEndpoint,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64 },
    MalformedBody,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::InvalidEndpoint => write!(f, "invalid endpoint"),
            GenerationFailure::HttpStatus(code) => write!(f, "http status {code}"),
            GenerationFailure::Timeout => write!(f, "timeout"),
            GenerationFailure::Network => write!(f, "network error"),
            GenerationFailure::TooLarge { max_bytes } => {
                write!(f, "response larger than {max_bytes} bytes")
            }
            GenerationFailure::MalformedBody => write!(f, "malformed response body"),
        }
    }
}

/// Failure of one generation call. `message` is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GenerationError {
    pub kind: GenerationFailure,
    pub message: String,
}

impl GenerationError {
    pub(crate) fn new(kind: GenerationFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// First `max_chars` chars of `text`; no marker is appended.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_prompt(text: &str, max_chars: usize) -> String {
    format!("{INSTRUCTION}\n\n{}", truncate_chars(text, max_chars))
}

/// Splits generated text on `*`, trimming and dropping empty entries.
/// Order is preserved and duplicates are kept.
pub fn split_quotes(raw: &str) -> Vec<String> {
    raw.split(QUOTE_DELIMITER)
        .map(str::trim)
        .filter(|quote| !quote.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Quote list from a successful response body.
///
/// A body without `candidates[0].content.parts[0].text` yields the
/// [`NO_RESPONSE_SENTINEL`] instead of an error.
pub fn quotes_from_response(body: &Value) -> Vec<String> {
    match body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    {
        Some(text) => split_quotes(text),
        None => vec![NO_RESPONSE_SENTINEL.to_string()],
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[async_trait::async_trait]
pub trait QuoteGenerator: Send + Sync {
    /// One attempt, no retries.
    async fn generate_quotes(
        &self,
        text: &str,
        api_key: &str,
    ) -> Result<Vec<String>, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    settings: GeneratorSettings,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(settings: GeneratorSettings) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GenerationError::new(GenerationFailure::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    fn request_url(&self, api_key: &str) -> Result<Url, GenerationError> {
        let mut url = Url::parse(&self.settings.endpoint).map_err(|err| {
            GenerationError::new(GenerationFailure::InvalidEndpoint, err.to_string())
        })?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, GenerationError> {
        let max_bytes = self.settings.max_response_bytes;
        let too_large = || {
            GenerationError::new(
                GenerationFailure::TooLarge { max_bytes },
                "response too large",
            )
        };
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl QuoteGenerator for GeminiClient {
    async fn generate_quotes(
        &self,
        text: &str,
        api_key: &str,
    ) -> Result<Vec<String>, GenerationError> {
        let url = self.request_url(api_key)?;
        let prompt = build_prompt(text, self.settings.max_prompt_chars);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
            },
        };
        quote_debug!(
            ctx: GENERATOR,
            "requesting quotes prompt_chars={}",
            prompt.chars().count()
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = self.read_body(response).await?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            quote_warn!(ctx: GENERATOR, "service returned {}: {}", status, message);
            return Err(GenerationError::new(
                GenerationFailure::HttpStatus(status.as_u16()),
                message,
            ));
        }

        let value: Value = serde_json::from_slice(&body).map_err(|err| {
            GenerationError::new(GenerationFailure::MalformedBody, err.to_string())
        })?;
        let quotes = quotes_from_response(&value);
        quote_info!(ctx: GENERATOR, "received {} quotes", quotes.len());
        Ok(quotes)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GenerationError {
    // The request URL carries the credential; keep it out of messages.
    let err = err.without_url();
    if err.is_timeout() {
        return GenerationError::new(GenerationFailure::Timeout, "request timed out");
    }
    GenerationError::new(GenerationFailure::Network, err.to_string())
}
