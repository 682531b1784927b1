use crate::{ApiKey, CycleId, LocateToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the active page for its readable text.
    ExtractText { cycle: CycleId },
    /// Read the generation credential from the credential store.
    LoadCredential { cycle: CycleId },
    /// Call the generation service with the extracted text.
    GenerateQuotes {
        cycle: CycleId,
        text: String,
        api_key: ApiKey,
    },
    /// Ask the active page to scroll to a quote.
    LocateQuote { token: LocateToken, query: String },
    /// Show the settings surface.
    OpenSettings,
}
