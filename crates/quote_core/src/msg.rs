use crate::{ApiKey, CycleId, DeliveryFailure, LocateOutcome, LocateToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for quotes from the current page.
    GenerateClicked,
    /// User asked for the settings surface.
    SettingsClicked,
    /// User picked a quote from the list (0-based).
    QuoteSelected { index: usize },
    /// Page text arrived from the document context.
    TextExtracted {
        cycle: CycleId,
        result: Result<String, DeliveryFailure>,
    },
    /// Credential lookup finished; `None` when absent or unusable.
    CredentialLoaded {
        cycle: CycleId,
        api_key: Option<ApiKey>,
    },
    /// Generation service answered. `Err` carries a user-facing message.
    QuotesGenerated {
        cycle: CycleId,
        result: Result<Vec<String>, String>,
    },
    /// Document context answered a locate request.
    QuoteLocated {
        token: LocateToken,
        result: Result<LocateOutcome, DeliveryFailure>,
    },
    /// Refresh request; never changes state.
    Tick,
}
