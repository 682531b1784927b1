use quote_core::{ApiKey, CycleId, LocateOutcome, LocateToken};

use crate::bridge::BridgeError;
use crate::generate::GenerationError;

/// Result of one executed command, tagged with the cycle or token it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TextExtracted {
        cycle: CycleId,
        result: Result<String, BridgeError>,
    },
    CredentialLoaded {
        cycle: CycleId,
        api_key: Option<ApiKey>,
    },
    QuotesGenerated {
        cycle: CycleId,
        result: Result<Vec<String>, GenerationError>,
    },
    QuoteLocated {
        token: LocateToken,
        result: Result<LocateOutcome, BridgeError>,
    },
}
