use crate::state::LoadingStage;
use crate::{AppState, DeliveryFailure, Effect, Msg, SessionError};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::GenerateClicked => {
            // At most one cycle in flight; the trigger is disabled while loading.
            if state.is_loading() {
                return (state, Vec::new());
            }
            let cycle = state.begin_cycle();
            vec![Effect::ExtractText { cycle }]
        }
        Msg::SettingsClicked => vec![Effect::OpenSettings],
        Msg::TextExtracted { cycle, result } => {
            if !matches!(state.loading_stage(cycle), Some(LoadingStage::Extracting)) {
                return (state, Vec::new());
            }
            match result {
                Err(DeliveryFailure::NoTab) => {
                    state.fail(SessionError::NoTab);
                    Vec::new()
                }
                Err(DeliveryFailure::Unreachable(reason)) => {
                    state.fail(SessionError::BridgeUnreachable(reason));
                    Vec::new()
                }
                Ok(text) if text.trim().is_empty() => {
                    state.fail(SessionError::NoText);
                    Vec::new()
                }
                Ok(text) => {
                    state.await_credential(text);
                    vec![Effect::LoadCredential { cycle }]
                }
            }
        }
        Msg::CredentialLoaded { cycle, api_key } => {
            if !matches!(
                state.loading_stage(cycle),
                Some(LoadingStage::AwaitingCredential { .. })
            ) {
                return (state, Vec::new());
            }
            match api_key {
                None => {
                    state.fail(SessionError::NoCredential);
                    Vec::new()
                }
                Some(api_key) => match state.take_pending_text() {
                    Some(text) => vec![Effect::GenerateQuotes {
                        cycle,
                        text,
                        api_key,
                    }],
                    None => Vec::new(),
                },
            }
        }
        Msg::QuotesGenerated { cycle, result } => {
            if !matches!(state.loading_stage(cycle), Some(LoadingStage::Generating)) {
                return (state, Vec::new());
            }
            match result {
                Ok(quotes) => state.ready(quotes),
                Err(message) => state.fail(SessionError::GenerationFailed(message)),
            }
            Vec::new()
        }
        Msg::QuoteSelected { index } => match state.begin_locate(index) {
            Some((token, query)) => vec![Effect::LocateQuote { token, query }],
            None => Vec::new(),
        },
        Msg::QuoteLocated { token, result } => {
            // Stale tokens are dropped; the phase never changes here.
            state.apply_locate(token, result);
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}
