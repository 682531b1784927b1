use std::sync::Once;

use pretty_assertions::assert_eq;
use quote_core::{
    update, ApiKey, AppState, DeliveryFailure, Effect, Msg, PhaseView, SessionError,
    SessionPhase,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(quote_logging::initialize_for_tests);
}

fn key() -> ApiKey {
    ApiKey::new("test-key").unwrap()
}

fn start(state: AppState) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::GenerateClicked);
    let cycle = state.cycle();
    assert_eq!(effects, vec![Effect::ExtractText { cycle }]);
    (state, cycle)
}

fn run_to_ready(state: AppState, quotes: &[&str]) -> AppState {
    let (state, cycle) = start(state);
    let (state, _) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Ok("Some page text.".to_string()),
        },
    );
    let (state, _) = update(
        state,
        Msg::CredentialLoaded {
            cycle,
            api_key: Some(key()),
        },
    );
    let (state, _) = update(
        state,
        Msg::QuotesGenerated {
            cycle,
            result: Ok(quotes.iter().map(|q| q.to_string()).collect()),
        },
    );
    state
}

#[test]
fn full_cycle_reaches_ready() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    assert_eq!(state.phase(), &SessionPhase::Loading);
    assert!(!state.view().generate_enabled);

    let (state, effects) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Ok("Hello world.".to_string()),
        },
    );
    assert_eq!(effects, vec![Effect::LoadCredential { cycle }]);

    let (state, effects) = update(
        state,
        Msg::CredentialLoaded {
            cycle,
            api_key: Some(key()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::GenerateQuotes {
            cycle,
            text: "Hello world.".to_string(),
            api_key: key(),
        }]
    );

    let (mut state, effects) = update(
        state,
        Msg::QuotesGenerated {
            cycle,
            result: Ok(vec!["Quote one".to_string(), "Quote two".to_string()]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.phase(),
        &SessionPhase::Ready(vec!["Quote one".to_string(), "Quote two".to_string()])
    );
    let view = state.view();
    assert_eq!(view.phase, PhaseView::Ready);
    assert_eq!(view.quotes.len(), 2);
    assert!(view.generate_enabled);
    assert!(state.consume_dirty());
}

#[test]
fn missing_tab_fails_with_no_tab() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, effects) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Err(DeliveryFailure::NoTab),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), &SessionPhase::Failed(SessionError::NoTab));
}

#[test]
fn unreachable_page_is_distinct_from_no_tab() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, _) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Err(DeliveryFailure::Unreachable("restricted page".to_string())),
        },
    );
    assert_eq!(
        state.phase(),
        &SessionPhase::Failed(SessionError::BridgeUnreachable(
            "restricted page".to_string()
        ))
    );
}

#[test]
fn whitespace_only_text_fails_with_no_text() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, effects) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Ok(" \n\t ".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), &SessionPhase::Failed(SessionError::NoText));
    assert_eq!(state.view().status.as_deref(), Some("Error: No text found."));
}

#[test]
fn missing_credential_fails_without_generation_effect() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, _) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Ok("text".to_string()),
        },
    );
    let (state, effects) = update(
        state,
        Msg::CredentialLoaded {
            cycle,
            api_key: None,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.phase(),
        &SessionPhase::Failed(SessionError::NoCredential)
    );
}

#[test]
fn generation_error_carries_service_message() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, _) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Ok("text".to_string()),
        },
    );
    let (state, _) = update(
        state,
        Msg::CredentialLoaded {
            cycle,
            api_key: Some(key()),
        },
    );
    let (state, _) = update(
        state,
        Msg::QuotesGenerated {
            cycle,
            result: Err("invalid key".to_string()),
        },
    );
    assert_eq!(
        state.phase(),
        &SessionPhase::Failed(SessionError::GenerationFailed("invalid key".to_string()))
    );
    assert_eq!(state.view().phase, PhaseView::Failed);
    assert!(state
        .view()
        .status
        .unwrap()
        .contains("invalid key"));
}

#[test]
fn generate_is_ignored_while_loading() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, effects) = update(state, Msg::GenerateClicked);
    assert!(effects.is_empty());
    assert_eq!(state.cycle(), cycle);
    assert_eq!(state.phase(), &SessionPhase::Loading);
}

#[test]
fn failed_and_ready_states_restart_on_generate() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, _) = update(
        state,
        Msg::TextExtracted {
            cycle,
            result: Err(DeliveryFailure::NoTab),
        },
    );
    let (state, next) = start(state);
    assert_eq!(next, cycle + 1);
    assert_eq!(state.phase(), &SessionPhase::Loading);
    assert_eq!(state.view().status.as_deref(), Some("Generating quotes..."));

    let state = run_to_ready(AppState::new(), &["a"]);
    let (state, _) = update(state, Msg::QuoteSelected { index: 0 });
    assert_eq!(state.active_quote(), Some(0));
    let (state, _) = start(state);
    assert_eq!(state.active_quote(), None);
    assert!(state.quotes().is_none());
}

#[test]
fn events_from_stale_cycle_are_ignored() {
    init_logging();
    let (state, first) = start(AppState::new());
    let (state, _) = update(
        state,
        Msg::TextExtracted {
            cycle: first,
            result: Err(DeliveryFailure::NoTab),
        },
    );
    let (state, second) = start(state);

    let (state, effects) = update(
        state,
        Msg::TextExtracted {
            cycle: first,
            result: Ok("late text".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), &SessionPhase::Loading);

    let (state, effects) = update(
        state,
        Msg::QuotesGenerated {
            cycle: first,
            result: Ok(vec!["late".to_string()]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), &SessionPhase::Loading);
    assert_eq!(state.cycle(), second);
}

#[test]
fn out_of_order_events_within_cycle_are_ignored() {
    init_logging();
    let (state, cycle) = start(AppState::new());
    let (state, effects) = update(
        state,
        Msg::CredentialLoaded {
            cycle,
            api_key: Some(key()),
        },
    );
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::QuotesGenerated {
            cycle,
            result: Ok(vec!["x".to_string()]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), &SessionPhase::Loading);
}

#[test]
fn empty_quote_list_is_ready_with_status() {
    init_logging();
    let state = run_to_ready(AppState::new(), &[]);
    assert_eq!(state.phase(), &SessionPhase::Ready(Vec::new()));
    assert_eq!(
        state.view().status.as_deref(),
        Some("No quotes were returned.")
    );
}

#[test]
fn settings_click_emits_effect_without_state_change() {
    init_logging();
    let state = AppState::new();
    let before = state.view();
    let (next, effects) = update(state, Msg::SettingsClicked);
    assert_eq!(next.view(), before);
    assert_eq!(effects, vec![Effect::OpenSettings]);
}
