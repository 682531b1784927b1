use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use quote_core::{DeliveryFailure, Effect, Msg};
use quote_engine::{
    load_api_key, BridgeError, EngineEvent, EngineEvents, EngineHandle, MemoryCredentialStore,
};
use quote_logging::{quote_debug, quote_info, quote_warn, CONTROLLER};

use super::app::AppEvent;

/// Executes controller effects against the privileged context and feeds its
/// events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    credentials: Arc<MemoryCredentialStore>,
    settings_path: PathBuf,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        events: EngineEvents,
        credentials: Arc<MemoryCredentialStore>,
        settings_path: PathBuf,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        spawn_event_loop(events, event_tx);
        Self {
            engine,
            credentials,
            settings_path,
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ExtractText { cycle } => {
                    quote_debug!(ctx: CONTROLLER, "ExtractText cycle={}", cycle);
                    self.engine.extract_text(cycle);
                }
                Effect::LoadCredential { cycle } => {
                    quote_debug!(ctx: CONTROLLER, "LoadCredential cycle={}", cycle);
                    self.engine.load_credential(cycle);
                }
                Effect::GenerateQuotes {
                    cycle,
                    text,
                    api_key,
                } => {
                    quote_info!(
                        ctx: CONTROLLER,
                        "GenerateQuotes cycle={} text_chars={}",
                        cycle,
                        text.chars().count()
                    );
                    self.engine.generate(cycle, text, api_key);
                }
                Effect::LocateQuote { token, query } => {
                    quote_debug!(ctx: CONTROLLER, "LocateQuote token={}", token);
                    self.engine.locate_quote(token, query);
                }
                Effect::OpenSettings => self.show_settings(),
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    fn show_settings(&self) {
        let key_state = if load_api_key(self.credentials.as_ref()).is_some() {
            "set"
        } else {
            "not set"
        };
        println!("Settings file: {}", self.settings_path.display());
        println!("Gemini API key: {key_state} (use `key <value>` to store one)");
    }
}

fn spawn_event_loop(events: EngineEvents, event_tx: mpsc::Sender<AppEvent>) {
    let spawned = thread::Builder::new()
        .name("engine-events".to_string())
        .spawn(move || {
            while let Some(event) = events.recv() {
                if event_tx.send(AppEvent::Msg(map_event(event))).is_err() {
                    break;
                }
            }
        });
    if let Err(err) = spawned {
        quote_warn!(ctx: CONTROLLER, "failed to start event loop: {}", err);
    }
}

/// Engine event as a controller message.
pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::TextExtracted { cycle, result } => Msg::TextExtracted {
            cycle,
            result: result.map_err(delivery_failure),
        },
        EngineEvent::CredentialLoaded { cycle, api_key } => {
            Msg::CredentialLoaded { cycle, api_key }
        }
        EngineEvent::QuotesGenerated { cycle, result } => Msg::QuotesGenerated {
            cycle,
            result: result.map_err(|err| {
                quote_warn!(ctx: CONTROLLER, "cycle {} generation failed: {}", cycle, err.kind);
                err.message
            }),
        },
        EngineEvent::QuoteLocated { token, result } => Msg::QuoteLocated {
            token,
            result: result.map_err(delivery_failure),
        },
    }
}

/// Only a missing active tab is reported as such; every other delivery
/// problem means the page could not be reached.
fn delivery_failure(err: BridgeError) -> DeliveryFailure {
    match err {
        BridgeError::NoActiveTab => DeliveryFailure::NoTab,
        other => DeliveryFailure::Unreachable(other.to_string()),
    }
}
