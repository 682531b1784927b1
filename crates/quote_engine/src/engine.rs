use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use quote_core::{ApiKey, CycleId, LocateToken};
use quote_logging::{quote_debug, quote_info, PRIVILEGED};
use tokio_util::sync::CancellationToken;

use crate::bridge::{request_locate, request_text, Bridge, Target};
use crate::credentials::{load_api_key, CredentialStore};
use crate::generate::QuoteGenerator;
use crate::EngineEvent;

enum EngineCommand {
    ExtractText {
        cycle: CycleId,
    },
    LoadCredential {
        cycle: CycleId,
    },
    Generate {
        cycle: CycleId,
        text: String,
        api_key: ApiKey,
    },
    LocateQuote {
        token: LocateToken,
        query: String,
    },
}

/// Collaborators the privileged context talks to.
#[derive(Clone)]
pub struct EngineServices {
    pub bridge: Arc<dyn Bridge>,
    pub generator: Arc<dyn QuoteGenerator>,
    pub credentials: Arc<dyn CredentialStore>,
}

/// Command side of the privileged context. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    shutdown: CancellationToken,
}

/// Event side of the privileged context.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    /// Starts the privileged context on a background thread with its own runtime.
    pub fn spawn(services: EngineServices) -> io::Result<(Self, EngineEvents)> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let token = shutdown.clone();
        thread::Builder::new()
            .name("privileged-context".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let services = services.clone();
                    let event_tx = event_tx.clone();
                    let token = token.clone();
                    runtime.spawn(async move {
                        tokio::select! {
                            _ = token.cancelled() => {}
                            event = handle_command(&services, command) => {
                                let _ = event_tx.send(event);
                            }
                        }
                    });
                }
                quote_info!(ctx: PRIVILEGED, "command channel closed, stopping");
                token.cancel();
                runtime.shutdown_timeout(Duration::from_secs(1));
            })?;

        Ok((Self { cmd_tx, shutdown }, EngineEvents { event_rx }))
    }

    pub fn extract_text(&self, cycle: CycleId) {
        self.submit(EngineCommand::ExtractText { cycle });
    }

    pub fn load_credential(&self, cycle: CycleId) {
        self.submit(EngineCommand::LoadCredential { cycle });
    }

    pub fn generate(&self, cycle: CycleId, text: String, api_key: ApiKey) {
        self.submit(EngineCommand::Generate {
            cycle,
            text,
            api_key,
        });
    }

    pub fn locate_quote(&self, token: LocateToken, query: impl Into<String>) {
        self.submit(EngineCommand::LocateQuote {
            token,
            query: query.into(),
        });
    }

    /// Cancels in-flight work; cancelled commands emit no event.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn submit(&self, command: EngineCommand) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let _ = self.cmd_tx.send(command);
    }
}

impl EngineEvents {
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(services: &EngineServices, command: EngineCommand) -> EngineEvent {
    match command {
        EngineCommand::ExtractText { cycle } => {
            let result = request_text(services.bridge.as_ref(), Target::ActiveTab).await;
            match &result {
                Ok(text) => quote_debug!(
                    ctx: PRIVILEGED,
                    "cycle {} received {} chars",
                    cycle,
                    text.chars().count()
                ),
                Err(err) => quote_info!(ctx: PRIVILEGED, "cycle {} extraction failed: {}", cycle, err),
            }
            EngineEvent::TextExtracted { cycle, result }
        }
        EngineCommand::LoadCredential { cycle } => {
            let api_key = load_api_key(services.credentials.as_ref());
            quote_debug!(
                ctx: PRIVILEGED,
                "cycle {} credential present={}",
                cycle,
                api_key.is_some()
            );
            EngineEvent::CredentialLoaded { cycle, api_key }
        }
        EngineCommand::Generate {
            cycle,
            text,
            api_key,
        } => {
            let result = services
                .generator
                .generate_quotes(&text, api_key.expose())
                .await;
            EngineEvent::QuotesGenerated { cycle, result }
        }
        EngineCommand::LocateQuote { token, query } => {
            let result =
                request_locate(services.bridge.as_ref(), Target::ActiveTab, &query).await;
            EngineEvent::QuoteLocated { token, result }
        }
    }
}
