use std::io::{self, BufRead};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use log::LevelFilter;
use quote_core::{update, AppState, Msg, SessionPhase};
use quote_engine::{
    load_page, spawn_document_context, ChannelBridge, Document, EngineHandle, EngineServices,
    GeminiClient, MemoryCredentialStore, TabRegistry, API_KEY_ENTRY, LISTENER_CAPACITY,
};
use quote_logging::{quote_debug, quote_info, quote_warn, CONTROLLER};
use serde_json::Value;

use super::commands::{parse_command, UserCommand, HELP};
use super::effects::EffectRunner;
use super::render;
use super::settings::{Settings, API_KEY_ENV};
use crate::Cli;

/// Everything the controller loop reacts to.
pub enum AppEvent {
    Msg(Msg),
    Command(UserCommand),
    Invalid(String),
    InputClosed,
}

pub fn run_app(cli: &Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load(&cli.config)?;
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        settings.log_level.into()
    };
    quote_logging::initialize(settings.log_destination, level);
    quote_info!(ctx: CONTROLLER, "starting with settings from {:?}", cli.config);
    if settings.apply_api_key_override(std::env::var(API_KEY_ENV).ok()) {
        quote_info!(ctx: CONTROLLER, "using API key from {}", API_KEY_ENV);
    }

    let registry = TabRegistry::new();
    open_active_tab(&registry, cli)?;

    let credentials = Arc::new(MemoryCredentialStore::new());
    if let Some(key) = &settings.api_key {
        credentials.set(API_KEY_ENTRY, Value::String(key.clone()));
    }

    let generator = GeminiClient::new(settings.generator_settings())
        .context("failed to build the generation client")?;
    let services = EngineServices {
        bridge: Arc::new(ChannelBridge::with_timeout(
            registry,
            settings.bridge_timeout(),
        )),
        generator: Arc::new(generator),
        credentials: credentials.clone(),
    };
    let (engine, events) =
        EngineHandle::spawn(services).context("failed to start the privileged context")?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(
        engine,
        events,
        credentials.clone(),
        cli.config.clone(),
        event_tx.clone(),
    );
    let mut controller = Controller::new(runner);

    let result = if cli.once {
        controller.run_once(&event_rx)
    } else {
        spawn_input_loop(event_tx)?;
        render::print(&controller.state.view());
        println!("{HELP}");
        controller.run_interactive(&event_rx, &credentials);
        Ok(())
    };
    controller.runner.shutdown();
    result
}

/// Opens the page given on the command line as the active tab and injects a
/// listener into it. Restricted pages stay open without a listener.
fn open_active_tab(registry: &TabRegistry, cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = &cli.page else {
        if let Some(url) = &cli.url {
            registry.open_tab(url.clone());
        }
        return Ok(());
    };

    let page = load_page(path, None)?;
    let url = match &cli.url {
        Some(url) => url.clone(),
        None => file_url(path),
    };
    quote_info!(
        ctx: CONTROLLER,
        "opened {} ({} chars, {})",
        url,
        page.html.chars().count(),
        page.encoding_label
    );

    let tab = registry.open_tab(url.clone());
    match registry.attach_listener(tab, LISTENER_CAPACITY) {
        Ok(inbox) => {
            spawn_document_context(Document::new(url, page.html), inbox)
                .context("failed to start the document context")?;
        }
        Err(err) => quote_warn!(ctx: CONTROLLER, "no listener in tab {}: {}", tab, err),
    }
    Ok(())
}

fn file_url(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

fn spawn_input_loop(event_tx: mpsc::Sender<AppEvent>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let event = match parse_command(&line) {
                    Ok(command) => AppEvent::Command(command),
                    Err(message) => AppEvent::Invalid(message),
                };
                if event_tx.send(event).is_err() {
                    return;
                }
            }
            let _ = event_tx.send(AppEvent::InputClosed);
        })
        .context("failed to start the input loop")?;
    Ok(())
}

struct Controller {
    state: AppState,
    runner: EffectRunner,
}

impl Controller {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    /// Runs one update, executes its effects and renders if anything changed.
    fn dispatch_msg(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            render::print(&state.view());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn run_once(&mut self, events: &mpsc::Receiver<AppEvent>) -> anyhow::Result<()> {
        self.dispatch_msg(Msg::GenerateClicked);
        while self.state.is_loading() {
            match events.recv() {
                Ok(AppEvent::Msg(msg)) => self.dispatch_msg(msg),
                Ok(_) => {}
                Err(_) => anyhow::bail!("privileged context stopped unexpectedly"),
            }
        }
        match self.state.phase() {
            SessionPhase::Failed(error) => anyhow::bail!("{error}"),
            _ => Ok(()),
        }
    }

    fn run_interactive(
        &mut self,
        events: &mpsc::Receiver<AppEvent>,
        credentials: &MemoryCredentialStore,
    ) {
        while let Ok(event) = events.recv() {
            match event {
                AppEvent::Msg(msg) => self.dispatch_msg(msg),
                AppEvent::Command(UserCommand::Generate) if self.state.is_loading() => {
                    println!("Already generating quotes; please wait.");
                }
                AppEvent::Command(UserCommand::Generate) => {
                    self.dispatch_msg(Msg::GenerateClicked)
                }
                AppEvent::Command(UserCommand::Select(index)) => {
                    if self.state.quotes().is_some_and(|quotes| index < quotes.len()) {
                        self.dispatch_msg(Msg::QuoteSelected { index });
                    } else {
                        println!("No quote {} to scroll to.", index + 1);
                    }
                }
                AppEvent::Command(UserCommand::Settings) => self.dispatch_msg(Msg::SettingsClicked),
                AppEvent::Command(UserCommand::SetKey(key)) => {
                    credentials.set(API_KEY_ENTRY, Value::String(key));
                    quote_debug!(ctx: CONTROLLER, "API key stored");
                    println!("API key stored.");
                }
                AppEvent::Command(UserCommand::Refresh) => {
                    self.dispatch_msg(Msg::Tick);
                    render::print(&self.state.view());
                }
                AppEvent::Command(UserCommand::Help) => println!("{HELP}"),
                AppEvent::Command(UserCommand::Quit) | AppEvent::InputClosed => break,
                AppEvent::Invalid(message) => println!("{message}"),
            }
        }
    }
}
