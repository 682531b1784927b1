use std::fmt;

use crate::view_model::{AppViewModel, PhaseView, QuoteRowView};

/// Identifies one generation cycle. Monotonically increasing per `AppState`.
pub type CycleId = u64;
/// Identifies one locate request. Only the latest token is honoured.
pub type LocateToken = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Loading,
    Ready(Vec<String>),
    Failed(SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No active page to read from.
    NoTab,
    /// The page produced no readable text.
    NoText,
    /// Credential missing or unusable.
    NoCredential,
    /// The page could not be reached with a message.
    BridgeUnreachable(String),
    /// The generation service failed; carries its message.
    GenerationFailed(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoTab => write!(f, "Could not extract text: no active tab."),
            SessionError::NoText => write!(f, "No text found."),
            SessionError::NoCredential => write!(
                f,
                "Gemini API key not found or invalid. Please set it in the settings."
            ),
            SessionError::BridgeUnreachable(reason) => {
                write!(f, "Could not extract text: {reason}")
            }
            SessionError::GenerationFailed(message) => {
                write!(f, "Could not generate quotes: {message}")
            }
        }
    }
}

/// Why a request never reached the document context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFailure {
    NoTab,
    Unreachable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateOutcome {
    Found,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocateReport {
    pub index: usize,
    pub result: Result<LocateOutcome, DeliveryFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoadingStage {
    Extracting,
    AwaitingCredential { text: String },
    Generating,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: SessionPhase,
    stage: Option<LoadingStage>,
    cycle: CycleId,
    active_quote: Option<usize>,
    locate_token: LocateToken,
    pending_locate: Option<(LocateToken, usize)>,
    last_locate: Option<LocateReport>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    /// Id of the latest cycle started (0 before the first one).
    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn quotes(&self) -> Option<&[String]> {
        match &self.phase {
            SessionPhase::Ready(quotes) => Some(quotes),
            _ => None,
        }
    }

    pub fn active_quote(&self) -> Option<usize> {
        self.active_quote
    }

    pub fn last_locate(&self) -> Option<&LocateReport> {
        self.last_locate.as_ref()
    }

    pub fn has_pending_locate(&self) -> bool {
        self.pending_locate.is_some()
    }

    pub fn view(&self) -> AppViewModel {
        let quotes = self
            .quotes()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, text)| QuoteRowView {
                index,
                text: text.clone(),
                active: self.active_quote == Some(index),
            })
            .collect();

        let phase = match &self.phase {
            SessionPhase::Idle => PhaseView::Idle,
            SessionPhase::Loading => PhaseView::Loading,
            SessionPhase::Ready(_) => PhaseView::Ready,
            SessionPhase::Failed(_) => PhaseView::Failed,
        };

        AppViewModel {
            phase,
            quotes,
            status: status_line(&self.phase),
            locate_status: self.last_locate.as_ref().map(locate_line),
            generate_enabled: !self.is_loading(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn begin_cycle(&mut self) -> CycleId {
        self.cycle += 1;
        self.phase = SessionPhase::Loading;
        self.stage = Some(LoadingStage::Extracting);
        self.active_quote = None;
        self.pending_locate = None;
        self.last_locate = None;
        self.dirty = true;
        self.cycle
    }

    /// Stage of the in-flight cycle, if `cycle` is the one in flight.
    pub(crate) fn loading_stage(&self, cycle: CycleId) -> Option<&LoadingStage> {
        if self.is_loading() && cycle == self.cycle {
            self.stage.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn await_credential(&mut self, text: String) {
        self.stage = Some(LoadingStage::AwaitingCredential { text });
    }

    /// Moves the extracted text out of the credential stage and marks the
    /// cycle as generating.
    pub(crate) fn take_pending_text(&mut self) -> Option<String> {
        match self.stage.take() {
            Some(LoadingStage::AwaitingCredential { text }) => {
                self.stage = Some(LoadingStage::Generating);
                Some(text)
            }
            other => {
                self.stage = other;
                None
            }
        }
    }

    pub(crate) fn fail(&mut self, error: SessionError) {
        self.phase = SessionPhase::Failed(error);
        self.stage = None;
        self.dirty = true;
    }

    pub(crate) fn ready(&mut self, quotes: Vec<String>) {
        self.phase = SessionPhase::Ready(quotes);
        self.stage = None;
        self.dirty = true;
    }

    /// Selects quote `index` and returns the token and text to locate.
    pub(crate) fn begin_locate(&mut self, index: usize) -> Option<(LocateToken, String)> {
        let query = self.quotes()?.get(index)?.clone();
        self.locate_token += 1;
        self.active_quote = Some(index);
        self.pending_locate = Some((self.locate_token, index));
        self.dirty = true;
        Some((self.locate_token, query))
    }

    pub(crate) fn apply_locate(
        &mut self,
        token: LocateToken,
        result: Result<LocateOutcome, DeliveryFailure>,
    ) -> bool {
        match self.pending_locate {
            Some((pending, index)) if pending == token => {
                self.pending_locate = None;
                self.last_locate = Some(LocateReport { index, result });
                self.dirty = true;
                true
            }
            _ => false,
        }
    }
}

fn status_line(phase: &SessionPhase) -> Option<String> {
    match phase {
        SessionPhase::Idle => None,
        SessionPhase::Loading => Some("Generating quotes...".to_string()),
        SessionPhase::Ready(quotes) if quotes.is_empty() => {
            Some("No quotes were returned.".to_string())
        }
        SessionPhase::Ready(_) => None,
        SessionPhase::Failed(error) => Some(format!("Error: {error}")),
    }
}

fn locate_line(report: &LocateReport) -> String {
    let number = report.index + 1;
    match &report.result {
        Ok(LocateOutcome::Found) => format!("Scrolled to quote {number}."),
        Ok(LocateOutcome::NotFound) => format!("Quote {number} was not found on the page."),
        Err(DeliveryFailure::NoTab) => format!("Quote {number}: no active tab."),
        Err(DeliveryFailure::Unreachable(reason)) => {
            format!("Quote {number}: could not reach the page ({reason}).")
        }
    }
}
