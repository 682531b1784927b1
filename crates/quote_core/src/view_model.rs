#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseView {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: PhaseView,
    pub quotes: Vec<QuoteRowView>,
    /// Phase message: progress, empty result or the failure text.
    pub status: Option<String>,
    /// Outcome of the latest locate request; shown beside the quote list.
    pub locate_status: Option<String>,
    pub generate_enabled: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRowView {
    pub index: usize,
    pub text: String,
    pub active: bool,
}
