//! Quote finder core: pure controller state machine and view-model helpers.
mod credential;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use credential::ApiKey;
pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AppState, CycleId, DeliveryFailure, LocateOutcome, LocateReport, LocateToken, SessionError,
    SessionPhase,
};
pub use update::update;
pub use view_model::{AppViewModel, PhaseView, QuoteRowView};
