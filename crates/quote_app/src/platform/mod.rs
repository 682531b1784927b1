mod app;
mod commands;
mod effects;
mod render;
mod settings;

pub use app::run_app;
pub use settings::SETTINGS_FILE;
