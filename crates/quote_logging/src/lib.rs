#![deny(missing_docs)]
//! Shared logging utilities for the quote finder workspace.
//!
//! This crate provides the `quote_*` logging macros used across the codebase,
//! the log targets naming each execution context, and initializers for the
//! global logger (application and unit tests).

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Log target for the user-facing controller.
pub const CONTROLLER: &str = "quote::controller";
/// Log target for the privileged background context.
pub const PRIVILEGED: &str = "quote::privileged";
/// Log target for the page-embedded document context.
pub const DOCUMENT: &str = "quote::document";
/// Log target for message delivery between contexts.
pub const BRIDGE: &str = "quote::bridge";
/// Log target for the remote generation client.
pub const GENERATOR: &str = "quote::generator";

/// Default log file, relative to the working directory.
pub const LOG_FILE: &str = "./quote_app.log";

/// Logs a trace-level message, optionally under a context target.
#[macro_export]
macro_rules! quote_trace {
    (ctx: $ctx:expr, $($arg:tt)+) => {{
        log::trace!(target: $ctx, $($arg)+);
    }};
    ($($arg:tt)+) => {{
        log::trace!($($arg)+);
    }};
}

/// Logs a debug-level message, optionally under a context target.
#[macro_export]
macro_rules! quote_debug {
    (ctx: $ctx:expr, $($arg:tt)+) => {{
        log::debug!(target: $ctx, $($arg)+);
    }};
    ($($arg:tt)+) => {{
        log::debug!($($arg)+);
    }};
}

/// Logs an info-level message, optionally under a context target.
#[macro_export]
macro_rules! quote_info {
    (ctx: $ctx:expr, $($arg:tt)+) => {{
        log::info!(target: $ctx, $($arg)+);
    }};
    ($($arg:tt)+) => {{
        log::info!($($arg)+);
    }};
}

/// Logs a warn-level message, optionally under a context target.
#[macro_export]
macro_rules! quote_warn {
    (ctx: $ctx:expr, $($arg:tt)+) => {{
        log::warn!(target: $ctx, $($arg)+);
    }};
    ($($arg:tt)+) => {{
        log::warn!($($arg)+);
    }};
}

/// Logs an error-level message, optionally under a context target.
#[macro_export]
macro_rules! quote_error {
    (ctx: $ctx:expr, $($arg:tt)+) => {{
        log::error!(target: $ctx, $($arg)+);
    }};
    ($($arg:tt)+) => {{
        log::error!($($arg)+);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogDestination {
    /// Write to [`LOG_FILE`].
    File,
    /// Write to the terminal (stderr for warnings and errors).
    #[default]
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Initializes the global logger for the application.
///
/// File destinations that cannot be created are reported on stderr and
/// skipped. Calling this twice is harmless: the second call is ignored.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::Terminal | LogDestination::Both) {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file_logger) = create_file_logger(Path::new(LOG_FILE), level, config) {
            loggers.push(file_logger);
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Info)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
