#![deny(missing_docs)]
//! Logging macros shared by every crate of the invoice tracker.
//!
//! Records go through the `log` facade. The binary decides where they end up
//! (terminal, `./tracker.log`, or both); libraries only ever use the macros
//! below, so the backend can change without touching them.

/// Per-tick detail: URLs requested, tick numbers, retries.
#[macro_export]
macro_rules! tracker_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// State changes of a poll session.
#[macro_export]
macro_rules! tracker_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Mounts, uploads, loaded config.
#[macro_export]
macro_rules! tracker_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// A job or refresh did not go as planned but the program carries on.
#[macro_export]
macro_rules! tracker_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Failures the user has to act on.
#[macro_export]
macro_rules! tracker_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Installs a terminal logger for tests.
///
/// Only the first call installs a logger; later calls (from other tests in the
/// same binary) return without effect.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
