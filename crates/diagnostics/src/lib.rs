// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Structured logging shared by the gatefs crates.
//!
//! Output goes to stderr through `emit_term` and is controlled by the
//! `GATEFS_LOG` environment variable:
//! - `GATEFS_LOG=off` (default) - nothing
//! - `GATEFS_LOG=info` - deletions, walks and other user-visible work
//! - `GATEFS_LOG=debug` - per-node resolution and lease lifecycle
//!
//! `warn` and `error` are accepted too.

use std::sync::Once;

// Re-export emit so the macros resolve in dependent crates.
pub use emit;

/// The environment variable selecting the log level.
pub const LOG_ENV: &str = "GATEFS_LOG";

static INIT: Once = Once::new();

/// What a `GATEFS_LOG` value asks for. `Ok(None)` means logging is off.
pub fn parse_level(value: &str) -> Result<Option<emit::Level>, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Ok(None),
        "debug" => Ok(Some(emit::Level::Debug)),
        "info" => Ok(Some(emit::Level::Info)),
        "warn" => Ok(Some(emit::Level::Warn)),
        "error" => Ok(Some(emit::Level::Error)),
        other => Err(format!("unknown {LOG_ENV} value '{other}'")),
    }
}

/// Install the stderr emitter according to `GATEFS_LOG`.
///
/// Safe to call more than once; only the first call has an effect. An
/// unrecognized value falls back to `info` and says so.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).unwrap_or_default();
        let (level, problem) = match parse_level(&value) {
            Ok(None) => return,
            Ok(Some(level)) => (level, None),
            Err(problem) => (emit::Level::Info, Some(problem)),
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if let Some(problem) = problem {
            emit::warn!("{problem}, using info", problem);
        }

        // The emitter lives for the rest of the process.
        std::mem::forget(rt);
    });
}

/// User-visible operations: "Deleted /data/cache", "Walked 120 entries".
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Per-node detail: resolution steps, lease open/close, skipped entries.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Recoverable oddities worth noting.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Failures that stop an operation.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("off").unwrap(), None);
        assert_eq!(parse_level("").unwrap(), None);
        assert_eq!(parse_level("DEBUG").unwrap(), Some(emit::Level::Debug));
        assert_eq!(parse_level("warn").unwrap(), Some(emit::Level::Warn));
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn test_macros_compile() {
        info!("Test message");
        debug!("Debug message with {value}", value: 42);
        warn!("Warning message");
        error!("Error message");
    }
}
