//! Process logging setup plus per-module switchable log macros.
//!
//! Modules that log through the macros define their own switch:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("step sync finished");
//! ```
//! Flipping `ENABLE_LOGS` to `false` silences a chatty module (the sensing
//! loop at 10 Hz, for example) without touching `RUST_LOG`.

use log::LevelFilter;

/// Install `env_logger`. `RUST_LOG` wins; otherwise `info`.
/// Safe to call more than once.
pub fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    let _ = builder.try_init();
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
