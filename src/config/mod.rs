//! Roast Configuration Module
//!
//! Loads the thermal, advisory and session constants from TOML so that
//! operators can recalibrate the demo curve without a rebuild.
//!
//! ## Loading Order
//!
//! 1. `ROAST_CONFIG` environment variable (path to TOML file)
//! 2. `roast_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! The binary calls `config::init()` once at startup and reads it back with
//! `config::get()`. Library types take a `RoastConfig` by value so they stay
//! testable without the global.
//!
//! ```ignore
//! config::init(RoastConfig::load());
//! let controller = RoastController::new(config::get().clone(), provider, sink);
//! ```

pub mod defaults;
mod roast_config;
pub mod validation;

pub use roast_config::*;

use std::sync::OnceLock;

/// Global roast configuration, initialized once at startup.
static ROAST_CONFIG: OnceLock<RoastConfig> = OnceLock::new();

/// Initialize the global roast configuration.
///
/// A second call is ignored with a warning.
pub fn init(config: RoastConfig) {
    if ROAST_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global roast configuration.
///
/// Falls back to the built-in defaults when `init()` has not been called.
pub fn get() -> &'static RoastConfig {
    ROAST_CONFIG.get_or_init(RoastConfig::default)
}
