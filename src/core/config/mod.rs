//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given on the command line), then applies `MENTOR_BIND`,
//! `MENTOR_LOG_LEVEL` and the API key variables from the environment.
//!
//! # Module layout
//!
//! - **types**: resolved configuration structs (`Config`, `LlmConfig`, …).
//! - **raw**: serde targets mirroring the TOML shape, with defaults; private.
//! - **load**: `load`, `load_from`, `parse_str`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{API_KEY_VARS, EnvOverrides, defaults, expand_home, load, load_from, parse_str};
pub use types::*;

impl Config {
    /// Built-in defaults with the dummy provider and no API key.
    /// Used by tests and offline runs; no external calls are possible.
    pub fn offline_default() -> Self {
        let mut cfg = defaults(&EnvOverrides::default());
        cfg.llm.provider = "dummy".into();
        cfg
    }
}
