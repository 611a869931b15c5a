//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the rest of the crate
//! consumes. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;
use std::time::Duration;

// ── Server ──────────────────────────────────────────────────────────────────

/// HTTP listener and logging settings (`[server]`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the axum listener binds to.
    pub bind: String,
    pub log_level: String,
    /// Append logs here instead of stderr when set.
    pub log_file: Option<PathBuf>,
    /// Sessions untouched for this long are dropped. `None` keeps them
    /// until deleted or process exit (`session_idle_secs = 0`).
    pub session_idle: Option<Duration>,
}

// ── LLM ─────────────────────────────────────────────────────────────────────

/// Settings shared by the HTTP-backed providers.
///
/// Populated from `[llm.gemini]` or `[llm.openai]`.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Endpoint root (Gemini) or full chat completions URL (OpenAI).
    pub api_base_url: String,
    /// Model name sent to the API.
    pub model: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active: `"gemini"`, `"openai"` or `"dummy"`.
    /// Maps to `default` in `[llm]`.
    pub provider: String,
    pub gemini: ProviderConfig,
    pub openai: ProviderConfig,
}

impl LlmConfig {
    /// Model name of the active provider, for health output and logs.
    pub fn active_model(&self) -> &str {
        match self.provider.as_str() {
            "gemini" => &self.gemini.model,
            "openai" | "openai-compatible" => &self.openai.model,
            _ => "none",
        }
    }
}

// ── Mentor ──────────────────────────────────────────────────────────────────

/// Persona settings (`[mentor]`).
#[derive(Debug, Clone)]
pub struct MentorConfig {
    /// System instruction with `{{module}}` and `{{experience}}` placeholders.
    pub system_template: String,
    pub page_title: String,
}

// ── Top-level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    /// Sourced from the environment only, never from TOML.
    pub llm_api_key: Option<String>,
    pub mentor: MentorConfig,
}
