//! Raw TOML deserialization types.
//!
//! These structs mirror the file shape and carry `serde` defaults; every
//! table is optional so an empty file is a valid config.

use serde::Deserialize;

use crate::prompt::DEFAULT_SYSTEM_TEMPLATE;

#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub mentor: RawMentor,
}

// ── Server ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            log_file: None,
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub gemini: RawProvider,
    #[serde(default)]
    pub openai: RawProvider,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            gemini: RawProvider::default(),
            openai: RawProvider::default(),
        }
    }
}

/// Every field is optional; the loader fills gaps with the defaults of
/// whichever provider the table belongs to.
#[derive(Deserialize, Default)]
pub(super) struct RawProvider {
    pub api_base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

// ── Mentor ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawMentor {
    #[serde(default = "default_system_template")]
    pub system_template: String,
    #[serde(default = "default_page_title")]
    pub page_title: String,
}

impl Default for RawMentor {
    fn default() -> Self {
        Self {
            system_template: default_system_template(),
            page_title: default_page_title(),
        }
    }
}

// ── Defaults ────────────────────────────────────────────────────────────────

pub(super) fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_session_idle_secs() -> u64 {
    3600
}

pub(super) fn default_llm_provider() -> String {
    "gemini".to_string()
}

pub(super) fn default_system_template() -> String {
    DEFAULT_SYSTEM_TEMPLATE.to_string()
}

pub(super) fn default_page_title() -> String {
    "AI Chatbot Mentor".to_string()
}

pub(super) const GEMINI_API_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
pub(super) const GEMINI_MODEL: &str = "gemini-2.5-flash";
pub(super) const GEMINI_TEMPERATURE: f32 = 0.0;

pub(super) const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
pub(super) const OPENAI_MODEL: &str = "gpt-4o-mini";
pub(super) const OPENAI_TEMPERATURE: f32 = 0.0;

pub(super) const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
