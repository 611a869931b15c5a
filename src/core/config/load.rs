//! Configuration loading with env-var overrides.
//!
//! Reads a TOML file (all tables optional), fills gaps with built-in
//! defaults, then applies `MENTOR_BIND` / `MENTOR_LOG_LEVEL` and picks up
//! the API key from the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

use super::raw::{self, RawConfig, RawProvider};
use super::types::*;

/// Env vars checked for the API key, first non-empty wins.
/// `Gemini_key` is the name older `.env` files use.
pub const API_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "Gemini_key", "LLM_API_KEY"];

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Values taken from the process environment.
///
/// Tests build this directly instead of mutating env vars.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub bind: Option<String>,
    pub log_level: Option<String>,
    pub api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            bind: non_empty_var("MENTOR_BIND"),
            log_level: non_empty_var("MENTOR_LOG_LEVEL"),
            api_key: API_KEY_VARS.iter().find_map(|name| non_empty_var(name)),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load config from `config_path`, or `config/default.toml` when it exists,
/// or built-in defaults otherwise. Env overrides are applied last.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        Ok(defaults(&overrides))
    }
}

/// Built-in defaults with env overrides applied; no file involved.
pub fn defaults(overrides: &EnvOverrides) -> Config {
    resolve(RawConfig::default(), overrides)
}

/// Read and resolve a specific TOML file.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let parsed: RawConfig = toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;
    let config = resolve(parsed, overrides);
    check_template(&config.mentor.system_template)
        .map_err(|e| AppError::Config(format!("{e} in {}", path.display())))?;
    Ok(config)
}

/// Parse TOML text into a resolved [`Config`].
pub fn parse_str(text: &str, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let parsed: RawConfig =
        toml::from_str(text).map_err(|e| AppError::Config(format!("parse error: {e}")))?;
    let config = resolve(parsed, overrides);
    check_template(&config.mentor.system_template).map_err(AppError::Config)?;
    Ok(config)
}

/// Both selector values must reach the model.
fn check_template(template: &str) -> Result<(), String> {
    let missing: Vec<&str> = TEMPLATE_VARS
        .iter()
        .copied()
        .filter(|var| !template.contains(var))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("[mentor] system_template is missing {}", missing.join(", ")))
    }
}

const TEMPLATE_VARS: [&str; 2] = ["{{module}}", "{{experience}}"];

fn resolve(raw: RawConfig, overrides: &EnvOverrides) -> Config {
    let server = raw.server;
    let bind = overrides.bind.clone().unwrap_or(server.bind);
    let log_level = overrides.log_level.clone().unwrap_or(server.log_level);

    Config {
        server: ServerConfig {
            bind,
            log_level,
            log_file: server.log_file.as_deref().map(expand_home),
            session_idle: (server.session_idle_secs > 0)
                .then(|| Duration::from_secs(server.session_idle_secs)),
        },
        llm: LlmConfig {
            provider: raw.llm.provider,
            gemini: provider_config(
                raw.llm.gemini,
                raw::GEMINI_API_BASE_URL,
                raw::GEMINI_MODEL,
                raw::GEMINI_TEMPERATURE,
            ),
            openai: provider_config(
                raw.llm.openai,
                raw::OPENAI_API_BASE_URL,
                raw::OPENAI_MODEL,
                raw::OPENAI_TEMPERATURE,
            ),
        },
        llm_api_key: overrides.api_key.clone(),
        mentor: MentorConfig {
            system_template: raw.mentor.system_template,
            page_title: raw.mentor.page_title,
        },
    }
}

fn provider_config(
    raw: RawProvider,
    base_url: &str,
    model: &str,
    temperature: f32,
) -> ProviderConfig {
    ProviderConfig {
        api_base_url: raw.api_base_url.unwrap_or_else(|| base_url.to_string()),
        model: raw.model.unwrap_or_else(|| model.to_string()),
        temperature: raw.temperature.unwrap_or(temperature),
        timeout_seconds: raw
            .timeout_seconds
            .unwrap_or(raw::DEFAULT_TIMEOUT_SECONDS)
            .max(1),
    }
}

/// Expand a leading `~` to the user's home directory.
/// Paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(path),
        },
        _ => PathBuf::from(path),
    }
}
