//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory called at startup.

pub mod dummy;
pub mod gemini;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct the provider named by `[llm] default`.
///
/// `api_key` comes from the environment (never TOML) and may be `None`.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "gemini" => Ok(LlmProvider::Gemini(gemini::GeminiProvider::new(
            &config.gemini,
            api_key,
        )?)),
        "openai" | "openai-compatible" => Ok(LlmProvider::OpenAiCompatible(
            openai_compatible::OpenAiCompatibleProvider::new(&config.openai, api_key)?,
        )),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

/// Drain a failed response's body for error reporting.
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn llm_config(provider: &str) -> LlmConfig {
        let mut cfg = Config::offline_default().llm;
        cfg.provider = provider.into();
        cfg
    }

    #[test]
    fn builds_each_known_provider() {
        assert_eq!(build(&llm_config("dummy"), None).unwrap().name(), "dummy");
        let gemini = build(&llm_config("gemini"), None).unwrap();
        assert_eq!(gemini.name(), "gemini");
        assert_eq!(gemini.model(), "gemini-2.5-flash");
        assert_eq!(build(&llm_config("openai"), Some("k".into())).unwrap().name(), "openai");
        assert_eq!(build(&llm_config("openai-compatible"), None).unwrap().name(), "openai");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        match build(&llm_config("claude-local"), None) {
            Err(ProviderError::UnknownProvider(name)) => assert_eq!(name, "claude-local"),
            other => panic!("expected UnknownProvider, got {other:?}"),
        }
    }
}
