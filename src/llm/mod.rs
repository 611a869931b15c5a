//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations; the
//! `complete` method is `async fn` on the enum so callers need no
//! trait-object machinery. Providers are stateless and cheap to clone.
//!
//! Every call is one round trip: a system instruction plus a single user
//! message. No history is sent and nothing is retried.

pub mod providers;

use serde::Serialize;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Request / response ────────────────────────────────────────────────────────

/// What gets sent to the model for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// Persona instruction built from the session settings.
    pub system: String,
    /// The latest learner message, verbatim.
    pub user: String,
}

/// Token counts reported by the provider, when it reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Adding a backend = new module + new variant + new arm in each method.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
    Gemini(providers::gemini::GeminiProvider),
}

impl LlmProvider {
    /// Send one request and return the model's text reply.
    pub async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(request).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(request).await,
            LlmProvider::Gemini(p) => p.complete(request).await,
        }
    }

    /// Short backend name as written in `[llm] default`.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(_) => "openai",
            LlmProvider::Gemini(_) => "gemini",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Dummy(_) => "none",
            LlmProvider::OpenAiCompatible(p) => p.model(),
            LlmProvider::Gemini(p) => p.model(),
        }
    }
}
