//! Dummy LLM provider: echoes the user message back prefixed with `[echo]`.
//! Lets the whole turn run without network access or an API key.

use crate::llm::{ChatRequest, LlmResponse, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, ProviderError> {
        Ok(LlmResponse {
            text: format!("[echo] {}", request.user),
            usage: None,
        })
    }
}
