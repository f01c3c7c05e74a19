use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;

use crate::error::{AdvisorError, Result};
use crate::settings::AiSettings;

pub fn map_backend(provider: &str) -> Result<LLMBackend> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(AdvisorError::UnknownProvider(other.to_string())),
    }
}

/// One system + user exchange. Returns the model's text reply.
pub async fn generate(settings: &AiSettings, system: &str, user_msg: &str) -> Result<String> {
    let backend = map_backend(&settings.provider)?;

    let mut builder = LLMBuilder::new()
        .backend(backend)
        .model(&settings.model)
        .system(system);

    if !settings.api_key.is_empty() {
        builder = builder.api_key(&settings.api_key);
    }

    let llm = builder
        .build()
        .map_err(|e| AdvisorError::Build(e.to_string()))?;

    let messages = vec![ChatMessage::user().content(user_msg).build()];

    let response = llm
        .chat(&messages)
        .await
        .map_err(|e| AdvisorError::Chat(e.to_string()))?;

    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AdvisorError::EmptyResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_providers_map() {
        for p in ["openai", "anthropic", "google", "ollama", "groq", "mistral", "deepseek"] {
            assert!(map_backend(p).is_ok(), "{p}");
        }
        assert!(matches!(map_backend("acme"), Err(AdvisorError::UnknownProvider(p)) if p == "acme"));
    }
}
