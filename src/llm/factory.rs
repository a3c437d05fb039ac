//! LLM client construction from configuration.
//!
//! The rest of the service only ever sees `dyn LlmClient`; vendor identity
//! stops here.

use std::sync::Arc;

use crate::config::Settings;
use crate::error::ProviderError;
use crate::llm::{AnthropicClient, LlmClient, OpenAIClient};

/// Create the configured LLM client.
pub fn create_client(settings: &Settings) -> Result<Arc<dyn LlmClient>, ProviderError> {
    match settings.default_provider.as_str() {
        "openai" => {
            let key = settings
                .openai_api_key
                .as_deref()
                .ok_or_else(|| ProviderError::Other("OpenAI API key is required".to_string()))?;
            let mut client = OpenAIClient::new(key);
            if let Some(model) = &settings.model {
                client = client.with_model(model);
            }
            Ok(Arc::new(client))
        }
        "anthropic" => {
            let key = settings.anthropic_api_key.as_deref().ok_or_else(|| {
                ProviderError::Other("Anthropic API key is required".to_string())
            })?;
            let mut client = AnthropicClient::new(key);
            if let Some(model) = &settings.model {
                client = client.with_model(model);
            }
            Ok(Arc::new(client))
        }
        other => Err(ProviderError::Other(format!(
            "Unknown LLM provider '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_selected_by_default() {
        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Settings::default()
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider(), "openai");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_anthropic_selected_with_model_override() {
        let settings = Settings {
            default_provider: "anthropic".to_string(),
            anthropic_api_key: Some("sk-ant-test".to_string()),
            model: Some("claude-haiku-4-5".to_string()),
            ..Settings::default()
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider(), "anthropic");
        assert_eq!(client.model(), "claude-haiku-4-5");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let settings = Settings::default();
        assert!(create_client(&settings).is_err());
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let settings = Settings {
            default_provider: "parrot".to_string(),
            ..Settings::default()
        };
        assert!(create_client(&settings).is_err());
    }
}
