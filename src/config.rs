use std::str::FromStr;

use anyhow::Result;

// Default configuration constants
const DEFAULT_CONTEXT_WINDOW: usize = 10;
const DEFAULT_OVERLAP_COUNT: usize = 5;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 600; // 10 minutes
const DEFAULT_DB_PATH: &str = "chatflow.redb";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PROVIDER: &str = "openai";
const MIN_CONTEXT_WINDOW: usize = 1;
const MIN_CACHE_TTL_SECONDS: u64 = 1;

/// Application settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Number of most recent messages kept verbatim in the prompt context.
    pub context_window: usize,
    /// Messages past the window tolerated before compaction fires.
    pub overlap_count: usize,
    pub cache_ttl_seconds: u64,
    pub db_path: String,
    pub bind_addr: String,
    pub default_provider: String,
    /// Optional model override; each provider has its own default.
    pub model: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub brave_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            overlap_count: DEFAULT_OVERLAP_COUNT,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            db_path: DEFAULT_DB_PATH.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            default_provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            openai_api_key: None,
            anthropic_api_key: None,
            brave_api_key: None,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            context_window: env_parse("PREVIOUS_MESSAGE_CONTEXT_LENGTH", DEFAULT_CONTEXT_WINDOW),
            overlap_count: env_parse("OVERLAP_COUNT", DEFAULT_OVERLAP_COUNT),
            cache_ttl_seconds: env_parse("CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL_SECONDS),
            db_path: env_string("CHATFLOW_DB_PATH", DEFAULT_DB_PATH),
            bind_addr: env_string("CHATFLOW_BIND_ADDR", DEFAULT_BIND_ADDR),
            default_provider: env_string("DEFAULT_LLM_PROVIDER", DEFAULT_PROVIDER),
            model: std::env::var("CHATFLOW_MODEL").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            brave_api_key: std::env::var("BRAVE_API_KEY").ok(),
        }
    }

    /// Validate configuration values before the server starts.
    pub fn validate(&self) -> Result<()> {
        if self.context_window < MIN_CONTEXT_WINDOW {
            return Err(anyhow::anyhow!(
                "Context window must be at least {}",
                MIN_CONTEXT_WINDOW
            ));
        }

        if self.cache_ttl_seconds < MIN_CACHE_TTL_SECONDS {
            return Err(anyhow::anyhow!(
                "Cache TTL must be at least {} second(s)",
                MIN_CACHE_TTL_SECONDS
            ));
        }

        match self.default_provider.as_str() {
            "openai" => {
                if self.openai_api_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "OPENAI_API_KEY is required when DEFAULT_LLM_PROVIDER=openai"
                    ));
                }
            }
            "anthropic" => {
                if self.anthropic_api_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "ANTHROPIC_API_KEY is required when DEFAULT_LLM_PROVIDER=anthropic"
                    ));
                }
            }
            other => {
                return Err(anyhow::anyhow!("Unknown LLM provider '{}'", other));
            }
        }

        Ok(())
    }

    /// Threshold past which history compaction fires.
    pub fn compaction_threshold(&self) -> usize {
        self.context_window + self.overlap_count
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.context_window, 10);
        assert_eq!(settings.overlap_count, 5);
        assert_eq!(settings.cache_ttl_seconds, 600);
        assert_eq!(settings.compaction_threshold(), 15);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_zero_context_window_rejected() {
        let settings = Settings {
            context_window: 0,
            ..valid_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let settings = Settings {
            cache_ttl_seconds: 0,
            ..valid_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let settings = Settings {
            default_provider: "gemini".to_string(),
            ..valid_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_provider_requires_matching_key() {
        let settings = Settings {
            default_provider: "anthropic".to_string(),
            ..valid_settings()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            default_provider: "anthropic".to_string(),
            anthropic_api_key: Some("sk-ant-test".to_string()),
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }
}
