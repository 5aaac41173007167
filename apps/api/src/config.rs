use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// Application configuration loaded from environment variables.
/// Only malformed numeric values fail startup; the API key may be absent.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets-store credential. When absent the key must be supplied per request.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub completion_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub max_sessions: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: optional_env("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            completion_timeout_secs: parse_env("COMPLETION_TIMEOUT_SECS", 120)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            max_sessions: parse_env("MAX_SESSIONS", 256)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Whether a credential is available without asking the user for one.
    pub fn has_stored_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            completion_timeout_secs: 120,
            max_upload_bytes: 10 * 1024 * 1024,
            max_sessions: 256,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

/// Reads a variable, treating unset and blank values the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u16 = parse_env("PERSONAPATH_TEST_UNSET_PORT", 9090).unwrap();
        assert_eq!(value, 9090);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("PERSONAPATH_TEST_BAD_PORT", "not-a-port");
        let result: Result<u16> = parse_env("PERSONAPATH_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("PERSONAPATH_TEST_BAD_PORT"), "{message}");
    }

    #[test]
    fn test_blank_env_value_counts_as_missing() {
        std::env::set_var("PERSONAPATH_TEST_BLANK_KEY", "   ");
        assert!(optional_env("PERSONAPATH_TEST_BLANK_KEY").is_none());
    }

    #[test]
    fn test_default_config_has_no_stored_key() {
        let config = Config::default();
        assert!(!config.has_stored_api_key());
        assert_eq!(config.openai_model, "gpt-4");
    }
}
