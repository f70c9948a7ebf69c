//! Configuration, read from environment variables.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini model for routine generation.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Default API endpoint. Overridable for tests and proxies.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Coach configuration.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// Gemini model identifier.
    pub model: String,
    /// API credential, required.
    pub api_key: SecretString,
    /// API base URL (no trailing slash).
    pub base_url: String,
    /// Sampling temperature for routine generation.
    pub temperature: f32,
    /// Completion token cap for routine generation.
    pub max_output_tokens: u32,
}

impl CoachConfig {
    /// Load configuration from the environment.
    ///
    /// `GEMINI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model = std::env::var("CALICOACH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let temperature = match std::env::var("CALICOACH_TEMPERATURE") {
            Ok(raw) => raw.parse::<f32>().map_err(|e| ConfigError::InvalidValue {
                key: "CALICOACH_TEMPERATURE".to_string(),
                message: e.to_string(),
            })?,
            Err(_) => 0.7,
        };

        let max_output_tokens = match std::env::var("CALICOACH_MAX_OUTPUT_TOKENS") {
            Ok(raw) => raw.parse::<u32>().map_err(|e| ConfigError::InvalidValue {
                key: "CALICOACH_MAX_OUTPUT_TOKENS".to_string(),
                message: e.to_string(),
            })?,
            Err(_) => 4096,
        };

        Ok(Self {
            model,
            api_key: SecretString::from(api_key),
            base_url,
            temperature,
            max_output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        // Not reading the environment here: just pin the constants the
        // generator depends on.
        assert_eq!(DEFAULT_MODEL, "gemini-2.5-flash");
        assert!(DEFAULT_BASE_URL.starts_with("https://"));
        assert!(!DEFAULT_BASE_URL.ends_with('/'));
    }
}
