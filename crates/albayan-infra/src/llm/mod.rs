//! Answer provider implementations.
//!
//! Contains the concrete [`AnswerProvider`](albayan_core::llm::provider::AnswerProvider)
//! for Google Gemini and a factory ([`create_provider`]) that builds it from
//! configuration.

pub mod gemini;

use secrecy::SecretString;

use albayan_core::llm::box_provider::BoxAnswerProvider;
use albayan_types::answer::AnswerError;
use albayan_types::config::GlobalConfig;

use self::gemini::GeminiProvider;

/// Create a [`BoxAnswerProvider`] from configuration and the resolved key.
///
/// A missing key is not an error here: the provider reports it on first use.
///
/// # Errors
///
/// Returns [`AnswerError::Configuration`] if the HTTP client cannot be built.
pub fn create_provider(
    config: &GlobalConfig,
    api_key: Option<SecretString>,
) -> Result<BoxAnswerProvider, AnswerError> {
    if api_key.is_none() {
        tracing::warn!("No API key found in GEMINI_API_KEY or API_KEY; questions will fail");
    }
    let provider = GeminiProvider::new(api_key, config)?;
    tracing::debug!(model = provider.model(), "Gemini provider created");
    Ok(BoxAnswerProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_with_key() {
        let provider =
            create_provider(&GlobalConfig::default(), Some(SecretString::from("k"))).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_create_provider_without_key() {
        let provider = create_provider(&GlobalConfig::default(), None).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
