//! API key resolution.
//!
//! The key is read from the environment once at startup: `GEMINI_API_KEY`
//! first, then the generic `API_KEY`. It is wrapped in [`SecretString`] right
//! away and never logged.

use secrecy::SecretString;

/// Variables checked for the API key, highest priority first.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Resolve the API key from the process environment.
pub fn resolve_api_key() -> Option<SecretString> {
    resolve_api_key_with(|name| std::env::var(name).ok())
}

/// Resolve the API key through `lookup`, skipping blank values.
pub fn resolve_api_key_with<F>(lookup: F) -> Option<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS.iter().find_map(|name| {
        let value = lookup(name)?;
        let value = value.trim();
        if value.is_empty() {
            tracing::debug!(var = name, "Ignoring empty API key variable");
            None
        } else {
            tracing::debug!(var = name, "API key resolved");
            Some(SecretString::from(value.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_gemini_key_preferred() {
        let key = resolve_api_key_with(lookup(&[("GEMINI_API_KEY", "g"), ("API_KEY", "a")]));
        assert_eq!(key.unwrap().expose_secret(), "g");
    }

    #[test]
    fn test_falls_back_to_generic_key() {
        let key = resolve_api_key_with(lookup(&[("API_KEY", "a")]));
        assert_eq!(key.unwrap().expose_secret(), "a");
    }

    #[test]
    fn test_blank_value_skipped() {
        let key = resolve_api_key_with(lookup(&[("GEMINI_API_KEY", "  "), ("API_KEY", "a")]));
        assert_eq!(key.unwrap().expose_secret(), "a");
    }

    #[test]
    fn test_missing_key_is_none() {
        assert!(resolve_api_key_with(lookup(&[])).is_none());
    }
}
