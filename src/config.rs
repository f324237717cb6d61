use crate::error::{Error, Result};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_API_BASE_URL";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Settings for the Gemini client, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    ///
    /// A missing, blank or placeholder API key is rejected. Blank optional
    /// values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
            .ok_or_else(|| {
                Error::config(format!(
                    "ERROR: Please set {API_KEY_VAR} environment variable"
                ))
            })?;

        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = Self::new(api_key);
        if let Some(model) = non_blank(MODEL_VAR) {
            config = config.with_model(model.trim());
        }
        if let Some(base_url) = non_blank(BASE_URL_VAR) {
            config = config.with_base_url(base_url.trim().trim_end_matches('/'));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn placeholder_and_blank_keys_are_rejected() {
        for key in ["YOUR_API_KEY_HERE", "", "   "] {
            let result = Config::from_lookup(lookup_from(&[(API_KEY_VAR, key)]));
            assert!(result.is_err(), "key {key:?} should be rejected");
        }
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "secret")])).unwrap();
        assert_eq!(config, Config::new("secret"));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn overrides_are_picked_up() {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, "gemini-test"),
            (BASE_URL_VAR, "http://127.0.0.1:9000/v1/"),
            ("UNRELATED", "x"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gemini-test");
        assert_eq!(config.base_url, "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn blank_overrides_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, ""),
            (BASE_URL_VAR, "  "),
        ]))
        .unwrap();

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
