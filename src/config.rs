// src/config.rs
use crate::state::DEFAULT_MODEL;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_SYSTEM_ROLE: &str = "You are a helpful fitness and nutrition assistant.";
pub const DEFAULT_TOP_K: u32 = 7;

pub const BASE_URL_VAR: &str = "FITNESS_API_BASE_URL";
pub const MODEL_VAR: &str = "FITNESS_API_MODEL";
pub const TOP_K_VAR: &str = "FITNESS_API_TOP_K";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub system_role: String,
    pub top_k: u32,
    pub default_model: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            system_role: DEFAULT_SYSTEM_ROLE.to_string(),
            top_k: DEFAULT_TOP_K,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Reads overrides from the process environment (and `.env`, if present).
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(model) = lookup(MODEL_VAR).filter(|v| !v.trim().is_empty()) {
            config.default_model = model.trim().to_string();
        }
        if let Some(raw) = lookup(TOP_K_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(k) if k > 0 => config.top_k = k,
                _ => tracing::warn!(value = %raw, "ignoring invalid {TOP_K_VAR}"),
            }
        }
        config
    }

    /// `{base}/{path}` with exactly one slash in between.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
