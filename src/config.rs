use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const API_URL_VAR: &str = "TASKCLIENT_API_URL";
pub const LOGIN_REDIRECT_VAR: &str = "TASKCLIENT_LOGIN_REDIRECT";
pub const TOKEN_FILE_VAR: &str = "TASKCLIENT_TOKEN_FILE";

/// Where the backend lives and which of its endpoints handle authentication.
///
/// Endpoint paths are relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub login_endpoint: String,
    pub signup_endpoint: String,
    pub refresh_endpoint: String,
    /// Entry point the application returns to once the session can't be recovered.
    pub login_redirect: String,
    /// Persist tokens here. Without it tokens are kept in memory only.
    pub token_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            login_endpoint: "/auth/login".to_string(),
            signup_endpoint: "/auth/signup".to_string(),
            refresh_endpoint: "/auth/refresh".to_string(),
            login_redirect: "/login".to_string(),
            token_file: None,
        }
    }
}

impl ApiConfig {
    /// Defaults, overridden by `TASKCLIENT_API_URL`, `TASKCLIENT_LOGIN_REDIRECT` and
    /// `TASKCLIENT_TOKEN_FILE` when set.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = var(API_URL_VAR).filter(|s| !s.is_empty()) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(redirect) = var(LOGIN_REDIRECT_VAR).filter(|s| !s.is_empty()) {
            config.login_redirect = redirect;
        }
        config.token_file = var(TOKEN_FILE_VAR).filter(|s| !s.is_empty()).map(PathBuf::from);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let config = ApiConfig::from_vars(|name| match name {
            API_URL_VAR => Some("https://tasks.example.com/api/v1/".to_string()),
            TOKEN_FILE_VAR => Some("/tmp/tokens.json".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "https://tasks.example.com/api/v1");
        assert_eq!(config.login_redirect, "/login");
        assert_eq!(config.token_file, Some(PathBuf::from("/tmp/tokens.json")));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ApiConfig = serde_json::from_str(r#"{"base_url": "http://127.0.0.1:9000"}"#).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.refresh_endpoint, "/auth/refresh");
    }
}
