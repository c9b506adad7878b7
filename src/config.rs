//! Environment-driven configuration.
//!
//! Environment variables:
//! - WECHAT_APP_ID: Official Account appid (required)
//! - WECHAT_APP_SECRET: Official Account appsecret (required, never logged)
//! - WECHAT_SHARE_JS: path of the share script to patch (default: static/js-helper/wx-share.js)
//! - WECHAT_API_BASE: API origin (default: https://api.weixin.qq.com)
//! - WECHAT_SHARE_URL: page URL to sign with the fresh ticket (optional)
//!
//! `from_lookup` takes any key -> value function so callers (and tests) are not
//! tied to the process environment.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub const ENV_APP_ID: &str = "WECHAT_APP_ID";
pub const ENV_APP_SECRET: &str = "WECHAT_APP_SECRET";
pub const ENV_SHARE_JS: &str = "WECHAT_SHARE_JS";
pub const ENV_API_BASE: &str = "WECHAT_API_BASE";
pub const ENV_SHARE_URL: &str = "WECHAT_SHARE_URL";

pub const DEFAULT_ASSET_PATH: &str = "static/js-helper/wx-share.js";
pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing or empty environment variable {0}")]
    Missing(&'static str),
}

/// Resolved run configuration
#[derive(Clone)]
pub struct Config {
    pub app_id: String,
    pub app_secret: String,
    pub asset_path: PathBuf,
    pub api_base: String,
    pub share_url: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &redact_id(&self.app_id))
            .field("app_secret", &"[redacted]")
            .field("asset_path", &self.asset_path)
            .field("api_base", &self.api_base)
            .field("share_url", &self.share_url)
            .finish()
    }
}

impl Config {
    /// Build a config from explicit credentials with every other field at its default
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            asset_path: PathBuf::from(DEFAULT_ASSET_PATH),
            api_base: DEFAULT_API_BASE.to_string(),
            share_url: None,
        }
    }

    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Values are trimmed; blank counts as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_id = get(ENV_APP_ID).ok_or(ConfigError::Missing(ENV_APP_ID))?;
        let app_secret = get(ENV_APP_SECRET).ok_or(ConfigError::Missing(ENV_APP_SECRET))?;

        let mut config = Self::new(app_id, app_secret);
        if let Some(path) = get(ENV_SHARE_JS) {
            config = config.with_asset_path(path);
        }
        if let Some(base) = get(ENV_API_BASE) {
            config = config.with_api_base(base);
        }
        if let Some(url) = get(ENV_SHARE_URL) {
            config = config.with_share_url(url);
        }
        Ok(config)
    }

    /// Override the share script path
    pub fn with_asset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.asset_path = path.into();
        self
    }

    /// Override the API origin (trailing slashes are dropped)
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Sign this page URL with the fetched ticket
    pub fn with_share_url(mut self, url: impl Into<String>) -> Self {
        self.share_url = Some(url.into());
        self
    }

    /// Redacted appid for logs
    pub fn app_id_hint(&self) -> String {
        redact_id(&self.app_id)
    }
}

/// Redact an ID for logs: keep first 2 and last 2 chars where possible
pub(crate) fn redact_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 4 {
        format!("{}***", id)
    } else {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{}***{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_and_trims_credentials() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_APP_ID, "  wx1234567890  "),
            (ENV_APP_SECRET, "\tsecret\n"),
        ]))
        .unwrap();
        assert_eq!(config.app_id, "wx1234567890");
        assert_eq!(config.app_secret, "secret");
        assert_eq!(config.asset_path, PathBuf::from(DEFAULT_ASSET_PATH));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.share_url.is_none());
    }

    #[test]
    fn missing_app_id_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[(ENV_APP_SECRET, "secret")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_APP_ID));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            (ENV_APP_ID, "wx1234567890"),
            (ENV_APP_SECRET, "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_APP_SECRET));
    }

    #[test]
    fn optional_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_APP_ID, "wx1234567890"),
            (ENV_APP_SECRET, "secret"),
            (ENV_SHARE_JS, "public/share.js"),
            (ENV_API_BASE, "http://127.0.0.1:9000/"),
            (ENV_SHARE_URL, "https://example.com/post"),
        ]))
        .unwrap();
        assert_eq!(config.asset_path, PathBuf::from("public/share.js"));
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.share_url.as_deref(), Some("https://example.com/post"));
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = Config::new("wx1234567890", "topsecret");
        let shown = format!("{:?}", config);
        assert!(!shown.contains("topsecret"));
        assert!(shown.contains("wx***90"));
    }
}
