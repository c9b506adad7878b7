//! WeChat Official Account access_token client.
//!
//! Provides the HTTP client shared by the token and ticket calls, the unified
//! `Error` type, and response decoding. Tokens are not cached or refreshed here;
//! every call goes upstream exactly once.
//!
//! Endpoint:
//! - GET https://api.weixin.qq.com/cgi-bin/token?grant_type=client_credential&appid=APPID&secret=APPSECRET
//!
//! Example (pseudo usage):
//! ```ignore
//! use wxticket_rs::WxClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = WxClient::new("https://api.weixin.qq.com")?;
//!     let token = client.get_access_token("your_appid", "your_appsecret").await?;
//!     println!("access_token expires_in: {}", token.expires_in);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::redact_id;
use crate::errors;

/// Per-request timeout for both upstream calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Echoed response bodies are cut at this many bytes
const MAX_BODY_ECHO: usize = 2048;

/// Successful access_token response
#[derive(Clone, Debug, Deserialize)]
pub struct AccessToken {
    /// Access token string
    pub access_token: String,
    /// Expiration in seconds (not tracked)
    #[serde(default)]
    pub expires_in: u32,
}

/// Unified error type for both upstream calls
#[derive(Debug, Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("weixin error {code}: {message}; body: {body}")]
    Wx {
        code: i64,
        message: String,
        body: String,
    },

    #[error("response has no `{field}`; body: {body}")]
    MissingField { field: &'static str, body: String },

    #[error("malformed response (status {status}): {error}; body: {body}")]
    UnexpectedResponse {
        status: u16,
        error: String,
        body: String,
    },
}

impl Error {
    /// True when the platform answered with well-formed JSON that reports a failure
    pub fn is_api_reported(&self) -> bool {
        matches!(self, Error::Wx { .. } | Error::MissingField { .. })
    }

    /// Human-readable errcode guidance, when the platform supplied an errcode
    pub fn explain(&self) -> Option<String> {
        match self {
            Error::Wx { code, message, .. } => Some(errors::explain(*code, message)),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the WeChat Official Account platform API
///
/// - Wraps `reqwest::Client` with a 10 second timeout
/// - `api_base` is the origin every endpoint path is joined to
#[derive(Clone, Debug)]
pub struct WxClient {
    http: reqwest::Client,
    api_base: String,
}

impl WxClient {
    /// Build a client against `api_base` (e.g. https://api.weixin.qq.com)
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_http(http, api_base))
    }

    /// Use a custom `reqwest::Client`
    pub fn with_http(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { http, api_base }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Fetch access_token
    ///
    /// GET {api_base}/cgi-bin/token
    /// params: grant_type=client_credential, appid, secret (do not log secrets)
    #[instrument(level = "debug", skip(self, secret))]
    pub async fn get_access_token(&self, appid: &str, secret: &str) -> Result<AccessToken> {
        let mut url = self.endpoint("/cgi-bin/token")?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("grant_type", "client_credential");
            qp.append_pair("appid", appid);
            qp.append_pair("secret", secret);
        }
        if appid.starts_with("ww") {
            warn!(
                "appid starts with 'ww' (likely a WeCom corpid); jsapi tickets need an Official Account appid"
            );
        }
        debug!(
            "Requesting access_token (no secrets), appid hint: {}",
            redact_id(appid)
        );

        let (status, bytes) = self.get_bytes(url).await?;
        decode_field(status, &bytes, "access_token")
    }

    /// Join `path` onto the API origin
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Single GET, returning the status and the raw body.
    ///
    /// Transport errors drop the URL: its query carries the secret or the access_token.
    pub(crate) async fn get_bytes(&self, url: Url) -> Result<(StatusCode, Vec<u8>)> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        Ok((status, bytes.to_vec()))
    }
}

/// Decode a JSON object that must carry a non-empty string `field`.
///
/// - Not JSON, or not an object: `Error::UnexpectedResponse`
/// - Object without `field` and a non-zero errcode: `Error::Wx`
/// - Object without `field` otherwise: `Error::MissingField`
pub(crate) fn decode_field<T: DeserializeOwned>(
    status: StatusCode,
    bytes: &[u8],
    field: &'static str,
) -> Result<T> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(de_err) => {
            return Err(Error::UnexpectedResponse {
                status: status.as_u16(),
                error: de_err.to_string(),
                body: echo_body(bytes),
            });
        }
    };

    let Some(obj) = value.as_object() else {
        return Err(Error::UnexpectedResponse {
            status: status.as_u16(),
            error: "expected a JSON object".to_string(),
            body: echo_body(bytes),
        });
    };

    let present = obj
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if present {
        return serde_json::from_value(value).map_err(|de_err| Error::UnexpectedResponse {
            status: status.as_u16(),
            error: de_err.to_string(),
            body: echo_body(bytes),
        });
    }

    let code = obj.get("errcode").and_then(Value::as_i64).unwrap_or(0);
    if code != 0 {
        let message = obj
            .get("errmsg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Err(Error::Wx {
            code,
            message,
            body: echo_body(bytes),
        })
    } else {
        Err(Error::MissingField {
            field,
            body: echo_body(bytes),
        })
    }
}

/// Body text for diagnostics: access_token redacted, truncated to `MAX_BODY_ECHO`
pub(crate) fn echo_body(bytes: &[u8]) -> String {
    let mut body = String::from_utf8_lossy(bytes).to_string();
    if let Ok(mut v) = serde_json::from_str::<Value>(&body) {
        if let Some(obj) = v.as_object_mut() {
            if obj.contains_key("access_token") {
                obj.insert(
                    "access_token".to_string(),
                    Value::String("[redacted]".into()),
                );
            }
        }
        if let Ok(s) = serde_json::to_string(&v) {
            body = s;
        }
    }
    if body.len() > MAX_BODY_ECHO {
        let mut cut = MAX_BODY_ECHO;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
