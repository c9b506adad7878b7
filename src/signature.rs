//! JS-SDK `wx.config` signature.
//!
//! signature = sha1("jsapi_ticket=T&noncestr=N&timestamp=TS&url=U"), lowercase hex.
//! Keys are in ASCII order and the URL is taken without its `#` fragment.

use std::time::{SystemTime, UNIX_EPOCH};

use sha1::{Digest, Sha1};

const NONCE_LEN: usize = 15;

/// Everything a page needs for `wx.config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePackage {
    pub nonce_str: String,
    pub timestamp: u64,
    pub url: String,
    pub signature: String,
}

impl SignaturePackage {
    /// Sign `url` with a fresh nonce and the current unix time
    pub fn new(ticket: &str, url: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::with_nonce(ticket, url, &nonce_str(), timestamp)
    }

    /// Sign with caller-supplied nonce and timestamp
    pub fn with_nonce(ticket: &str, url: &str, nonce_str: &str, timestamp: u64) -> Self {
        let url = strip_fragment(url).to_string();
        let signature = jsapi_signature(ticket, nonce_str, &timestamp.to_string(), &url);
        Self {
            nonce_str: nonce_str.to_string(),
            timestamp,
            url,
            signature,
        }
    }
}

/// Compute the JS-SDK signature
pub fn jsapi_signature(ticket: &str, nonce_str: &str, timestamp: &str, url: &str) -> String {
    let raw = format!(
        "jsapi_ticket={}&noncestr={}&timestamp={}&url={}",
        ticket,
        nonce_str,
        timestamp,
        strip_fragment(url)
    );
    let digest = Sha1::digest(raw.as_bytes());
    // lowercase hex
    let mut s = String::with_capacity(digest.len() * 2);
    for b in digest {
        use core::fmt::Write;
        let _ = write!(&mut s, "{:02x}", b);
    }
    s
}

/// Random alphanumeric nonce
pub fn nonce_str() -> String {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(NONCE_LEN)
        .collect()
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sample published in the WeChat JS-SDK documentation appendix
    const TICKET: &str =
        "sM4AOVdWfPE4DxkXGEs8VMCPGGVi4C3VM0P37wVUCFvkVAy_90u5h9nbSlYy3-Sl-HhTdfl2fzFy1AOcHKP7qg";
    const NONCE: &str = "Wm3WZYTPz0wzccnW";
    const TIMESTAMP: u64 = 1414587457;
    const URL: &str = "http://mp.weixin.qq.com?params=value";
    const SIGNATURE: &str = "0f9de62fce790f9a083d5c99e95740ceb90c27ed";

    #[test]
    fn matches_documented_sample() {
        assert_eq!(
            jsapi_signature(TICKET, NONCE, &TIMESTAMP.to_string(), URL),
            SIGNATURE
        );
    }

    #[test]
    fn fragment_is_ignored() {
        let pkg = SignaturePackage::with_nonce(TICKET, &format!("{URL}#section"), NONCE, TIMESTAMP);
        assert_eq!(pkg.url, URL);
        assert_eq!(pkg.signature, SIGNATURE);
    }

    #[test]
    fn nonce_shape() {
        let n = nonce_str();
        assert_eq!(n.len(), NONCE_LEN);
        assert!(n.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn fresh_package_is_self_consistent() {
        let pkg = SignaturePackage::new("T", "https://example.com/a");
        assert_eq!(
            pkg.signature,
            jsapi_signature("T", &pkg.nonce_str, &pkg.timestamp.to_string(), &pkg.url)
        );
        assert_eq!(pkg.signature.len(), 40);
    }
}
