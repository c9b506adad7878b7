//! WeChat Official Account errcode helpers for the token and ticket calls
//!
//! Purpose
//! - Map well-known global errcode values to categories and hints
//! - Say whether a rerun can help, or the credentials must be fixed first
//! - Pull the caller IP out of the "not in whitelist" message
//!
//! Notes
//! - Program logic depends on `errcode`; `errmsg` is diagnostic text only.
//! - Nothing here retries. The advice is printed for the operator.
//! - Unknown codes map to `Unknown`: no rerun advice and a generic hint.

/// High-level classification for an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// errcode = 0
    Success,
    /// System busy or rate limited, a later rerun may work
    Temporary,
    /// appid/secret/token problems
    Auth,
    /// Caller IP not allowed
    IpWhitelist,
    /// Request shape problems
    InvalidParam,
    /// Quota or permission limits on the account
    Limit,
    Unknown,
}

/// A compact explanation for an errcode.
#[derive(Debug, Clone)]
pub struct ErrorHelp {
    pub code: i64,
    pub category: ErrorCategory,
    /// Short, stable summary for the code
    pub summary: &'static str,
    /// Actionable hint for mitigation
    pub hint: &'static str,
    /// Whether rerunning later (without changes) may succeed
    pub rerun_may_help: bool,
}

/// Classify errcode into a category.
pub fn category_for(code: i64) -> ErrorCategory {
    match code {
        0 => ErrorCategory::Success,
        -1 | 45009 | 45011 => ErrorCategory::Temporary,
        40001 | 40013 | 40014 | 40125 | 41001 | 41002 | 41004 | 42001 => ErrorCategory::Auth,
        40164 | 61004 | 89503 => ErrorCategory::IpWhitelist,
        40002 | 40097 => ErrorCategory::InvalidParam,
        48001 | 50001 | 50002 | 61024 => ErrorCategory::Limit,
        _ => ErrorCategory::Unknown,
    }
}

/// Returns a hint for a known errcode.
pub fn hint_for(code: i64) -> &'static str {
    match code {
        -1 => "System busy; rerun in a few seconds.",
        0 => "Success.",
        40001 => {
            "AppSecret wrong or access_token invalid; check WECHAT_APP_SECRET matches the appid, or it was reset in the admin console."
        }
        40002 => "Invalid grant_type; must be client_credential.",
        40013 => "Invalid appid; WECHAT_APP_ID must be an Official Account appid (starts with 'wx').",
        40014 => "Invalid access_token; the token step must run right before the ticket step.",
        40097 => "Invalid arguments; check the ticket type parameter.",
        40125 => "Invalid appsecret; copy the AppSecret again from the admin console.",
        40164 => {
            "Caller IP not in the API IP whitelist; add it under Settings > Basic Configuration."
        }
        41001 => "access_token missing from the ticket request.",
        41002 => "appid missing; set WECHAT_APP_ID.",
        41004 => "appsecret missing; set WECHAT_APP_SECRET.",
        42001 => "access_token expired; fetch a new one and retry the ticket call.",
        45009 => "Daily API quota reached; wait for the quota to reset or clear it in the admin console.",
        45011 => "API called too frequently; slow down and rerun.",
        48001 => "API unauthorized; the account type lacks permission for this API.",
        50001 | 50002 => "User or account restricted; check the account status in the admin console.",
        61004 => "Caller IP not allowed for third-party platform access.",
        61024 => "Account is managed by a third-party platform; fetch the ticket there instead.",
        89503 => "Call needs admin confirmation for this IP; approve it in the admin console.",
        _ => "Unknown code; refer to official docs and logs for details.",
    }
}

/// Whether rerunning later without any change may succeed
pub fn rerun_may_help(code: i64) -> bool {
    matches!(category_for(code), ErrorCategory::Temporary) || code == 42001
}

/// Build a structured help object for a given errcode.
pub fn lookup(code: i64) -> ErrorHelp {
    let summary = match code {
        -1 => "System busy",
        0 => "Success",
        40001 => "Invalid credential",
        40002 => "Invalid grant_type",
        40013 => "Invalid appid",
        40014 => "Invalid access_token",
        40097 => "Invalid arguments",
        40125 => "Invalid appsecret",
        40164 => "IP not in whitelist",
        41001 => "Missing access_token",
        41002 => "Missing appid",
        41004 => "Missing appsecret",
        42001 => "access_token expired",
        45009 => "Daily quota exceeded",
        45011 => "Frequency limit",
        48001 => "API unauthorized",
        50001 | 50002 => "Account restricted",
        61004 => "IP not allowed",
        61024 => "Managed by third-party platform",
        89503 => "IP needs admin confirmation",
        _ => "Unknown error",
    };

    ErrorHelp {
        code,
        category: category_for(code),
        summary,
        hint: hint_for(code),
        rerun_may_help: rerun_may_help(code),
    }
}

/// Produce a concise, human-readable explanation string.
pub fn explain(errcode: i64, errmsg: &str) -> String {
    let help = lookup(errcode);
    let mut parts = vec![
        format!("errcode={} ({:?})", help.code, help.category),
        help.summary.to_string(),
        format!("hint: {}", help.hint),
    ];

    if help.rerun_may_help {
        parts.push("rerun: may help".to_string());
    } else {
        parts.push("rerun: fix configuration first".to_string());
    }

    if let Some(ip) = whitelist_ip(errmsg) {
        parts.push(format!("caller ip: {ip}"));
    }

    parts.join(" | ")
}

/// Extract the IP from messages like "invalid ip 1.2.3.4 ipv6 ::ffff:1.2.3.4, not in whitelist"
pub fn whitelist_ip(errmsg: &str) -> Option<&str> {
    if !errmsg.contains("not in whitelist") {
        return None;
    }
    let rest = errmsg.split("invalid ip ").nth(1)?;
    rest.split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .filter(|ip| !ip.is_empty())
}
