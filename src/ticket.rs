//! JS-SDK ticket API
//!
//! Exchange an access_token for a short-lived ticket used by client-side code
//! to sign `wx.config`.
//!
//! Endpoint (GET):
//!   https://api.weixin.qq.com/cgi-bin/ticket/getticket?access_token=ACCESS_TOKEN&type=jsapi
//!
//! Successful response example:
//! {
//!   "errcode": 0,
//!   "errmsg": "ok",
//!   "ticket": "bxLdikRXVbTPdHSM05e5u5sUoXNKd8-41ZO3MhKoyN5OfkWITDGgnr2fwJ0m9E8NYzWKVZvdVtaUgWvsdshFKA",
//!   "expires_in": 7200
//! }
//!
//! Usage:
//!   let client = WxClient::new(DEFAULT_API_BASE)?;
//!   let token = client.get_access_token(&appid, &secret).await?;
//!   let ticket = client.get_jsapi_ticket(&token.access_token).await?;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::token::{Result, WxClient, decode_field, echo_body};

/// Ticket kind requested via the `type` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketType {
    /// JS-SDK signature ticket
    #[default]
    Jsapi,
    /// Card API ticket
    WxCard,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Jsapi => "jsapi",
            TicketType::WxCard => "wx_card",
        }
    }
}

/// Successful getticket response
#[derive(Debug, Clone, Deserialize)]
pub struct JsapiTicket {
    pub ticket: String,
    /// Expiration in seconds (not tracked)
    #[serde(default)]
    pub expires_in: u32,
}

impl WxClient {
    /// Fetch a jsapi ticket
    pub async fn get_jsapi_ticket(&self, access_token: &str) -> Result<JsapiTicket> {
        self.get_ticket(access_token, TicketType::Jsapi).await
    }

    /// Call cgi-bin/ticket/getticket.
    ///
    /// - access_token: Official Account access_token
    /// - kind: ticket type (`jsapi` or `wx_card`)
    #[instrument(level = "debug", skip(self, access_token))]
    pub async fn get_ticket(&self, access_token: &str, kind: TicketType) -> Result<JsapiTicket> {
        let mut url = self.endpoint("/cgi-bin/ticket/getticket")?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("access_token", access_token);
            qp.append_pair("type", kind.as_str());
        }

        let (status, bytes) = self.get_bytes(url).await?;
        info!(
            status = status.as_u16(),
            body = %echo_body(&bytes),
            "getticket response"
        );

        decode_field(status, &bytes, "ticket")
    }
}
