#![doc = r#"
wxticket-rs

Refreshes the WeChat JS-SDK `jsapi_ticket` that a static share script embeds.

A run is three steps, each depending on the previous one:
- token: exchange appid + appsecret for an access_token
- ticket: exchange the access_token for a jsapi_ticket
- patch: rewrite `var jsapi_ticket = '...';` in the share script

Quick usage:

```ignore
use wxticket_rs::{Config, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new("your_appid", "your_appsecret")
        .with_asset_path("static/js-helper/wx-share.js");
    let report = app::run(&config).await?;
    println!("ticket: {}, patched: {}", report.ticket, report.outcome.matched());
    Ok(())
}
```
"#]

pub mod app;
pub mod config;
pub mod errors;
pub mod patch;
pub mod signature;
pub mod ticket;
pub mod token;

pub use app::{AppError, RunReport};
pub use config::{Config, ConfigError};
pub use patch::{AssetPatcher, PatchError, PatchOutcome, patch_ticket_in_file};
pub use signature::{SignaturePackage, jsapi_signature};
pub use ticket::{JsapiTicket, TicketType};
pub use token::*;
