use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wxticket_rs::{PatchOutcome, app};

// 运行方式：
//   cargo run --bin wxticket
//
// 环境变量（也可写入 .env）：
// - WECHAT_APP_ID, WECHAT_APP_SECRET（必填）
// - WECHAT_SHARE_JS（默认 static/js-helper/wx-share.js）
// - WECHAT_SHARE_URL（可选，用新 ticket 为该页面计算签名）
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    info!("开始获取微信 jsapi_ticket...");

    let result = app::run_from_env().await;
    match &result {
        Ok(report) => match report.outcome {
            PatchOutcome::NoMatch => warn!(
                "jsapi_ticket 已获取，但 {} 中未找到要替换的行，文件未更新",
                report.asset_path.display()
            ),
            _ => info!("jsapi_ticket 更新完成!"),
        },
        Err(e) => {
            error!("[ERR] {e}");
            if let Some(help) = e.explain() {
                error!("{help}");
            }
        }
    }

    ExitCode::from(app::exit_status(&result))
}
