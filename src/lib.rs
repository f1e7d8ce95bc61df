pub mod aggregator;
pub mod config;
pub mod invidious;
pub mod report;
mod server;
pub mod util; // doctestのためpubにする

use std::sync::Arc;

use config::AppConfig;
use invidious::InvidiousClient;
use server::HttpState;

/// ロガーを初期化（RUST_LOG未設定時はinfo）
fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// 設定を読み込み、上流クライアントを作成してHTTPサーバーを起動
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let config = AppConfig::from_env()?;
    log::info!(
        "Upstream API: {} (timeout: {}s)",
        config.api_base,
        config.http_timeout.as_secs()
    );

    let client = InvidiousClient::new(&config.api_base, config.http_timeout)?;
    let state = HttpState {
        client: Arc::new(client),
    };

    server::start_http_server(config.bind_addr, state).await
}
