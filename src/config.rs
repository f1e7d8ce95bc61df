// =============================================================================
// 共通設定・定数モジュール
// =============================================================================
// 環境変数（と任意の.envファイル）からアプリケーション設定を読み込む
// ドメインの挙動に影響するのは上流APIのベースURLのみ
// =============================================================================

use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// 上流APIベースURLの環境変数名
pub const ENV_API_BASE: &str = "INVIDIOUS_API_BASE";
/// 待ち受けアドレスの環境変数名
pub const ENV_BIND_ADDR: &str = "PROXY_BIND_ADDR";
/// 上流タイムアウト（秒）の環境変数名
pub const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";

/// 上流APIのデフォルトベースURL
pub const DEFAULT_API_BASE: &str = "https://inv.perditum.com/api/v1";

/// デフォルトの待ち受けアドレス
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// HTTPリクエストのデフォルトタイムアウト（秒）
///
/// 上流APIがハングした場合でも、1リクエストがこれ以上待たされないようにする。
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// HTTPリクエストのデフォルトタイムアウト（Duration）
pub fn http_timeout() -> Duration {
    Duration::from_secs(HTTP_TIMEOUT_SECS)
}

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an http(s) URL, got: {value}")]
    InvalidApiBase { var: &'static str, value: String },

    #[error("{var} must be a socket address like 127.0.0.1:5000, got: {value}")]
    InvalidBindAddr { var: &'static str, value: String },

    #[error("{var} must be a positive integer, got: {value}")]
    InvalidTimeout { var: &'static str, value: String },
}

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// 上流APIのベースURL（末尾スラッシュなし）
    pub api_base: String,
    /// HTTPサーバーの待ち受けアドレス
    pub bind_addr: SocketAddr,
    /// 上流1リクエストあたりのタイムアウト
    pub http_timeout: Duration,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// カレントディレクトリに`.env`があれば先に読み込む（既存の環境変数が優先）
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::info!("Loaded environment from {}", path.display());
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を組み立てる（未設定・空はデフォルト）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base = match get(ENV_API_BASE) {
            Some(value) => parse_api_base(value.trim())?,
            None => DEFAULT_API_BASE.to_string(),
        };

        let bind_addr_raw = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr {
                var: ENV_BIND_ADDR,
                value: bind_addr_raw.clone(),
            })?;

        let http_timeout = match get(ENV_HTTP_TIMEOUT) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: ENV_HTTP_TIMEOUT,
                        value,
                    })
                }
            },
            None => http_timeout(),
        };

        Ok(Self {
            api_base,
            bind_addr,
            http_timeout,
        })
    }
}

fn parse_api_base(value: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidApiBase {
        var: ENV_API_BASE,
        value: value.to_string(),
    };

    let url = Url::parse(value).map_err(|_| invalid())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid());
    }

    Ok(value.trim_end_matches('/').to_string())
}
