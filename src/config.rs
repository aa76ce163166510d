use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const GATEWAY_API_URL: &str = "http://127.0.0.1:8080/api/public";
pub const FEED_LINK: &str = "https://stockrss.example.com/";

/// Channel-level description shown by feed readers under the user's title.
pub const FEED_DESCRIPTION: &str = "北向资金 / 主力-大中小单净流入 / 实时涨跌 订阅";

/// Default refresh hint for feed readers (minutes).
pub const FEED_TTL_MINUTES: u32 = 5;

/// Per-stock item links point at the Xueqiu quote page.
pub const XUEQIU_STOCK_URL: &str = "https://xueqiu.com/S/";

/// Attempts per gateway call before the adapter reports Unavailable.
pub const FETCH_ATTEMPTS: u32 = 3;

/// Fixed backoff between attempts (milliseconds).
pub const RETRY_BACKOFF_MS: u64 = 1200;

/// Per-request HTTP timeout (seconds). Gateway dataset calls can be slow.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the AkShare-compatible gateway (GATEWAY_API_URL)
    pub gateway_api_url: String,
    /// Directory of per-user YAML configs (USERS_DIR)
    pub users_dir: PathBuf,
    /// Directory the rendered feeds are written to (OUTPUT_DIR)
    pub output_dir: PathBuf,
    /// Channel link embedded in every feed (FEED_LINK)
    pub feed_link: String,
    /// Refresh hint written into every channel, minutes (FEED_TTL_MINUTES)
    pub feed_ttl_minutes: u32,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            gateway_api_url: std::env::var("GATEWAY_API_URL")
                .unwrap_or_else(|_| GATEWAY_API_URL.to_string()),
            users_dir: std::env::var("USERS_DIR")
                .unwrap_or_else(|_| "configs/users".to_string())
                .into(),
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "public/feeds".to_string())
                .into(),
            feed_link: std::env::var("FEED_LINK").unwrap_or_else(|_| FEED_LINK.to_string()),
            feed_ttl_minutes: std::env::var("FEED_TTL_MINUTES")
                .unwrap_or_else(|_| FEED_TTL_MINUTES.to_string())
                .parse::<u32>()
                .map_err(|_| {
                    AppError::Config("FEED_TTL_MINUTES must be a number of minutes".to_string())
                })?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
