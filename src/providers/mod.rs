//! Adapters for the AkShare-compatible market-data gateway.
//!
//! Each adapter owns one endpoint, absorbs its failures into
//! [`Fetch::Unavailable`](crate::types::Fetch), and resolves column names
//! against an ordered alias list so that gateway/AkShare version drift does
//! not break the pipeline.

pub mod fields;
mod fund_flow;
mod northbound;
mod quotes;

pub use fund_flow::fetch_fund_flow;
pub use northbound::fetch_northbound;
pub use quotes::fetch_quotes;

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::{Asia::Shanghai, Tz};
use tracing::{debug, warn};

use crate::config::{Config, FETCH_ATTEMPTS, HTTP_TIMEOUT_SECS, RETRY_BACKOFF_MS};
use crate::error::Result;
use crate::types::{Fetch, Unavailable};
use fields::Row;

/// Current wall-clock time in the exchange's timezone. Feed timestamps and
/// fetch-time stamps all use Asia/Shanghai.
pub fn now_shanghai() -> DateTime<Tz> {
    Utc::now().with_timezone(&Shanghai)
}

/// Handle to the market-data gateway, constructed once at startup and passed
/// to every adapter call. Holds the HTTP client and the optional access
/// credential read from `DATA_GATEWAY_TOKEN` at construction.
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ProviderClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)")
            .build()?;

        let token = std::env::var("DATA_GATEWAY_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self {
            http,
            base_url: cfg.gateway_api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Fetch one gateway dataset as a list of row objects.
    ///
    /// Up to [`FETCH_ATTEMPTS`] tries with a fixed backoff on transport errors
    /// and non-2xx statuses. A body that decodes but is not an array of
    /// objects is schema drift, not a transient failure, so it is not retried.
    pub async fn get_rows(&self, endpoint: &str, params: &[(&str, &str)]) -> Fetch<Vec<Row>> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut body = None;
        for attempt in 1..=FETCH_ATTEMPTS {
            let mut req = self.http.get(&url).query(params);
            if let Some(token) = &self.token {
                req = req.query(&[("token", token.as_str())]);
            }

            match req.send().await {
                Ok(resp) if resp.status().is_success() => match resp.text().await {
                    Ok(text) => {
                        body = Some(text);
                        break;
                    }
                    Err(e) => warn!(endpoint, attempt, "gateway body read failed: {e}"),
                },
                Ok(resp) => warn!(endpoint, attempt, "gateway returned HTTP {}", resp.status()),
                Err(e) => warn!(endpoint, attempt, "gateway request failed: {e}"),
            }

            if attempt < FETCH_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS)).await;
            }
        }

        let Some(body) = body else {
            return Fetch::Unavailable(Unavailable::Network);
        };

        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                warn!(endpoint, "gateway body is not JSON: {e}");
                return Fetch::Unavailable(Unavailable::SchemaDrift);
            }
        };

        let Some(arr) = value.as_array() else {
            warn!(endpoint, "gateway response is not an array");
            return Fetch::Unavailable(Unavailable::SchemaDrift);
        };
        if arr.is_empty() {
            return Fetch::Unavailable(Unavailable::NoRows);
        }

        let rows: Vec<Row> = arr.iter().filter_map(|v| v.as_object().cloned()).collect();
        if rows.is_empty() {
            warn!(endpoint, "gateway array holds no objects");
            return Fetch::Unavailable(Unavailable::SchemaDrift);
        }

        debug!(endpoint, rows = rows.len(), "gateway dataset fetched");
        Fetch::Data(rows)
    }
}
