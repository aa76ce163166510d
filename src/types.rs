use chrono::DateTime;
use chrono_tz::Tz;

// ---------------------------------------------------------------------------
// Adapter result: distinguishes "no data" from "malformed response"
// ---------------------------------------------------------------------------

/// What a provider adapter hands back. Adapters never abort the run: any
/// failure is absorbed into `Unavailable` and the composer falls back to
/// placeholder output.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Data(T),
    Unavailable(Unavailable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// Transport failure after all retry attempts.
    Network,
    /// Response decoded but none of the known column aliases matched.
    SchemaDrift,
    /// Well-formed response with nothing in it.
    NoRows,
}

impl<T> Fetch<T> {
    pub fn as_data(&self) -> Option<&T> {
        match self {
            Fetch::Data(v) => Some(v),
            Fetch::Unavailable(_) => None,
        }
    }
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Unavailable::Network => "network",
            Unavailable::SchemaDrift => "schema_drift",
            Unavailable::NoRows => "no_rows",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Market data value objects: rebuilt on every fetch cycle, never persisted
// ---------------------------------------------------------------------------

/// Realtime snapshot of one stock. Amount is normalized to 亿元.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Canonical exchange-prefixed code, e.g. "sh600036".
    pub code: String,
    pub name: String,
    pub price: Option<f64>,
    pub pct_chg: Option<f64>,
    /// Trade amount in 亿元.
    pub amount_yi: Option<f64>,
    /// Fetch time, Asia/Shanghai local, "%Y-%m-%d %H:%M:%S".
    pub time: String,
}

/// Per-stock daily net fund flow, all buckets in 万元, positive = inflow.
#[derive(Debug, Clone, PartialEq)]
pub struct FundFlow {
    pub code: String,
    pub main_wan: Option<f64>,
    pub huge_wan: Option<f64>,
    pub large_wan: Option<f64>,
    pub medium_wan: Option<f64>,
    pub small_wan: Option<f64>,
    /// Timestamp of the source row, as reported by the provider.
    pub ts: String,
}

/// Northbound (沪股通/深股通) net inflow for the current session, in 亿元.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NorthboundOverview {
    pub sh: Option<f64>,
    pub sz: Option<f64>,
    pub total: Option<f64>,
    pub time: String,
}

/// One subscriber, loaded from a YAML file and validated. Never mutated by
/// the pipeline; `stocks` holds canonical codes only.
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfig {
    pub user_id: String,
    pub token: String,
    pub title: String,
    pub stocks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Feed items: built per run, discarded after rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// HTML body.
    pub description: String,
    pub guid: String,
    pub pub_date: DateTime<Tz>,
}
