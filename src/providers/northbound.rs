use tracing::warn;

use crate::types::{Fetch, NorthboundOverview, Unavailable};

use super::fields::{to_float, to_text, Row};
use super::{now_shanghai, ProviderClient};

const SH_COLS: &[&str] = &[
    "沪股通-净流入",
    "沪股通净流入",
    "当日资金净流入-沪股通",
    "沪股通-当日资金净流入",
];
const SZ_COLS: &[&str] = &[
    "深股通-净流入",
    "深股通净流入",
    "当日资金净流入-深股通",
    "深股通-当日资金净流入",
];
const TOTAL_COLS: &[&str] = &[
    "北向资金-净流入",
    "北向资金净流入",
    "当日资金净流入-北向",
    "北向资金-当日资金净流入",
];

/// Northbound net inflow for the current session, in 亿元.
pub async fn fetch_northbound(client: &ProviderClient) -> Fetch<NorthboundOverview> {
    let rows = match client.get_rows("stock_hsgt_fund_flow_summary_em", &[]).await {
        Fetch::Data(rows) => rows,
        Fetch::Unavailable(reason) => {
            warn!(%reason, "northbound overview unavailable");
            return Fetch::Unavailable(reason);
        }
    };

    let time = now_shanghai().format("%Y-%m-%d %H:%M:%S").to_string();
    northbound_from_rows(&rows, &time)
}

fn northbound_from_rows(rows: &[Row], time: &str) -> Fetch<NorthboundOverview> {
    let Some(row) = latest_row(rows) else {
        return Fetch::Unavailable(Unavailable::NoRows);
    };

    let overview = NorthboundOverview {
        sh: pick_flow(row, SH_COLS),
        sz: pick_flow(row, SZ_COLS),
        total: pick_flow(row, TOTAL_COLS),
        time: time.to_string(),
    };

    if overview.sh.is_none() && overview.sz.is_none() && overview.total.is_none() {
        warn!("northbound columns not recognized");
        return Fetch::Unavailable(Unavailable::SchemaDrift);
    }
    Fetch::Data(overview)
}

/// Most recent row: max of the `日期` column when present (the dataset is
/// reported as ISO dates, so string order is date order), else the first row.
fn latest_row(rows: &[Row]) -> Option<&Row> {
    if rows.iter().any(|r| r.contains_key("日期")) {
        rows.iter()
            .max_by_key(|r| r.get("日期").map(to_text).unwrap_or_default())
    } else {
        rows.first()
    }
}

/// First candidate that is present in the row AND cleans to a number wins;
/// a present-but-empty column falls through to the next alias.
fn pick_flow(row: &Row, candidates: &[&str]) -> Option<f64> {
    candidates
        .iter()
        .find_map(|c| row.get(*c).and_then(to_float))
        .map(|v| (v * 100.0).round() / 100.0)
}
