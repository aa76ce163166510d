use tracing::warn;

use crate::codes::{bare_code, market_of};
use crate::types::{Fetch, FundFlow, Unavailable};

use super::fields::{pick_col, pick_value, to_float, to_text, Row};
use super::ProviderClient;

// Newer gateway versions report the buckets as `…-净额` columns denominated
// in 元; older ones use the bare names, already in 万元.
const MAIN_COLS: &[&str] = &["主力净流入-净额", "主力净流入"];
const HUGE_COLS: &[&str] = &["超大单净流入-净额", "超大单净流入"];
const LARGE_COLS: &[&str] = &["大单净流入-净额", "大单净流入"];
const MEDIUM_COLS: &[&str] = &["中单净流入-净额", "中单净流入"];
const SMALL_COLS: &[&str] = &["小单净流入-净额", "小单净流入"];
const TS_COLS: &[&str] = &["时间", "日期"];

/// Per-stock daily net fund flow. The endpoint returns the session history
/// oldest-first; the last row is the latest session.
pub async fn fetch_fund_flow(client: &ProviderClient, code: &str) -> Fetch<FundFlow> {
    let params = [("stock", bare_code(code)), ("market", market_of(code))];
    let rows = match client.get_rows("stock_individual_fund_flow", &params).await {
        Fetch::Data(rows) => rows,
        Fetch::Unavailable(reason) => {
            warn!(code, %reason, "fund flow unavailable");
            return Fetch::Unavailable(reason);
        }
    };

    fund_flow_from_rows(&rows, code)
}

fn fund_flow_from_rows(rows: &[Row], code: &str) -> Fetch<FundFlow> {
    let Some(last) = rows.last() else {
        return Fetch::Unavailable(Unavailable::NoRows);
    };

    let buckets = [MAIN_COLS, HUGE_COLS, LARGE_COLS, MEDIUM_COLS, SMALL_COLS];
    if buckets.iter().all(|cands| pick_col(last, cands).is_none()) {
        warn!(code, "fund flow columns not recognized");
        return Fetch::Unavailable(Unavailable::SchemaDrift);
    }

    Fetch::Data(FundFlow {
        code: code.to_string(),
        main_wan: bucket_wan(last, MAIN_COLS),
        huge_wan: bucket_wan(last, HUGE_COLS),
        large_wan: bucket_wan(last, LARGE_COLS),
        medium_wan: bucket_wan(last, MEDIUM_COLS),
        small_wan: bucket_wan(last, SMALL_COLS),
        ts: pick_value(last, TS_COLS).map(to_text).unwrap_or_default(),
    })
}

/// Resolve one bucket and normalize it to 万元: `…-净额` columns are 元.
fn bucket_wan(row: &Row, candidates: &[&str]) -> Option<f64> {
    let col = pick_col(row, candidates)?;
    let v = row.get(col).and_then(to_float)?;
    if col.ends_with("-净额") {
        Some(v / 1e4)
    } else {
        Some(v)
    }
}
