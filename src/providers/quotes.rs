use std::collections::HashSet;

use tracing::warn;

use crate::codes::normalize_code;
use crate::types::{Fetch, Quote, Unavailable};

use super::fields::{pick_col, to_float, to_text, Row};
use super::{now_shanghai, ProviderClient};

const CODE_COLS: &[&str] = &["代码", "symbol", "证券代码"];
const NAME_COLS: &[&str] = &["名称", "name", "证券简称"];
const PRICE_COLS: &[&str] = &["最新价", "最新价(元)", "最新", "现价"];
const PCT_COLS: &[&str] = &["涨跌幅", "涨跌幅(%)", "涨跌幅 %", "涨幅"];
const AMOUNT_COLS: &[&str] = &["成交额", "成交额(元)", "成交额(万元)", "成交额(亿元)"];

/// Realtime snapshot for the requested canonical codes.
///
/// The gateway returns the whole market in one call; rows are filtered down
/// to the requested set here. Raw codes are re-normalized first because some
/// gateway versions return them without the exchange prefix.
pub async fn fetch_quotes(client: &ProviderClient, codes: &[String]) -> Fetch<Vec<Quote>> {
    let rows = match client.get_rows("stock_zh_a_spot_em", &[]).await {
        Fetch::Data(rows) => rows,
        Fetch::Unavailable(reason) => {
            warn!(%reason, "quote snapshot unavailable");
            return Fetch::Unavailable(reason);
        }
    };

    let time = now_shanghai().format("%Y-%m-%d %H:%M:%S").to_string();
    quotes_from_rows(&rows, codes, &time)
}

fn quotes_from_rows(rows: &[Row], codes: &[String], time: &str) -> Fetch<Vec<Quote>> {
    let Some(first) = rows.first() else {
        return Fetch::Unavailable(Unavailable::NoRows);
    };

    // Resolve each column once against the first row; the gateway returns
    // uniform columns per dataset.
    let (Some(code_col), Some(name_col), Some(price_col), Some(pct_col), Some(amt_col)) = (
        pick_col(first, CODE_COLS),
        pick_col(first, NAME_COLS),
        pick_col(first, PRICE_COLS),
        pick_col(first, PCT_COLS),
        pick_col(first, AMOUNT_COLS),
    ) else {
        warn!("quote snapshot columns not recognized");
        return Fetch::Unavailable(Unavailable::SchemaDrift);
    };

    let wanted: HashSet<&str> = codes.iter().map(String::as_str).collect();

    let mut quotes = Vec::with_capacity(wanted.len());
    for row in rows {
        let raw_code = match row.get(code_col) {
            Some(serde_json::Value::String(s)) => s.clone(),
            // Some gateway versions emit bare codes as numbers, dropping
            // leading zeros.
            Some(serde_json::Value::Number(n)) => format!("{:06}", n.as_i64().unwrap_or(0)),
            _ => continue,
        };
        let Ok(canonical) = normalize_code(&raw_code) else {
            continue;
        };
        if !wanted.contains(canonical.as_str()) {
            continue;
        }

        let amount_yi = row
            .get(amt_col)
            .and_then(to_float)
            .map(|v| round2(normalize_amount_to_yi(v, amt_col)));

        quotes.push(Quote {
            name: row.get(name_col).map(to_text).unwrap_or_default(),
            price: row.get(price_col).and_then(to_float),
            pct_chg: row.get(pct_col).and_then(to_float),
            amount_yi,
            time: time.to_string(),
            code: canonical,
        });
    }

    if quotes.is_empty() {
        return Fetch::Unavailable(Unavailable::NoRows);
    }
    Fetch::Data(quotes)
}

/// Trade amounts are reported in whichever unit the resolved column name
/// carries: 亿元 as-is, 万元 scaled by 1e4, anything else is 元.
fn normalize_amount_to_yi(v: f64, col_name: &str) -> f64 {
    if col_name.contains("亿元") {
        v
    } else if col_name.contains("万元") {
        v / 1e4
    } else {
        v / 1e8
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows_from(v: serde_json::Value) -> Vec<Row> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    const T: &str = "2026-08-04 10:30:00";

    #[test]
    fn filters_to_requested_codes_and_normalizes_bare_ones() {
        let rows = rows_from(json!([
            {"代码": "600036", "名称": "招商银行", "最新价": 35.20, "涨跌幅": 1.23, "成交额": 2_500_000_000.0},
            {"代码": "000858", "名称": "五粮液", "最新价": 140.5, "涨跌幅": -0.5, "成交额": 1_000_000_000.0},
            {"代码": "601318", "名称": "中国平安", "最新价": 55.0, "涨跌幅": 0.0, "成交额": 3_000_000_000.0}
        ]));
        let out = quotes_from_rows(&rows, &["sh600036".into(), "sz000858".into()], T);
        let quotes = out.as_data().unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].code, "sh600036");
        assert_eq!(quotes[0].name, "招商银行");
        assert_eq!(quotes[0].price, Some(35.20));
        // 元 → 亿元
        assert_eq!(quotes[0].amount_yi, Some(25.0));
        assert_eq!(quotes[1].code, "sz000858");
        assert_eq!(quotes[1].time, T);
    }

    #[test]
    fn accepts_prefixed_codes_and_alias_columns() {
        let rows = rows_from(json!([
            {"symbol": "sh600036", "name": "招商银行", "现价": "35.20", "涨幅": "1.23%", "成交额(万元)": "250,000"}
        ]));
        let out = quotes_from_rows(&rows, &["sh600036".into()], T);
        let quotes = out.as_data().unwrap();
        assert_eq!(quotes[0].price, Some(35.2));
        assert_eq!(quotes[0].pct_chg, Some(1.23));
        // 万元 → 亿元
        assert_eq!(quotes[0].amount_yi, Some(25.0));
    }

    #[test]
    fn numeric_codes_keep_leading_zeros() {
        let rows = rows_from(json!([
            {"代码": 858, "名称": "五粮液", "最新价": 140.5, "涨跌幅": -0.5, "成交额": 1.0}
        ]));
        let out = quotes_from_rows(&rows, &["sz000858".into()], T);
        assert_eq!(out.as_data().unwrap()[0].code, "sz000858");
    }

    #[test]
    fn absent_cells_become_none_not_errors() {
        let rows = rows_from(json!([
            {"代码": "600036", "名称": "招商银行", "最新价": null, "涨跌幅": "--", "成交额": null}
        ]));
        let quotes = quotes_from_rows(&rows, &["sh600036".into()], T).as_data().unwrap();
        assert_eq!(quotes[0].price, None);
        assert_eq!(quotes[0].pct_chg, None);
        assert_eq!(quotes[0].amount_yi, None);
    }

    #[test]
    fn unrecognized_columns_are_schema_drift() {
        let rows = rows_from(json!([{"c": "600036", "n": "x"}]));
        let out = quotes_from_rows(&rows, &["sh600036".into()], T);
        assert_eq!(out, Fetch::Unavailable(Unavailable::SchemaDrift));
    }

    #[test]
    fn no_requested_code_in_snapshot_is_no_rows() {
        let rows = rows_from(json!([
            {"代码": "600000", "名称": "浦发银行", "最新价": 8.0, "涨跌幅": 0.1, "成交额": 1.0}
        ]));
        let out = quotes_from_rows(&rows, &["sh600036".into()], T);
        assert_eq!(out, Fetch::Unavailable(Unavailable::NoRows));
    }

    #[test]
    fn amount_already_in_yi_passes_through() {
        let rows = rows_from(json!([
            {"代码": "600036", "名称": "招商银行", "最新价": 35.2, "涨跌幅": 1.2, "成交额(亿元)": 25.136}
        ]));
        let quotes = quotes_from_rows(&rows, &["sh600036".into()], T).as_data().unwrap();
        assert_eq!(quotes[0].amount_yi, Some(25.14));
    }
}
