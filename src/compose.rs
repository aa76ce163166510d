//! Joins quotes and fund-flow records into feed items. All formatting here
//! renders `—` for absent values; a missing number must never take down a
//! user's feed.

use std::collections::HashMap;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::XUEQIU_STOCK_URL;
use crate::types::{Fetch, FeedItem, FundFlow, NorthboundOverview, Quote, UserConfig};

/// One feed item per requested stock, plus degradation paths: a stock with no
/// quote still gets an item, and a run with no quotes at all gets a single
/// heartbeat item so subscribers can see the feed is alive.
pub fn compose_items(
    user: &UserConfig,
    quotes: &Fetch<Vec<Quote>>,
    flows: &HashMap<String, FundFlow>,
    northbound: &Fetch<NorthboundOverview>,
    feed_link: &str,
    now: DateTime<Tz>,
) -> Vec<FeedItem> {
    let northline = northbound_line(northbound);

    let quotes = match quotes.as_data() {
        Some(q) if !q.is_empty() => q,
        _ => return vec![heartbeat_item(northbound, &northline, feed_link, now)],
    };

    let by_code: HashMap<&str, &Quote> = quotes.iter().map(|q| (q.code.as_str(), q)).collect();

    user.stocks
        .iter()
        .map(|code| {
            let quote = by_code.get(code.as_str()).copied();
            stock_item(user, code, quote, flows.get(code), &northline, now)
        })
        .collect()
}

fn stock_item(
    user: &UserConfig,
    code: &str,
    quote: Option<&Quote>,
    flow: Option<&FundFlow>,
    northline: &str,
    now: DateTime<Tz>,
) -> FeedItem {
    let name = match quote {
        Some(q) if !q.name.is_empty() => q.name.clone(),
        _ => code.to_uppercase(),
    };

    let title = match (quote.and_then(|q| q.price), quote.and_then(|q| q.pct_chg)) {
        (Some(price), Some(pct)) => format!("{name} {price:.2}（{pct:+.2}%）"),
        (Some(price), None) => format!("{name} {price:.2}"),
        _ => format!("{name}（行情暂不可用）"),
    };

    let quote_line = match quote {
        Some(q) => format!(
            "<p>最新价：{}　涨跌幅：{}　成交额：{} 亿元　时间：{}</p>",
            fmt_price(q.price),
            fmt_pct(q.pct_chg),
            fmt_yi(q.amount_yi),
            q.time,
        ),
        None => "<p>最新价：—　涨跌幅：—　成交额：— 亿元</p>".to_string(),
    };

    let flow_lines = match flow {
        Some(f) => format!(
            "<p><b>当日净流入（万元）</b><br/>\
             主力 {}（{}） | 超大单 {}（{}） | 大单 {}（{}） | 中单 {}（{}） | 小单 {}（{}）</p>\
             <p>数据时间（资金流）：{}</p>",
            fmt_wan_int(f.main_wan),
            dir_arrow(f.main_wan),
            fmt_wan_int(f.huge_wan),
            dir_arrow(f.huge_wan),
            fmt_wan_int(f.large_wan),
            dir_arrow(f.large_wan),
            fmt_wan_int(f.medium_wan),
            dir_arrow(f.medium_wan),
            fmt_wan_int(f.small_wan),
            dir_arrow(f.small_wan),
            if f.ts.is_empty() { "—" } else { &f.ts },
        ),
        None => "<p>当日净流入（万元）：暂无数据</p>".to_string(),
    };

    let description = format!(
        "<p><b>{name}（{code}）</b></p>{quote_line}{flow_lines}<hr/><p>{northline}</p>"
    );

    FeedItem {
        title,
        link: format!("{XUEQIU_STOCK_URL}{}", code.to_uppercase()),
        description,
        guid: format!("{}-{}-{}", user.user_id, code, now.format("%Y%m%d")),
        pub_date: now,
    }
}

fn heartbeat_item(
    northbound: &Fetch<NorthboundOverview>,
    northline: &str,
    feed_link: &str,
    now: DateTime<Tz>,
) -> FeedItem {
    let total = northbound.as_data().and_then(|nb| nb.total);
    FeedItem {
        title: format!("北向资金心跳 {} 亿元", fmt_yi(total)),
        link: feed_link.to_string(),
        description: format!("<p>个股快照暂不可用，稍后自动重试。</p><p>{northline}</p>"),
        guid: format!("heartbeat-{}", now.format("%Y%m%d%H%M")),
        pub_date: now,
    }
}

/// Shared summary line appended to every item in a user's feed.
pub fn northbound_line(northbound: &Fetch<NorthboundOverview>) -> String {
    match northbound.as_data() {
        Some(nb) if nb.total.is_some() => format!(
            "北向资金（亿元）｜沪股通 {}｜深股通 {}｜合计 {}｜时间 {}",
            fmt_yi(nb.sh),
            fmt_yi(nb.sz),
            fmt_yi(nb.total),
            nb.time,
        ),
        _ => "北向资金：接口暂不可用 / 闭市".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Display formatting
// ---------------------------------------------------------------------------

pub fn fmt_price(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "—".to_string(),
    }
}

/// Percent change with a direction arrow, `↑1.23%` / `↓0.45%`.
pub fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(v) => {
            let arrow = if v >= 0.0 { "↑" } else { "↓" };
            format!("{arrow}{:.2}%", v.abs())
        }
        None => "—".to_string(),
    }
}

/// 亿元 with two decimals.
pub fn fmt_yi(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "—".to_string(),
    }
}

/// 万元 as a signed, thousands-grouped integer, e.g. `-12,345 万`.
pub fn fmt_wan_int(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{} 万", group_thousands(v.round() as i64)),
        None => "—".to_string(),
    }
}

/// Flow direction marker for one bucket.
pub fn dir_arrow(v: Option<f64>) -> &'static str {
    match v {
        Some(v) if v > 0.0 => "↑流入",
        Some(v) if v < 0.0 => "↓流出",
        Some(_) => "—",
        None => "—",
    }
}

fn group_thousands(v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Shanghai;
    use crate::types::Unavailable;

    fn fixed_now() -> DateTime<Tz> {
        Shanghai.with_ymd_and_hms(2026, 8, 4, 10, 30, 0).unwrap()
    }

    fn user() -> UserConfig {
        UserConfig {
            user_id: "alice".into(),
            token: "a1b2c3d4".into(),
            title: "小艾的盯盘".into(),
            stocks: vec!["sh600036".into()],
        }
    }

    fn quote() -> Quote {
        Quote {
            code: "sh600036".into(),
            name: "招商银行".into(),
            price: Some(35.2),
            pct_chg: Some(1.23),
            amount_yi: Some(25.0),
            time: "2026-08-04 10:30:00".into(),
        }
    }

    fn flow() -> FundFlow {
        FundFlow {
            code: "sh600036".into(),
            main_wan: Some(1234.0),
            huge_wan: Some(-500.4),
            large_wan: Some(1734.0),
            medium_wan: Some(0.0),
            small_wan: None,
            ts: "2026-08-04".into(),
        }
    }

    fn northbound() -> Fetch<NorthboundOverview> {
        Fetch::Data(NorthboundOverview {
            sh: Some(12.35),
            sz: Some(-3.2),
            total: Some(9.15),
            time: "2026-08-04 10:30:00".into(),
        })
    }

    #[test]
    fn joins_quote_and_flow_into_one_item() {
        let flows = HashMap::from([("sh600036".to_string(), flow())]);
        let items = compose_items(
            &user(),
            &Fetch::Data(vec![quote()]),
            &flows,
            &northbound(),
            "https://example.com/",
            fixed_now(),
        );

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "招商银行 35.20（+1.23%）");
        assert_eq!(item.link, "https://xueqiu.com/S/SH600036");
        assert_eq!(item.guid, "alice-sh600036-20260804");
        assert!(item.description.contains("最新价：35.20"));
        assert!(item.description.contains("涨跌幅：↑1.23%"));
        assert!(item.description.contains("成交额：25.00 亿元"));
        assert!(item.description.contains("主力 1,234 万（↑流入）"));
        assert!(item.description.contains("超大单 -500 万（↓流出）"));
        assert!(item.description.contains("中单 0 万（—）"));
        assert!(item.description.contains("小单 —（—）"));
        assert!(item.description.contains("北向资金（亿元）｜沪股通 12.35｜深股通 -3.20｜合计 9.15"));
    }

    #[test]
    fn stock_without_quote_still_gets_an_item() {
        let mut u = user();
        u.stocks = vec!["sh600036".into(), "sz000858".into()];
        let items = compose_items(
            &u,
            &Fetch::Data(vec![quote()]),
            &HashMap::new(),
            &northbound(),
            "https://example.com/",
            fixed_now(),
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "SZ000858（行情暂不可用）");
        assert!(items[1].description.contains("当日净流入（万元）：暂无数据"));
    }

    #[test]
    fn title_degrades_without_pct() {
        let mut q = quote();
        q.pct_chg = None;
        let items = compose_items(
            &user(),
            &Fetch::Data(vec![q]),
            &HashMap::new(),
            &northbound(),
            "https://example.com/",
            fixed_now(),
        );
        assert_eq!(items[0].title, "招商银行 35.20");
    }

    #[test]
    fn unavailable_quotes_produce_a_single_heartbeat() {
        let items = compose_items(
            &user(),
            &Fetch::Unavailable(Unavailable::Network),
            &HashMap::new(),
            &northbound(),
            "https://example.com/",
            fixed_now(),
        );

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "北向资金心跳 9.15 亿元");
        assert_eq!(items[0].guid, "heartbeat-202608041030");
        assert_eq!(items[0].link, "https://example.com/");
    }

    #[test]
    fn heartbeat_renders_placeholder_when_northbound_is_down_too() {
        let items = compose_items(
            &user(),
            &Fetch::Unavailable(Unavailable::NoRows),
            &HashMap::new(),
            &Fetch::Unavailable(Unavailable::Network),
            "https://example.com/",
            fixed_now(),
        );

        assert_eq!(items[0].title, "北向资金心跳 — 亿元");
        assert!(items[0].description.contains("北向资金：接口暂不可用 / 闭市"));
    }

    #[test]
    fn northbound_line_treats_missing_total_as_closed() {
        let nb = Fetch::Data(NorthboundOverview {
            sh: Some(1.0),
            sz: None,
            total: None,
            time: "2026-08-04 10:30:00".into(),
        });
        assert_eq!(northbound_line(&nb), "北向资金：接口暂不可用 / 闭市");
    }

    #[test]
    fn formatting_helpers_render_placeholders_for_none() {
        assert_eq!(fmt_price(None), "—");
        assert_eq!(fmt_pct(None), "—");
        assert_eq!(fmt_yi(None), "—");
        assert_eq!(fmt_wan_int(None), "—");
        assert_eq!(dir_arrow(None), "—");
    }

    #[test]
    fn pct_arrow_tracks_sign() {
        assert_eq!(fmt_pct(Some(2.5)), "↑2.50%");
        assert_eq!(fmt_pct(Some(-0.87)), "↓0.87%");
        assert_eq!(fmt_pct(Some(0.0)), "↑0.00%");
    }

    #[test]
    fn wan_grouping_handles_signs_and_magnitudes() {
        assert_eq!(fmt_wan_int(Some(0.0)), "0 万");
        assert_eq!(fmt_wan_int(Some(999.0)), "999 万");
        assert_eq!(fmt_wan_int(Some(1234.4)), "1,234 万");
        assert_eq!(fmt_wan_int(Some(1_234_567.8)), "1,234,568 万");
        assert_eq!(fmt_wan_int(Some(-12_345.0)), "-12,345 万");
    }
}
