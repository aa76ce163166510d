use serde_json::{Map, Value};

/// One gateway response row: a JSON object keyed by the upstream column names.
pub type Row = Map<String, Value>;

/// First candidate column present in the row wins. The candidate order encodes
/// provider-version precedence, so it must be checked exactly as listed.
pub fn pick_col<'a>(row: &Row, candidates: &'a [&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|c| row.contains_key(*c))
}

/// `pick_col` + value lookup in one step.
pub fn pick_value<'a>(row: &'a Row, candidates: &[&str]) -> Option<&'a Value> {
    pick_col(row, candidates).and_then(|c| row.get(c))
}

/// Tolerant scalar cleaning. Gateway columns flip between JSON numbers and
/// strings across versions; strings may carry thousands separators and a
/// trailing percent sign.
pub fn to_float(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim().replace(',', "");
            let s = s.strip_suffix('%').unwrap_or(&s);
            s.parse().ok()
        }
        _ => None,
    }
}

/// Render a cell as display text (timestamps and names arrive as either
/// strings or numbers depending on gateway version).
pub fn to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn first_matching_candidate_wins() {
        let r = row(json!({"涨跌幅": 1.0, "涨幅": 2.0}));
        assert_eq!(pick_col(&r, &["涨跌幅", "涨跌幅(%)", "涨幅"]), Some("涨跌幅"));
        // Even when a later candidate is also present, ordering decides.
        assert_eq!(pick_col(&r, &["涨跌幅(%)", "涨幅", "涨跌幅"]), Some("涨幅"));
    }

    #[test]
    fn no_candidate_present_is_none() {
        let r = row(json!({"something": 1}));
        assert_eq!(pick_col(&r, &["代码", "symbol"]), None);
        assert!(pick_value(&r, &["代码", "symbol"]).is_none());
    }

    #[test]
    fn to_float_accepts_numbers_and_cleaned_strings() {
        assert_eq!(to_float(&json!(12.5)), Some(12.5));
        assert_eq!(to_float(&json!(-3)), Some(-3.0));
        assert_eq!(to_float(&json!("1,234.56")), Some(1234.56));
        assert_eq!(to_float(&json!(" 2.35% ")), Some(2.35));
        assert_eq!(to_float(&json!("-0.87%")), Some(-0.87));
    }

    #[test]
    fn to_float_rejects_non_numeric() {
        assert_eq!(to_float(&json!("--")), None);
        assert_eq!(to_float(&json!("")), None);
        assert_eq!(to_float(&json!(null)), None);
        assert_eq!(to_float(&json!([1, 2])), None);
    }

    #[test]
    fn to_text_handles_strings_and_numbers() {
        assert_eq!(to_text(&json!(" 2025-06-03 ")), "2025-06-03");
        assert_eq!(to_text(&json!(20250603)), "20250603");
        assert_eq!(to_text(&json!(null)), "");
    }
}
