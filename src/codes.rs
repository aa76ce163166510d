use crate::error::{AppError, Result};

/// Map a raw stock identifier to canonical exchange-prefixed form.
///
/// Already-prefixed codes ("sh600036", "SZ000858") pass through lowercased.
/// Bare 6-digit codes get their exchange from the leading digit: 6xxxxx is
/// Shanghai, everything else Shenzhen. Anything else is rejected.
pub fn normalize_code(raw: &str) -> Result<String> {
    let c = raw.trim().to_ascii_lowercase();

    if let Some(rest) = c.strip_prefix("sh").or_else(|| c.strip_prefix("sz")) {
        if is_bare_code(rest) {
            return Ok(c);
        }
        return Err(AppError::InvalidCode(raw.to_string()));
    }

    if is_bare_code(&c) {
        let prefix = if c.starts_with('6') { "sh" } else { "sz" };
        return Ok(format!("{prefix}{c}"));
    }

    Err(AppError::InvalidCode(raw.to_string()))
}

fn is_bare_code(s: &str) -> bool {
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit())
}

/// The 6-digit part of a canonical code ("sh600036" → "600036").
pub fn bare_code(canonical: &str) -> &str {
    &canonical[2..]
}

/// The exchange prefix of a canonical code ("sh600036" → "sh").
pub fn market_of(canonical: &str) -> &str {
    &canonical[..2]
}
