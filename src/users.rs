use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::codes::normalize_code;
use crate::error::{AppError, Result};
use crate::types::UserConfig;

static USER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").unwrap());
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{6,32}$").unwrap());

/// Raw YAML shape before validation. Stock entries may be bare numbers
/// (`600036`) or strings (`sz000858`).
#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    stocks: Vec<StockEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StockEntry {
    Num(u64),
    Str(String),
}

impl StockEntry {
    fn as_raw(&self) -> String {
        match self {
            // Bare numeric codes lose their leading zeros in YAML.
            StockEntry::Num(n) => format!("{n:06}"),
            StockEntry::Str(s) => s.clone(),
        }
    }
}

/// Load every valid user config under `dir`, sorted by filename.
///
/// An unreadable directory is a process-level error; a bad individual file is
/// logged and skipped so the rest of the batch proceeds.
pub fn load_users(dir: &Path) -> Result<Vec<UserConfig>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    paths.sort();

    let mut users = Vec::new();
    for path in paths {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?").to_string();

        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %name, "unreadable, skipping: {e}");
                continue;
            }
        };

        // Stale HTML error pages occasionally end up saved in place of
        // configs; the leading '<' gives them away.
        if text.starts_with('<') {
            warn!(file = %name, "looks like HTML, skipping");
            continue;
        }

        match parse_user(&text) {
            Ok(user) => users.push(user),
            Err(e) => warn!(file = %name, "invalid user config, skipping: {e}"),
        }
    }
    Ok(users)
}

fn parse_user(text: &str) -> Result<UserConfig> {
    let raw: RawUser = serde_yaml::from_str(text)?;
    validate(raw)
}

fn validate(raw: RawUser) -> Result<UserConfig> {
    let user_id = raw.user_id.trim().to_string();
    let token = raw.token.trim().to_string();

    if !USER_RE.is_match(&user_id) {
        return Err(AppError::InvalidUser(format!("bad user_id {user_id:?}")));
    }
    if !TOKEN_RE.is_match(&token) {
        return Err(AppError::InvalidUser(format!(
            "{user_id}: token must be 6-32 letters or digits"
        )));
    }

    let title = match raw.title.trim() {
        "" => format!("{user_id} 的盯盘"),
        t => t.to_string(),
    };

    let stocks = raw
        .stocks
        .iter()
        .map(|s| normalize_code(&s.as_raw()))
        .collect::<Result<Vec<_>>>()?;

    Ok(UserConfig { user_id, token, title, stocks })
}
