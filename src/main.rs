mod codes;
mod compose;
mod config;
mod error;
mod feed;
mod providers;
mod types;
mod users;

use std::collections::HashMap;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::compose::{compose_items, northbound_line};
use crate::config::Config;
use crate::error::Result;
use crate::feed::render_feed;
use crate::providers::{
    fetch_fund_flow, fetch_northbound, fetch_quotes, now_shanghai, ProviderClient,
};
use crate::types::{Fetch, FundFlow, NorthboundOverview, Unavailable, UserConfig};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let client = ProviderClient::new(&cfg)?;
    std::fs::create_dir_all(&cfg.output_dir)?;

    let users = users::load_users(&cfg.users_dir)?;
    if users.is_empty() {
        warn!("no valid user configs under {}", cfg.users_dir.display());
        return Ok(());
    }
    info!("loaded {} user config(s) from {}", users.len(), cfg.users_dir.display());

    // One overview per run; the same summary line is shared by every feed.
    let northbound = fetch_northbound(&client).await;

    let mut generated = 0usize;
    for user in &users {
        match build_feed_for_user(&cfg, &client, user, &northbound).await {
            Ok(path) => {
                info!(user = %user.user_id, "feed written to {path}");
                generated += 1;
            }
            Err(e) => error!(user = %user.user_id, "feed generation failed: {e}"),
        }
    }

    info!("done: {generated}/{} feeds generated", users.len());
    Ok(())
}

/// The whole pipeline for one subscriber. Provider failures degrade to
/// placeholder output inside the adapters; only rendering and IO errors
/// surface here, and they fail this user's feed alone.
async fn build_feed_for_user(
    cfg: &Config,
    client: &ProviderClient,
    user: &UserConfig,
    northbound: &Fetch<NorthboundOverview>,
) -> Result<String> {
    let quotes = if user.stocks.is_empty() {
        Fetch::Unavailable(Unavailable::NoRows)
    } else {
        fetch_quotes(client, &user.stocks).await
    };

    let mut flows: HashMap<String, FundFlow> = HashMap::new();
    for code in &user.stocks {
        if let Fetch::Data(ff) = fetch_fund_flow(client, code).await {
            flows.insert(code.clone(), ff);
        }
    }

    let now = now_shanghai();
    let items = compose_items(user, &quotes, &flows, northbound, &cfg.feed_link, now);
    let xml = render_feed(user, cfg, &items, &northbound_line(northbound), now)?;

    let path = cfg.output_dir.join(format!("{}-{}.xml", user.user_id, user.token));
    std::fs::write(&path, xml)?;
    Ok(path.display().to_string())
}
