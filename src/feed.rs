use chrono::DateTime;
use chrono_tz::Tz;
use rss::{ChannelBuilder, Guid, Item, ItemBuilder};

use crate::config::{Config, FEED_DESCRIPTION};
use crate::error::Result;
use crate::types::{FeedItem, UserConfig};

/// Render one user's feed as a pretty-printed RSS 2.0 document.
///
/// The clock is a parameter, so output is deterministic for fixed inputs.
/// A snapshot item keyed by the current minute is appended on every render;
/// its guid changes each cycle so feed readers register an update even when
/// the underlying values did not move.
pub fn render_feed(
    user: &UserConfig,
    cfg: &Config,
    items: &[FeedItem],
    northline: &str,
    now: DateTime<Tz>,
) -> Result<String> {
    let mut rss_items: Vec<Item> = items.iter().map(to_item).collect();
    rss_items.push(snapshot_item(user, &cfg.feed_link, northline, now));

    let channel = ChannelBuilder::default()
        .title(user.title.clone())
        .link(cfg.feed_link.clone())
        .description(FEED_DESCRIPTION.to_string())
        .language(Some("zh-cn".to_string()))
        .last_build_date(Some(now.to_rfc2822()))
        .ttl(Some(cfg.feed_ttl_minutes.to_string()))
        .items(rss_items)
        .build();

    let buf = channel.pretty_write_to(Vec::new(), b' ', 2)?;
    Ok(String::from_utf8(buf)?)
}

fn to_item(item: &FeedItem) -> Item {
    ItemBuilder::default()
        .title(Some(item.title.clone()))
        .link(Some(item.link.clone()))
        .guid(Some(feed_guid(&item.guid)))
        .pub_date(Some(item.pub_date.to_rfc2822()))
        .description(Some(item.description.clone()))
        .build()
}

fn snapshot_item(user: &UserConfig, feed_link: &str, northline: &str, now: DateTime<Tz>) -> Item {
    let description = format!(
        "<ul>\n  <li>更新时间：{}</li>\n  <li>{}</li>\n  <li>覆盖股票数：{}</li>\n</ul>",
        now.format("%Y-%m-%d %H:%M:%S"),
        northline,
        user.stocks.len(),
    );

    ItemBuilder::default()
        .title(Some(format!("{} 实时快照 @ {}", user.title, now.format("%Y-%m-%d %H:%M"))))
        .link(Some(feed_link.to_string()))
        .guid(Some(feed_guid(&format!(
            "{}-snapshot-{}",
            user.user_id,
            now.format("%Y%m%d%H%M")
        ))))
        .pub_date(Some(now.to_rfc2822()))
        .description(Some(description))
        .build()
}

fn feed_guid(value: &str) -> Guid {
    let mut guid = Guid::default();
    guid.set_value(value);
    guid.set_permalink(false);
    guid
}
