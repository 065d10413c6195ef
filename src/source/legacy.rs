// src/source/legacy.rs
//! Previous-generation feed API: `data.feed.feed_items`, numeric ids, split
//! title fields, links derived from a token path.

use anyhow::{Context, Result};
use metrics::counter;
use serde::Deserialize;

use crate::listing::RawItem;
use crate::normalize::LISTING_ORIGIN;

#[derive(Debug, Deserialize)]
struct FeedResponse {
    data: FeedData,
}

#[derive(Debug, Deserialize)]
struct FeedData {
    feed: Feed,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    feed_items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title_1: Option<String>,
    #[serde(default)]
    title_2: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    link_token: Option<String>,
}

pub fn parse_response(body: &str) -> Result<Vec<RawItem>> {
    let rsp: FeedResponse = serde_json::from_str(body).context("parsing legacy feed json")?;

    let mut out = Vec::with_capacity(rsp.data.feed.feed_items.len());
    for it in rsp.data.feed.feed_items {
        let title = match (it.title_1.as_deref(), it.title_2.as_deref()) {
            (Some(a), Some(b)) => Some(format!("{a} {b}")),
            (Some(a), None) => Some(a.to_string()),
            (None, Some(b)) => Some(b.to_string()),
            (None, None) => None,
        };
        let link = it
            .link_token
            .map(|t| format!("{LISTING_ORIGIN}/item/{t}"));

        out.push(RawItem {
            id: it.id,
            link,
            title,
            price: it.price,
        });
    }

    counter!("watcher_items_parsed_total", "variant" => "legacy-feed").increment(out.len() as u64);
    Ok(out)
}
