// src/source/marker.rs
//! Current-generation map API: one JSON document with a `data.markers` array,
//! one marker per listing, keyed by an opaque `token`.

use anyhow::{Context, Result};
use metrics::counter;
use serde::Deserialize;

use crate::listing::RawItem;
use crate::normalize::LISTING_ORIGIN;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    data: ApiData,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    #[serde(default)]
    markers: Vec<Marker>,
}

#[derive(Debug, Deserialize)]
struct Marker {
    token: String,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    price: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    street: Option<TextField>,
    #[serde(default)]
    house: Option<House>,
}

#[derive(Debug, Deserialize)]
struct TextField {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct House {
    #[serde(default)]
    number: Option<i64>,
}

/// Parse a marker API response body into raw items. Duplicate tokens within
/// one response are collapsed, first occurrence wins; the store-level claim
/// still guards across responses.
pub fn parse_response(body: &str) -> Result<Vec<RawItem>> {
    let rsp: ApiResponse = serde_json::from_str(body).context("parsing marker api json")?;

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(rsp.data.markers.len());
    for m in rsp.data.markers {
        if m.token.is_empty() || !seen.insert(m.token.clone()) {
            continue;
        }

        let street = m
            .address
            .as_ref()
            .and_then(|a| a.street.as_ref())
            .map(|s| s.text.as_str())
            .unwrap_or_default();
        let house = m
            .address
            .as_ref()
            .and_then(|a| a.house.as_ref())
            .and_then(|h| h.number)
            .map(|n| n.to_string())
            .unwrap_or_default();
        let title = format!("{street} {house}").trim().to_string();

        out.push(RawItem {
            link: Some(format!("{LISTING_ORIGIN}/realestate/item/{}", m.token)),
            id: Some(m.token),
            title: (!title.is_empty()).then_some(title),
            price: m.price.map(|p| p.to_string()),
        });
    }

    counter!("watcher_items_parsed_total", "variant" => "marker-api").increment(out.len() as u64);
    Ok(out)
}
