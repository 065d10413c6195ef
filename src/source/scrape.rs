// src/source/scrape.rs
//! Server-rendered search page. Selector set is fixed to the known card
//! layout; scraped cards have no stable id, so the link is the identity
//! signal downstream.

use metrics::counter;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::listing::RawItem;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("#__next ul li").unwrap());
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".item-data-content_heading__tphH4").unwrap());
static PRICE: Lazy<Selector> = Lazy::new(|| Selector::parse("span.price_price__xQt90").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Extract raw items from a search results page. A page that matches no
/// cards yields an empty batch, not an error; markup drift shows up as a
/// quiet source, which the cycle report makes visible.
pub fn parse_page(html: &str) -> Vec<RawItem> {
    let doc = Html::parse_document(html);

    let mut out = Vec::new();
    for card in doc.select(&CARD) {
        let title = card
            .select(&TITLE)
            .next()
            .map(|n| n.text().collect::<String>());
        let price = card
            .select(&PRICE)
            .next()
            .map(|n| n.text().collect::<String>());
        let link = card
            .select(&LINK)
            .next()
            .and_then(|n| n.value().attr("href"))
            .map(str::to_string);

        if title.is_none() && price.is_none() && link.is_none() {
            continue; // spacer / ad card
        }
        out.push(RawItem {
            id: None,
            link,
            title,
            price,
        });
    }

    counter!("watcher_items_parsed_total", "variant" => "html-scrape").increment(out.len() as u64);
    out
}
