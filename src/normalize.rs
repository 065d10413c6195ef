// src/normalize.rs
use once_cell::sync::OnceCell;
use url::Url;

use crate::listing::{Listing, RawItem, NO_PRICE, NO_TITLE};

/// Base origin used to resolve relative links coming off scraped pages.
pub const LISTING_ORIGIN: &str = "https://www.yad2.co.il";

/// Collapse whitespace runs and trim. Upstream titles concatenate street and
/// house number and occasionally carry stray newlines from markup.
pub fn clean_text(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Resolve a possibly-relative link against the listing origin. Returns None
/// when the value cannot form a URL at all.
fn absolutize(link: &str) -> Option<String> {
    match Url::parse(link) {
        Ok(u) => Some(u.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(LISTING_ORIGIN).ok()?;
            base.join(link).ok().map(|u| u.to_string())
        }
        Err(_) => None,
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| clean_text(&s)).filter(|s| !s.is_empty())
}

/// Map a raw item to a canonical listing. Returns None for items with no
/// identity signal (neither id nor usable link); such items are skipped, not
/// treated as errors.
pub fn normalize(raw: RawItem) -> Option<Listing> {
    let id = non_empty(raw.id).unwrap_or_default();
    let link = non_empty(raw.link)
        .and_then(|l| absolutize(&l))
        .unwrap_or_default();

    if id.is_empty() && link.is_empty() {
        return None;
    }

    let title = non_empty(raw.title).unwrap_or_else(|| NO_TITLE.to_string());
    let price = non_empty(raw.price).unwrap_or_else(|| NO_PRICE.to_string());

    Some(Listing::new(id, link, title, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_runs() {
        assert_eq!(clean_text("  Rothschild   10 \n"), "Rothschild 10");
    }

    #[test]
    fn missing_fields_get_sentinels() {
        let l = normalize(RawItem {
            id: Some("t1".into()),
            link: Some("https://www.yad2.co.il/realestate/item/t1".into()),
            title: None,
            price: Some("  ".into()),
        })
        .unwrap();
        assert_eq!(l.title, NO_TITLE);
        assert_eq!(l.price, NO_PRICE);
    }

    #[test]
    fn relative_link_is_resolved() {
        let l = normalize(RawItem {
            id: None,
            link: Some("/realestate/item/q9".into()),
            title: Some("Bialik 3".into()),
            price: Some("5600".into()),
        })
        .unwrap();
        assert_eq!(l.link, "https://www.yad2.co.il/realestate/item/q9");
        assert_eq!(l.identity_key(), l.link);
    }

    #[test]
    fn item_without_identity_is_invalid() {
        assert!(normalize(RawItem {
            id: None,
            link: None,
            title: Some("orphan".into()),
            price: Some("1".into()),
        })
        .is_none());
        // whitespace-only fields carry no identity either
        assert!(normalize(RawItem {
            id: Some("  ".into()),
            link: Some("".into()),
            ..Default::default()
        })
        .is_none());
    }

    #[test]
    fn same_link_yields_same_identity() {
        let mk = |price: &str| {
            normalize(RawItem {
                id: None,
                link: Some("/realestate/item/dup".into()),
                title: Some("Allenby 7".into()),
                price: Some(price.into()),
            })
            .unwrap()
        };
        let a = mk("4000");
        let b = mk("4100");
        assert_eq!(a.identity_key(), b.identity_key());
    }
}
