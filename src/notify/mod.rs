// src/notify/mod.rs
pub mod telegram;

use anyhow::Result;

use crate::listing::Listing;

/// Delivery contract. Errors are per-recipient: the pipeline logs them and
/// keeps going; retry policy lives inside the implementation.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Message body announced for a newly discovered listing.
pub fn format_message(listing: &Listing) -> String {
    format!(
        "New listing on Yad2:\n\nTitle: {}\nPrice: {}\nLink: {}",
        listing.title, listing.price, listing.link
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_all_fields() {
        let l = Listing::new(
            "1".into(),
            "https://www.yad2.co.il/realestate/item/1".into(),
            "Flat A".into(),
            "3000".into(),
        );
        let msg = format_message(&l);
        assert!(msg.contains("Title: Flat A"));
        assert!(msg.contains("Price: 3000"));
        assert!(msg.contains("Link: https://www.yad2.co.il/realestate/item/1"));
    }
}
