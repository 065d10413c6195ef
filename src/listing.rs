// src/listing.rs
use chrono::{DateTime, Utc};

/// Placeholder when a title could not be extracted from the upstream item.
pub const NO_TITLE: &str = "No title";
/// Placeholder when a price could not be extracted from the upstream item.
pub const NO_PRICE: &str = "No price";

/// Transport-shaped item as produced by a source adapter. Every field is
/// optional; the normalizer decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub id: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub price: Option<String>,
}

/// Canonical listing record. Timestamps are owned by the store and are only
/// populated on rows read back from it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Listing {
    pub id: String,
    pub link: String,
    pub title: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    pub fn new(id: String, link: String, title: String, price: String) -> Self {
        Self {
            id,
            link,
            title,
            price,
            created_at: None,
            updated_at: None,
        }
    }

    /// Deduplication key: the upstream id when present, otherwise the link.
    pub fn identity_key(&self) -> &str {
        if self.id.is_empty() {
            &self.link
        } else {
            &self.id
        }
    }

    /// A listing carrying a sentinel field came from a low-confidence
    /// extraction; it may be recorded but must never be announced.
    pub fn notifiable(&self) -> bool {
        self.title != NO_TITLE && self.price != NO_PRICE
    }
}
