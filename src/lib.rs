// src/lib.rs
// Public library surface for integration tests (and the binary).

pub mod config;
pub mod listing;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::{Config, Subscriber};
pub use crate::listing::{Listing, RawItem, NO_PRICE, NO_TITLE};
pub use crate::notify::Notifier;
pub use crate::pipeline::{CycleReport, Pipeline};
pub use crate::source::{SourceClient, SourceDescriptor};
pub use crate::store::ListingStore;
