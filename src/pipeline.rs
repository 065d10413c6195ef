// src/pipeline.rs
//! One polling cycle: sources → normalize → claim → fan out. Source and
//! delivery faults degrade into report counts; only a store fault aborts the
//! cycle, since at-most-once cannot be guaranteed without the store.

use std::sync::Arc;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Subscriber;
use crate::listing::Listing;
use crate::normalize::normalize;
use crate::notify::{format_message, Notifier};
use crate::source::{SourceClient, SourceDescriptor};
use crate::store::ListingStore;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watcher_items_parsed_total", "Raw items parsed per source variant.");
        describe_counter!("watcher_new_listings_total", "Listings newly claimed in the store.");
        describe_counter!("watcher_source_errors_total", "Source fetch/parse errors.");
        describe_counter!(
            "watcher_notify_failures_total",
            "Per-subscriber delivery failures."
        );
        describe_gauge!("watcher_last_cycle_ts", "Unix ts when a cycle last finished.");
    });
}

/// Aggregated counts for one cycle; the caller decides what to do with them
/// (log line, exit code).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sources_visited: usize,
    pub sources_failed: usize,
    pub items_fetched: usize,
    /// Items with no identity signal, dropped by the normalizer.
    pub items_skipped: usize,
    pub listings_normalized: usize,
    pub new_listings: usize,
    /// Newly claimed listings withheld from fan-out because of sentinel fields.
    pub suppressed: usize,
    pub notifications_attempted: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

pub struct Pipeline {
    client: Arc<dyn SourceClient>,
    store: Arc<dyn ListingStore>,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn SourceClient>,
        store: Arc<dyn ListingStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            client,
            store,
            notifier,
        }
    }

    /// Visit every source once. Cancellation is cooperative: the current
    /// source finishes, remaining sources are skipped.
    pub async fn run_cycle(
        &self,
        sources: &[SourceDescriptor],
        subscribers: &[Subscriber],
        shutdown: &watch::Receiver<bool>,
    ) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for source in sources {
            if *shutdown.borrow() {
                info!(visited = report.sources_visited, "cycle cancelled between sources");
                break;
            }

            report.sources_visited += 1;
            let raw = match self.client.fetch(source).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = ?e, kind = source.kind(), url = %source.display_url(),
                          "source fetch failed, skipping for this cycle");
                    counter!("watcher_source_errors_total").increment(1);
                    report.sources_failed += 1;
                    continue;
                }
            };
            report.items_fetched += raw.len();

            for item in raw {
                let Some(listing) = normalize(item) else {
                    report.items_skipped += 1;
                    continue;
                };
                report.listings_normalized += 1;

                // Store fault escalates: without the claim there is no
                // at-most-once guarantee, so the rest of the cycle is unsafe.
                if !self.store.try_claim(&listing).await? {
                    debug!(key = listing.identity_key(), "already seen");
                    continue;
                }
                report.new_listings += 1;
                counter!("watcher_new_listings_total").increment(1);

                if !listing.notifiable() {
                    debug!(key = listing.identity_key(), "claimed but suppressed (sentinel fields)");
                    report.suppressed += 1;
                    continue;
                }

                let (sent, failed) = self.fan_out(&listing, subscribers).await;
                report.notifications_attempted += subscribers.len();
                report.notifications_sent += sent;
                report.notifications_failed += failed;
            }
        }

        gauge!("watcher_last_cycle_ts").set(chrono::Utc::now().timestamp() as f64);
        info!(
            sources = report.sources_visited,
            failed_sources = report.sources_failed,
            fetched = report.items_fetched,
            new = report.new_listings,
            sent = report.notifications_sent,
            notify_failed = report.notifications_failed,
            "cycle finished"
        );
        Ok(report)
    }

    /// Deliver one listing to all subscribers concurrently. Returns
    /// (sent, failed); a failure for one recipient never blocks the others.
    async fn fan_out(&self, listing: &Listing, subscribers: &[Subscriber]) -> (usize, usize) {
        let text = format_message(listing);

        let mut set = JoinSet::new();
        for sub in subscribers {
            let notifier = Arc::clone(&self.notifier);
            let text = text.clone();
            let chat_id = sub.id;
            let name = sub.display_name();
            set.spawn(async move {
                match notifier.deliver(chat_id, &text).await {
                    Ok(()) => {
                        debug!(chat_id, subscriber = %name, "notification delivered");
                        true
                    }
                    Err(e) => {
                        warn!(error = ?e, chat_id, subscriber = %name, "notification failed");
                        counter!("watcher_notify_failures_total").increment(1);
                        false
                    }
                }
            });
        }

        let mut sent = 0;
        let mut failed = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(true) => sent += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    warn!(error = ?e, "notification task panicked");
                    failed += 1;
                }
            }
        }
        (sent, failed)
    }
}
