// src/scheduler.rs
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::config::Subscriber;
use crate::pipeline::Pipeline;
use crate::source::SourceDescriptor;

pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Continuous driver: run a cycle, wait out the interval, repeat. A failed
/// cycle (store fault) is logged and retried on the next tick. Shutdown is
/// honored at the wait boundary and between sources inside a cycle.
pub async fn run_forever(
    pipeline: &Pipeline,
    sources: &[SourceDescriptor],
    subscribers: &[Subscriber],
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // A slow cycle should delay the next tick, not burst to catch up.
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                match changed {
                    Ok(()) if *shutdown.borrow() => {
                        info!("scheduler stopping");
                        return;
                    }
                    Ok(()) => continue,
                    // Sender gone without a signal: keep the fixed cadence.
                    Err(_) => {
                        ticker.tick().await;
                    }
                }
            }
        }

        if let Err(e) = pipeline.run_cycle(sources, subscribers, &shutdown).await {
            error!(error = ?e, "cycle aborted, retrying on next tick");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::listing::RawItem;
    use crate::notify::Notifier;
    use crate::source::SourceClient;
    use crate::store::MemoryStore;

    struct NullClient;

    #[async_trait::async_trait]
    impl SourceClient for NullClient {
        async fn fetch(&self, _source: &SourceDescriptor) -> anyhow::Result<Vec<RawItem>> {
            Ok(Vec::new())
        }
    }

    struct NullNotifier;

    #[async_trait::async_trait]
    impl Notifier for NullNotifier {
        async fn deliver(&self, _chat_id: i64, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_the_wait_boundary_on_shutdown() {
        let pipeline = Pipeline::new(
            Arc::new(NullClient),
            Arc::new(MemoryStore::new()),
            Arc::new(NullNotifier),
        );
        let (tx, rx) = watch::channel(false);

        let fut = run_forever(&pipeline, &[], &[], Duration::from_secs(60), rx);
        tokio::pin!(fut);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(300), &mut fut)
            .await
            .expect("scheduler should stop after the shutdown signal");
    }
}
