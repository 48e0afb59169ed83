//! Per-domain request pacing
//!
//! The limiter keeps one slot per domain holding the time of the last
//! dispatched request. A caller locks its domain's slot, sleeps until the
//! minimum spacing has elapsed, records the dispatch time and releases the
//! slot. Callers for the same domain are therefore serialized; callers for
//! different domains never touch the same slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

type DomainSlot = Arc<tokio::sync::Mutex<Option<Instant>>>;

/// Shared rate limiter keyed by domain
///
/// Construct one per process (or per test) and share it through an `Arc`;
/// state persists across crawl runs for as long as the instance lives.
#[derive(Debug, Default)]
pub struct DomainRateLimiter {
    slots: Mutex<HashMap<String, DomainSlot>>,
}

impl DomainRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, domain: &str) -> DomainSlot {
        // A poisoned map only means another task panicked while inserting;
        // the map itself is still consistent.
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry(domain.to_lowercase())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    /// Waits until at least `min_delay` has passed since the last request to
    /// `domain`, then records now as that domain's last dispatch
    ///
    /// Returns immediately for a domain with no recorded request. The
    /// returned instant is the dispatch time that was recorded.
    pub async fn wait_for_domain(&self, domain: &str, min_delay: Duration) -> Instant {
        let slot = self.slot(domain);
        let mut last_dispatch = slot.lock().await;

        if let Some(last) = *last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < min_delay {
                let wait = min_delay - elapsed;
                tracing::trace!(domain = %domain, wait_ms = wait.as_millis() as u64, "Pacing request");
                tokio::time::sleep(wait).await;
            }
        }

        let now = Instant::now();
        *last_dispatch = Some(now);
        now
    }

    /// Time of the last dispatched request to `domain`, if any
    pub async fn last_dispatch(&self, domain: &str) -> Option<Instant> {
        let slot = self.slot(domain);
        let last = *slot.lock().await;
        last
    }

    /// Number of domains seen so far
    pub fn tracked_domains(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}
