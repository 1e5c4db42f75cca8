use super::currency::CurrencyCode;
use super::error::FetchError;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// A rate obtained from one successful upstream fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RateEntry {
    pub code: CurrencyCode,
    pub value: f64,
    pub fetched_at: DateTime<Utc>,
    // Expiry is measured on the monotonic clock; `fetched_at` is for display
    fetched: Instant,
}

impl RateEntry {
    pub fn new(code: CurrencyCode, value: f64) -> Self {
        Self {
            code,
            value,
            fetched_at: Utc::now(),
            fetched: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched.elapsed() < ttl
    }
}

#[derive(Default)]
struct SlotState {
    entry: Option<RateEntry>,
    last_error: Option<FetchError>,
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    /// Completed fetch attempts, successful or not.
    attempts: AtomicU64,
}

/// Rate cache with one slot per currency, each expiring independently.
///
/// Every slot sits behind its own async mutex. [`RateCache::get_or_fetch`]
/// holds it across the upstream call, so concurrent misses for a code share
/// a single fetch while other codes stay unblocked. Callers that queued
/// behind a fetch get its outcome, error included, instead of starting
/// another one.
pub struct RateCache {
    slots: [Slot; CurrencyCode::ALL.len()],
    ttl: Duration,
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::default()),
            ttl,
        }
    }

    /// Returns the entry for `code` if it has not expired.
    pub async fn get(&self, code: CurrencyCode) -> Option<RateEntry> {
        let state = self.slots[code.index()].state.lock().await;
        state.entry.as_ref().filter(|e| e.is_fresh(self.ttl)).cloned()
    }

    /// Returns the stored entry for `code`, stale or not.
    pub async fn peek(&self, code: CurrencyCode) -> Option<RateEntry> {
        self.slots[code.index()].state.lock().await.entry.clone()
    }

    #[cfg(test)]
    async fn put(&self, entry: RateEntry) {
        let mut state = self.slots[entry.code.index()].state.lock().await;
        state.entry = Some(entry);
    }

    /// Returns the fresh entry for `code`, calling `fetch` on a miss.
    ///
    /// A failed fetch leaves the stored entry untouched.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        code: CurrencyCode,
        fetch: F,
    ) -> Result<RateEntry, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<f64, FetchError>>,
    {
        let slot = &self.slots[code.index()];
        let seen = slot.attempts.load(Ordering::Acquire);

        let mut state = slot.state.lock().await;
        if let Some(entry) = state.entry.as_ref() {
            if entry.is_fresh(self.ttl) {
                debug!("Cache HIT for currency rate: {}", code);
                return Ok(entry.clone());
            }
            debug!("Cache entry expired for currency rate: {}", code);
        } else {
            debug!("Cache MISS for currency rate: {}", code);
        }

        // A fetch finished while we waited for the lock and it failed
        if slot.attempts.load(Ordering::Acquire) != seen {
            if let Some(err) = state.last_error.clone() {
                debug!("Sharing failed fetch for currency rate: {}", code);
                return Err(err);
            }
        }

        let result = fetch().await;
        slot.attempts.fetch_add(1, Ordering::AcqRel);
        match result {
            Ok(value) => {
                let entry = RateEntry::new(code, value);
                state.entry = Some(entry.clone());
                state.last_error = None;
                Ok(entry)
            }
            Err(err) => {
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}
