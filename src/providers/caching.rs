use crate::core::cache::RateCache;
use crate::core::currency::{CurrencyCode, CurrencyRateProvider};
use crate::core::error::FetchError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Serves rates from a [`RateCache`], falling through to `inner` on a miss.
pub struct CachingRateProvider<T: CurrencyRateProvider> {
    inner: T,
    cache: Arc<RateCache>,
}

impl<T: CurrencyRateProvider> CachingRateProvider<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self::with_cache(inner, Arc::new(RateCache::new(ttl)))
    }

    pub fn with_cache(inner: T, cache: Arc<RateCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }
}

#[async_trait]
impl<T: CurrencyRateProvider> CurrencyRateProvider for CachingRateProvider<T> {
    async fn get_rate(&self, code: CurrencyCode) -> Result<f64, FetchError> {
        let entry = self
            .cache
            .get_or_fetch(code, || self.inner.get_rate(code))
            .await?;
        Ok(entry.value)
    }
}
