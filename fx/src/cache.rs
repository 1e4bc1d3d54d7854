//! Time-bounded rate cache with coalesced refreshes.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use freightquote_common::{constants, Currency, CurrencyPair};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;
use crate::store::RateStore;
use crate::table::RateTable;

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Maximum age before a stored table must be refreshed.
    pub freshness_window: Duration,
    /// Serve a stale factor when a refresh fails ("best effort mode").
    /// Off by default: refresh failures propagate to the caller.
    pub allow_stale_fallback: bool,
    /// Serve factor 1 for a target missing from a fetched table.
    /// Off by default: a missing target is `UnsupportedCurrency`. The
    /// degradation is reported via [`RateSource::DefaultFactor`] when on.
    pub default_factor_for_missing: bool,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: constants::rate_freshness_window(),
            allow_stale_fallback: false,
            default_factor_for_missing: false,
        }
    }
}

/// Where a returned factor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// Base and target are the same currency; no I/O performed.
    Identity,
    /// Served from a fresh stored table.
    CacheHit,
    /// Served from a table fetched during this lookup.
    Refreshed,
    /// Refresh failed; served from an expired table (opt-in).
    StaleFallback,
    /// Target missing from the fetched table; factor 1 served (opt-in).
    DefaultFactor,
}

/// Result of a rate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLookup {
    /// Units of target currency per one unit of base.
    pub factor: Decimal,
    /// Provenance of the factor.
    pub source: RateSource,
}

impl RateLookup {
    fn new(factor: Decimal, source: RateSource) -> Self {
        Self { factor, source }
    }

    /// Whether the factor came from a degraded path.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.source,
            RateSource::StaleFallback | RateSource::DefaultFactor
        )
    }
}

/// Per-base-currency exchange-rate cache.
///
/// Serves stored factors while a table is within the freshness window and
/// refreshes from the provider otherwise. Concurrent lookups for the same
/// base coalesce onto at most one in-flight provider call.
pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    store: Arc<dyn RateStore>,
    refresh_guards: DashMap<String, Arc<Mutex<()>>>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a cache with the default configuration.
    pub fn new(provider: Arc<dyn RateProvider>, store: Arc<dyn RateStore>) -> Self {
        Self::with_config(provider, store, RateCacheConfig::default())
    }

    /// Create a cache with a custom configuration.
    pub fn with_config(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn RateStore>,
        config: RateCacheConfig,
    ) -> Self {
        Self {
            provider,
            store,
            refresh_guards: DashMap::new(),
            config,
        }
    }

    /// Get the conversion factor from `base` to `target`.
    pub async fn get_rate(&self, base: &Currency, target: &Currency) -> FxResult<Decimal> {
        Ok(self.lookup(base, target).await?.factor)
    }

    /// Look up a factor along with its provenance.
    #[instrument(skip(self), fields(base = %base, target = %target))]
    pub async fn lookup(&self, base: &Currency, target: &Currency) -> FxResult<RateLookup> {
        if base == target {
            return Ok(RateLookup::new(Decimal::ONE, RateSource::Identity));
        }

        if let Some(lookup) = self.fresh_factor(base, target).await? {
            debug!("Cache hit");
            return Ok(lookup);
        }

        // Stale, absent, or missing the target: refresh under the per-base
        // guard so concurrent lookups share one provider call.
        let guard = self.refresh_guard(base);
        let _held = guard.lock().await;

        // Another task may have refreshed while we waited on the guard.
        if let Some(lookup) = self.fresh_factor(base, target).await? {
            debug!("Cache hit after coalesced refresh");
            return Ok(lookup);
        }

        match self.refresh_locked(base, &[]).await {
            Ok(table) => match table.factor(target) {
                Some(factor) => Ok(RateLookup::new(factor, RateSource::Refreshed)),
                None => self.missing_target(base, target),
            },
            Err(e) => self.stale_fallback(base, target, e).await,
        }
    }

    /// Force a refresh for `base`, optionally restricted to `symbols`.
    ///
    /// A restricted fetch still overwrites the whole stored table for the
    /// base (last-write-wins); callers needing many targets should request
    /// them together.
    pub async fn refresh(&self, base: &Currency, symbols: &[Currency]) -> FxResult<RateTable> {
        let guard = self.refresh_guard(base);
        let _held = guard.lock().await;
        self.refresh_locked(base, symbols).await
    }

    /// Factor from a fresh stored table, if one covers the target.
    async fn fresh_factor(
        &self,
        base: &Currency,
        target: &Currency,
    ) -> FxResult<Option<RateLookup>> {
        if let Some(table) = self.store.load(base).await? {
            if table.is_fresh(self.config.freshness_window) {
                if let Some(factor) = table.factor(target) {
                    return Ok(Some(RateLookup::new(factor, RateSource::CacheHit)));
                }
            }
        }
        Ok(None)
    }

    /// Fetch and store a new table. Caller must hold the base's guard.
    async fn refresh_locked(&self, base: &Currency, symbols: &[Currency]) -> FxResult<RateTable> {
        let table = self.provider.fetch_table(base, symbols).await?;
        // A table for another base would land under the wrong key, and its
        // factor() would short-circuit to 1 for the wrong currency.
        if table.base != *base {
            return Err(FxError::MalformedPayload {
                provider: self.provider.name().to_string(),
                detail: format!("requested base {} but table is for {}", base, table.base),
            });
        }
        self.store.save(&table).await?;
        info!(
            base = %base,
            targets = table.rates.len(),
            provider = self.provider.name(),
            "Refreshed rate table"
        );
        Ok(table)
    }

    fn missing_target(&self, base: &Currency, target: &Currency) -> FxResult<RateLookup> {
        let pair = CurrencyPair::new(base.clone(), target.clone());
        if self.config.default_factor_for_missing {
            // Known weak policy carried from the original system; callers can
            // detect it via the lookup source.
            warn!(%pair, "Target missing from fetched table, serving factor 1");
            return Ok(RateLookup::new(Decimal::ONE, RateSource::DefaultFactor));
        }
        Err(FxError::UnsupportedCurrency(pair))
    }

    async fn stale_fallback(
        &self,
        base: &Currency,
        target: &Currency,
        refresh_error: FxError,
    ) -> FxResult<RateLookup> {
        if self.config.allow_stale_fallback {
            if let Some(table) = self.store.load(base).await? {
                if let Some(factor) = table.factor(target) {
                    warn!(
                        base = %base,
                        target = %target,
                        error = %refresh_error,
                        "Refresh failed, serving stale rate"
                    );
                    return Ok(RateLookup::new(factor, RateSource::StaleFallback));
                }
            }
        }
        Err(refresh_error)
    }

    fn refresh_guard(&self, base: &Currency) -> Arc<Mutex<()>> {
        self.refresh_guards
            .entry(base.code().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRateProvider;
    use crate::store::{MemoryRateStore, RateStore};
    use freightquote_common::now;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn usd_rates() -> HashMap<Currency, Decimal> {
        let mut rates = HashMap::new();
        rates.insert(Currency::eur(), dec!(0.92));
        rates.insert(Currency::gbp(), dec!(0.79));
        rates
    }

    fn setup() -> (Arc<MockRateProvider>, Arc<MemoryRateStore>, RateCache) {
        setup_with(RateCacheConfig::default())
    }

    fn setup_with(
        config: RateCacheConfig,
    ) -> (Arc<MockRateProvider>, Arc<MemoryRateStore>, RateCache) {
        let provider = Arc::new(MockRateProvider::new("mock"));
        provider.set_table(Currency::usd(), usd_rates());
        let store = Arc::new(MemoryRateStore::new());
        let cache = RateCache::with_config(provider.clone(), store.clone(), config);
        (provider, store, cache)
    }

    #[tokio::test]
    async fn test_identity_lookup_without_io() {
        let (provider, _, cache) = setup();

        let lookup = cache
            .lookup(&Currency::usd(), &Currency::usd())
            .await
            .unwrap();

        assert_eq!(lookup.factor, Decimal::ONE);
        assert_eq!(lookup.source, RateSource::Identity);
        assert_eq!(provider.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_reuse_within_window() {
        let (provider, _, cache) = setup();

        let eur = cache
            .lookup(&Currency::usd(), &Currency::eur())
            .await
            .unwrap();
        let gbp = cache
            .lookup(&Currency::usd(), &Currency::gbp())
            .await
            .unwrap();

        assert_eq!(eur.factor, dec!(0.92));
        assert_eq!(eur.source, RateSource::Refreshed);
        assert_eq!(gbp.factor, dec!(0.79));
        assert_eq!(gbp.source, RateSource::CacheHit);
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_table_triggers_one_replacing_fetch() {
        let (provider, store, cache) = setup();

        let mut old_rates = HashMap::new();
        old_rates.insert(Currency::eur(), dec!(0.80));
        let stale = RateTable::with_fetched_at(
            Currency::usd(),
            now() - Duration::hours(25),
            old_rates,
        );
        store.save(&stale).await.unwrap();

        let lookup = cache
            .lookup(&Currency::usd(), &Currency::eur())
            .await
            .unwrap();

        assert_eq!(lookup.factor, dec!(0.92));
        assert_eq!(lookup.source, RateSource::Refreshed);
        assert_eq!(provider.fetch_count(), 1);

        // Old table replaced wholesale
        let stored = store.load(&Currency::usd()).await.unwrap().unwrap();
        assert_eq!(stored.factor(&Currency::eur()), Some(dec!(0.92)));
    }

    #[tokio::test]
    async fn test_missing_target_is_an_error_by_default() {
        let (_, _, cache) = setup();

        let result = cache.lookup(&Currency::usd(), &Currency::jpy()).await;

        assert!(matches!(result, Err(FxError::UnsupportedCurrency(_))));
    }

    #[tokio::test]
    async fn test_missing_target_default_factor_behind_flag() {
        let (_, _, cache) = setup_with(RateCacheConfig {
            default_factor_for_missing: true,
            ..Default::default()
        });

        let lookup = cache
            .lookup(&Currency::usd(), &Currency::jpy())
            .await
            .unwrap();

        // Weakest policy: factor 1, but visibly flagged
        assert_eq!(lookup.factor, Decimal::ONE);
        assert_eq!(lookup.source, RateSource::DefaultFactor);
        assert!(lookup.is_degraded());
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates_by_default() {
        let (provider, store, cache) = setup();

        let stale = RateTable::with_fetched_at(
            Currency::usd(),
            now() - Duration::hours(25),
            usd_rates(),
        );
        store.save(&stale).await.unwrap();
        provider.set_fail(true);

        let result = cache.lookup(&Currency::usd(), &Currency::eur()).await;

        assert!(matches!(result, Err(FxError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_stale_fallback_with_opt_in() {
        let (provider, store, cache) = setup_with(RateCacheConfig {
            allow_stale_fallback: true,
            ..Default::default()
        });

        let stale = RateTable::with_fetched_at(
            Currency::usd(),
            now() - Duration::hours(25),
            usd_rates(),
        );
        store.save(&stale).await.unwrap();
        provider.set_fail(true);

        let lookup = cache
            .lookup(&Currency::usd(), &Currency::eur())
            .await
            .unwrap();

        assert_eq!(lookup.factor, dec!(0.92));
        assert_eq!(lookup.source, RateSource::StaleFallback);
        assert!(lookup.is_degraded());
    }

    #[tokio::test]
    async fn test_failure_without_usable_cache_propagates_even_with_opt_in() {
        let (provider, _, cache) = setup_with(RateCacheConfig {
            allow_stale_fallback: true,
            ..Default::default()
        });
        provider.set_fail(true);

        let result = cache.lookup(&Currency::usd(), &Currency::eur()).await;

        assert!(matches!(result, Err(FxError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_concurrent_lookups_coalesce_to_one_fetch() {
        let (provider, _, cache) = setup();
        provider.set_delay(std::time::Duration::from_millis(50));

        let cache = Arc::new(cache);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.get_rate(&Currency::usd(), &Currency::eur()).await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), dec!(0.92));
        }
        assert_eq!(provider.fetch_count(), 1);
    }

    /// Provider that echoes a EUR table no matter which base was requested.
    struct WrongBaseProvider;

    #[async_trait::async_trait]
    impl RateProvider for WrongBaseProvider {
        fn name(&self) -> &str {
            "wrong-base"
        }

        async fn fetch_table(
            &self,
            _base: &Currency,
            _symbols: &[Currency],
        ) -> FxResult<RateTable> {
            let mut rates = HashMap::new();
            rates.insert(Currency::usd(), dec!(1.09));
            Ok(RateTable::new(Currency::eur(), rates))
        }
    }

    #[tokio::test]
    async fn test_wrong_base_table_is_rejected_and_not_stored() {
        let store = Arc::new(MemoryRateStore::new());
        let cache = RateCache::new(Arc::new(WrongBaseProvider), store.clone());

        // Must not come back as factor 1 via the echoed base's implicit entry
        let result = cache.lookup(&Currency::usd(), &Currency::eur()).await;
        assert!(matches!(result, Err(FxError::MalformedPayload { .. })));

        assert!(store.load(&Currency::usd()).await.unwrap().is_none());
        assert!(store.load(&Currency::eur()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restricted_refresh_overwrites_whole_table() {
        let (_, store, cache) = setup();

        // Full table first, then a fetch restricted to EUR
        cache.refresh(&Currency::usd(), &[]).await.unwrap();
        cache
            .refresh(&Currency::usd(), &[Currency::eur()])
            .await
            .unwrap();

        // Last write wins: GBP is gone from the stored table
        let stored = store.load(&Currency::usd()).await.unwrap().unwrap();
        assert_eq!(stored.factor(&Currency::eur()), Some(dec!(0.92)));
        assert_eq!(stored.factor(&Currency::gbp()), None);
    }
}
