// Rust guideline compliant 2026-08-27

//! Points-to-miles conversion graph -- resolves a rate between a reward
//! currency and a target miles currency, deriving cross-rates through a
//! designated base currency when no direct edge exists.
//!
//! Entry points: [`ConversionGraph::convert`], [`RateCache::new`].
//! Configuration via [`GraphConfig::builder`].
//!
//! Edges are directional: a reverse rate is never assumed. A missing path
//! yields a null [`Conversion`] (`miles = None`), which callers must treat
//! as "unrankable", never as an error. The cache is an explicit, passed-in
//! object with a TTL -- no module-level rate singletons.

use domain::{Conversion, ConversionRate, RateStore};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// GraphError
// ---------------------------------------------------------------------------

/// Errors raised while configuring a [`ConversionGraph`].
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The supplied configuration is invalid.
    #[error("invalid conversion graph configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// GraphConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`ConversionGraph`].
///
/// Construct via [`GraphConfig::builder`].
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Reference currency used to derive cross-rates when no direct edge
    /// exists (mirrors fiat cross-rate derivation from a base currency).
    pub base_currency: String,
}

/// Builder for [`GraphConfig`].
///
/// Obtain via [`GraphConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct GraphConfigBuilder {
    base_currency: String,
}

impl GraphConfig {
    /// Create a builder. `base_currency` is the only required parameter.
    #[must_use]
    pub fn builder(base_currency: impl Into<String>) -> GraphConfigBuilder {
        GraphConfigBuilder { base_currency: base_currency.into() }
    }
}

impl GraphConfigBuilder {
    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] when `base_currency` is empty.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<GraphConfig, GraphError> {
        if self.base_currency.trim().is_empty() {
            return Err(GraphError::InvalidConfig {
                reason: "base_currency must be non-empty".to_owned(),
            });
        }
        Ok(GraphConfig { base_currency: self.base_currency })
    }
}

// ---------------------------------------------------------------------------
// RateCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    rates: Vec<ConversionRate>,
    fetched_at: Instant,
}

/// Explicit TTL cache over a [`RateStore`], keyed by source currency.
///
/// Rates are near-static, so a fresh entry is served without touching the
/// store. On a store failure an expired entry is served stale with a `warn`
/// log -- a transient rate outage should not turn every conversion null.
///
/// Safe on `current_thread` runtimes: the `RefCell` borrow is always dropped
/// before the store read awaits.
#[derive(Debug)]
pub struct RateCache {
    ttl: Duration,
    entries: RefCell<HashMap<String, CacheEntry>>,
}

impl RateCache {
    /// Create an empty cache whose entries stay fresh for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RefCell::new(HashMap::new()) }
    }

    /// Outgoing edges for `source`, from cache or store.
    ///
    /// Degrades on store failure: serves a stale entry when one exists,
    /// otherwise returns no edges. Never errors.
    pub async fn rates_for<R: RateStore>(&self, store: &R, source: &str) -> Vec<ConversionRate> {
        let key = source.to_lowercase();
        // Scope the borrow so it is dropped before the store read awaits.
        {
            let entries = self.entries.borrow();
            if let Some(entry) = entries.get(&key)
                && entry.fetched_at.elapsed() < self.ttl
            {
                return entry.rates.clone();
            }
        }

        match store.list_rates(source).await {
            Ok(rates) => {
                self.entries
                    .borrow_mut()
                    .insert(key, CacheEntry { rates: rates.clone(), fetched_at: Instant::now() });
                rates
            }
            Err(e) => {
                let stale = self.entries.borrow().get(&key).map(|entry| entry.rates.clone());
                match stale {
                    Some(rates) => {
                        tracing::warn!("rate_cache: store read failed, serving stale rates for {source}: {e}");
                        rates
                    }
                    None => {
                        tracing::warn!("rate_cache: store read failed, no rates for {source}: {e}");
                        vec![]
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConversionGraph
// ---------------------------------------------------------------------------

/// Resolves conversion rates between reward and miles currencies.
#[derive(Debug, Clone)]
pub struct ConversionGraph {
    config: GraphConfig,
}

impl ConversionGraph {
    /// Create a new graph from `config`.
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Convert `points` from `source` into `target` miles.
    ///
    /// Resolution order: same-currency identity, direct edge, cross-rate via
    /// the configured base currency. No path yields `Conversion::default()`
    /// (`miles = None`), never an error.
    pub async fn convert<R: RateStore>(
        &self,
        store: &R,
        cache: &RateCache,
        points: f64,
        source: &str,
        target: &str,
    ) -> Conversion {
        let Some(rate) = self.resolve_rate(store, cache, source, target).await else {
            tracing::debug!("conversion: no path from {source} to {target}");
            return Conversion::default();
        };
        Conversion { miles: Some(points * rate), rate: Some(rate) }
    }

    /// Effective rate from `source` to `target`, if any path exists.
    async fn resolve_rate<R: RateStore>(
        &self,
        store: &R,
        cache: &RateCache,
        source: &str,
        target: &str,
    ) -> Option<f64> {
        if source.eq_ignore_ascii_case(target) {
            return Some(1.0);
        }

        let outgoing = cache.rates_for(store, source).await;
        if let Some(direct) = pick_edge(&outgoing, target) {
            return Some(direct.rate);
        }

        // Cross-rate through the base currency: source -> base -> target.
        let base = self.config.base_currency.as_str();
        if source.eq_ignore_ascii_case(base) || target.eq_ignore_ascii_case(base) {
            return None;
        }
        let to_base = pick_edge(&outgoing, base)?;
        let from_base = cache.rates_for(store, base).await;
        let onward = pick_edge(&from_base, target)?;
        tracing::debug!(
            "conversion: derived cross-rate {source}->{base}->{target} = {}",
            to_base.rate * onward.rate
        );
        Some(to_base.rate * onward.rate)
    }
}

/// The usable edge to `target`: finite positive rate, most recently updated
/// among duplicates.
fn pick_edge<'a>(rates: &'a [ConversionRate], target: &str) -> Option<&'a ConversionRate> {
    rates
        .iter()
        .filter(|r| r.target.eq_ignore_ascii_case(target) && r.rate.is_finite() && r.rate > 0.0)
        .max_by_key(|r| r.updated_at)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::StoreError;
    use std::cell::Cell;

    const EPS: f64 = 1e-9;

    fn edge(source: &str, target: &str, rate: f64) -> ConversionRate {
        ConversionRate {
            source: source.to_owned(),
            target: target.to_owned(),
            rate,
            updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
        }
    }

    struct MockRateStore {
        edges: Vec<ConversionRate>,
        calls: Cell<u32>,
        fail: bool,
    }

    impl MockRateStore {
        fn new(edges: Vec<ConversionRate>) -> Self {
            Self { edges, calls: Cell::new(0), fail: false }
        }

        fn failing() -> Self {
            Self { edges: vec![], calls: Cell::new(0), fail: true }
        }
    }

    impl RateStore for MockRateStore {
        async fn list_rates(&self, source: &str) -> Result<Vec<ConversionRate>, StoreError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(StoreError::Unavailable { reason: "mock outage".to_owned() });
            }
            Ok(self
                .edges
                .iter()
                .filter(|e| e.source.eq_ignore_ascii_case(source))
                .cloned()
                .collect())
        }
    }

    fn make_graph() -> ConversionGraph {
        ConversionGraph::new(GraphConfig::builder("krisflyer").build().unwrap())
    }

    fn fresh_cache() -> RateCache {
        RateCache::new(Duration::from_secs(300))
    }

    // ------------------------------------------------------------------
    // Config builder
    // ------------------------------------------------------------------

    #[test]
    fn config_rejects_empty_base_currency() {
        let result = GraphConfig::builder("  ").build();
        assert!(matches!(result, Err(GraphError::InvalidConfig { .. })));
    }

    // ------------------------------------------------------------------
    // Rate resolution
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn direct_edge_lookup() {
        let store = MockRateStore::new(vec![edge("citi-points", "krisflyer", 0.4)]);
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 1000.0, "citi-points", "krisflyer").await;
        assert!((result.miles.unwrap() - 400.0).abs() < EPS);
        assert!((result.rate.unwrap() - 0.4).abs() < EPS);
    }

    #[tokio::test]
    async fn same_currency_is_identity_without_store_read() {
        let store = MockRateStore::new(vec![]);
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 250.0, "krisflyer", "KRISFLYER").await;
        assert!((result.miles.unwrap() - 250.0).abs() < EPS);
        assert_eq!(store.calls.get(), 0);
    }

    #[tokio::test]
    async fn cross_rate_via_base_currency() {
        // dbs-points -> krisflyer (base) -> asia-miles.
        let store = MockRateStore::new(vec![
            edge("dbs-points", "krisflyer", 0.5),
            edge("krisflyer", "asia-miles", 0.8),
        ]);
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 1000.0, "dbs-points", "asia-miles").await;
        assert!((result.rate.unwrap() - 0.4).abs() < EPS);
        assert!((result.miles.unwrap() - 400.0).abs() < EPS);
    }

    #[tokio::test]
    async fn no_path_returns_null_conversion() {
        let store = MockRateStore::new(vec![edge("citi-points", "krisflyer", 0.4)]);
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 1000.0, "uob-points", "asia-miles").await;
        assert_eq!(result, Conversion::default());
    }

    #[tokio::test]
    async fn reverse_edge_is_never_assumed() {
        let store = MockRateStore::new(vec![edge("citi-points", "krisflyer", 0.4)]);
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 100.0, "krisflyer", "citi-points").await;
        assert!(result.miles.is_none());
    }

    #[tokio::test]
    async fn round_trip_when_both_edges_exist() {
        let store = MockRateStore::new(vec![
            edge("citi-points", "krisflyer", 0.4),
            edge("krisflyer", "citi-points", 2.5),
        ]);
        let graph = make_graph();
        let cache = fresh_cache();
        let there = graph.convert(&store, &cache, 1000.0, "citi-points", "krisflyer").await;
        let back = graph
            .convert(&store, &cache, there.miles.unwrap(), "krisflyer", "citi-points")
            .await;
        assert!((back.miles.unwrap() - 1000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn zero_or_negative_rates_are_unusable() {
        let store = MockRateStore::new(vec![edge("citi-points", "krisflyer", 0.0)]);
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 100.0, "citi-points", "krisflyer").await;
        assert!(result.miles.is_none());
    }

    #[tokio::test]
    async fn duplicate_edges_resolve_to_most_recent() {
        let mut old = edge("citi-points", "krisflyer", 0.3);
        old.updated_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let store = MockRateStore::new(vec![old, edge("citi-points", "krisflyer", 0.4)]);
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 100.0, "citi-points", "krisflyer").await;
        assert!((result.rate.unwrap() - 0.4).abs() < EPS);
    }

    // ------------------------------------------------------------------
    // Cache behavior
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn fresh_entry_skips_store() {
        let store = MockRateStore::new(vec![edge("citi-points", "krisflyer", 0.4)]);
        let graph = make_graph();
        let cache = fresh_cache();
        graph.convert(&store, &cache, 100.0, "citi-points", "krisflyer").await;
        graph.convert(&store, &cache, 100.0, "citi-points", "krisflyer").await;
        assert_eq!(store.calls.get(), 1, "second convert must be served from cache");
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let store = MockRateStore::new(vec![edge("citi-points", "krisflyer", 0.4)]);
        let graph = make_graph();
        let cache = RateCache::new(Duration::ZERO);
        graph.convert(&store, &cache, 100.0, "citi-points", "krisflyer").await;
        graph.convert(&store, &cache, 100.0, "citi-points", "krisflyer").await;
        assert_eq!(store.calls.get(), 2);
    }

    #[tokio::test]
    async fn store_failure_serves_stale_entry() {
        let good = MockRateStore::new(vec![edge("citi-points", "krisflyer", 0.4)]);
        let cache = RateCache::new(Duration::ZERO); // immediately stale
        let graph = make_graph();
        graph.convert(&good, &cache, 100.0, "citi-points", "krisflyer").await;

        let bad = MockRateStore::failing();
        let result = graph.convert(&bad, &cache, 100.0, "citi-points", "krisflyer").await;
        assert!((result.miles.unwrap() - 40.0).abs() < EPS, "stale rates must still convert");
    }

    #[tokio::test]
    async fn store_failure_cold_cache_degrades_to_null() {
        let store = MockRateStore::failing();
        let graph = make_graph();
        let result = graph.convert(&store, &fresh_cache(), 100.0, "citi-points", "krisflyer").await;
        assert!(result.miles.is_none());
    }
}
