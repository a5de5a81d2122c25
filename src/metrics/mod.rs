//! Prometheus metrics for the search pipeline and favorites coordinator.
//!
//! All metrics live in a crate-local registry so embedding applications can
//! expose them next to their own.
//!
//! # Example
//! ```no_run
//! use listing_search::metrics;
//!
//! metrics::init_metrics().ok();
//! println!("{}", metrics::gather_metrics());
//! ```

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "listing_search";

lazy_static! {
    /// Registry holding every metric below
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Result cache
    // ============================================================================

    /// Page lookups answered from the result cache
    pub static ref CACHE_HITS_TOTAL: Counter = Counter::with_opts(
        Opts::new("result_cache_hits_total", "Result cache hits").namespace(NAMESPACE)
    ).expect("Failed to create CACHE_HITS_TOTAL metric");

    /// Page lookups that needed a remote fetch
    pub static ref CACHE_MISSES_TOTAL: Counter = Counter::with_opts(
        Opts::new("result_cache_misses_total", "Result cache misses").namespace(NAMESPACE)
    ).expect("Failed to create CACHE_MISSES_TOTAL metric");

    // ============================================================================
    // Remote listing API
    // ============================================================================

    /// Remote fetches
    ///
    /// Labels: kind (search, filter, favorites, toggle), outcome (success, error)
    pub static ref REMOTE_FETCHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("remote_fetches_total", "Remote listing API calls").namespace(NAMESPACE),
        &["kind", "outcome"]
    ).expect("Failed to create REMOTE_FETCHES_TOTAL metric");

    /// Remote fetch latency in seconds
    ///
    /// Labels: kind
    pub static ref REMOTE_FETCH_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("remote_fetch_duration_seconds", "Remote listing API latency")
            .namespace(NAMESPACE)
            .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["kind"]
    ).expect("Failed to create REMOTE_FETCH_DURATION_SECONDS metric");

    /// Responses dropped because a newer request superseded them
    pub static ref STALE_RESPONSES_TOTAL: Counter = Counter::with_opts(
        Opts::new("stale_responses_total", "Superseded responses discarded").namespace(NAMESPACE)
    ).expect("Failed to create STALE_RESPONSES_TOTAL metric");

    // ============================================================================
    // Filter synchronisation
    // ============================================================================

    /// URL rewrites actually performed after debouncing
    pub static ref URL_WRITES_TOTAL: Counter = Counter::with_opts(
        Opts::new("url_writes_total", "Debounced URL rewrites").namespace(NAMESPACE)
    ).expect("Failed to create URL_WRITES_TOTAL metric");

    // ============================================================================
    // Favorites
    // ============================================================================

    /// Favorite toggles by terminal state
    ///
    /// Labels: outcome (confirmed, reconciled, rolled_back)
    pub static ref FAVORITE_TOGGLES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("favorite_toggles_total", "Favorite toggles by outcome").namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create FAVORITE_TOGGLES_TOTAL metric");
}

/// Register every metric with [`PROMETHEUS_REGISTRY`].
///
/// Fails with `AlreadyReg` when called twice.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(CACHE_HITS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CACHE_MISSES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(REMOTE_FETCHES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(REMOTE_FETCH_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(STALE_RESPONSES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(URL_WRITES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(FAVORITE_TOGGLES_TOTAL.clone()))?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Record the outcome and latency of one remote call
pub fn observe_fetch(kind: &str, success: bool, elapsed: std::time::Duration) {
    let outcome = if success { "success" } else { "error" };
    REMOTE_FETCHES_TOTAL.with_label_values(&[kind, outcome]).inc();
    REMOTE_FETCH_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(elapsed.as_secs_f64());
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
