//! Prometheus metrics registry for the weather notifier.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the scheduler and HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format.

use prometheus::{Counter, CounterVec, GaugeVec, Histogram, HistogramOpts, Opts, Registry};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Dispatch cycles run, labelled by frequency class.
    pub dispatch_cycles_total: CounterVec,
    /// Size of the registry snapshot taken by the most recent cycle,
    /// labelled by frequency class.
    pub dispatch_targets: GaugeVec,
    /// Subscribers dropped from a cycle because their weather lookup
    /// failed.
    pub forecasts_dropped_total: Counter,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated (should not happen in practice).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let dispatch_cycles_total = CounterVec::new(
            Opts::new(
                "weather_notifier_dispatch_cycles_total",
                "Dispatch cycles run per frequency class",
            ),
            &["frequency"],
        )?;

        let dispatch_targets = GaugeVec::new(
            Opts::new(
                "weather_notifier_dispatch_targets",
                "Registry snapshot size of the most recent cycle",
            ),
            &["frequency"],
        )?;

        let forecasts_dropped_total = Counter::with_opts(Opts::new(
            "weather_notifier_forecasts_dropped_total",
            "Subscribers skipped because their weather lookup failed",
        ))?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "weather_notifier_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "weather_notifier_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(dispatch_cycles_total.clone()))?;
        registry.register(Box::new(dispatch_targets.clone()))?;
        registry.register(Box::new(forecasts_dropped_total.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            dispatch_cycles_total,
            dispatch_targets,
            forecasts_dropped_total,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format (for the `/metrics`
    /// endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
