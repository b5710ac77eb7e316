//! # Prometheus Metrics
//!
//! Operational counters for the vault, scraped at `/metrics` on the
//! configured metrics port. Everything lives in a dedicated registry with
//! the `saving` namespace.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Plans successfully created.
    pub plans_created_total: IntCounter,
    /// Plans successfully withdrawn (closed).
    pub withdrawals_total: IntCounter,
    /// Withdrawal attempts that returned an error.
    pub withdrawals_rejected_total: IntCounter,
    /// Sum of all payouts, in the smallest currency unit.
    pub payout_amount_total: IntCounter,
    /// Engine call latency per API request, in seconds.
    pub request_latency_seconds: Histogram,
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntCounter> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("saving".into()), None)?;

        let plans_created_total = register_counter(
            &registry,
            "plans_created_total",
            "Total number of savings plans created",
        )?;
        let withdrawals_total = register_counter(
            &registry,
            "withdrawals_total",
            "Total number of successful plan withdrawals",
        )?;
        let withdrawals_rejected_total = register_counter(
            &registry,
            "withdrawals_rejected_total",
            "Total number of rejected withdrawal attempts",
        )?;
        let payout_amount_total = register_counter(
            &registry,
            "payout_amount_total",
            "Sum of all withdrawal payouts",
        )?;

        let request_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "request_latency_seconds",
                "Engine call latency per API request in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )?;
        registry.register(Box::new(request_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            plans_created_total,
            withdrawals_total,
            withdrawals_rejected_total,
            payout_amount_total,
            request_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
