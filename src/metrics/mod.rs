//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Submissions by path (simulated / broadcast)
//! - Failed submissions
//! - Gas values that were unavailable or replaced by a fallback profile
//! - Finalization outcomes

use crate::error::{SubmitterError, SubmitterResult};
use crate::tx::FinalizationStatus;

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref SUBMISSIONS: CounterVec = register_counter_vec!(
        "wallet_submitter_submissions_total",
        "Total successful submissions by path",
        &["chain_id", "path"]
    ).expect("metric can be registered");

    pub static ref SUBMISSIONS_FAILED: CounterVec = register_counter_vec!(
        "wallet_submitter_submissions_failed_total",
        "Total failed submissions",
        &["chain_id"]
    ).expect("metric can be registered");

    pub static ref GAS_UNAVAILABLE: CounterVec = register_counter_vec!(
        "wallet_submitter_gas_unavailable_total",
        "Gas values the estimator or oracle failed to produce",
        &["chain_id", "field"]
    ).expect("metric can be registered");

    pub static ref GAS_FALLBACK: CounterVec = register_counter_vec!(
        "wallet_submitter_gas_fallback_total",
        "Gas values taken from a chain fallback profile",
        &["chain_id", "field"]
    ).expect("metric can be registered");

    pub static ref FINALIZATIONS: CounterVec = register_counter_vec!(
        "wallet_submitter_finalizations_total",
        "Finalized transactions by status",
        &["status"]
    ).expect("metric can be registered");
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> SubmitterResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| SubmitterError::Config(format!("Cannot bind {}: {}", addr, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| SubmitterError::Internal(e.to_string()))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    render().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Encode all registered metrics in the text exposition format
pub fn render() -> SubmitterResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| SubmitterError::Internal(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| SubmitterError::Internal(e.to_string()))
}

// Helper functions to record metrics

pub fn record_submission(chain_id: u64, path: &str) {
    SUBMISSIONS
        .with_label_values(&[&chain_id.to_string(), path])
        .inc();
}

pub fn record_submission_failed(chain_id: u64) {
    SUBMISSIONS_FAILED
        .with_label_values(&[&chain_id.to_string()])
        .inc();
}

pub fn record_gas_unavailable(chain_id: u64, field: &str) {
    GAS_UNAVAILABLE
        .with_label_values(&[&chain_id.to_string(), field])
        .inc();
}

pub fn record_gas_fallback(chain_id: u64, field: &str) {
    GAS_FALLBACK
        .with_label_values(&[&chain_id.to_string(), field])
        .inc();
}

pub fn record_finalization(status: FinalizationStatus) {
    let label = match status {
        FinalizationStatus::Success => "success",
        FinalizationStatus::Failed => "failed",
    };
    FINALIZATIONS.with_label_values(&[label]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_metrics() {
        record_gas_fallback(999_001, "gas_limit");
        record_finalization(FinalizationStatus::Failed);

        let text = render().unwrap();
        assert!(text.contains("wallet_submitter_gas_fallback_total"));
        assert!(text.contains("chain_id=\"999001\""));
        assert!(text.contains("wallet_submitter_finalizations_total"));
    }
}
