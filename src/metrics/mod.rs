//! Prometheus counters for the inventory workflow, exposed at `/metrics`.

use axum::{http::header, http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref EVENTS_PROCESSED: IntCounterVec = IntCounterVec::new(
        Opts::new("medistock_events_processed_total", "Domain events handled by the processor"),
        &["event"]
    )
    .expect("metric can be created");
    pub static ref STOCK_ADJUSTMENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("medistock_stock_adjustments_total", "Successful stock changes"),
        &["direction"]
    )
    .expect("metric can be created");
    pub static ref STOCK_ADJUSTMENT_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("medistock_stock_adjustment_failures_total", "Refused stock changes"),
        &["reason"]
    )
    .expect("metric can be created");
    pub static ref HISTORY_ENTRIES_WRITTEN: IntCounter = IntCounter::new(
        "medistock_history_entries_written_total",
        "Audit entries persisted alongside a mutation"
    )
    .expect("metric can be created");
    pub static ref MUTATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("medistock_mutations_total", "Committed medicine and aisle writes"),
        &["entity", "action"]
    )
    .expect("metric can be created");
    pub static ref VALIDATION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("medistock_validation_failures_total", "Business-rule violations"),
        &["code"]
    )
    .expect("metric can be created");
}

/// Registers the counters once; repeated calls are harmless.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(EVENTS_PROCESSED.clone()),
        Box::new(STOCK_ADJUSTMENTS.clone()),
        Box::new(STOCK_ADJUSTMENT_FAILURES.clone()),
        Box::new(HISTORY_ENTRIES_WRITTEN.clone()),
        Box::new(MUTATIONS.clone()),
        Box::new(VALIDATION_FAILURES.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => error!("Failed to register metric: {}", e),
        }
    }
}

/// Text exposition of every registered counter.
pub fn render() -> Result<String, prometheus::Error> {
    register_metrics();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub async fn metrics_handler() -> impl IntoResponse {
    match render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_output_lists_counters() {
        HISTORY_ENTRIES_WRITTEN.inc();
        STOCK_ADJUSTMENT_FAILURES.with_label_values(&["negative"]).inc();
        let text = render().unwrap();
        assert!(text.contains("medistock_history_entries_written_total"));
        assert!(text.contains("reason=\"negative\""));
    }
}
