/*
 * Prometheus instrumentation for quote outcomes
 */

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use crate::models::{QuoterError, Result};

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_ERROR: &str = "error";

pub struct QuoteMetrics {
    registry: Registry,
    quotes_total: IntCounterVec,
    quote_duration: HistogramVec,
}

impl QuoteMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("stablequote".to_string()), None)
            .map_err(metrics_error)?;

        let quotes_total = IntCounterVec::new(
            Opts::new("quotes_total", "Quote attempts by venue and outcome"),
            &["dex", "outcome"],
        )
        .map_err(metrics_error)?;

        let quote_duration = HistogramVec::new(
            HistogramOpts::new("quote_duration_seconds", "Wall time of a quote including chain calls"),
            &["dex"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(quotes_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(quote_duration.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            quotes_total,
            quote_duration,
        })
    }

    pub fn observe(&self, dex: &str, ok: bool, seconds: f64) {
        let outcome = if ok { OUTCOME_OK } else { OUTCOME_ERROR };
        self.quotes_total.with_label_values(&[dex, outcome]).inc();
        self.quote_duration.with_label_values(&[dex]).observe(seconds);
    }

    #[must_use]
    pub fn count(&self, dex: &str, outcome: &str) -> u64 {
        self.quotes_total.with_label_values(&[dex, outcome]).get()
    }

    /// Totals across venues as (ok, error).
    #[must_use]
    pub fn totals(&self) -> (u64, u64) {
        let mut ok = 0;
        let mut failed = 0;
        for family in self.registry.gather() {
            if !family.get_name().ends_with("quotes_total") {
                continue;
            }
            for metric in family.get_metric() {
                let value = metric.get_counter().get_value() as u64;
                let is_ok = metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == "outcome" && label.get_value() == OUTCOME_OK);
                if is_ok {
                    ok += value;
                } else {
                    failed += value;
                }
            }
        }
        (ok, failed)
    }

    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| QuoterError::MetricsError(e.to_string()))
    }
}

fn metrics_error(err: prometheus::Error) -> QuoterError {
    QuoterError::MetricsError(err.to_string())
}
