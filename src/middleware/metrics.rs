//! Prometheus metrics for the token endpoint.
//!
//! Exposes a standard `/metrics` endpoint that Prometheus can scrape.
//! Counters live in the global default registry and are registered once,
//! on first use.

use once_cell::sync::Lazy;
use prometheus::{
    opts, register_counter, register_counter_vec, Counter, CounterVec, Encoder, TextEncoder,
};

static METRICS: Lazy<TokenMetrics> = Lazy::new(TokenMetrics::register);

pub struct TokenMetrics {
    tokens_issued_total: Counter,
    issuance_rejected_total: Counter,
    introspections_total: CounterVec,
    revocations_total: Counter,
}

impl TokenMetrics {
    fn register() -> Self {
        let tokens_issued_total = register_counter!(opts!(
            "indietoken_tokens_issued_total",
            "Bearer tokens issued"
        ))
        .expect("failed to register indietoken_tokens_issued_total");

        let issuance_rejected_total = register_counter!(opts!(
            "indietoken_issuance_rejected_total",
            "Token requests rejected with invalid_request"
        ))
        .expect("failed to register indietoken_issuance_rejected_total");

        let introspections_total = register_counter_vec!(
            opts!("indietoken_introspections_total", "Token introspections by outcome"),
            &["outcome"]
        )
        .expect("failed to register indietoken_introspections_total");

        let revocations_total = register_counter!(opts!(
            "indietoken_revocations_total",
            "Revocation requests received"
        ))
        .expect("failed to register indietoken_revocations_total");

        Self {
            tokens_issued_total,
            issuance_rejected_total,
            introspections_total,
            revocations_total,
        }
    }

    pub fn token_issued(&self) {
        self.tokens_issued_total.inc();
    }

    pub fn issuance_rejected(&self) {
        self.issuance_rejected_total.inc();
    }

    /// `outcome` is one of active, unknown, revoked, malformed, missing.
    pub fn introspected(&self, outcome: &str) {
        self.introspections_total.with_label_values(&[outcome]).inc();
    }

    pub fn revocation(&self) {
        self.revocations_total.inc();
    }
}

pub fn metrics() -> &'static TokenMetrics {
    &METRICS
}

/// Encode all registered metrics as Prometheus text format.
/// Called by the `/metrics` HTTP handler.
pub fn encode_metrics() -> String {
    Lazy::force(&METRICS);
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_exposition() {
        metrics().token_issued();
        metrics().introspected("revoked");

        let output = encode_metrics();
        assert!(output.contains("indietoken_tokens_issued_total"));
        assert!(output.contains("indietoken_introspections_total{outcome=\"revoked\"}"));
        assert!(output.contains("indietoken_revocations_total"));
    }
}
