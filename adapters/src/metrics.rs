//! Bank call metrics

use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static::lazy_static! {
    /// Outbound bank calls by outcome
    pub static ref BANK_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "boleto_bank_requests_total",
        "Total outbound bank requests",
        &["bank", "operation", "outcome"]
    )
    .unwrap();

    /// Outbound bank call latency
    pub static ref BANK_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "boleto_bank_request_duration_seconds",
        "Outbound bank request duration",
        &["bank", "operation"]
    )
    .unwrap();
}

/// Operation label for the register call
pub const OPERATION_REGISTER: &str = "register";

/// Operation label for the ticket exchange
pub const OPERATION_TICKET: &str = "ticket";

/// Record one finished bank call
pub fn observe(bank: &str, operation: &str, outcome: &str, seconds: f64) {
    BANK_REQUEST_DURATION
        .with_label_values(&[bank, operation])
        .observe(seconds);
    BANK_REQUESTS_TOTAL
        .with_label_values(&[bank, operation, outcome])
        .inc();
}
