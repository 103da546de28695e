//! Partner bank adapters

pub mod itau;
pub mod jpmorgan;
pub mod stone;

pub use itau::ItauAdapter;
pub use jpmorgan::JpMorganAdapter;
pub use stone::StoneAdapter;

use crate::metrics;
use crate::transport::{OutboundRequest, RawResponse, Transport};
use crate::{Error, Result};
use boleto_core::taxonomy::codes;
use boleto_core::BoletoResponse;
use std::time::{Duration, Instant};
use tracing::debug;

/// Message used when the bank timed out without a transport error
pub const GATEWAY_TIMEOUT_MESSAGE: &str = "GatewayTimeout";

/// Send through `transport`, recording duration and outcome
pub(crate) async fn send_timed(
    transport: &Transport,
    request: OutboundRequest,
    timeout: Duration,
    bank: &str,
    operation: &str,
    metric: &str,
) -> Result<RawResponse> {
    let start = Instant::now();
    let result = transport.send(request, timeout, operation).await;
    let elapsed = start.elapsed().as_secs_f64();

    let outcome = match &result {
        Ok(raw) if (200..300).contains(&raw.status) => "ok",
        Ok(_) => "rejected",
        Err(Error::Timeout { .. }) => "timeout",
        Err(_) => "error",
    };
    metrics::observe(bank, operation, outcome, elapsed);
    debug!(bank = bank, metric = metric, seconds = elapsed, "Bank call timed");

    result
}

/// `MPTimeout` response carrying the transport failure text
pub(crate) fn timeout_response(error: Option<&Error>) -> BoletoResponse {
    let message = error
        .map(|e| e.to_string())
        .unwrap_or_else(|| GATEWAY_TIMEOUT_MESSAGE.to_string());
    BoletoResponse::from_error(codes::MP_TIMEOUT, message).with_status_code(504)
}
