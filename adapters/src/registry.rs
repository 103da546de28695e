//! Adapter registry
//!
//! Built once at startup. Adapters whose construction or warm up failed are
//! kept as failed slots so that resolving them reports the original cause.

use crate::banks::{ItauAdapter, JpMorganAdapter, StoneAdapter};
use crate::certificate::CertificateProvider;
use crate::config::GatewayConfig;
use crate::connector::BankAdapter;
use crate::{Error, Result};
use boleto_core::taxonomy::{classify, codes, generic_errors_map, INTERNAL_ERROR_MESSAGE};
use boleto_core::{BankNumber, BoletoRequest, BoletoResponse, ErrorsMap, RegistrationOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

enum Slot {
    Ready(Arc<dyn BankAdapter>),
    Failed(String),
}

/// Bank number to adapter
pub struct AdapterRegistry {
    slots: HashMap<BankNumber, Slot>,
    generic: ErrorsMap,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            generic: generic_errors_map(),
        }
    }

    /// Construct and warm up every supported adapter
    pub fn build(config: &GatewayConfig, certificates: Arc<dyn CertificateProvider>) -> Self {
        let mut registry = Self::new();

        let adapters: Vec<Arc<dyn BankAdapter>> = vec![
            Arc::new(JpMorganAdapter::new(config, certificates.clone())),
            Arc::new(StoneAdapter::new(config, certificates.clone())),
            Arc::new(ItauAdapter::new(config, certificates)),
        ];

        for adapter in adapters {
            let bank = adapter.bank_number();
            match adapter.warm_up() {
                Ok(()) => {
                    info!(bank = adapter.bank_name_integration(), "Adapter ready");
                    registry.slots.insert(bank, Slot::Ready(adapter));
                }
                Err(e) => {
                    error!(bank = adapter.bank_name_integration(), error = %e, "Adapter unavailable");
                    registry.slots.insert(bank, Slot::Failed(e.to_string()));
                }
            }
        }

        registry
    }

    /// Add or replace an adapter
    pub fn register(&mut self, adapter: Arc<dyn BankAdapter>) {
        self.slots.insert(adapter.bank_number(), Slot::Ready(adapter));
    }

    /// Adapter for `bank`
    pub fn resolve(&self, bank: BankNumber) -> Result<Arc<dyn BankAdapter>> {
        match self.slots.get(&bank) {
            Some(Slot::Ready(adapter)) => Ok(adapter.clone()),
            Some(Slot::Failed(reason)) => Err(Error::AdapterUnavailable {
                bank: bank.to_string(),
                reason: reason.clone(),
            }),
            None => Err(Error::UnsupportedAdapter(bank.to_string())),
        }
    }

    /// Banks with a ready adapter
    pub fn ready_banks(&self) -> Vec<BankNumber> {
        let mut banks: Vec<BankNumber> = self
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(bank, _)| *bank)
            .collect();
        banks.sort_by_key(|bank| bank.code());
        banks
    }

    /// Register one boleto and classify the result for the client
    pub async fn register_boleto(&self, mut request: BoletoRequest) -> RegistrationOutcome {
        let attempt = Uuid::new_v4();
        let bank = request.bank_number;
        let start = Instant::now();

        info!(attempt = %attempt, bank = %bank, "Registration started");

        let bank_name = bank.to_string();
        let (response, adapter) = match self.resolve(bank) {
            Ok(adapter) => {
                let response = match adapter.process_boleto(&mut request).await {
                    Ok(response) => response,
                    Err(e) => error_response(&attempt, &bank_name, e),
                };
                (response, Some(adapter))
            }
            Err(e) => (error_response(&attempt, &bank_name, e), None),
        };

        let bank_errors = adapter.as_ref().and_then(|adapter| adapter.errors_map());
        let outcome = classify(&bank_name, response, bank_errors, &self.generic);

        info!(
            attempt = %attempt,
            bank = %bank_name,
            status = outcome.status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Registration finished"
        );

        outcome
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("ready", &self.ready_banks())
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// Canonical response for an internal failure
fn error_response(attempt: &Uuid, bank: &str, e: Error) -> BoletoResponse {
    match e {
        Error::Timeout { .. } | Error::Connection(_) => {
            warn!(attempt = %attempt, bank = bank, error = %e, "Bank unreachable");
            BoletoResponse::from_error(codes::MP_TIMEOUT, e.to_string()).with_status_code(504)
        }
        Error::Ticket(message) => {
            warn!(attempt = %attempt, bank = bank, message = %message, "Ticket refused");
            BoletoResponse::from_error(codes::MP_TICKET, message)
        }
        Error::UnparseableResponse { status, body, .. } => {
            error!(attempt = %attempt, bank = bank, status = status, body = %body, "Unparseable bank response");
            BoletoResponse::from_error(codes::MP500, INTERNAL_ERROR_MESSAGE).with_status_code(status)
        }
        other => {
            error!(attempt = %attempt, bank = bank, error = %other, "Registration failed");
            BoletoResponse::from_error(codes::MP500, INTERNAL_ERROR_MESSAGE)
        }
    }
}
