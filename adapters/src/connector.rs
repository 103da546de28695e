//! Bank adapter contract
//!
//! Every partner bank plugs into the same registration state machine:
//!
//! ```text
//!   validate ──fail──▶ validation errors
//!      │
//!      ▼
//!   ticket (ticket banks only) ──Err──▶ caller
//!      │
//!      ▼
//!   register ──▶ integrity guard ──▶ response
//! ```

use crate::Result;
use async_trait::async_trait;
use boleto_core::taxonomy::codes;
use boleto_core::{BankNumber, BoletoRequest, BoletoResponse, ErrorResponse, ErrorsMap, Issuer, Validator};
use tracing::{info, warn};

/// Message used when the bank reports success without an our number
pub const OUR_NUMBER_FAIL_MESSAGE: &str = "our number was not returned by the bank";

/// Message used when the bank reports success with malformed identifiers
pub const BAD_GATEWAY_MESSAGE: &str = "BadGateway";

/// Per-bank integration
#[async_trait]
pub trait BankAdapter: Send + Sync {
    /// Partner bank
    fn bank_number(&self) -> BankNumber;

    /// Integration name used in logs and metrics
    fn bank_name_integration(&self) -> &'static str;

    /// Bank-native codes and their status class. `None` means generic only.
    fn errors_map(&self) -> Option<&ErrorsMap>;

    /// Predicates run before any bank call
    fn validator(&self) -> &Validator;

    /// Run the validator. Empty means valid.
    fn validate_boleto(&self, request: &mut BoletoRequest) -> Vec<ErrorResponse> {
        match self.validator().assert(request) {
            Ok(()) => Vec::new(),
            Err(error) => {
                info!(
                    bank = self.bank_name_integration(),
                    code = %error.code,
                    message = %error.message,
                    "Request rejected by validation"
                );
                vec![error]
            }
        }
    }

    /// Authentication exchange for ticket-based banks
    async fn get_ticket(&self, _request: &BoletoRequest) -> Result<Option<String>> {
        Ok(None)
    }

    /// Render, send and parse the registration call
    async fn register_boleto(&self, request: &mut BoletoRequest) -> Result<BoletoResponse>;

    /// Full registration attempt
    async fn process_boleto(&self, request: &mut BoletoRequest) -> Result<BoletoResponse> {
        let errors = self.validate_boleto(request);
        if !errors.is_empty() {
            return Ok(BoletoResponse::failure(errors));
        }

        if let Some(ticket) = self.get_ticket(request).await? {
            request.authentication.authorization_token = ticket;
        }

        let response = self.register_boleto(request).await?;
        Ok(integrity_guard(self.bank_name_integration(), response))
    }

    /// Build expensive resources (TLS identity, signing key) ahead of the first call
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}

fn is_blank_our_number(our_number: &str) -> bool {
    our_number.chars().all(|c| c == '0')
}

/// Demote a success that carries unusable identifiers to a failure
pub fn integrity_guard(bank: &str, response: BoletoResponse) -> BoletoResponse {
    if response.has_errors() {
        return response;
    }

    let status = response.status_code();

    if is_blank_our_number(response.our_number().trim()) {
        warn!(bank = bank, "Bank success without our number");
        return BoletoResponse::from_error(codes::MP_OUR_NUMBER_FAIL, OUR_NUMBER_FAIL_MESSAGE)
            .with_status_code(status);
    }

    let issuer = Issuer::new(response.bar_code_number(), response.digitable_line());
    if !issuer.is_consistent() {
        warn!(
            bank = bank,
            barcode = response.bar_code_number(),
            digitable_line = response.digitable_line(),
            "Bank success with malformed barcode or digitable line"
        );
        return BoletoResponse::from_error(codes::MP_BAD_GATEWAY, BAD_GATEWAY_MESSAGE)
            .with_status_code(status);
    }

    response
}
