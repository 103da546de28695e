//! Error taxonomy: canonical and bank-native codes to HTTP status classes
//!
//! Lookup order is bank map first, then the generic map. Codes present in
//! neither collapse to a generic internal error; the native code and message
//! are logged and never returned to the caller.

use crate::response::{BoletoResponse, ErrorResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

/// Canonical error codes
pub mod codes {
    /// Generic bad request
    pub const MP400: &str = "MP400";
    /// Generic internal error
    pub const MP500: &str = "MP500";
    /// Generic bad gateway
    pub const MP502: &str = "MP502";
    /// Generic gateway timeout
    pub const MP504: &str = "MP504";
    /// Amount below one cent
    pub const MP_AMOUNT_IN_CENTS: &str = "MPAmountInCents";
    /// Expiration date out of range
    pub const MP_EXPIRE_DATE: &str = "MPExpireDate";
    /// Buyer document type unknown
    pub const MP_BUYER_DOCUMENT_TYPE: &str = "MPBuyerDocumentType";
    /// Document number fails its check digits
    pub const MP_DOCUMENT_NUMBER: &str = "MPDocumentNumber";
    /// Recipient document type unknown
    pub const MP_RECIPIENT_DOCUMENT_TYPE: &str = "MPRecipientDocumentType";
    /// Payee guarantor without name
    pub const MP_PAYEE_GUARANTOR_NAME_TYPE: &str = "MPPayeeGuarantorNameType";
    /// Payee guarantor document type unknown
    pub const MP_PAYEE_GUARANTOR_DOCUMENT_TYPE: &str = "MPPayeeGuarantorDocumentType";
    /// Our number out of range
    pub const MP_OUR_NUMBER: &str = "MPOurNumber";
    /// Wallet variation out of range
    pub const MP_WALLET_VARIATION: &str = "MPWalletVariation";
    /// Bank call timed out or could not connect
    pub const MP_TIMEOUT: &str = "MPTimeout";
    /// Bank reported success without an our number
    pub const MP_OUR_NUMBER_FAIL: &str = "MPOurNumberFail";
    /// Bank reported success with corrupt identifiers
    pub const MP_BAD_GATEWAY: &str = "MPBadGateway";
    /// Ticket exchange rejected
    pub const MP_TICKET: &str = "MPTicket";
}

/// Client message used whenever an error collapses to the generic internal error
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred.";

/// HTTP status class of an error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusClass {
    /// 200
    Ok,
    /// 400
    BadRequest,
    /// 500
    InternalServerError,
    /// 502
    BadGateway,
    /// 504
    GatewayTimeout,
}

impl StatusClass {
    /// Numeric HTTP status
    pub fn as_u16(self) -> u16 {
        match self {
            StatusClass::Ok => 200,
            StatusClass::BadRequest => 400,
            StatusClass::InternalServerError => 500,
            StatusClass::BadGateway => 502,
            StatusClass::GatewayTimeout => 504,
        }
    }

    /// Class for a numeric status, if it is one of the known classes
    pub fn from_u16(status: u16) -> Option<Self> {
        match status {
            200 => Some(StatusClass::Ok),
            400 => Some(StatusClass::BadRequest),
            500 => Some(StatusClass::InternalServerError),
            502 => Some(StatusClass::BadGateway),
            504 => Some(StatusClass::GatewayTimeout),
            _ => None,
        }
    }

    fn canonical_code(self) -> &'static str {
        match self {
            StatusClass::BadRequest => codes::MP400,
            StatusClass::BadGateway => codes::MP502,
            StatusClass::GatewayTimeout => codes::MP504,
            StatusClass::Ok | StatusClass::InternalServerError => codes::MP500,
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Immutable bank-native code to status class map
pub type ErrorsMap = HashMap<String, StatusClass>;

/// Build an errors map from static pairs
pub fn errors_map(entries: &[(&str, StatusClass)]) -> ErrorsMap {
    entries
        .iter()
        .map(|(code, class)| (code.to_string(), *class))
        .collect()
}

/// Cross-bank canonical code map
pub fn generic_errors_map() -> ErrorsMap {
    errors_map(&[
        (codes::MP400, StatusClass::BadRequest),
        (codes::MP_AMOUNT_IN_CENTS, StatusClass::BadRequest),
        (codes::MP_EXPIRE_DATE, StatusClass::BadRequest),
        (codes::MP_BUYER_DOCUMENT_TYPE, StatusClass::BadRequest),
        (codes::MP_DOCUMENT_NUMBER, StatusClass::BadRequest),
        (codes::MP_RECIPIENT_DOCUMENT_TYPE, StatusClass::BadRequest),
        (codes::MP_PAYEE_GUARANTOR_NAME_TYPE, StatusClass::BadRequest),
        (codes::MP_PAYEE_GUARANTOR_DOCUMENT_TYPE, StatusClass::BadRequest),
        (codes::MP_OUR_NUMBER, StatusClass::BadRequest),
        (codes::MP_WALLET_VARIATION, StatusClass::BadRequest),
        (codes::MP_TIMEOUT, StatusClass::GatewayTimeout),
        (codes::MP_OUR_NUMBER_FAIL, StatusClass::BadGateway),
        (codes::MP_BAD_GATEWAY, StatusClass::BadGateway),
        (codes::MP_TICKET, StatusClass::BadGateway),
    ])
}

/// Status class of a code: bank map first, generic map second
pub fn lookup(code: &str, bank_map: Option<&ErrorsMap>, generic: &ErrorsMap) -> Option<StatusClass> {
    bank_map
        .and_then(|map| map.get(code))
        .or_else(|| generic.get(code))
        .copied()
}

/// Classified outcome handed to the outer HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationOutcome {
    /// Status class to answer with
    pub status: StatusClass,
    /// Client-visible response
    pub response: BoletoResponse,
}

/// Classify a response for the client.
///
/// Known codes are rewritten to `MP400`/`MP502`/`MP504` keeping their message.
/// Internal and unknown codes become `MP500` with the generic message.
pub fn classify(
    bank: &str,
    response: BoletoResponse,
    bank_map: Option<&ErrorsMap>,
    generic: &ErrorsMap,
) -> RegistrationOutcome {
    let Some(first) = response.first_error().cloned() else {
        return RegistrationOutcome {
            status: StatusClass::Ok,
            response,
        };
    };

    let status = match lookup(&first.code, bank_map, generic) {
        Some(StatusClass::Ok) | None => {
            warn!(
                bank = bank,
                code = %first.code,
                message = %first.message,
                "Unmapped error code collapsed to internal error"
            );
            StatusClass::InternalServerError
        }
        Some(class) => class,
    };

    let client_error = if status == StatusClass::InternalServerError {
        error!(
            bank = bank,
            code = %first.code,
            message = %first.message,
            "Registration failed with internal error"
        );
        ErrorResponse::new(codes::MP500, INTERNAL_ERROR_MESSAGE)
    } else {
        ErrorResponse::new(status.canonical_code(), first.message)
    };

    RegistrationOutcome {
        status,
        response: BoletoResponse::failure(vec![client_error])
            .with_status_code(response.status_code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone_map() -> ErrorsMap {
        errors_map(&[
            ("srn:error:validation", StatusClass::BadRequest),
            ("srn:error:unauthenticated", StatusClass::InternalServerError),
            ("srn:error:conflict", StatusClass::BadGateway),
        ])
    }

    #[test]
    fn test_generic_codes() {
        let generic = generic_errors_map();
        assert_eq!(lookup("MPTimeout", None, &generic), Some(StatusClass::GatewayTimeout));
        assert_eq!(lookup("MPOurNumberFail", None, &generic), Some(StatusClass::BadGateway));
        assert_eq!(lookup("MPAmountInCents", None, &generic), Some(StatusClass::BadRequest));
        assert_eq!(lookup("BOL-1", None, &generic), None);
    }

    #[test]
    fn test_bank_map_consulted_first() {
        let generic = generic_errors_map();
        let bank = errors_map(&[("MP400", StatusClass::BadGateway)]);
        assert_eq!(lookup("MP400", Some(&bank), &generic), Some(StatusClass::BadGateway));
        assert_eq!(lookup("MPTimeout", Some(&bank), &generic), Some(StatusClass::GatewayTimeout));
    }

    #[test]
    fn test_classify_rewrites_known_codes() {
        let generic = generic_errors_map();
        let response = BoletoResponse::from_error("srn:error:validation", "is invalid");

        let outcome = classify("Stone", response, Some(&stone_map()), &generic);

        assert_eq!(outcome.status, StatusClass::BadRequest);
        assert_eq!(
            outcome.response.errors(),
            &[ErrorResponse::new("MP400", "is invalid")]
        );
    }

    #[test]
    fn test_classify_collapses_unknown_codes() {
        let generic = generic_errors_map();
        let response = BoletoResponse::from_error("XYZ-999", "secret backend detail");

        let outcome = classify("Stone", response, Some(&stone_map()), &generic);

        assert_eq!(outcome.status, StatusClass::InternalServerError);
        let error = outcome.response.first_error().unwrap();
        assert_eq!(error.code, "MP500");
        assert_eq!(error.message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_classify_hides_mapped_internal_errors() {
        let generic = generic_errors_map();
        let response = BoletoResponse::from_error("srn:error:unauthenticated", "token expired");

        let outcome = classify("Stone", response, Some(&stone_map()), &generic);

        assert_eq!(outcome.status, StatusClass::InternalServerError);
        assert_eq!(outcome.response.first_error().unwrap().message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_classify_success() {
        let generic = generic_errors_map();
        let outcome = classify("Stone", BoletoResponse::success("1", "2", "3"), None, &generic);
        assert_eq!(outcome.status, StatusClass::Ok);
        assert!(!outcome.response.has_errors());
    }

    #[test]
    fn test_timeout_becomes_mp504() {
        let generic = generic_errors_map();
        let outcome = classify(
            "JPMorgan",
            BoletoResponse::from_error("MPTimeout", "GatewayTimeout"),
            None,
            &generic,
        );
        assert_eq!(outcome.status.as_u16(), 504);
        assert_eq!(outcome.response.first_error().unwrap().code, "MP504");
    }
}
