//! Transformation engine
//!
//! ```text
//!                render (bank module + helpers)
//!   BoletoRequest ─────────────────────────────▶ wire payload
//!
//!                capture (pattern)          map (ApiMapping)
//!   bank body ─────────────────▶ Captures ─────────────────▶ BoletoResponse
//! ```
//!
//! Capturing only extracts the named fields from whatever shape the bank
//! answered with. Deciding between error and success happens afterwards, on
//! the flat captures, so the same mapping serves every response route.

pub mod helpers;
pub mod pattern;

use crate::transport::RawResponse;
use crate::{Error, Result};
use boleto_core::issuer::fmt_digitable_line;
use boleto_core::{BoletoResponse, ErrorResponse};
use pattern::{capture_json, capture_xml, parse_pattern, Captures};
use tracing::warn;

/// Bank error code
pub const ERROR_CODE: &str = "errorCode";
/// Bank error message
pub const MESSAGE_ERROR: &str = "messageError";
/// Extra error details
pub const MESSAGE_DETAILS: &str = "messageDetails";
/// 44 digit barcode
pub const BAR_CODE_NUMBER: &str = "barCodeNumber";
/// Digitable line
pub const DIGITABLE_LINE: &str = "digitableLine";
/// Bank document identifier
pub const OUR_NUMBER: &str = "ourNumber";

/// Shape of one bank response route
#[derive(Debug, Clone, Copy)]
pub enum ResponsePattern {
    /// JSON pattern with `{{field}}` leaves
    Json(&'static str),
    /// XML element local names and the field each one fills
    Xml(&'static [(&'static str, &'static str)]),
}

impl ResponsePattern {
    /// Extract the pattern fields from `body`
    pub fn capture(&self, body: &str) -> Result<Captures> {
        match self {
            ResponsePattern::Json(pattern) => {
                let pattern = parse_pattern(pattern)?;
                let body: serde_json::Value = serde_json::from_str(body)?;
                let mut captures = Captures::new();
                capture_json(&pattern, &body, &mut captures);
                Ok(captures)
            }
            ResponsePattern::Xml(fields) => capture_xml(fields, body),
        }
    }
}

/// How captures become a canonical response for one bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiMapping {
    /// Message values that are replaced by the error code
    pub code_as_message: &'static [&'static str],
    /// Append `: details` to the message when details were captured
    pub join_details: bool,
    /// Left-pad the our number with zeros to this width
    pub our_number_width: Option<usize>,
}

impl Default for ApiMapping {
    fn default() -> Self {
        Self {
            code_as_message: &["{}"],
            join_details: false,
            our_number_width: None,
        }
    }
}

fn captured<'a>(captures: &'a Captures, field: &str) -> &'a str {
    captures.get(field).map(|value| value.trim()).unwrap_or("")
}

impl ApiMapping {
    /// Capture `raw` with `pattern` and map the result.
    ///
    /// Bodies the pattern cannot read are reported as unparseable.
    pub fn parse(
        &self,
        bank: &str,
        raw: &RawResponse,
        pattern: &ResponsePattern,
    ) -> Result<BoletoResponse> {
        let captures = pattern.capture(&raw.body).map_err(|e| {
            warn!(bank = bank, status = raw.status, error = %e, "Bank body does not match pattern");
            unparseable(bank, raw)
        })?;

        self.to_response(bank, raw.status, &captures, &raw.body)
    }

    /// Canonical response from flat captures
    pub fn to_response(
        &self,
        bank: &str,
        status: u16,
        captures: &Captures,
        raw_body: &str,
    ) -> Result<BoletoResponse> {
        let code = captured(captures, ERROR_CODE);
        let message = captured(captures, MESSAGE_ERROR);

        if !code.is_empty() || !message.is_empty() {
            let message = self.message(code, message, captured(captures, MESSAGE_DETAILS));
            return Ok(
                BoletoResponse::failure(vec![ErrorResponse::new(code, message)])
                    .with_status_code(status),
            );
        }

        let bar_code = captured(captures, BAR_CODE_NUMBER);
        let line = captured(captures, DIGITABLE_LINE);
        let our_number = captured(captures, OUR_NUMBER);

        if bar_code.is_empty() && line.is_empty() && !captures.contains_key(OUR_NUMBER) {
            return Err(Error::UnparseableResponse {
                bank: bank.to_string(),
                status,
                body: raw_body.to_string(),
            });
        }

        let our_number = match self.our_number_width {
            Some(width) => helpers::pad_left(our_number, '0', width),
            None => our_number.to_string(),
        };

        Ok(
            BoletoResponse::success(bar_code, fmt_digitable_line(line), our_number)
                .with_status_code(status),
        )
    }

    fn message(&self, code: &str, message: &str, details: &str) -> String {
        if self.code_as_message.contains(&message) {
            return code.to_string();
        }
        if self.join_details && !details.is_empty() && details != "{}" {
            return format!("{} : {}", message, details);
        }
        message.to_string()
    }
}

fn unparseable(bank: &str, raw: &RawResponse) -> Error {
    Error::UnparseableResponse {
        bank: bank.to_string(),
        status: raw.status,
        body: raw.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JP: ApiMapping = ApiMapping {
        code_as_message: &["{}", "Error"],
        join_details: true,
        our_number_width: Some(12),
    };

    fn captures(pairs: &[(&str, &str)]) -> Captures {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            content_type: "application/json".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_success_is_trimmed_padded_and_grouped() {
        let response = JP
            .to_response(
                "JPMorgan",
                200,
                &captures(&[
                    (BAR_CODE_NUMBER, " 37691877200000002000098000600016400000504858 "),
                    (DIGITABLE_LINE, "37690098080060001640600005048582187720000000200"),
                    (OUR_NUMBER, "123456"),
                ]),
                "",
            )
            .unwrap();

        assert!(!response.has_errors());
        assert_eq!(response.bar_code_number(), "37691877200000002000098000600016400000504858");
        assert_eq!(
            response.digitable_line(),
            "37690.09808 00600.016406 00005.048582 1 87720000000200"
        );
        assert_eq!(response.our_number(), "000000123456");
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_error_message_rules() {
        let error = |pairs: &[(&str, &str)]| {
            JP.to_response("JPMorgan", 500, &captures(pairs), "")
                .unwrap()
                .first_error()
                .cloned()
                .unwrap()
        };

        let e = error(&[(ERROR_CODE, "Signature Verification Failure "), (MESSAGE_ERROR, "Error")]);
        assert_eq!(e.code, "Signature Verification Failure");
        assert_eq!(e.message, "Signature Verification Failure");

        let e = error(&[(ERROR_CODE, "BOL-144"), (MESSAGE_ERROR, "Boleto já Existente"), (MESSAGE_DETAILS, "{boletoBarCode:1}")]);
        assert_eq!(e.message, "Boleto já Existente : {boletoBarCode:1}");

        let e = error(&[(ERROR_CODE, "BOL-144"), (MESSAGE_ERROR, "Boleto já Existente"), (MESSAGE_DETAILS, "{}")]);
        assert_eq!(e.message, "Boleto já Existente");

        let e = error(&[(ERROR_CODE, "GCA-010"), (MESSAGE_ERROR, "The account was not found.")]);
        assert_eq!(e.message, "The account was not found.");
    }

    #[test]
    fn test_default_mapping_keeps_error_text() {
        let mapping = ApiMapping::default();
        let response = mapping
            .to_response(
                "Stone",
                400,
                &captures(&[(ERROR_CODE, "srn:error:validation"), (MESSAGE_ERROR, "Error"), (MESSAGE_DETAILS, "x")]),
                "",
            )
            .unwrap();
        assert_eq!(response.first_error().unwrap().message, "Error");

        let response = mapping
            .to_response("Stone", 401, &captures(&[(ERROR_CODE, "srn:error:unauthenticated"), (MESSAGE_ERROR, "{}")]), "")
            .unwrap();
        assert_eq!(response.first_error().unwrap().message, "srn:error:unauthenticated");
    }

    #[test]
    fn test_neither_shape_is_unparseable() {
        let err = JP
            .to_response("JPMorgan", 200, &captures(&[]), "{\"weird\":1}")
            .unwrap_err();
        assert!(matches!(err, Error::UnparseableResponse { status: 200, .. }));
    }

    #[test]
    fn test_parse_non_json_body_is_unparseable() {
        let pattern = ResponsePattern::Json(r#"{"barcode": "{{barCodeNumber}}"}"#);
        let err = ApiMapping::default()
            .parse("Stone", &raw(502, "<html>bad gateway</html>"), &pattern)
            .unwrap_err();
        assert!(matches!(err, Error::UnparseableResponse { status: 502, .. }));
    }

    #[test]
    fn test_empty_our_number_still_maps_to_success() {
        let pattern = ResponsePattern::Json(
            r#"{"barcode": "{{barCodeNumber}}", "our_number": "{{ourNumber}}", "writable_line": "{{digitableLine}}"}"#,
        );
        let response = ApiMapping::default()
            .parse("Stone", &raw(201, r#"{"barcode": "", "our_number": "", "writable_line": ""}"#), &pattern)
            .unwrap();
        assert!(!response.has_errors());
        assert_eq!(response.our_number(), "");
    }
}
