//! Stone adapter
//!
//! JSON over plain TLS with a static bearer token. Error codes are `srn:error:*`
//! tokens.

use super::{send_timed, timeout_response};
use crate::certificate::CertificateProvider;
use crate::config::GatewayConfig;
use crate::connector::BankAdapter;
use crate::metrics::OPERATION_REGISTER;
use crate::template::helpers::{
    convert_amount_in_cents_to_percent, convert_amount_in_cents_to_percent_per_day,
    date_plus_days, decimal_to_string, en_date, only_one_space, truncate_decimal,
};
use crate::template::{ApiMapping, ResponsePattern};
use crate::transport::{OutboundRequest, RawResponse, Transport};
use crate::Result;
use async_trait::async_trait;
use boleto_core::taxonomy::errors_map;
use boleto_core::validation::{
    max_days_to_pay_past_due_rule, validate_access_key, validate_fine, validate_interest,
};
use boleto_core::{BankNumber, BoletoRequest, BoletoResponse, ErrorsMap, StatusClass, Validator};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const BANK_NAME: &str = "Stone";

const REGISTER_METRIC: &str = "stone-register-boleto";

/// Stone issues every boleto as a bill of exchange
pub const INVOICE_TYPE: &str = "bill_of_exchange";

/// Payment window after expiration when the title carries no rules
pub const DEFAULT_DAYS_TO_PAY_PAST_DUE: u32 = 60;

const MAPPING: ApiMapping = ApiMapping {
    code_as_message: &["{}"],
    join_details: false,
    our_number_width: None,
};

const SUCCESS: ResponsePattern = ResponsePattern::Json(
    r#"{
        "barcode": "{{barCodeNumber}}",
        "our_number": "{{ourNumber}}",
        "writable_line": "{{digitableLine}}"
    }"#,
);

const ERROR: ResponsePattern = ResponsePattern::Json(
    r#"{
        "reason": "{{messageError}}",
        "type": "{{errorCode}}"
    }"#,
);

fn stone_errors() -> ErrorsMap {
    errors_map(&[
        ("srn:error:validation", StatusClass::BadRequest),
        ("srn:error:product_not_enabled", StatusClass::BadRequest),
        ("srn:error:unauthenticated", StatusClass::InternalServerError),
        ("srn:error:unauthorized", StatusClass::BadGateway),
        ("srn:error:not_found", StatusClass::BadGateway),
        ("srn:error:conflict", StatusClass::BadGateway),
    ])
}

/// JSON body for a validated request
pub fn render_request(request: &BoletoRequest) -> Value {
    let title = &request.title;
    let days_past_due = title
        .rules
        .as_ref()
        .map(|rules| rules.max_days_to_pay_past_due)
        .unwrap_or(DEFAULT_DAYS_TO_PAY_PAST_DUE);

    let name = only_one_space(&request.buyer.name);
    let trade_name = if request.buyer.document.is_cnpj() {
        Value::String(name.clone())
    } else {
        Value::Null
    };

    let mut body = Map::new();
    body.insert("account_id".into(), json!(request.authentication.access_key));
    body.insert("amount".into(), json!(title.amount_in_cents));
    body.insert("expiration_date".into(), json!(en_date(title.expire_date, "-")));
    body.insert(
        "limit_date".into(),
        json!(en_date(date_plus_days(title.expire_date, days_past_due), "-")),
    );
    body.insert("invoice_type".into(), json!(title.boleto_type_code));
    body.insert(
        "customer".into(),
        json!({
            "document": request.buyer.document.number,
            "legal_name": name,
            "trade_name": trade_name
        }),
    );

    if let Some(fine) = request.fine() {
        let value = if fine.amount_in_cents > 0 {
            truncate_decimal(
                convert_amount_in_cents_to_percent(title.amount_in_cents, fine.amount_in_cents),
                2,
            )
        } else {
            decimal_to_string(fine.percentage_on_total, 2)
        };
        body.insert(
            "fine".into(),
            json!({
                "date": en_date(date_plus_days(title.expire_date, fine.days_after_expiration_date), "-"),
                "value": value
            }),
        );
    }

    if let Some(interest) = request.interest() {
        let value = if interest.amount_per_day_in_cents > 0 {
            truncate_decimal(
                convert_amount_in_cents_to_percent_per_day(
                    title.amount_in_cents,
                    interest.amount_per_day_in_cents,
                ),
                2,
            )
        } else {
            decimal_to_string(interest.percentage_per_month, 2)
        };
        body.insert(
            "interest".into(),
            json!({
                "date": en_date(date_plus_days(title.expire_date, interest.days_after_expiration_date), "-"),
                "value": value
            }),
        );
    }

    Value::Object(body)
}

/// Route a bank answer (or transport failure) to its pattern
pub fn map_response(outcome: Result<RawResponse>) -> Result<BoletoResponse> {
    let raw = match outcome {
        Ok(raw) => raw,
        Err(e) if e.is_transport() => return Ok(timeout_response(Some(&e))),
        Err(e) => return Err(e),
    };

    match raw.status {
        0 | 504 => Ok(timeout_response(None)),
        200..=299 => MAPPING.parse(BANK_NAME, &raw, &SUCCESS),
        _ => MAPPING.parse(BANK_NAME, &raw, &ERROR),
    }
}

/// Stone integration
#[derive(Debug)]
pub struct StoneAdapter {
    validator: Validator,
    errors: ErrorsMap,
    transport: Transport,
    url: String,
    timeout: Duration,
}

impl StoneAdapter {
    /// Create adapter
    pub fn new(config: &GatewayConfig, certificates: Arc<dyn CertificateProvider>) -> Self {
        let mut validator = Validator::with_generic_rules();
        validator.push(validate_access_key);
        validator.push(validate_fine);
        validator.push(validate_interest);
        validator.push(max_days_to_pay_past_due_rule(DEFAULT_DAYS_TO_PAY_PAST_DUE));

        Self {
            validator,
            errors: stone_errors(),
            transport: Transport::plain(BANK_NAME, certificates)
                .accept_invalid_certs(config.accept_invalid_certs),
            url: config.urls.stone.clone(),
            timeout: config.timeouts.register(),
        }
    }
}

#[async_trait]
impl BankAdapter for StoneAdapter {
    fn bank_number(&self) -> BankNumber {
        BankNumber::Stone
    }

    fn bank_name_integration(&self) -> &'static str {
        BANK_NAME
    }

    fn errors_map(&self) -> Option<&ErrorsMap> {
        Some(&self.errors)
    }

    fn validator(&self) -> &Validator {
        &self.validator
    }

    async fn register_boleto(&self, request: &mut BoletoRequest) -> Result<BoletoResponse> {
        request.title.boleto_type_code = INVOICE_TYPE.to_string();

        let body = render_request(request);
        info!(bank = BANK_NAME, url = %self.url, "Registering boleto");

        let outbound = OutboundRequest::post(&self.url, "application/json", serde_json::to_string(&body)?)
            .header(
                "Authorization",
                format!("Bearer {}", request.authentication.authorization_token),
            );

        let outcome = send_timed(
            &self.transport,
            outbound,
            self.timeout,
            BANK_NAME,
            OPERATION_REGISTER,
            REGISTER_METRIC,
        )
        .await;

        map_response(outcome)
    }

    fn warm_up(&self) -> Result<()> {
        self.transport.warm_up()
    }
}
