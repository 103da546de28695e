//! Itaú adapter
//!
//! Ticket-based: a `client_credentials` exchange yields the access token sent
//! with the register call.

use super::{send_timed, timeout_response};
use crate::certificate::CertificateProvider;
use crate::config::GatewayConfig;
use crate::connector::BankAdapter;
use crate::metrics::{OPERATION_REGISTER, OPERATION_TICKET};
use crate::template::helpers::{
    clear_string, en_date, extract_numbers, join_space, pad_left, today, truncate_only,
};
use crate::template::{ApiMapping, ResponsePattern};
use crate::transport::{OutboundRequest, RawResponse, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use boleto_core::checkdigit::itau_dac;
use boleto_core::validation::{
    account_rule, agency_rule, boleto_type_rule, validate_account_digit,
};
use boleto_core::{BankNumber, BoletoRequest, BoletoResponse, ErrorsMap, Validator};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const BANK_NAME: &str = "Itau";

const TICKET_METRIC: &str = "itau-get-ticket-boleto-time";

const REGISTER_METRIC: &str = "itau-register-boleto-time";

/// Boleto kinds accepted by Itaú
pub const BOLETO_TYPES: &[(&str, &str)] = &[
    ("DM", "01"),
    ("NP", "02"),
    ("RC", "05"),
    ("DS", "08"),
    ("BDP", "18"),
    ("OUT", "99"),
];

/// Kind used when none or an unknown one is requested
pub const DEFAULT_BOLETO_TYPE: (&str, &str) = ("DM", "01");

/// Body substituted for HTML error pages
pub const HTML_ERROR_BODY: &str = r#"{"codigo":"501","mensagem":"Error"}"#;

const MAPPING: ApiMapping = ApiMapping {
    code_as_message: &["{}"],
    join_details: true,
    our_number_width: None,
};

const SUCCESS: ResponsePattern = ResponsePattern::Json(
    r#"{
        "codigo_barras": "{{barCodeNumber}}",
        "numero_linha_digitavel": "{{digitableLine}}",
        "nosso_numero": "{{ourNumber}}"
    }"#,
);

const ERROR: ResponsePattern = ResponsePattern::Json(
    r#"{
        "codigo": "{{errorCode}}",
        "mensagem": "{{messageError}}",
        "campos": "{{messageDetails}}"
    }"#,
);

#[derive(Debug, Default, Deserialize)]
struct TicketResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default, rename = "errorMessage")]
    error_message: String,
}

/// Resolve the boleto kind. Unknown kinds fall back to DM.
pub fn resolve_boleto_type(requested: &str) -> (&'static str, &'static str) {
    let requested = requested.trim().to_uppercase();
    BOLETO_TYPES
        .iter()
        .find(|(kind, _)| *kind == requested)
        .copied()
        .unwrap_or(DEFAULT_BOLETO_TYPE)
}

/// Form pairs of the ticket exchange
pub fn ticket_form(request: &BoletoRequest) -> Vec<(String, String)> {
    vec![
        ("scope".to_string(), "readonly".to_string()),
        ("grant_type".to_string(), "client_credentials".to_string()),
        ("client_id".to_string(), request.authentication.username.clone()),
        ("client_secret".to_string(), request.authentication.password.clone()),
    ]
}

/// Token from a ticket answer, or the reason it was refused
pub fn map_ticket_response(raw: &RawResponse) -> Result<String> {
    let parsed = || serde_json::from_str::<TicketResponse>(&raw.body).unwrap_or_default();

    match raw.status {
        200 => {
            let token = parsed().access_token;
            if token.is_empty() {
                Err(Error::Ticket("integration error".to_string()))
            } else {
                Ok(token)
            }
        }
        400 | 500 => Err(Error::Ticket(parsed().error_message)),
        403 => Err(Error::Ticket("403 Forbidden".to_string())),
        _ => Err(Error::Ticket("integration error".to_string())),
    }
}

/// JSON body for a validated request with resolved boleto type
pub fn render_request(request: &BoletoRequest, environment: &str) -> Result<Value> {
    let agreement = &request.agreement;
    let title = &request.title;
    let buyer = &request.buyer;
    let address = &buyer.address;

    let our_number = pad_left(&title.our_number.to_string(), '0', 8);
    let dac = itau_dac(&agreement.agency, &agreement.account, agreement.wallet, &our_number)?;
    let street = join_space(&[
        address.street.as_str(),
        address.number.as_str(),
        address.complement.as_str(),
    ]);

    Ok(json!({
        "tipo_ambiente": environment,
        "tipo_registro": 1,
        "tipo_cobranca": 1,
        "tipo_produto": "00006",
        "subproduto": "00008",
        "beneficiario": {
            "cpf_cnpj_beneficiario": request.recipient.document.number,
            "agencia_beneficiario": agreement.agency,
            "conta_beneficiario": pad_left(&agreement.account, '0', 7),
            "digito_verificador_conta_beneficiario": agreement.account_digit
        },
        "identificador_titulo_empresa": truncate_only(&clear_string(&title.document_number), 25),
        "uso_banco": "",
        "titulo_aceite": "S",
        "pagador": {
            "cpf_cnpj_pagador": buyer.document.number,
            "nome_pagador": truncate_only(&clear_string(&buyer.name), 30),
            "logradouro_pagador": truncate_only(&clear_string(&street), 40),
            "bairro_pagador": truncate_only(&clear_string(&address.district), 15),
            "cidade_pagador": truncate_only(&clear_string(&address.city), 20),
            "uf_pagador": truncate_only(&address.state_code, 2),
            "cep_pagador": extract_numbers(&address.zip_code)
        },
        "tipo_carteira_titulo": agreement.wallet.to_string(),
        "moeda": {
            "codigo_moeda_cnab": "09"
        },
        "nosso_numero": our_number,
        "digito_verificador_nosso_numero": dac.to_string(),
        "data_vencimento": en_date(title.expire_date, "-"),
        "valor_cobrado": pad_left(&title.amount_in_cents.to_string(), '0', 17),
        "especie": title.boleto_type_code,
        "data_emissao": en_date(today(), "-"),
        "tipo_pagamento": 3,
        "indicador_pagamento_parcial": false
    }))
}

/// Route a register answer (or transport failure) to its pattern
pub fn map_response(outcome: Result<RawResponse>) -> Result<BoletoResponse> {
    let mut raw = match outcome {
        Ok(raw) => raw,
        Err(e) if e.is_transport() => return Ok(timeout_response(Some(&e))),
        Err(e) => return Err(e),
    };

    if raw.is_html() {
        warn!(bank = BANK_NAME, status = raw.status, "Bank answered with an HTML page");
        raw.body = HTML_ERROR_BODY.to_string();
        return MAPPING.parse(BANK_NAME, &raw, &ERROR);
    }

    match raw.status {
        200 => MAPPING.parse(BANK_NAME, &raw, &SUCCESS),
        0 | 504 => Ok(timeout_response(None)),
        _ => MAPPING.parse(BANK_NAME, &raw, &ERROR),
    }
}

/// Itaú integration
#[derive(Debug)]
pub struct ItauAdapter {
    validator: Validator,
    transport: Transport,
    ticket_url: String,
    register_url: String,
    environment: String,
    ticket_timeout: Duration,
    register_timeout: Duration,
}

impl ItauAdapter {
    /// Create adapter
    pub fn new(config: &GatewayConfig, certificates: Arc<dyn CertificateProvider>) -> Self {
        let mut validator = Validator::with_generic_rules();
        validator.push(account_rule(5));
        validator.push(agency_rule(4));
        validator.push(validate_account_digit);
        validator.push(boleto_type_rule(BOLETO_TYPES, DEFAULT_BOLETO_TYPE));

        Self {
            validator,
            transport: Transport::plain(BANK_NAME, certificates)
                .accept_invalid_certs(config.accept_invalid_certs),
            ticket_url: config.urls.itau_ticket.clone(),
            register_url: config.urls.itau_register.clone(),
            environment: config.itau_environment.clone(),
            ticket_timeout: config.timeouts.token(),
            register_timeout: config.timeouts.register(),
        }
    }
}

#[async_trait]
impl BankAdapter for ItauAdapter {
    fn bank_number(&self) -> BankNumber {
        BankNumber::Itau
    }

    fn bank_name_integration(&self) -> &'static str {
        BANK_NAME
    }

    fn errors_map(&self) -> Option<&ErrorsMap> {
        None
    }

    fn validator(&self) -> &Validator {
        &self.validator
    }

    async fn get_ticket(&self, request: &BoletoRequest) -> Result<Option<String>> {
        info!(bank = BANK_NAME, url = %self.ticket_url, "Requesting ticket");

        let outbound = OutboundRequest::post_form(&self.ticket_url, ticket_form(request));
        let raw = send_timed(
            &self.transport,
            outbound,
            self.ticket_timeout,
            BANK_NAME,
            OPERATION_TICKET,
            TICKET_METRIC,
        )
        .await?;

        map_ticket_response(&raw).map(Some).map_err(|e| {
            warn!(bank = BANK_NAME, status = raw.status, error = %e, "Ticket refused");
            e
        })
    }

    async fn register_boleto(&self, request: &mut BoletoRequest) -> Result<BoletoResponse> {
        let (kind, code) = resolve_boleto_type(&request.title.boleto_type);
        request.title.boleto_type = kind.to_string();
        request.title.boleto_type_code = code.to_string();

        let body = render_request(request, &self.environment)?;
        info!(bank = BANK_NAME, url = %self.register_url, "Registering boleto");

        let outbound = OutboundRequest::post(
            &self.register_url,
            "application/json",
            serde_json::to_string(&body)?,
        )
        .header("Accept", "application/vnd.itau")
        .header("access_token", request.authentication.authorization_token.as_str())
        .header("itau-chave", request.authentication.access_key.as_str())
        .header("identificador", request.recipient.document.number.as_str());

        let outcome = send_timed(
            &self.transport,
            outbound,
            self.register_timeout,
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
