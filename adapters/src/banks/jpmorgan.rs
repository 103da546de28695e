//! JPMorgan adapter
//!
//! JSON over mutual TLS. The rendered body is signed with RS256 and the
//! compact token travels as the request body; in mock mode the plain JSON is
//! posted over an ordinary client instead.

use super::{send_timed, timeout_response};
use crate::certificate::{load_pem, CertificateProvider, PemKind};
use crate::config::GatewayConfig;
use crate::connector::BankAdapter;
use crate::metrics::OPERATION_REGISTER;
use crate::signing::JwtSigner;
use crate::template::helpers::{
    cents_to_decimal, doc_type, en_date, extract_numbers, join_space, only_alphabetics,
    only_alphanumerics, only_one_space, remove_all_spaces, today, truncate_only,
};
use crate::template::{ApiMapping, ResponsePattern};
use crate::transport::{ClientIdentity, OutboundRequest, RawResponse, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use boleto_core::taxonomy::{codes, errors_map};
use boleto_core::{BankNumber, BoletoRequest, BoletoResponse, ErrorsMap, StatusClass, Validator};
use once_cell::sync::OnceCell;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const BANK_NAME: &str = "JPMorgan";

const REGISTER_METRIC: &str = "jpmorgan-register-boleto";

/// JPMorgan only issues mercantile duplicates
pub const BOLETO_TYPE: (&str, &str) = ("DM", "02");

/// Width of the our number returned to clients
pub const OUR_NUMBER_WIDTH: usize = 12;

const ENCRYPT_ERROR: &str = "Encript error";

const INTERNAL_ERROR: &str = "Internal Error";

const MAPPING: ApiMapping = ApiMapping {
    code_as_message: &["{}", "Error"],
    join_details: true,
    our_number_width: Some(OUR_NUMBER_WIDTH),
};

const SUCCESS: ResponsePattern = ResponsePattern::Json(
    r#"{
        "resposta": {
            "numCodBarras": "{{barCodeNumber}}",
            "identdNossoNum": "{{ourNumber}}",
            "linhaDigitavel": "{{digitableLine}}"
        }
    }"#,
);

const SERVICE_MESSAGE: ResponsePattern =
    ResponsePattern::Xml(&[("Status", "messageError"), ("Reason", "errorCode")]);

const ERROR_JSON: ResponsePattern = ResponsePattern::Json(
    r#"{
        "errorCode": "{{errorCode}}",
        "errorMsg": "{{messageError}}",
        "resposta": "{{messageDetails}}"
    }"#,
);

const ERROR_LIST: ResponsePattern = ResponsePattern::Json(
    r#"{
        "errors": [{
            "errorCode": "{{errorCode}}",
            "errorMsg": "{{messageError}}",
            "resposta": "{{messageDetails}}"
        }]
    }"#,
);

const BOLETO_ERROR: ResponsePattern = ResponsePattern::Json(
    r#"{
        "numCodRetorno": "{{errorCode}}",
        "mensagem": "{{messageError}}",
        "resposta": "{{messageDetails}}"
    }"#,
);

fn jpmorgan_errors() -> ErrorsMap {
    errors_map(&[
        ("BOL-1", StatusClass::BadGateway),
        ("BOL-2", StatusClass::BadRequest),
        ("BOL-3", StatusClass::BadRequest),
        ("BOL-4", StatusClass::BadRequest),
        ("BOL-5", StatusClass::BadRequest),
        ("BOL-7", StatusClass::BadRequest),
        ("BOL-144", StatusClass::BadRequest),
        ("GCA-001", StatusClass::BadGateway),
        ("GCA-003", StatusClass::BadGateway),
        ("GCA-111", StatusClass::BadRequest),
        ("Signature Verification Failure", StatusClass::InternalServerError),
        ("Authentication Failure", StatusClass::InternalServerError),
        ("Internal Error - Contact Service Provider", StatusClass::BadGateway),
    ])
}

fn to_uint(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

fn payer_text(value: &str, max: usize) -> String {
    truncate_only(&only_alphanumerics(&only_one_space(value)), max)
}

/// JSON body for a request already resolved to the DM boleto type
pub fn render_request(request: &BoletoRequest) -> Value {
    let address = &request.buyer.address;
    let street = join_space(&[
        address.street.as_str(),
        address.number.as_str(),
        address.complement.as_str(),
    ]);
    let amount = cents_to_decimal(request.title.amount_in_cents)
        .to_f64()
        .unwrap_or_default();

    json!({
        "clienteBeneficiario": {
            "cnpjCpfBenfcrioOr": to_uint(&request.recipient.document.number),
            "codAgencia": to_uint(&request.agreement.agency),
            "codBanco": request.bank_number.code(),
            "codCartTit": 1,
            "codContaCorrente": to_uint(&request.agreement.account),
            "tpPessoaBenfcrioOr": doc_type(&request.recipient.document),
            "txtInfCliCed": truncate_only(&request.recipient.name, 80)
        },
        "sacadoOuPagador": {
            "bairroPagdr": payer_text(&address.district, 15),
            "cepPagdr": to_uint(&extract_numbers(&address.zip_code)),
            "cidPagdr": payer_text(&address.city, 15),
            "cnpjCpfPagdr": to_uint(&request.buyer.document.number),
            "logradPagdr": payer_text(&street, 40),
            "nomRzSocPagdr": payer_text(&request.buyer.name, 40),
            "tpPessoaPagdr": doc_type(&request.buyer.document),
            "ufPagdr": truncate_only(&only_alphabetics(&remove_all_spaces(&address.state_code)), 2)
        },
        "titulo": {
            "numDocTit": request.title.document_number,
            "dtVencTit": en_date(request.title.expire_date, "-"),
            "vlrTit": amount,
            "codEspTit": to_uint(&request.title.boleto_type_code),
            "dtEmsTit": en_date(today(), "-"),
            "vlrAbattTit": 0,
            "tpCodPrott": 3,
            "qtdDiaPrott": 0,
            "codMoedaCnab": 9
        },
        "juros": {
            "codJurosTit": 3
        },
        "descontos": {
            "codDesctTit": 0
        }
    })
}

/// Route a bank answer (or transport failure) to its pattern
pub fn map_response(outcome: Result<RawResponse>) -> Result<BoletoResponse> {
    let raw = match outcome {
        Ok(raw) => raw,
        Err(e) if e.is_transport() => return Ok(timeout_response(Some(&e))),
        Err(e) => return Err(e),
    };

    let pattern = match raw.status {
        200 => SUCCESS,
        0 | 504 => return Ok(timeout_response(None)),
        401 | 500 if raw.is_xml() => SERVICE_MESSAGE,
        401 | 500 => ERROR_JSON,
        400 | 403 | 404 => ERROR_LIST,
        409 | 422 => BOLETO_ERROR,
        status => {
            error!(bank = BANK_NAME, status = status, body = %raw.body, "Unexpected bank status");
            return Ok(
                BoletoResponse::from_error(codes::MP500, INTERNAL_ERROR).with_status_code(status),
            );
        }
    };

    MAPPING.parse(BANK_NAME, &raw, &pattern)
}

/// JPMorgan integration
pub struct JpMorganAdapter {
    validator: Validator,
    errors: ErrorsMap,
    transport: Transport,
    certificates: Arc<dyn CertificateProvider>,
    sign_key: String,
    signer: OnceCell<JwtSigner>,
    url: String,
    timeout: Duration,
    mock_mode: bool,
}

impl JpMorganAdapter {
    /// Create adapter. The TLS identity is loaded on warm up or first use.
    pub fn new(config: &GatewayConfig, certificates: Arc<dyn CertificateProvider>) -> Self {
        let transport = if config.mock_mode {
            Transport::plain(BANK_NAME, certificates.clone())
        } else {
            Transport::mutual_tls(
                BANK_NAME,
                ClientIdentity {
                    certificate: config.certificates.jpmorgan_crt.clone(),
                    key: config.certificates.jpmorgan_key.clone(),
                },
                certificates.clone(),
            )
        }
        .accept_invalid_certs(config.accept_invalid_certs);

        Self {
            validator: Validator::with_generic_rules(),
            errors: jpmorgan_errors(),
            transport,
            certificates,
            sign_key: config.certificates.jpmorgan_sign_key.clone(),
            signer: OnceCell::new(),
            url: config.urls.jpmorgan.clone(),
            timeout: config.timeouts.default_timeout(),
            mock_mode: config.mock_mode,
        }
    }

    fn signer(&self) -> Result<&JwtSigner> {
        self.signer.get_or_try_init(|| {
            let pem = load_pem(self.certificates.as_ref(), &self.sign_key, PemKind::PrivateKey)?;
            JwtSigner::from_pem(&pem)
        })
    }

    fn sign(&self, body: &Value) -> Result<String> {
        self.signer()?.sign(body)
    }
}

#[async_trait]
impl BankAdapter for JpMorganAdapter {
    fn bank_number(&self) -> BankNumber {
        BankNumber::JpMorgan
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
        request.title.boleto_type = BOLETO_TYPE.0.to_string();
        request.title.boleto_type_code = BOLETO_TYPE.1.to_string();

        let body = render_request(request);
        let signed = match self.sign(&body) {
            Ok(token) => token,
            Err(e) => {
                error!(bank = BANK_NAME, error = %e, "Failed to sign request body");
                return Ok(BoletoResponse::from_error(codes::MP500, ENCRYPT_ERROR));
            }
        };

        let payload = if self.mock_mode {
            serde_json::to_string(&body)?
        } else {
            signed
        };
        info!(bank = BANK_NAME, url = %self.url, signed = !self.mock_mode, "Registering boleto");

        let outbound = OutboundRequest::post(&self.url, "text/xml", payload);
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

impl std::fmt::Debug for JpMorganAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JpMorganAdapter")
            .field("url", &self.url)
            .field("mock_mode", &self.mock_mode)
            .field("transport", &self.transport)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::fixtures::{request, BARCODE, LINE_DIGITS};

    fn raw(status: u16, content_type: &str, body: &str) -> RawResponse {
        RawResponse {
            status,
            content_type: content_type.to_string(),
            body: body.to_string(),
        }
    }

    fn first_error(response: &BoletoResponse) -> (String, String) {
        let error = response.first_error().unwrap();
        (error.code.clone(), error.message.clone())
    }

    #[test]
    fn test_render_request() {
        let mut req = request(BankNumber::JpMorgan);
        req.title.boleto_type_code = "02".to_string();
        req.buyer.address.state_code = " R J ".to_string();
        req.buyer.address.district = "Jardim   Botânico do Rio#".to_string();

        let body = render_request(&req);

        assert_eq!(body["clienteBeneficiario"]["cnpjCpfBenfcrioOr"], 11222333000181u64);
        assert_eq!(body["clienteBeneficiario"]["codBanco"], 376);
        assert_eq!(body["clienteBeneficiario"]["codAgencia"], 57);
        assert_eq!(body["clienteBeneficiario"]["tpPessoaBenfcrioOr"], 2);
        assert_eq!(body["sacadoOuPagador"]["tpPessoaPagdr"], 1);
        assert_eq!(body["sacadoOuPagador"]["nomRzSocPagdr"], "Nome do Comprador Cliente");
        assert_eq!(body["sacadoOuPagador"]["logradPagdr"], "Rua Teste 2 SALA 1");
        assert_eq!(body["sacadoOuPagador"]["bairroPagdr"], "Jardim Botânico");
        assert_eq!(body["sacadoOuPagador"]["cepPagdr"], 20931001);
        assert_eq!(body["sacadoOuPagador"]["ufPagdr"], "RJ");
        assert_eq!(body["titulo"]["vlrTit"], 2.0);
        assert_eq!(body["titulo"]["codEspTit"], 2);
        assert_eq!(body["titulo"]["numDocTit"], "1001");
        assert_eq!(body["juros"]["codJurosTit"], 3);
    }

    #[test]
    fn test_success_pads_our_number() {
        let body = json!({
            "resposta": {
                "numCodBarras": BARCODE,
                "linhaDigitavel": LINE_DIGITS,
                "identdNossoNum": "123456"
            }
        });

        let response = map_response(Ok(raw(200, "application/json", &body.to_string()))).unwrap();

        assert!(!response.has_errors());
        assert_eq!(response.our_number(), "000000123456");
        assert_eq!(
            response.digitable_line(),
            "37690.09808 00600.016406 00005.048582 1 87720000000200"
        );
    }

    #[test]
    fn test_xml_service_message() {
        let body = "<ServiceMessage>\n  <Status>Error</Status>\n  <Reason>Signature Verification Failure </Reason>\n</ServiceMessage>";
        let response = map_response(Ok(raw(401, "application/xml", body))).unwrap();

        assert_eq!(
            first_error(&response),
            (
                "Signature Verification Failure".to_string(),
                "Signature Verification Failure".to_string()
            )
        );
        assert_eq!(response.status_code(), 401);
    }

    #[test]
    fn test_json_service_error() {
        let body = r#"{"errorCode": "GCA-001", "errorMsg": "Internal Error - Contact Service Provider"}"#;
        let response = map_response(Ok(raw(500, "application/json", body))).unwrap();
        assert_eq!(
            first_error(&response),
            (
                "GCA-001".to_string(),
                "Internal Error - Contact Service Provider".to_string()
            )
        );
        assert_eq!(response.status_code(), 500);

        let body = r#"{"errorCode": "Authentication Failure", "errorMsg": "Error", "resposta": {}}"#;
        let response = map_response(Ok(raw(401, "application/json", body))).unwrap();
        assert_eq!(first_error(&response).1, "Authentication Failure");

        match map_response(Ok(raw(500, "text/plain", "Service Unavailable"))) {
            Err(Error::UnparseableResponse { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_error_list_and_boleto_errors() {
        let body = r#"{"errors": [{"errorCode": "GCA-010", "errorMsg": "The account was not found."}]}"#;
        let response = map_response(Ok(raw(404, "application/json", body))).unwrap();
        assert_eq!(
            first_error(&response),
            ("GCA-010".to_string(), "The account was not found.".to_string())
        );

        let body = r#"{"numCodRetorno": "BOL-144", "mensagem": "Boleto já Existente. Detalhes abaixo:"}"#;
        let response = map_response(Ok(raw(409, "application/json", body))).unwrap();
        assert_eq!(
            first_error(&response),
            ("BOL-144".to_string(), "Boleto já Existente. Detalhes abaixo:".to_string())
        );

        let body = r#"{"numCodRetorno": "BOL-144", "mensagem": "Boleto já Existente.", "resposta": {"boletoBeneficiaryNumber": "4102374718"}}"#;
        let response = map_response(Ok(raw(409, "application/json", body))).unwrap();
        assert_eq!(
            first_error(&response).1,
            "Boleto já Existente. : {boletoBeneficiaryNumber:4102374718}"
        );
    }

    #[test]
    fn test_timeouts_and_unknown_status() {
        let response = map_response(Ok(raw(504, "", ""))).unwrap();
        assert_eq!(
            first_error(&response),
            ("MPTimeout".to_string(), "GatewayTimeout".to_string())
        );

        let response = map_response(Err(Error::Timeout {
            seconds: 40,
            operation: "register".to_string(),
        }))
        .unwrap();
        assert_eq!(first_error(&response).0, "MPTimeout");
        assert!(first_error(&response).1.contains("Timeout after 40s"));

        let response = map_response(Ok(raw(418, "", "teapot"))).unwrap();
        assert_eq!(
            first_error(&response),
            ("MP500".to_string(), "Internal Error".to_string())
        );
    }

    #[test]
    fn test_errors_map() {
        let map = jpmorgan_errors();
        assert_eq!(map["BOL-1"], StatusClass::BadGateway);
        assert_eq!(map["GCA-111"], StatusClass::BadRequest);
        assert_eq!(map["Authentication Failure"], StatusClass::InternalServerError);
        assert_eq!(map.len(), 13);
    }
}
