//! JPMorgan registration against a mocked bank (mock mode, unsigned body)

mod common;

use boleto_adapters::{AdapterRegistry, InMemoryCertificateStore};
use boleto_core::taxonomy::INTERNAL_ERROR_MESSAGE;
use boleto_core::{BankNumber, StatusClass};
use common::{config, registry, request, BARCODE, LINE_DIGITS};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REGISTER_PATH: &str = "/tsapi/v1/boletos";

#[tokio::test]
async fn test_success_pads_our_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .and(header("Content-Type", "text/xml"))
        .and(body_partial_json(json!({
            "clienteBeneficiario": { "codBanco": 376, "codAgencia": 57 },
            "titulo": { "codEspTit": 2, "numDocTit": "1001" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resposta": {
                "numCodBarras": BARCODE,
                "linhaDigitavel": LINE_DIGITS,
                "identdNossoNum": "12345678"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::JpMorgan))
        .await;

    assert_eq!(outcome.status, StatusClass::Ok);
    assert_eq!(outcome.response.our_number(), "000012345678");
}

#[tokio::test]
async fn test_error_list_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "errorCode": "BOL-2", "errorMsg": "Data de vencimento inválida" }]
        })))
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::JpMorgan))
        .await;

    assert_eq!(outcome.status, StatusClass::BadRequest);
    let error = outcome.response.first_error().unwrap();
    assert_eq!(error.code, "MP400");
    assert_eq!(error.message, "Data de vencimento inválida");
}

#[tokio::test]
async fn test_service_message_is_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_raw(
            "<ServiceMessage><Status>Unauthorized</Status><Reason>Authentication Failure</Reason></ServiceMessage>",
            "application/xml",
        ))
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::JpMorgan))
        .await;

    assert_eq!(outcome.status, StatusClass::InternalServerError);
    assert_eq!(outcome.response.first_error().unwrap().message, INTERNAL_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_plain_text_service_error_is_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_raw("Service Unavailable", "text/plain"))
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::JpMorgan))
        .await;

    assert_eq!(outcome.status, StatusClass::InternalServerError);
    let error = outcome.response.first_error().unwrap();
    assert_eq!(error.code, "MP500");
    assert_eq!(error.message, INTERNAL_ERROR_MESSAGE);
    assert_eq!(outcome.response.status_code(), 500);
}

#[tokio::test]
async fn test_missing_signing_key_never_reaches_the_bank() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let registry = AdapterRegistry::build(
        &config(&server.uri()),
        Arc::new(InMemoryCertificateStore::new()),
    );
    let outcome = registry.register_boleto(request(BankNumber::JpMorgan)).await;

    assert_eq!(outcome.status, StatusClass::InternalServerError);
    assert_eq!(outcome.response.first_error().unwrap().code, "MP500");
}
