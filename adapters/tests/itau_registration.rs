//! Itaú ticket exchange and registration against a mocked bank

mod common;

use boleto_core::{BankNumber, StatusClass};
use common::{registry, request, BARCODE, LINE_DIGITS, LINE_FORMATTED};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TICKET_PATH: &str = "/identity/connect/token";
const REGISTER_PATH: &str = "/codigo_barras/registro";

async fn mount_ticket(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TICKET_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "itau-ticket",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ticket_then_register() {
    let server = MockServer::start().await;
    mount_ticket(&server).await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .and(header("access_token", "itau-ticket"))
        .and(header("itau-chave", "3b5a6e4c-account"))
        .and(header("identificador", "11222333000181"))
        .and(body_partial_json(json!({
            "tipo_ambiente": "1",
            "nosso_numero": "12345678",
            "digito_verificador_nosso_numero": "0",
            "especie": "01",
            "beneficiario": {
                "agencia_beneficiario": "0057",
                "conta_beneficiario": "0012345"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "codigo_barras": BARCODE,
            "numero_linha_digitavel": LINE_DIGITS,
            "nosso_numero": "12345678"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::Itau))
        .await;

    assert_eq!(outcome.status, StatusClass::Ok);
    assert_eq!(outcome.response.digitable_line(), LINE_FORMATTED);
    assert_eq!(outcome.response.our_number(), "12345678");
}

#[tokio::test]
async fn test_forbidden_ticket_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TICKET_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::Itau))
        .await;

    assert_eq!(outcome.status, StatusClass::BadGateway);
    let error = outcome.response.first_error().unwrap();
    assert_eq!(error.code, "MP502");
    assert_eq!(error.message, "403 Forbidden");
}

#[tokio::test]
async fn test_rejected_ticket_keeps_bank_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TICKET_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "errorMessage": "invalid_client" })),
        )
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::Itau))
        .await;

    assert_eq!(outcome.status, StatusClass::BadGateway);
    assert_eq!(outcome.response.first_error().unwrap().message, "invalid_client");
}

#[tokio::test]
async fn test_html_error_page_is_hidden() {
    let server = MockServer::start().await;
    mount_ticket(&server).await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_raw("<html><body>Bad Gateway</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let outcome = registry(&server.uri())
        .register_boleto(request(BankNumber::Itau))
        .await;

    assert_eq!(outcome.status, StatusClass::InternalServerError);
    assert_eq!(outcome.response.first_error().unwrap().code, "MP500");
}

#[tokio::test]
async fn test_invalid_account_digit_never_reaches_the_bank() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut boleto = request(BankNumber::Itau);
    boleto.agreement.account_digit = "77".to_string();
    let outcome = registry(&server.uri()).register_boleto(boleto).await;

    assert_eq!(outcome.status, StatusClass::BadRequest);
}
