//! Shared builders for the bank scenarios

#![allow(dead_code)]

use boleto_adapters::{AdapterRegistry, GatewayConfig, InMemoryCertificateStore};
use boleto_core::validation::brazil_today;
use boleto_core::{
    Address, Agreement, Authentication, BankNumber, BoletoRequest, Buyer, Document, Recipient,
    Title,
};
use chrono::Duration;
use std::sync::Arc;

pub const BARCODE: &str = "37691877200000002000098000600016400000504858";
pub const LINE_DIGITS: &str = "37690098080060001640600005048582187720000000200";
pub const LINE_FORMATTED: &str = "37690.09808 00600.016406 00005.048582 1 87720000000200";

/// Mock mode config with every bank pointed at `base`
pub fn config(base: &str) -> GatewayConfig {
    let mut config = GatewayConfig {
        mock_mode: true,
        ..GatewayConfig::default()
    };
    config.timeouts.register_secs = 1;
    config.timeouts.token_secs = 1;
    config.timeouts.default_secs = 1;
    config.urls.jpmorgan = format!("{}/tsapi/v1/boletos", base);
    config.urls.stone = format!("{}/api/v1/barcode_payment_invoices", base);
    config.urls.itau_ticket = format!("{}/identity/connect/token", base);
    config.urls.itau_register = format!("{}/codigo_barras/registro", base);
    config
}

pub fn certificates() -> Arc<InMemoryCertificateStore> {
    Arc::new(
        InMemoryCertificateStore::new()
            .with("jpmorgan_sign_key", include_str!("../fixtures/jwt_private.pem")),
    )
}

pub fn registry(base: &str) -> AdapterRegistry {
    AdapterRegistry::build(&config(base), certificates())
}

pub fn request(bank: BankNumber) -> BoletoRequest {
    let mut request = BoletoRequest::new(bank);
    request.authentication = Authentication {
        username: "client-id".to_string(),
        password: "client-secret".to_string(),
        access_key: "3b5a6e4c-account".to_string(),
        authorization_token: "stone-token".to_string(),
    };
    request.agreement = Agreement {
        agreement_number: 267,
        wallet: 109,
        agency: "57".to_string(),
        account: "12345".to_string(),
        account_digit: "7".to_string(),
        ..Agreement::default()
    };
    request.title = Title {
        expire_date: brazil_today() + Duration::days(5),
        amount_in_cents: 200,
        our_number: 12345678,
        document_number: "1001".to_string(),
        ..Title::default()
    };
    request.recipient = Recipient {
        name: "Empresa Recebedora LTDA".to_string(),
        document: Document {
            doc_type: "CNPJ".to_string(),
            number: "11222333000181".to_string(),
        },
        address: Address::default(),
    };
    request.buyer = Buyer {
        name: "Nome do Comprador".to_string(),
        email: "comprador@teste.com".to_string(),
        document: Document {
            doc_type: "CPF".to_string(),
            number: "12345678909".to_string(),
        },
        address: Address {
            street: "Rua Teste".to_string(),
            number: "2".to_string(),
            complement: "SALA 1".to_string(),
            zip_code: "20931-001".to_string(),
            city: "Rio de Janeiro".to_string(),
            district: "Centro".to_string(),
            state_code: "RJ".to_string(),
        },
    };
    request
}
