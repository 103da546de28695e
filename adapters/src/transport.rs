//! HTTP/TLS transport shared by the bank adapters
//!
//! One `Transport` per adapter instance. The reqwest client (and its
//! connection pool) is built lazily exactly once; for mutual-TLS banks that
//! includes loading the client identity from the certificate provider, which
//! is the expensive part.

use crate::certificate::{load_pem, CertificateProvider, PemKind};
use crate::{Error, Result};
use once_cell::sync::OnceCell;
use reqwest::{Client, Identity, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Logical names of a mutual-TLS client certificate and key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Certificate name
    pub certificate: String,
    /// Private key name
    pub key: String,
}

/// Body of an outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Pre-rendered payload with its content type
    Raw {
        /// Content-Type header
        content_type: String,
        /// Payload
        payload: String,
    },
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

/// Fully rendered request, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: String,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Body
    pub body: RequestBody,
}

impl OutboundRequest {
    /// POST with a raw payload
    pub fn post(url: impl Into<String>, content_type: &str, payload: String) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Raw {
                content_type: content_type.to_string(),
                payload,
            },
        }
    }

    /// POST with form pairs
    pub fn post_form(url: impl Into<String>, pairs: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Form(pairs),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Bank answer, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status
    pub status: u16,
    /// Content-Type header, empty when absent
    pub content_type: String,
    /// Body as text
    pub body: String,
}

impl RawResponse {
    /// Body looks like XML
    pub fn is_xml(&self) -> bool {
        self.content_type.contains("xml") || self.body.trim_start().starts_with('<')
    }

    /// Body looks like HTML
    pub fn is_html(&self) -> bool {
        self.content_type.contains("html")
            || self.body.trim_start().to_ascii_lowercase().starts_with("<!doctype html")
            || self.body.trim_start().to_ascii_lowercase().starts_with("<html")
    }
}

/// Lazily built HTTP client for one bank
pub struct Transport {
    bank: String,
    identity: Option<ClientIdentity>,
    accept_invalid_certs: bool,
    certificates: Arc<dyn CertificateProvider>,
    client: OnceCell<Client>,
}

impl Transport {
    /// Plain TLS transport
    pub fn plain(bank: impl Into<String>, certificates: Arc<dyn CertificateProvider>) -> Self {
        Self {
            bank: bank.into(),
            identity: None,
            accept_invalid_certs: false,
            certificates,
            client: OnceCell::new(),
        }
    }

    /// Mutual-TLS transport presenting `identity`
    pub fn mutual_tls(
        bank: impl Into<String>,
        identity: ClientIdentity,
        certificates: Arc<dyn CertificateProvider>,
    ) -> Self {
        Self {
            identity: Some(identity),
            ..Self::plain(bank, certificates)
        }
    }

    /// Skip server certificate verification
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// True once the client has been built
    pub fn is_initialized(&self) -> bool {
        self.client.get().is_some()
    }

    /// Build the client now so construction failures surface early
    pub fn warm_up(&self) -> Result<()> {
        self.client().map(|_| ())
    }

    fn client(&self) -> Result<&Client> {
        self.client.get_or_try_init(|| self.build_client())
    }

    fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(identity) = &self.identity {
            let mut pem = load_pem(self.certificates.as_ref(), &identity.certificate, PemKind::Certificate)?;
            let key = load_pem(self.certificates.as_ref(), &identity.key, PemKind::PrivateKey)?;
            pem.push(b'\n');
            pem.extend_from_slice(&key);

            let identity = Identity::from_pem(&pem).map_err(|e| Error::Certificate {
                name: identity.certificate.clone(),
                reason: e.to_string(),
            })?;
            builder = builder.identity(identity);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        info!(
            bank = %self.bank,
            mutual_tls = self.identity.is_some(),
            "Transport initialised"
        );

        Ok(client)
    }

    /// Send one request bounded by `timeout`.
    ///
    /// Any status code is a successful send; only transport failures are `Err`.
    pub async fn send(
        &self,
        request: OutboundRequest,
        timeout: Duration,
        operation: &str,
    ) -> Result<RawResponse> {
        let client = self.client()?;
        let start = Instant::now();

        info!(bank = %self.bank, operation = operation, url = %request.url, "Sending request to bank");

        let mut builder = client.request(request.method, &request.url).timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Raw { content_type, payload } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(payload),
            RequestBody::Form(pairs) => builder.form(&pairs),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e, timeout, operation))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, timeout, operation))?;

        info!(
            bank = %self.bank,
            operation = operation,
            status = status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Bank responded"
        );
        debug!(bank = %self.bank, body = %body, "Bank response body");

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    fn transport_error(&self, e: reqwest::Error, timeout: Duration, operation: &str) -> Error {
        warn!(bank = %self.bank, operation = operation, error = %e, "Bank call failed");

        if e.is_timeout() {
            Error::Timeout {
                seconds: timeout.as_secs(),
                operation: operation.to_string(),
            }
        } else {
            Error::Connection(e.to_string())
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("bank", &self.bank)
            .field("identity", &self.identity)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
