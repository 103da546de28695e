//! Error types for adapters
//!
//! These are internal failures. Business failures reported by a bank travel
//! as `BoletoResponse` errors instead.

use thiserror::Error;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Adapter errors
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Timeout
    #[error("Timeout after {seconds}s: {operation}")]
    Timeout {
        /// Timeout duration
        seconds: u64,
        /// Operation
        operation: String,
    },

    /// Ticket exchange rejected by the bank
    #[error("Ticket error: {0}")]
    Ticket(String),

    /// Certificate missing or malformed
    #[error("Certificate {name} unavailable: {reason}")]
    Certificate {
        /// Logical certificate name
        name: String,
        /// Reason
        reason: String,
    },

    /// Request signing failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Request rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// Bank response matched neither the success nor the error shape
    #[error("Unparseable {bank} response (status {status})")]
    UnparseableResponse {
        /// Bank name
        bank: String,
        /// HTTP status
        status: u16,
        /// Raw body, kept for logging
        body: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No adapter registered for the bank
    #[error("Unsupported bank: {0}")]
    UnsupportedAdapter(String),

    /// Adapter construction failed at registry build time
    #[error("Adapter for {bank} unavailable: {reason}")]
    AdapterUnavailable {
        /// Bank name
        bank: String,
        /// Construction failure
        reason: String,
    },

    /// Core algorithm error
    #[error("Core error: {0}")]
    Core(#[from] boleto_core::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML error
    #[error("XML error: {0}")]
    Xml(String),
}

impl Error {
    /// Transport-level failure that callers may retry later
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Connection(_))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Error::Signing(e.to_string())
    }
}
