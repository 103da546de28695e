//! # Boleto Adapters
//!
//! Partner bank integrations for boleto registration:
//! - Adapter contract and registration state machine
//! - Request rendering and response mapping (transformation engine)
//! - Lazily built HTTP/TLS transport with mutual TLS and RS256 signing
//! - Registry with outcome classification
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        Adapter Registry (resolve + classify)        │
//! └────────────┬────────────────────────────────────────┘
//!              │
//!     ┌────────┼────────────────┐
//!     │        │                │
//! ┌───▼─────┐ ┌▼───────┐ ┌──────▼──┐
//! │JPMorgan │ │ Stone  │ │  Itaú   │
//! │ Adapter │ │Adapter │ │ Adapter │
//! └───┬─────┘ └┬───────┘ └──────┬──┘
//!     │        │                │
//!     └────────┼────────────────┘
//!              │
//! ┌────────────▼─────────────────────────────────────┐
//! │  Validator + Templates + Transport + Signing     │
//! └──────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod banks;
pub mod certificate;
pub mod config;
pub mod connector;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod signing;
pub mod telemetry;
pub mod template;
pub mod transport;

pub use certificate::{CertificateProvider, FileCertificateProvider, InMemoryCertificateStore};
pub use config::GatewayConfig;
pub use connector::BankAdapter;
pub use error::{Error, Result};
pub use registry::AdapterRegistry;
