//! # Boleto Core
//!
//! Pure building blocks shared by every bank integration:
//! - Canonical request/response model
//! - Modulo 10 / Modulo 11 check digits, CPF and CNPJ validation
//! - Febraban barcode assembly and digitable line formatting
//! - Issuer sanity checks on bank-returned identifiers
//! - Ordered validation pipeline
//! - Error taxonomy and status classification
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    Taxonomy     │ ← bank/generic code → status class
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Validation    │ ← ordered predicates, first error wins
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Barcode/Issuer  │ ← 44 digit barcode, 47 digit line
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  Check digits   │ ← mod10, mod11, CPF, CNPJ
//! └─────────────────┘
//! ```
//!
//! No I/O happens in this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod barcode;
pub mod checkdigit;
pub mod error;
pub mod issuer;
pub mod response;
pub mod taxonomy;
pub mod types;
pub mod validation;

pub use error::{Error, Result};
pub use issuer::Issuer;
pub use response::{BoletoResponse, ErrorResponse, Link};
pub use taxonomy::{ErrorsMap, RegistrationOutcome, StatusClass};
pub use types::*;
pub use validation::Validator;
