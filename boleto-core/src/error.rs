//! Error types for boleto core operations

use thiserror::Error;

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input expected to be numeric carried other characters
    #[error("Non-numeric input for {field}: {value:?}")]
    NonNumeric {
        /// Field being computed
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Input does not fit the fixed width of its slot
    #[error("Invalid length for {field}: expected {expected}, got {actual}")]
    InvalidLength {
        /// Field being computed
        field: &'static str,
        /// Expected number of digits
        expected: usize,
        /// Actual number of digits
        actual: usize,
    },

    /// Expiration date precedes the Febraban base date
    #[error("Expiration date {0} precedes the barcode base date")]
    DateBeforeBase(chrono::NaiveDate),

    /// Unknown bank identifier
    #[error("Unknown bank number: {0}")]
    UnknownBank(u16),
}
