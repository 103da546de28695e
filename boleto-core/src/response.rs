//! Canonical registration result

use serde::{Deserialize, Serialize};

/// One canonical error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Canonical or bank-native code
    pub code: String,
    /// Human readable message
    pub message: String,
}

impl ErrorResponse {
    /// Create new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Hypermedia link attached by the outer layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL
    pub href: String,
    /// Relation
    pub rel: String,
    /// HTTP method
    pub method: String,
}

/// Registration result: either the slip identifiers or a non-empty error list
///
/// The two states are exclusive; the only way to build a response is through
/// [`BoletoResponse::success`] or [`BoletoResponse::failure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoletoResponse {
    #[serde(skip)]
    status_code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ErrorResponse>,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    digitable_line: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    bar_code_number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    our_number: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    links: Vec<Link>,
}

impl BoletoResponse {
    /// Successful registration
    pub fn success(
        bar_code_number: impl Into<String>,
        digitable_line: impl Into<String>,
        our_number: impl Into<String>,
    ) -> Self {
        Self {
            status_code: 200,
            errors: Vec::new(),
            id: String::new(),
            digitable_line: digitable_line.into(),
            bar_code_number: bar_code_number.into(),
            our_number: our_number.into(),
            links: Vec::new(),
        }
    }

    /// Failed registration. An empty list is replaced by a generic internal error.
    pub fn failure(errors: Vec<ErrorResponse>) -> Self {
        let errors = if errors.is_empty() {
            vec![ErrorResponse::new(
                crate::taxonomy::codes::MP500,
                crate::taxonomy::INTERNAL_ERROR_MESSAGE,
            )]
        } else {
            errors
        };

        Self {
            status_code: 0,
            errors,
            id: String::new(),
            digitable_line: String::new(),
            bar_code_number: String::new(),
            our_number: String::new(),
            links: Vec::new(),
        }
    }

    /// Failed registration with a single error
    pub fn from_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::failure(vec![ErrorResponse::new(code, message)])
    }

    /// Attach the bank HTTP status observed for this attempt
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Attach the identifier assigned by the persistence layer
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach links
    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    /// Bank HTTP status (0 when no bank call completed)
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// True when the attempt failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors, empty on success
    pub fn errors(&self) -> &[ErrorResponse] {
        &self.errors
    }

    /// First error, if any
    pub fn first_error(&self) -> Option<&ErrorResponse> {
        self.errors.first()
    }

    /// Consume into the error list
    pub fn into_errors(self) -> Vec<ErrorResponse> {
        self.errors
    }

    /// Identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Formatted digitable line
    pub fn digitable_line(&self) -> &str {
        &self.digitable_line
    }

    /// 44 digit barcode
    pub fn bar_code_number(&self) -> &str {
        &self.bar_code_number
    }

    /// Bank document identifier
    pub fn our_number(&self) -> &str {
        &self.our_number
    }

    /// Links
    pub fn links(&self) -> &[Link] {
        &self.links
    }
}
