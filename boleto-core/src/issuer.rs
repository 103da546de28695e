//! Issuer sanity checks on bank-returned barcode and digitable line
//!
//! Format-only regex checks (ASCII digits and whitespace only), plus a
//! consistency check that the line regroups the barcode. Both run after a
//! bank reports success.

use crate::barcode::{barcode_from_digitable_line, format_digitable_line};
use once_cell::sync::Lazy;
use regex::Regex;

static BARCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^\d+$").expect("static barcode regex"));

static DIGITABLE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)^\d{5}\.\d{5}\s\d{5}\.\d{6}\s\d{5}\.\d{6}\s\d{1}\s\d+$")
        .expect("static digitable line regex")
});

/// Bank-returned identifiers of a registered boleto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    barcode: String,
    digitable_line: String,
}

impl Issuer {
    /// Create new issuer check
    pub fn new(barcode: impl Into<String>, digitable_line: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            digitable_line: digitable_line.into(),
        }
    }

    /// Barcode is all digits
    pub fn is_valid_barcode(&self) -> bool {
        BARCODE_RE.is_match(&self.barcode)
    }

    /// Line matches the canonical grouping
    pub fn is_valid_digitable_line(&self) -> bool {
        DIGITABLE_LINE_RE.is_match(&self.digitable_line)
    }

    /// Both identifiers describe the same 44 digit barcode
    pub fn is_consistent(&self) -> bool {
        self.is_valid_barcode()
            && self.is_valid_digitable_line()
            && barcode_from_digitable_line(&self.digitable_line)
                .map(|rebuilt| rebuilt == self.barcode)
                .unwrap_or(false)
    }
}

/// Canonical grouping for a bank-returned line.
///
/// An already grouped line is kept; otherwise non-digits are dropped and the
/// 47 digits are regrouped.
pub fn fmt_digitable_line(line: &str) -> String {
    let trimmed = line.trim();
    if DIGITABLE_LINE_RE.is_match(trimmed) {
        return trimmed.to_string();
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    format_digitable_line(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARCODE: &str = "37691877200000002000098000600016400000504858";
    const LINE: &str = "37690.09808 00600.016406 00005.048582 1 87720000000200";

    #[test]
    fn test_accepts_documented_shapes() {
        let issuer = Issuer::new(BARCODE, LINE);
        assert!(issuer.is_valid_barcode());
        assert!(issuer.is_valid_digitable_line());
        assert!(issuer.is_consistent());
    }

    #[test]
    fn test_rejects_malformed() {
        for barcode in ["", "   ", "3769187720000000200009800060001640000050485a", "1 2"] {
            assert!(!Issuer::new(barcode, LINE).is_valid_barcode(), "{barcode:?}");
        }

        for line in [
            "",
            "   ",
            "37690.09808 00600.016406 00005.048582 1",
            "37690-09808 00600.016406 00005.048582 1 87720000000200",
            "3769009808006000164060000504858218772000000020",
            "37690.09808 00600.016406 00005.048582 X 87720000000200",
        ] {
            assert!(!Issuer::new(BARCODE, line).is_valid_digitable_line(), "{line:?}");
        }
    }

    #[test]
    fn test_inconsistent_line() {
        let issuer = Issuer::new(
            "37691877200000002000098000600016400000504859",
            LINE,
        );
        assert!(issuer.is_valid_barcode());
        assert!(!issuer.is_consistent());
    }

    #[test]
    fn test_fmt_digitable_line() {
        assert_eq!(
            fmt_digitable_line("37690098080060001640600005048582187720000000200"),
            LINE
        );
        assert_eq!(fmt_digitable_line(LINE), LINE);
        assert_eq!(
            fmt_digitable_line(" 37690.09808.00600.016406.00005.048582.1.87720000000200 "),
            LINE
        );
    }
}
