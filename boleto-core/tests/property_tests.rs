//! Property-based tests for the numeric invariants
//!
//! Check digits, barcode/line consistency and the issuer regexes must hold
//! for all inputs, not just the bank fixtures.

use boleto_core::barcode::{
    assemble, barcode_from_digitable_line, digitable_line, BarcodeFields, CURRENCY_REAL,
};
use boleto_core::checkdigit::{mod10, mod10_contributions, mod11, mod11_remainder, TenAs};
use boleto_core::issuer::{fmt_digitable_line, Issuer};
use boleto_core::validation::{validate_fine, Validator};
use boleto_core::{BankNumber, BoletoRequest, Fees, Fine};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn fields(days: i64, amount: u64, free_field: String) -> BarcodeFields {
    BarcodeFields {
        bank_code: "376".to_string(),
        currency: CURRENCY_REAL,
        expire_date: NaiveDate::from_ymd_opt(2000, 7, 3).unwrap() + Duration::days(days),
        amount_in_cents: amount,
        free_field,
    }
}

// ============================================================================
// Check digit invariants
// ============================================================================

proptest! {
    /// Property: every Modulo 10 contribution is folded to a single digit
    #[test]
    fn mod10_contributions_are_single_digits(value in "[0-9]{1,48}") {
        let contributions = mod10_contributions(&value).unwrap();
        prop_assert_eq!(contributions.len(), value.len());
        prop_assert!(contributions.iter().all(|c| *c <= 9));
        prop_assert!(mod10(&value).unwrap() <= 9);
    }

    /// Property: appending the Modulo 10 digit makes the weighted sum a multiple of 10
    #[test]
    fn mod10_digit_closes_the_sum(value in "[0-9]{1,30}") {
        let digit = mod10(&value).unwrap();
        let sum: u32 = mod10_contributions(&value).unwrap().iter().sum::<u32>() + digit;
        prop_assert_eq!(sum % 10, 0);
    }

    /// Property: Modulo 11 always renders a single symbol
    #[test]
    fn mod11_renders_one_symbol(value in "[0-9]{1,20}", base in 7u32..=9) {
        let remainder = mod11_remainder(&value, base).unwrap();
        prop_assert!(remainder < 11);

        let zero = mod11(&value, base, TenAs::Zero).unwrap();
        let x = mod11(&value, base, TenAs::X).unwrap();
        prop_assert_eq!(zero.len(), 1);
        prop_assert!(zero.chars().all(|c| c.is_ascii_digit()));
        if remainder == 1 {
            prop_assert_eq!(x, "X");
        } else {
            prop_assert_eq!(x, zero);
        }
    }

    /// Property: non-digit input is rejected rather than skipped
    #[test]
    fn check_digits_reject_letters(prefix in "[0-9]{0,5}", letter in "[a-zA-Z ]", suffix in "[0-9]{0,5}") {
        let value = format!("{}{}{}", prefix, letter, suffix);
        prop_assert!(mod10(&value).is_err());
        prop_assert!(mod11(&value, 9, TenAs::Zero).is_err());
    }
}

// ============================================================================
// Barcode invariants
// ============================================================================

proptest! {
    /// Property: the line of an assembled barcode rebuilds the same barcode
    #[test]
    fn line_regroups_barcode(
        days in 0i64..20_000,
        amount in 1u64..9_999_999_999,
        free in "[0-9]{25}",
    ) {
        let barcode = assemble(&fields(days, amount, free)).unwrap();
        prop_assert_eq!(barcode.len(), 44);

        let line = digitable_line(&barcode).unwrap();
        prop_assert_eq!(barcode_from_digitable_line(&line).unwrap(), barcode.clone());
        prop_assert!(Issuer::new(barcode, line).is_consistent());
    }

    /// Property: the general check digit is never 0
    #[test]
    fn barcode_digit_never_zero(days in 0i64..20_000, amount in 1u64..1_000_000, free in "[0-9]{25}") {
        let barcode = assemble(&fields(days, amount, free)).unwrap();
        prop_assert_ne!(&barcode[4..5], "0");
    }

    /// Property: formatting is idempotent
    #[test]
    fn fmt_digitable_line_idempotent(digits in "[0-9]{47}") {
        let once = fmt_digitable_line(&digits);
        prop_assert_eq!(fmt_digitable_line(&once), once.clone());
        prop_assert!(Issuer::new("1", once).is_valid_digitable_line());
    }
}

// ============================================================================
// Issuer rejections
// ============================================================================

proptest! {
    /// Property: a barcode with any non-digit is rejected
    #[test]
    fn issuer_rejects_non_digit_barcode(
        prefix in "[0-9]{0,20}",
        bad in "[^0-9]",
        suffix in "[0-9]{0,20}",
    ) {
        let barcode = format!("{}{}{}", prefix, bad, suffix);
        prop_assert!(!Issuer::new(barcode, "").is_valid_barcode());
    }

    /// Property: whitespace-only input is never valid
    #[test]
    fn issuer_rejects_blank(blank in "[ \t]{0,10}") {
        let issuer = Issuer::new(blank.clone(), blank);
        prop_assert!(!issuer.is_valid_barcode());
        prop_assert!(!issuer.is_valid_digitable_line());
    }

    /// Property: dropping a digit from a block breaks the line shape
    #[test]
    fn issuer_rejects_short_blocks(digits in "[0-9]{47}", drop in 0usize..32) {
        let line = fmt_digitable_line(&digits);
        let positions: Vec<usize> = line
            .char_indices()
            .filter(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .collect();
        let mut broken = line.clone();
        broken.remove(positions[drop]);
        prop_assert!(!Issuer::new("1", broken).is_valid_digitable_line());
    }
}

// ============================================================================
// Validation invariants
// ============================================================================

proptest! {
    /// Property: a fine passes iff exactly one rate is positive and it starts after day 0
    #[test]
    fn fine_exclusive_rate(amount in 0u64..1_000, percentage in 0u32..500, days in 0u32..5) {
        let mut request = BoletoRequest::new(BankNumber::Stone);
        request.title.fees = Some(Fees {
            fine: Some(Fine {
                days_after_expiration_date: days,
                amount_in_cents: amount,
                percentage_on_total: Decimal::new(percentage as i64, 2),
            }),
            interest: None,
        });

        let exclusive = (amount > 0) != (percentage > 0);
        let expected = exclusive && days >= 1;
        prop_assert_eq!(validate_fine(&mut request).is_ok(), expected);
    }

    /// Property: only the first failing rule is reported
    #[test]
    fn validator_short_circuits(first in 0usize..4) {
        let mut validator = Validator::new();
        for i in 0..4usize {
            validator.push(move |_: &mut BoletoRequest| {
                if i >= first {
                    Err(boleto_core::ErrorResponse::new(format!("R{}", i), "fail"))
                } else {
                    Ok(())
                }
            });
        }

        let mut request = BoletoRequest::new(BankNumber::JpMorgan);
        let err = validator.assert(&mut request).unwrap_err();
        prop_assert_eq!(err.code, format!("R{}", first));
    }
}
