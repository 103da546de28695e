//! Febraban barcode assembly and digitable line formatting
//!
//! ```text
//! barcode (44):  BBB M D FFFF VVVVVVVVVV LLLLLLLLLLLLLLLLLLLLLLLLL
//!                bank cur dv factor amount      free field (25)
//!
//! line (47):     BBBMLLLLLc LLLLLLLLLLc LLLLLLLLLLc D FFFFVVVVVVVVVV
//! ```
//!
//! `assemble` and the bank free-field builders are not used by any adapter
//! yet; registered banks return their own barcode.

use crate::checkdigit::{barcode_digit, itau_dac, mod10};
use crate::{Error, Result};
use chrono::NaiveDate;

/// Currency code for BRL
pub const CURRENCY_REAL: char = '9';

/// Barcode length
pub const BARCODE_LEN: usize = 44;

/// Unformatted digitable line length
pub const DIGITABLE_LINE_LEN: usize = 47;

/// Free field length
pub const FREE_FIELD_LEN: usize = 25;

const FACTOR_ROLLOVER_DAYS: i64 = 10_000;
const FACTOR_CYCLE: i64 = 9_000;
const FACTOR_RESTART: i64 = 1_000;

/// Febraban base date for the expiration factor
pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1997, 10, 7).unwrap_or(NaiveDate::MIN)
}

/// Days since the base date, restarting at 1000 once 9999 is exceeded
pub fn expiration_factor(date: NaiveDate) -> Result<u16> {
    let days = (date - base_date()).num_days();
    if days < 0 {
        return Err(Error::DateBeforeBase(date));
    }

    let factor = if days < FACTOR_ROLLOVER_DAYS {
        days
    } else {
        (days - FACTOR_ROLLOVER_DAYS) % FACTOR_CYCLE + FACTOR_RESTART
    };

    Ok(factor as u16)
}

/// Fields that make up a barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeFields {
    /// Three digit bank code
    pub bank_code: String,
    /// Currency code
    pub currency: char,
    /// Expiration date
    pub expire_date: NaiveDate,
    /// Amount in cents
    pub amount_in_cents: u64,
    /// Bank-defined free field (25 digits)
    pub free_field: String,
}

fn ensure_len(field: &'static str, value: &str, expected: usize) -> Result<()> {
    if value.len() != expected {
        return Err(Error::InvalidLength {
            field,
            expected,
            actual: value.len(),
        });
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::NonNumeric {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Assemble the 44 digit barcode
pub fn assemble(fields: &BarcodeFields) -> Result<String> {
    ensure_len("bank_code", &fields.bank_code, 3)?;
    ensure_len("free_field", &fields.free_field, FREE_FIELD_LEN)?;

    let amount = format!("{:010}", fields.amount_in_cents);
    if amount.len() != 10 {
        return Err(Error::InvalidLength {
            field: "amount",
            expected: 10,
            actual: amount.len(),
        });
    }

    let factor = expiration_factor(fields.expire_date)?;
    let without_digit = format!(
        "{}{}{:04}{}{}",
        fields.bank_code, fields.currency, factor, amount, fields.free_field
    );
    let digit = barcode_digit(&without_digit)?;

    Ok(format!(
        "{}{}{}",
        &without_digit[..4],
        digit,
        &without_digit[4..]
    ))
}

/// Unformatted 47 digit line for a barcode
pub fn digitable_line_digits(barcode: &str) -> Result<String> {
    ensure_len("barcode", barcode, BARCODE_LEN)?;

    let free = &barcode[19..];
    let block1 = format!("{}{}", &barcode[..4], &free[..5]);
    let block2 = &free[5..15];
    let block3 = &free[15..25];

    Ok(format!(
        "{}{}{}{}{}{}{}{}",
        block1,
        mod10(&block1)?,
        block2,
        mod10(block2)?,
        block3,
        mod10(block3)?,
        &barcode[4..5],
        &barcode[5..19]
    ))
}

/// Group 47 digits as `00000.00000 00000.000000 00000.000000 0 00000000000000`
pub fn format_digitable_line(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + 7);
    for (i, c) in digits.chars().enumerate() {
        match i {
            5 | 15 | 26 => out.push('.'),
            10 | 21 | 32 | 33 => out.push(' '),
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Formatted digitable line for a barcode
pub fn digitable_line(barcode: &str) -> Result<String> {
    Ok(format_digitable_line(&digitable_line_digits(barcode)?))
}

/// Rebuild the barcode carried by a digitable line (formatted or not)
pub fn barcode_from_digitable_line(line: &str) -> Result<String> {
    let digits: String = line.chars().filter(|c| !c.is_whitespace() && *c != '.').collect();
    ensure_len("digitable_line", &digits, DIGITABLE_LINE_LEN)?;

    Ok(format!(
        "{}{}{}{}{}{}",
        &digits[..4],
        &digits[32..33],
        &digits[33..47],
        &digits[4..9],
        &digits[10..20],
        &digits[21..31]
    ))
}

// =========================================================================
// BANK FREE FIELDS
// =========================================================================

/// Itaú: wallet(3) + our number(8) + DAC + agency(4) + account(5) + DAC + "000"
pub fn itau_free_field(wallet: u16, our_number: u64, agency: &str, account: &str) -> Result<String> {
    let our_number = format!("{:08}", our_number);
    let agency = format!("{:0>4}", agency);
    let account = format!("{:0>5}", account);
    let dac = itau_dac(&agency, &account, wallet, &our_number)?;
    let account_dac = mod10(&format!("{}{}", agency, account))?;

    let free = format!(
        "{:03}{}{}{}{}{}000",
        wallet, our_number, dac, agency, account, account_dac
    );
    ensure_len("free_field", &free, FREE_FIELD_LEN)?;
    Ok(free)
}

/// Bradesco: agency(4) + wallet(2) + our number(11) + account(7) + "0"
pub fn bradesco_free_field(agency: &str, wallet: u16, our_number: u64, account: &str) -> Result<String> {
    let free = format!(
        "{:0>4}{:02}{:011}{:0>7}0",
        agency, wallet, our_number, account
    );
    ensure_len("free_field", &free, FREE_FIELD_LEN)?;
    Ok(free)
}

/// BradescoShopFacil receives the account with its digit appended.
///
/// The digit is removed from the account slot and placed in the last
/// position of the free field instead of the fixed zero.
pub fn bradesco_shopfacil_free_field(
    agency: &str,
    wallet: u16,
    our_number: u64,
    account_with_digit: &str,
) -> Result<String> {
    let split = account_with_digit.len().saturating_sub(1);
    let (account, digit) = account_with_digit.split_at(split);
    if digit.is_empty() {
        return Err(Error::InvalidLength {
            field: "account",
            expected: 8,
            actual: 0,
        });
    }

    let free = format!(
        "{:0>4}{:02}{:011}{:0>7}{}",
        agency, wallet, our_number, account, digit
    );
    ensure_len("free_field", &free, FREE_FIELD_LEN)?;
    Ok(free)
}
