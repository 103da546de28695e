//! Modulo 10 / Modulo 11 check digits and taxpayer document validation
//!
//! All calculators walk the digits right to left. Inputs must be ASCII
//! digits; anything else is rejected instead of being silently skipped.

use crate::{Error, Result};

/// Standard Modulo 11 weight cycle upper bound (weights 2..=9)
pub const MOD11_DEFAULT_BASE: u32 = 9;

/// Bradesco our-number weight cycle upper bound (weights 2..=7)
pub const MOD11_BRADESCO_BASE: u32 = 7;

/// Itaú wallets whose DAC ignores agency and account
pub const ITAU_WALLET_ONLY_DAC: [u16; 4] = [126, 131, 146, 168];

fn digits_of(field: &'static str, value: &str) -> Result<Vec<u32>> {
    value
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::NonNumeric {
            field,
            value: value.to_string(),
        })
}

// =========================================================================
// MODULO 10
// =========================================================================

/// Per-position contributions of the Modulo 10 sum, rightmost digit first.
///
/// Weights alternate 2, 1 starting from the right; a product above 9 is
/// folded into the sum of its digits, so every contribution is at most 9.
pub fn mod10_contributions(value: &str) -> Result<Vec<u32>> {
    let digits = digits_of("mod10", value)?;

    Ok(digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            let weight = if i % 2 == 0 { 2 } else { 1 };
            let product = d * weight;
            if product > 9 {
                product / 10 + product % 10
            } else {
                product
            }
        })
        .collect())
}

/// Modulo 10 check digit
pub fn mod10(value: &str) -> Result<u32> {
    let sum: u32 = mod10_contributions(value)?.iter().sum();
    Ok((10 - sum % 10) % 10)
}

// =========================================================================
// MODULO 11
// =========================================================================

/// Rendering of a Modulo 11 result of 10
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenAs {
    /// Render as "0" (agency and account digits)
    Zero,
    /// Render as "X" (some wallet and our-number digits)
    X,
}

/// Weighted sum remainder with weights cycling 2..=base from the right
pub fn mod11_remainder(value: &str, base: u32) -> Result<u32> {
    let digits = digits_of("mod11", value)?;
    let span = base.max(2) - 1;

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| d * (2 + (i as u32 % span)))
        .sum();

    Ok(sum % 11)
}

/// Modulo 11 digit: `11 - remainder`, with 11 rendered as "0" and 10 per `ten`
pub fn mod11(value: &str, base: u32, ten: TenAs) -> Result<String> {
    let digit = 11 - mod11_remainder(value, base)?;
    Ok(match digit {
        11 => "0".to_string(),
        10 => match ten {
            TenAs::Zero => "0".to_string(),
            TenAs::X => "X".to_string(),
        },
        d => d.to_string(),
    })
}

/// Barcode general check digit over the other 43 digits (0, 10 and 11 become 1)
pub fn barcode_digit(value: &str) -> Result<u32> {
    if value.len() != 43 {
        return Err(Error::InvalidLength {
            field: "barcode",
            expected: 43,
            actual: value.len(),
        });
    }

    let digit = 11 - mod11_remainder(value, MOD11_DEFAULT_BASE)?;
    Ok(match digit {
        0 | 10 | 11 => 1,
        d => d,
    })
}

/// Our number followed by its Modulo 11 digit (Citibank, Santander)
pub fn our_number_with_mod11(our_number: u64) -> Result<String> {
    let value = our_number.to_string();
    let digit = mod11(&value, MOD11_DEFAULT_BASE, TenAs::Zero)?;
    Ok(format!("{}{}", value, digit))
}

/// Bradesco our-number digit over wallet + 11 digit number.
///
/// Remainder 0 gives "0", remainder 1 gives "P".
pub fn bradesco_our_number_digit(wallet: u16, our_number: &str) -> Result<String> {
    let value = format!("{:02}{:0>11}", wallet, our_number);
    Ok(match mod11_remainder(&value, MOD11_BRADESCO_BASE)? {
        0 => "0".to_string(),
        1 => "P".to_string(),
        r => (11 - r).to_string(),
    })
}

/// Banco do Brasil agency digit (4 digits, "X" for 10)
pub fn bb_agency_digit(agency: &str) -> Result<String> {
    mod11(&format!("{:0>4}", agency), MOD11_DEFAULT_BASE, TenAs::X)
}

/// Banco do Brasil account digit (8 digits, "X" for 10)
pub fn bb_account_digit(account: &str) -> Result<String> {
    mod11(&format!("{:0>8}", account), MOD11_DEFAULT_BASE, TenAs::X)
}

/// Itaú DAC over agency + account + wallet + our number
pub fn itau_dac(agency: &str, account: &str, wallet: u16, our_number: &str) -> Result<u32> {
    if ITAU_WALLET_ONLY_DAC.contains(&wallet) {
        mod10(&format!("{:03}{:0>8}", wallet, our_number))
    } else {
        mod10(&format!(
            "{:0>4}{:0>5}{:03}{:0>8}",
            agency, account, wallet, our_number
        ))
    }
}

// =========================================================================
// CPF / CNPJ
// =========================================================================

fn taxpayer_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

/// Validate an 11 digit CPF, check digits included
pub fn is_valid_cpf(number: &str) -> bool {
    let Ok(digits) = digits_of("cpf", number) else {
        return false;
    };
    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first = taxpayer_digit(&digits[..9], &[10, 9, 8, 7, 6, 5, 4, 3, 2]);
    let second = taxpayer_digit(&digits[..10], &[11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);
    digits[9] == first && digits[10] == second
}

/// Validate a 14 digit CNPJ, check digits included
pub fn is_valid_cnpj(number: &str) -> bool {
    let Ok(digits) = digits_of("cnpj", number) else {
        return false;
    };
    if digits.len() != 14 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first = taxpayer_digit(&digits[..12], &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    let second = taxpayer_digit(&digits[..13], &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    digits[12] == first && digits[13] == second
}
