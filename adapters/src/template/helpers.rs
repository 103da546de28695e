//! Helper table used while rendering bank payloads
//!
//! Pure functions only: date formats, document formats, cents to decimal
//! strings, character whitelists and fee arithmetic. Monetary math uses
//! `rust_decimal`, never floats.

use boleto_core::checkdigit::is_valid_cpf;
use boleto_core::validation::brazil_today;
use boleto_core::{Document, Fine, Interest};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::*;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const ACCENTED: &str = "ÁÉÍÓÚÀÈÌÒÙÂÊÎÔÛÃÕáéíóúàèìòùâêîôûãõç";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D+").expect("static regex"));

static JSON_CONTROL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\t\x0C\r\\]").expect("static regex"));

static SPECIAL_CHARACTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"[^a-zA-Z0-9{},.\-\s]+", ACCENTED)).expect("static regex")
});

static NON_ALPHANUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"[^a-zA-Z{}0-9\s]+", ACCENTED)).expect("static regex"));

static NON_ALPHABETIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"[^a-zA-Z{}\s]+", ACCENTED)).expect("static regex"));

static CITIBANK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9.;@\-/\s]+").expect("static regex"));

const CAIXA_SPECIAL: &str = ",/()*=-+!:?.;_'";

// =========================================================================
// DATES
// =========================================================================

/// Current date in Brazil
pub fn today() -> NaiveDate {
    brazil_today()
}

/// `dd/mm/yyyy`
pub fn br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `yyyy<del>mm<del>dd`
pub fn en_date(date: NaiveDate, delimiter: &str) -> String {
    date.format(&format!("%Y{0}%m{0}%d", delimiter)).to_string()
}

/// `ddmmyyyy`
pub fn br_date_without_delimiter(date: NaiveDate) -> String {
    date.format("%d%m%Y").to_string()
}

/// `yyyymmdd`
pub fn en_date_without_delimiter(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `yyyymmddHHMMSS`
pub fn full_date(moment: NaiveDateTime) -> String {
    moment.format("%Y%m%d%H%M%S").to_string()
}

/// Date shifted by `days`
pub fn date_plus_days(date: NaiveDate, days: u32) -> NaiveDate {
    date + Duration::days(i64::from(days))
}

/// Date shifted by `days - 1`, for banks that count the first day as day zero
pub fn date_plus_days_considering_zero_as_start(date: NaiveDate, days: u32) -> NaiveDate {
    date_plus_days(date, days.saturating_sub(1))
}

// =========================================================================
// DOCUMENTS
// =========================================================================

/// Numeric person type: 1 for CPF, 2 otherwise
pub fn doc_type(document: &Document) -> u8 {
    if document.is_cpf() {
        1
    } else {
        2
    }
}

fn group(value: &str, separators: &[(usize, char)]) -> String {
    let mut out = String::with_capacity(value.len() + separators.len());
    for (i, c) in value.chars().enumerate() {
        if let Some((_, sep)) = separators.iter().find(|(at, _)| *at == i) {
            out.push(*sep);
        }
        out.push(c);
    }
    out
}

/// `000.000.000-00`
pub fn fmt_cpf(number: &str) -> String {
    group(number, &[(3, '.'), (6, '.'), (9, '-')])
}

/// `00.000.000/0000-00`
pub fn fmt_cnpj(number: &str) -> String {
    group(number, &[(2, '.'), (5, '.'), (8, '/'), (12, '-')])
}

/// CPF format when the number is a valid CPF, CNPJ format otherwise
pub fn fmt_doc(document: &Document) -> String {
    if is_valid_cpf(&document.number) {
        fmt_cpf(&document.number)
    } else {
        fmt_cnpj(&document.number)
    }
}

// =========================================================================
// AMOUNTS
// =========================================================================

/// Cents as `reais.centavos`
pub fn to_float_str(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Cents as `reais,centavos`
pub fn fmt_number(cents: u64) -> String {
    format!("{},{:02}", cents / 100, cents % 100)
}

/// Cents as an exact decimal amount in reais
pub fn cents_to_decimal(cents: u64) -> Decimal {
    Decimal::from(cents) / Decimal::ONE_HUNDRED
}

/// Parse a decimal string, zero when malformed
pub fn str_to_decimal(value: &str) -> Decimal {
    Decimal::from_str(value.trim()).unwrap_or(Decimal::ZERO)
}

fn with_scale(value: Decimal, places: u32, strategy: RoundingStrategy) -> String {
    let mut value = value.round_dp_with_strategy(places, strategy);
    value.rescale(places);
    value.to_string()
}

/// Round half to even and render exactly `places` decimals (`%.Nf`)
pub fn decimal_to_string(value: Decimal, places: u32) -> String {
    with_scale(value, places, RoundingStrategy::MidpointNearestEven)
}

/// Truncate toward zero and render exactly `places` decimals
pub fn truncate_decimal(value: Decimal, places: u32) -> String {
    with_scale(value, places, RoundingStrategy::ToZero)
}

// =========================================================================
// STRINGS
// =========================================================================

/// Left-pad with `pad` up to `total` characters
pub fn pad_left(value: &str, pad: char, total: usize) -> String {
    let len = value.chars().count();
    if len >= total {
        return value.to_string();
    }
    let mut out: String = std::iter::repeat(pad).take(total - len).collect();
    out.push_str(value);
    out
}

/// Leading and trailing whitespace removed
pub fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Join with single spaces, keeping empty parts
pub fn join_space(parts: &[&str]) -> String {
    parts.join(" ")
}

/// First `max` characters
pub fn truncate_only(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

fn strip_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Accents stripped, anything outside code points 32..=122 dropped
pub fn clear_string(value: &str) -> String {
    strip_accents(value)
        .chars()
        .filter(|c| (' '..='z').contains(c))
        .collect()
}

/// Caixa whitelist. Rejected characters become blanks so field width is kept.
pub fn clear_string_caixa(value: &str) -> String {
    strip_accents(value)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || CAIXA_SPECIAL.contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Citibank whitelist, truncated to `max` bytes
pub fn sanitize_citibank(value: &str, max: usize) -> String {
    let cleared = CITIBANK_RE.replace_all(&clear_string(value), "").into_owned();
    cleared.chars().take(max).collect()
}

/// Letters (accented included), digits and whitespace
pub fn only_alphanumerics(value: &str) -> String {
    NON_ALPHANUMERIC_RE.replace_all(value, "").into_owned()
}

/// Letters (accented included) and whitespace
pub fn only_alphabetics(value: &str) -> String {
    NON_ALPHABETIC_RE.replace_all(value, "").into_owned()
}

/// Whitespace runs collapsed to one space
pub fn only_one_space(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").into_owned()
}

/// All whitespace removed
pub fn remove_all_spaces(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, "").into_owned()
}

/// Digits only
pub fn extract_numbers(value: &str) -> String {
    NON_DIGIT_RE.replace_all(value, "").into_owned()
}

/// Control characters that break JSON string literals removed
pub fn escape_string_on_json(value: &str) -> String {
    JSON_CONTROL_RE
        .replace_all(&value.replace('\u{8}', ""), "")
        .into_owned()
}

/// Letters, digits, `,`, `.`, `-` and whitespace
pub fn remove_special_character(value: &str) -> String {
    SPECIAL_CHARACTER_RE.replace_all(value, "").into_owned()
}

pub use boleto_core::issuer::fmt_digitable_line;

// =========================================================================
// FEES AND INTEREST
// =========================================================================

/// `amount` as a percentage of `total`
pub fn convert_amount_in_cents_to_percent(total: u64, amount: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(amount) / Decimal::from(total) * Decimal::ONE_HUNDRED
}

/// Daily `amount` as a monthly (30 day) percentage of `total`
pub fn convert_amount_in_cents_to_percent_per_day(total: u64, amount: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(amount) * Decimal::from(30) / Decimal::from(total) * Decimal::ONE_HUNDRED
}

/// Fee in reais: the fixed amount when set, otherwise the percentage of the title
pub fn calculate_fees(amount_in_cents: u64, percentage: Decimal, title_amount: u64) -> Decimal {
    if amount_in_cents > 0 {
        return cents_to_decimal(amount_in_cents);
    }
    if percentage <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    percentage / Decimal::ONE_HUNDRED * cents_to_decimal(title_amount)
}

/// Interest in reais per day. Monthly percentages are spread over 30 days.
pub fn calculate_interest_by_day(
    amount_in_cents: u64,
    percentage: Decimal,
    title_amount: u64,
) -> Decimal {
    let amount = calculate_fees(amount_in_cents, percentage, title_amount);
    if percentage > Decimal::ZERO {
        amount / Decimal::from(30)
    } else {
        amount
    }
}

/// Printed fine instruction
pub fn fine_instruction(expire_date: NaiveDate, title_amount: u64, fine: &Fine) -> String {
    let from = date_plus_days(expire_date, fine.days_after_expiration_date);
    let amount = calculate_fees(fine.amount_in_cents, fine.percentage_on_total, title_amount);
    format!(
        "A PARTIR DE {}: MULTA..........R$ {}",
        br_date(from),
        truncate_decimal(amount, 2)
    )
}

/// Printed interest instruction
pub fn interest_instruction(expire_date: NaiveDate, title_amount: u64, interest: &Interest) -> String {
    let from = date_plus_days(expire_date, interest.days_after_expiration_date);
    let amount = calculate_interest_by_day(
        interest.amount_per_day_in_cents,
        interest.percentage_per_month,
        title_amount,
    );
    format!(
        "A PARTIR DE {}: JUROS POR DIA DE ATRASO.........R$ {}",
        br_date(from),
        truncate_decimal(amount, 3)
    )
}
