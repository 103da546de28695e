//! Validation pipeline for canonical requests
//!
//! - Ordered predicate list, first failure wins
//! - Generic predicates shared by every adapter
//! - Parameterised bank predicates (agency, account, wallet, boleto type)
//!
//! Predicates are typed over the subject they inspect. The validator stores
//! them type-erased, so a subject of the wrong type yields `MP500 "Tipo
//! inválido"` instead of a panic.
//!
//! The BB and Bradesco validators are not registered by any adapter yet.

use crate::checkdigit::{is_valid_cnpj, is_valid_cpf};
use crate::response::ErrorResponse;
use crate::taxonomy::codes;
use crate::types::{BoletoRequest, Document};
use chrono::{Duration, NaiveDate, Utc};
use std::any::Any;
use tracing::debug;

/// Outcome of one predicate
pub type RuleResult = std::result::Result<(), ErrorResponse>;

type Rule = Box<dyn Fn(&mut dyn Any) -> RuleResult + Send + Sync>;

/// Brazilian offset from UTC, in hours
pub const BRAZIL_UTC_OFFSET_HOURS: i64 = -3;

/// Calendar date in Brazil
pub fn brazil_today() -> NaiveDate {
    (Utc::now() + Duration::hours(BRAZIL_UTC_OFFSET_HOURS)).date_naive()
}

/// Error returned when a predicate receives a subject of another type
pub fn invalid_type() -> ErrorResponse {
    ErrorResponse::new(codes::MP500, "Tipo inválido")
}

/// Ordered list of predicates, populated once at adapter construction
#[derive(Default)]
pub struct Validator {
    rules: Vec<Rule>,
}

impl Validator {
    /// Create empty validator
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Validator pre-loaded with the generic predicates
    pub fn with_generic_rules() -> Self {
        let mut validator = Self::new();
        validator.push(validate_amount_in_cents);
        validator.push(validate_expire_date);
        validator.push(validate_buyer_document);
        validator.push(validate_recipient_document);
        validator.push(validate_fees_and_rules_supported);
        validator
    }

    /// Append a predicate over subjects of type `T`
    pub fn push<T, F>(&mut self, rule: F)
    where
        T: Any,
        F: Fn(&mut T) -> RuleResult + Send + Sync + 'static,
    {
        self.rules
            .push(Box::new(move |subject: &mut dyn Any| {
                match subject.downcast_mut::<T>() {
                    Some(typed) => rule(typed),
                    None => Err(invalid_type()),
                }
            }));
    }

    /// Run predicates in registration order, returning the first failure
    pub fn assert(&self, subject: &mut dyn Any) -> RuleResult {
        for (position, rule) in self.rules.iter().enumerate() {
            if let Err(err) = rule(&mut *subject) {
                debug!(position, code = %err.code, "Validation rule rejected request");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Number of predicates
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// No predicates registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn bad_request(message: impl Into<String>) -> ErrorResponse {
    ErrorResponse::new(codes::MP400, message)
}

fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

// =========================================================================
// GENERIC PREDICATES
// =========================================================================

/// Amount must be at least one cent
pub fn validate_amount_in_cents(request: &mut BoletoRequest) -> RuleResult {
    if request.title.amount_in_cents < 1 {
        return Err(ErrorResponse::new(
            codes::MP_AMOUNT_IN_CENTS,
            "Valor não pode ser menor do que 1 centavo",
        ));
    }
    Ok(())
}

/// Expiration date must not be in the past (Brazil calendar)
pub fn validate_expire_date(request: &mut BoletoRequest) -> RuleResult {
    if request.title.expire_date < brazil_today() {
        return Err(ErrorResponse::new(
            codes::MP_EXPIRE_DATE,
            "Data de expiração não pode ser menor que a data de hoje",
        ));
    }
    Ok(())
}

enum DocumentCheck {
    Valid,
    InvalidNumber(&'static str),
    UnknownType,
}

/// Strip formatting from the number in place and check its digits
fn check_document(document: &mut Document) -> DocumentCheck {
    document.number = only_digits(&document.number);

    if document.is_cpf() {
        document.doc_type = "CPF".to_string();
        if is_valid_cpf(&document.number) {
            DocumentCheck::Valid
        } else {
            DocumentCheck::InvalidNumber("CPF inválido")
        }
    } else if document.is_cnpj() {
        document.doc_type = "CNPJ".to_string();
        if is_valid_cnpj(&document.number) {
            DocumentCheck::Valid
        } else {
            DocumentCheck::InvalidNumber("CNPJ inválido")
        }
    } else {
        DocumentCheck::UnknownType
    }
}

/// Buyer document must be a valid CPF or CNPJ
pub fn validate_buyer_document(request: &mut BoletoRequest) -> RuleResult {
    match check_document(&mut request.buyer.document) {
        DocumentCheck::Valid => Ok(()),
        DocumentCheck::InvalidNumber(message) => {
            Err(ErrorResponse::new(codes::MP_DOCUMENT_NUMBER, message))
        }
        DocumentCheck::UnknownType => Err(ErrorResponse::new(
            codes::MP_BUYER_DOCUMENT_TYPE,
            "Tipo de Documento inválido",
        )),
    }
}

/// Recipient document must be a valid CPF or CNPJ
pub fn validate_recipient_document(request: &mut BoletoRequest) -> RuleResult {
    match check_document(&mut request.recipient.document) {
        DocumentCheck::Valid => Ok(()),
        DocumentCheck::InvalidNumber(message) => {
            Err(ErrorResponse::new(codes::MP_DOCUMENT_NUMBER, message))
        }
        DocumentCheck::UnknownType => Err(ErrorResponse::new(
            codes::MP_RECIPIENT_DOCUMENT_TYPE,
            "Tipo de Documento inválido",
        )),
    }
}

/// Fees and rules are only forwarded to banks that honour them
pub fn validate_fees_and_rules_supported(request: &mut BoletoRequest) -> RuleResult {
    if request.title.fees.is_some() && !request.bank_number.accepts_fees() {
        return Err(bad_request("title.fees not available for this bank"));
    }
    if request.title.rules.is_some() && !request.bank_number.accepts_rules() {
        return Err(bad_request("title.rules not available for this bank"));
    }
    Ok(())
}

/// Minimum days after expiration before a fee applies
pub const MIN_DAYS_TO_START_CHARGING: u32 = 1;

/// Fine must carry exactly one rate and start at least one day after expiration
pub fn validate_fine(request: &mut BoletoRequest) -> RuleResult {
    let Some(fine) = request.fine() else {
        return Ok(());
    };

    if !fine.has_exclusive_rate() {
        return Err(bad_request(
            "Para o campo Fine deve ser informado exclusivamente o parâmetro AmountInCents ou PercentageOnTotal maiores que zero",
        ));
    }
    if fine.days_after_expiration_date < MIN_DAYS_TO_START_CHARGING {
        return Err(bad_request(format!(
            "Para o campo Fine o parâmetro DaysAfterExpirationDate precisa ser no mínimo {}",
            MIN_DAYS_TO_START_CHARGING
        )));
    }
    Ok(())
}

/// Interest must carry exactly one rate and start at least one day after expiration
pub fn validate_interest(request: &mut BoletoRequest) -> RuleResult {
    let Some(interest) = request.interest() else {
        return Ok(());
    };

    if !interest.has_exclusive_rate() {
        return Err(bad_request(
            "Para o campo Interest deve ser informado exclusivamente o parâmetro AmountInCents ou PercentagePerMonth maiores que zero",
        ));
    }
    if interest.days_after_expiration_date < MIN_DAYS_TO_START_CHARGING {
        return Err(bad_request(format!(
            "Para o campo Interest o parâmetro DaysAfterExpirationDate precisa ser no mínimo {}",
            MIN_DAYS_TO_START_CHARGING
        )));
    }
    Ok(())
}

/// Payee guarantor, when present, must be named
pub fn validate_payee_guarantor_name(request: &mut BoletoRequest) -> RuleResult {
    match &request.payee_guarantor {
        Some(guarantor) if guarantor.name.trim().is_empty() => Err(ErrorResponse::new(
            codes::MP_PAYEE_GUARANTOR_NAME_TYPE,
            "Nome do sacador avalista está vazio",
        )),
        _ => Ok(()),
    }
}

/// Payee guarantor, when present, must carry a valid CPF or CNPJ
pub fn validate_payee_guarantor_document(request: &mut BoletoRequest) -> RuleResult {
    let Some(guarantor) = request.payee_guarantor.as_mut() else {
        return Ok(());
    };

    match check_document(&mut guarantor.document) {
        DocumentCheck::Valid => Ok(()),
        DocumentCheck::InvalidNumber(message) => {
            Err(ErrorResponse::new(codes::MP_DOCUMENT_NUMBER, message))
        }
        DocumentCheck::UnknownType => Err(ErrorResponse::new(
            codes::MP_PAYEE_GUARANTOR_DOCUMENT_TYPE,
            "Tipo de Documento inválido",
        )),
    }
}

// =========================================================================
// BANK PREDICATES
// =========================================================================

/// Agency: numeric, up to `max_digits`, left-padded with zeros in place
pub fn agency_rule(max_digits: usize) -> impl Fn(&mut BoletoRequest) -> RuleResult + Send + Sync {
    move |request: &mut BoletoRequest| {
        let agency = request.agreement.agency.trim();
        if agency.is_empty()
            || agency.len() > max_digits
            || !agency.chars().all(|c| c.is_ascii_digit())
        {
            return Err(bad_request(format!(
                "Agência inválida, deve conter até {} dígitos",
                max_digits
            )));
        }
        request.agreement.agency = format!("{:0>width$}", agency, width = max_digits);
        Ok(())
    }
}

/// Account: numeric, up to `max_digits`, left-padded with zeros in place
pub fn account_rule(max_digits: usize) -> impl Fn(&mut BoletoRequest) -> RuleResult + Send + Sync {
    move |request: &mut BoletoRequest| {
        let account = request.agreement.account.trim();
        if account.is_empty()
            || account.len() > max_digits
            || !account.chars().all(|c| c.is_ascii_digit())
        {
            return Err(bad_request(format!(
                "Conta inválida, deve conter até {} dígitos",
                max_digits
            )));
        }
        request.agreement.account = format!("{:0>width$}", account, width = max_digits);
        Ok(())
    }
}

/// Account check digit must be a single digit
pub fn validate_account_digit(request: &mut BoletoRequest) -> RuleResult {
    let digit = request.agreement.account_digit.trim();
    if digit.len() != 1 || !digit.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad_request("Dígito da conta inválido"));
    }
    Ok(())
}

/// Wallet must be one of `allowed`
pub fn wallet_rule(
    allowed: &'static [u16],
    message: &'static str,
) -> impl Fn(&mut BoletoRequest) -> RuleResult + Send + Sync {
    move |request: &mut BoletoRequest| {
        if allowed.contains(&request.agreement.wallet) {
            Ok(())
        } else {
            Err(bad_request(message))
        }
    }
}

/// Boleto kind table: acronym and bank code
pub type BoletoTypeTable = &'static [(&'static str, &'static str)];

/// Resolve `title.boleto_type` against `table`, filling `boleto_type_code` in place.
///
/// An empty type takes `default`. Lookup is case-insensitive.
pub fn boleto_type_rule(
    table: BoletoTypeTable,
    default: (&'static str, &'static str),
) -> impl Fn(&mut BoletoRequest) -> RuleResult + Send + Sync {
    move |request: &mut BoletoRequest| {
        let requested = request.title.boleto_type.trim().to_uppercase();
        let (kind, code) = if requested.is_empty() {
            default
        } else {
            *table
                .iter()
                .find(|(kind, _)| *kind == requested)
                .ok_or_else(|| bad_request("espécie de boleto informada não existente"))?
        };

        request.title.boleto_type = kind.to_string();
        request.title.boleto_type_code = code.to_string();
        Ok(())
    }
}

/// Expiration date must not exceed `max`
pub fn max_expire_date_rule(
    max: NaiveDate,
    message: &'static str,
) -> impl Fn(&mut BoletoRequest) -> RuleResult + Send + Sync {
    move |request: &mut BoletoRequest| {
        if request.title.expire_date > max {
            Err(ErrorResponse::new(codes::MP_EXPIRE_DATE, message))
        } else {
            Ok(())
        }
    }
}

/// `rules.max_days_to_pay_past_due` must not exceed `max`
pub fn max_days_to_pay_past_due_rule(
    max: u32,
) -> impl Fn(&mut BoletoRequest) -> RuleResult + Send + Sync {
    move |request: &mut BoletoRequest| match &request.title.rules {
        Some(rules) if rules.max_days_to_pay_past_due > max => Err(bad_request(format!(
            "O campo MaxDaysToPayPastDue deve ser no máximo {}",
            max
        ))),
        _ => Ok(()),
    }
}

/// Non-empty access key
pub fn validate_access_key(request: &mut BoletoRequest) -> RuleResult {
    if request.authentication.access_key.trim().is_empty() {
        return Err(bad_request("o campo AccessKey não pode ser vazio"));
    }
    Ok(())
}

/// Non-empty username and password
pub fn validate_credentials(request: &mut BoletoRequest) -> RuleResult {
    if request.authentication.username.trim().is_empty()
        || request.authentication.password.trim().is_empty()
    {
        return Err(bad_request("o nome de usuário e senha devem ser preenchidos"));
    }
    Ok(())
}

/// Non-zero agreement number
pub fn validate_agreement_number(request: &mut BoletoRequest) -> RuleResult {
    if request.agreement.agreement_number == 0 {
        return Err(bad_request("o código do contrato deve ser preenchido"));
    }
    Ok(())
}

/// Non-empty account
pub fn validate_account_present(request: &mut BoletoRequest) -> RuleResult {
    if request.agreement.account.trim().is_empty() {
        return Err(bad_request("a conta deve ser preenchida"));
    }
    Ok(())
}

// =========================================================================
// BANCO DO BRASIL / BRADESCO
// =========================================================================

/// Banco do Brasil our number upper bound
pub const BB_MAX_OUR_NUMBER: u64 = 9_999_999_999;

/// Banco do Brasil instructions limit, in characters
pub const BB_MAX_INSTRUCTIONS: usize = 220;

/// Banco do Brasil document number limit, in characters
pub const BB_MAX_DOCUMENT_NUMBER: usize = 15;

/// Banco do Brasil our number range
pub fn validate_bb_our_number(request: &mut BoletoRequest) -> RuleResult {
    if request.title.our_number > BB_MAX_OUR_NUMBER {
        return Err(ErrorResponse::new(codes::MP_OUR_NUMBER, "Nosso número inválido"));
    }
    Ok(())
}

/// Banco do Brasil wallet variation must be set
pub fn validate_bb_wallet_variation(request: &mut BoletoRequest) -> RuleResult {
    if request.agreement.wallet_variation < 1 {
        return Err(ErrorResponse::new(
            codes::MP_WALLET_VARIATION,
            "Variação da carteira inválida",
        ));
    }
    Ok(())
}

/// Banco do Brasil instructions limit
pub fn validate_bb_instructions(request: &mut BoletoRequest) -> RuleResult {
    if request.title.instructions.chars().count() > BB_MAX_INSTRUCTIONS {
        return Err(bad_request(format!(
            "Instruções não podem passar de {} caracteres",
            BB_MAX_INSTRUCTIONS
        )));
    }
    Ok(())
}

/// Banco do Brasil document number limit
pub fn validate_bb_document_number(request: &mut BoletoRequest) -> RuleResult {
    if request.title.document_number.chars().count() > BB_MAX_DOCUMENT_NUMBER {
        return Err(bad_request(
            "O campo documentNumber do título ultrapassou o limite permitido de 15 caracteres",
        ));
    }
    Ok(())
}

/// Last date the Bradesco integrations accept before the factor rollover
pub fn bradesco_max_expire_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 21).unwrap_or(NaiveDate::MAX)
}

/// Bradesco ShopFacil wallets
pub const SHOPFACIL_WALLETS: &[u16] = &[25, 26];

/// Bradesco NetEmpresa wallets
pub const NET_EMPRESA_WALLETS: &[u16] = &[4, 9, 19];

/// Predicates for Banco do Brasil
pub fn bb_validator() -> Validator {
    let mut validator = Validator::with_generic_rules();
    validator.push(agency_rule(4));
    validator.push(account_rule(8));
    validator.push(validate_bb_our_number);
    validator.push(validate_bb_wallet_variation);
    validator.push(validate_bb_instructions);
    validator.push(validate_bb_document_number);
    validator.push(validate_payee_guarantor_name);
    validator.push(validate_payee_guarantor_document);
    validator
}

/// Predicates for Bradesco ShopFacil
pub fn bradesco_shopfacil_validator() -> Validator {
    let mut validator = Validator::with_generic_rules();
    validator.push(wallet_rule(
        SHOPFACIL_WALLETS,
        "a carteira deve ser 25 ou 26 para o BradescoShopFacil",
    ));
    validator.push(validate_credentials);
    validator.push(validate_agreement_number);
    validator.push(validate_account_present);
    validator.push(max_expire_date_rule(
        bradesco_max_expire_date(),
        "Data de vencimento não pode ser maior que 21-02-2025",
    ));
    validator
}

/// Predicates for Bradesco NetEmpresa
pub fn bradesco_net_empresa_validator() -> Validator {
    let mut validator = Validator::with_generic_rules();
    validator.push(agency_rule(4));
    validator.push(account_rule(7));
    validator.push(wallet_rule(
        NET_EMPRESA_WALLETS,
        "a carteira deve ser 4, 9 ou 19 para o bradescoNetEmpresa",
    ));
    validator.push(max_expire_date_rule(
        bradesco_max_expire_date(),
        "Data de vencimento não pode ser maior que 21-02-2025",
    ));
    validator
}
