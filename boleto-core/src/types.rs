//! Canonical boleto registration model
//!
//! Field names follow the gateway's inbound JSON contract (camelCase).
//! A `BoletoRequest` lives for one registration attempt; adapters only
//! mutate it to fill derived fields (our number digits, boleto type code,
//! ticket token) before rendering.

use crate::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// =========================================================================
// BANK IDENTIFIERS
// =========================================================================

/// Partner bank identifier (Febraban compensation code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BankNumber {
    /// Banco do Brasil
    Bb,
    /// Santander
    Santander,
    /// Citibank
    Citibank,
    /// Bradesco (ShopFacil and NetEmpresa integrations)
    Bradesco,
    /// Itaú Unibanco
    Itau,
    /// Caixa Econômica Federal
    Caixa,
    /// Stone
    Stone,
    /// JPMorgan
    JpMorgan,
    /// Pefisa
    Pefisa,
}

impl BankNumber {
    /// All known partner banks
    pub const ALL: [BankNumber; 9] = [
        BankNumber::Bb,
        BankNumber::Santander,
        BankNumber::Citibank,
        BankNumber::Bradesco,
        BankNumber::Itau,
        BankNumber::Caixa,
        BankNumber::Stone,
        BankNumber::JpMorgan,
        BankNumber::Pefisa,
    ];

    /// Numeric compensation code
    pub fn code(self) -> u16 {
        match self {
            BankNumber::Bb => 1,
            BankNumber::Santander => 33,
            BankNumber::Citibank => 745,
            BankNumber::Bradesco => 237,
            BankNumber::Itau => 341,
            BankNumber::Caixa => 104,
            BankNumber::Stone => 197,
            BankNumber::JpMorgan => 376,
            BankNumber::Pefisa => 174,
        }
    }

    /// Three digit code used as the barcode prefix
    pub fn barcode_prefix(self) -> String {
        format!("{:03}", self.code())
    }

    /// Only Caixa and Stone honour `Title.Fees`
    pub fn accepts_fees(self) -> bool {
        matches!(self, BankNumber::Caixa | BankNumber::Stone)
    }

    /// Only Caixa and Stone honour `Title.Rules`
    pub fn accepts_rules(self) -> bool {
        matches!(self, BankNumber::Caixa | BankNumber::Stone)
    }
}

impl TryFrom<u16> for BankNumber {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self> {
        BankNumber::ALL
            .into_iter()
            .find(|bank| bank.code() == code)
            .ok_or(Error::UnknownBank(code))
    }
}

impl From<BankNumber> for u16 {
    fn from(bank: BankNumber) -> u16 {
        bank.code()
    }
}

impl fmt::Display for BankNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BankNumber::Bb => "BancoDoBrasil",
            BankNumber::Santander => "Santander",
            BankNumber::Citibank => "Citibank",
            BankNumber::Bradesco => "Bradesco",
            BankNumber::Itau => "Itau",
            BankNumber::Caixa => "Caixa",
            BankNumber::Stone => "Stone",
            BankNumber::JpMorgan => "JPMorgan",
            BankNumber::Pefisa => "Pefisa",
        };
        write!(f, "{}", name)
    }
}

// =========================================================================
// REQUEST
// =========================================================================

/// Credentials used by the partner bank
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Authentication {
    /// Username or client id
    pub username: String,
    /// Password or client secret
    pub password: String,
    /// Static access key
    pub access_key: String,
    /// Bearer token, filled by the ticket step for ticket-based banks
    pub authorization_token: String,
}

/// Merchant contract with the bank
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Agreement {
    /// Contract number
    pub agreement_number: u64,
    /// Wallet code
    pub wallet: u16,
    /// Wallet variation (Banco do Brasil)
    pub wallet_variation: u16,
    /// Branch
    pub agency: String,
    /// Branch check digit
    pub agency_digit: String,
    /// Account number
    pub account: String,
    /// Account check digit
    pub account_digit: String,
}

/// Payment behaviour after expiration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rules {
    /// Bank may accept an amount different from the title
    pub accept_divergent_amount: bool,
    /// Days after expiration during which payment is still accepted
    pub max_days_to_pay_past_due: u32,
}

/// Late payment fine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fine {
    /// Days after expiration before the fine applies
    pub days_after_expiration_date: u32,
    /// Fixed fine in cents
    pub amount_in_cents: u64,
    /// Fine as a percentage of the title amount
    pub percentage_on_total: Decimal,
}

impl Fine {
    /// Exactly one of amount or percentage is positive
    pub fn has_exclusive_rate(&self) -> bool {
        (self.amount_in_cents > 0) != (self.percentage_on_total > Decimal::ZERO)
    }
}

/// Daily interest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interest {
    /// Days after expiration before interest applies
    pub days_after_expiration_date: u32,
    /// Fixed interest per day in cents
    pub amount_per_day_in_cents: u64,
    /// Interest as a monthly percentage of the title amount
    pub percentage_per_month: Decimal,
}

impl Interest {
    /// Exactly one of amount or percentage is positive
    pub fn has_exclusive_rate(&self) -> bool {
        (self.amount_per_day_in_cents > 0) != (self.percentage_per_month > Decimal::ZERO)
    }
}

/// Optional late fees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fees {
    /// Fine
    pub fine: Option<Fine>,
    /// Interest
    pub interest: Option<Interest>,
}

/// The payment slip itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Title {
    /// Expiration date (yyyy-mm-dd)
    pub expire_date: NaiveDate,
    /// Amount in cents
    pub amount_in_cents: u64,
    /// Bank document identifier
    pub our_number: u64,
    /// Free text printed on the slip
    pub instructions: String,
    /// Merchant document number
    pub document_number: String,
    /// Boleto kind acronym (DM, NP, DS...)
    pub boleto_type: String,
    /// Bank numeric code for `boleto_type`, resolved by the adapter
    pub boleto_type_code: String,
    /// Payment rules
    pub rules: Option<Rules>,
    /// Late fees
    pub fees: Option<Fees>,
}

impl Default for Title {
    fn default() -> Self {
        Self {
            expire_date: NaiveDate::MIN,
            amount_in_cents: 0,
            our_number: 0,
            instructions: String::new(),
            document_number: String::new(),
            boleto_type: String::new(),
            boleto_type_code: String::new(),
            rules: None,
            fees: None,
        }
    }
}

/// CPF or CNPJ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    /// "CPF" or "CNPJ"
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Document digits
    pub number: String,
}

impl Document {
    /// Individual taxpayer document
    pub fn is_cpf(&self) -> bool {
        self.doc_type.eq_ignore_ascii_case("CPF")
    }

    /// Company taxpayer document
    pub fn is_cnpj(&self) -> bool {
        self.doc_type.eq_ignore_ascii_case("CNPJ")
    }
}

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    /// Street
    pub street: String,
    /// Number
    pub number: String,
    /// Complement
    pub complement: String,
    /// CEP
    pub zip_code: String,
    /// City
    pub city: String,
    /// District
    pub district: String,
    /// Two letter state code
    pub state_code: String,
}

/// Payer of the slip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Buyer {
    /// Name
    pub name: String,
    /// Email
    pub email: String,
    /// Document
    pub document: Document,
    /// Address
    pub address: Address,
}

/// Beneficiary of the slip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipient {
    /// Name
    pub name: String,
    /// Document
    pub document: Document,
    /// Address
    pub address: Address,
}

/// Third party guaranteeing the title
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayeeGuarantor {
    /// Name
    pub name: String,
    /// Document
    pub document: Document,
}

/// Canonical boleto registration request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoletoRequest {
    /// Target bank
    pub bank_number: BankNumber,
    /// Credentials
    #[serde(default)]
    pub authentication: Authentication,
    /// Merchant contract
    #[serde(default)]
    pub agreement: Agreement,
    /// Slip data
    #[serde(default)]
    pub title: Title,
    /// Beneficiary
    #[serde(default)]
    pub recipient: Recipient,
    /// Payer
    #[serde(default)]
    pub buyer: Buyer,
    /// Guarantor
    #[serde(default)]
    pub payee_guarantor: Option<PayeeGuarantor>,
}

impl BoletoRequest {
    /// Empty request addressed to `bank`
    pub fn new(bank: BankNumber) -> Self {
        Self {
            bank_number: bank,
            authentication: Authentication::default(),
            agreement: Agreement::default(),
            title: Title::default(),
            recipient: Recipient::default(),
            buyer: Buyer::default(),
            payee_guarantor: None,
        }
    }

    /// Fine configured on the title, if any
    pub fn fine(&self) -> Option<&Fine> {
        self.title.fees.as_ref().and_then(|fees| fees.fine.as_ref())
    }

    /// Interest configured on the title, if any
    pub fn interest(&self) -> Option<&Interest> {
        self.title
            .fees
            .as_ref()
            .and_then(|fees| fees.interest.as_ref())
    }
}
