//! Core domain types and the persisted document layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Amount;
use crate::engine::ValidationError;
use crate::id::{gen_id, now_iso};

/// User identifier, as generated by [`gen_id`].
pub type UserId = String;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Cdf,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => f.write_str("USD"),
            Currency::Cdf => f.write_str("CDF"),
        }
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "USD" => Ok(Currency::Usd),
            "CDF" => Ok(Currency::Cdf),
            other => Err(ValidationError::UnsupportedCurrency(other.to_string())),
        }
    }
}

/// Processing state of an investment or withdrawal.
///
/// Requests are finalized out of band, so nothing moves them past `Pending`
/// inside this crate. Labels written by operators are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Pending,
    Other(String),
}

impl Status {
    const PENDING_LABEL: &'static str = "En attente";
}

impl From<String> for Status {
    fn from(label: String) -> Self {
        if label == Status::PENDING_LABEL {
            Status::Pending
        } else {
            Status::Other(label)
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Status::PENDING_LABEL.to_string(),
            Status::Other(label) => label,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => f.write_str("Pending"),
            Status::Other(label) => f.write_str(label),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub lastname: String,
    pub firstname: String,
    pub gender: String,
    pub country: String,
    /// Dial code followed by the local number.
    pub phone: String,
    /// Always stored lower-cased.
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_code: Option<String>,
    pub ref_code: String,
    // Kept for document compatibility. Balances come from the ledger.
    #[serde(rename = "balanceUSD", default)]
    pub balance_usd: Amount,
    #[serde(rename = "balanceCDF", default)]
    pub balance_cdf: Amount,
    #[serde(rename = "bonusUSD", default)]
    pub bonus_usd: Amount,
    pub created_at: String,
}

impl User {
    /// Name shown to the user and on request summaries.
    pub fn display_name(&self) -> &str {
        if self.firstname.is_empty() {
            &self.email
        } else {
            &self.firstname
        }
    }
}

/// A pseudo-investment submitted by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub user_id: UserId,
    pub date: String,
    pub name: String,
    pub currency: Currency,
    pub amount: Amount,
    #[serde(default)]
    pub note: String,
    pub status: Status,
}

impl Investment {
    /// Create a new pending investment with a fresh id and timestamp.
    pub fn new(
        user_id: &str,
        name: &str,
        currency: Currency,
        amount: Amount,
        note: &str,
    ) -> Self {
        Self {
            id: gen_id("inv"),
            user_id: user_id.to_string(),
            date: now_iso(),
            name: name.to_string(),
            currency,
            amount,
            note: note.to_string(),
            status: Status::Pending,
        }
    }

    /// Message sent to the operator to finalize this investment.
    pub fn summary(&self) -> String {
        format!(
            "Bonjour S-MONEY, je souhaite finaliser mon investissement. ID: {}, Montant: {} {}.",
            self.id,
            self.amount.to_fr_string(),
            self.currency
        )
    }
}

/// A referral credit attributed to a sponsor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub sponsor_id: UserId,
    /// Amount of the referred investment; the bonus is a percentage of it.
    pub amount: Amount,
}

/// A withdrawal request. Reduces the computed balance as soon as it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: String,
    pub user_id: UserId,
    pub date: String,
    pub amount: Amount,
    pub currency: Currency,
    /// Payout channel, e.g. a mobile money operator.
    pub method: String,
    pub phone: String,
    pub status: Status,
}

impl Withdrawal {
    pub fn new(user_id: &str, amount: Amount, currency: Currency, method: &str, phone: &str) -> Self {
        Self {
            id: gen_id("ret"),
            user_id: user_id.to_string(),
            date: now_iso(),
            amount,
            currency,
            method: method.to_string(),
            phone: phone.to_string(),
            status: Status::Pending,
        }
    }

    /// Recap of the request for manual processing.
    pub fn summary(&self, client: &str) -> String {
        format!(
            "Demande de Retrait:\n\
             --------------------\n\
             ID Retrait: {}\n\
             Client: {client}\n\
             Montant: {} {}\n\
             Méthode: {}\n\
             Numéro: {}\n\
             --------------------\n\
             En attente de traitement.",
            self.id,
            self.amount.to_fr_string(),
            self.currency,
            self.method,
            self.phone
        )
    }
}

/// Single-slot session record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sessions {
    pub current_user_id: Option<UserId>,
}

/// The whole persisted document. Replaced wholesale on every save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub sessions: Sessions,
    pub investments: Vec<Investment>,
    pub referrals: Vec<Referral>,
    pub withdrawals: Vec<Withdrawal>,
}

impl Snapshot {
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    /// Find a user by exact email or phone.
    pub fn find_by_identifier(&self, identifier: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.email == identifier || u.phone == identifier)
    }
}

/// Balances derived from the ledger for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSummary {
    /// USD investments plus referral bonus, minus USD withdrawals.
    pub usd: Amount,
    /// CDF investments minus CDF withdrawals.
    pub cdf: Amount,
    /// Referral bonus total, already included in `usd`.
    pub bonus: Amount,
}

/// One line of the balance report.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub user_id: UserId,
    pub email: String,
    pub balances: BalanceSummary,
    pub eligible: bool,
}

/// An externally supplied ledger entry, addressed by user email or phone.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Record an investment for the user.
    Investment {
        user: String,
        name: String,
        currency: Currency,
        amount: f64,
        note: String,
    },
    /// Credit a referral to the sponsoring user.
    Referral { sponsor: String, amount: f64 },
}
