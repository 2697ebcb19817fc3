//! Ledger engine.
//!
//! The engine owns the snapshot store and applies every domain rule on top of
//! it: investments, referrals, withdrawals and the balances derived from them.
//! Balances are never stored; they are recomputed from the ledger on each read.
//! Account and session operations live in the `auth` submodule.
//! Also supports async stream of ledger entries.

use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::Amount;
use crate::model::{
    BalanceSummary, Currency, Entry, Investment, Referral, Snapshot, Statement, Withdrawal,
};
use crate::store::{SnapshotStore, Storage};

mod auth;
pub use auth::{ProfileUpdate, Registration};

mod policy;
pub use policy::Policy;

mod error;
pub use error::{AuthError, PasswordChangeError, ProfileError, RegistrationError, ValidationError};

/// The ledger engine, generic over the storage backend.
pub struct Engine<S> {
    store: SnapshotStore<S>,
    policy: Policy,
}

/// Public API
impl<S: Storage> Engine<S> {
    pub fn new(storage: S) -> Self {
        Self::with_policy(storage, Policy::default())
    }

    pub fn with_policy(storage: S, policy: Policy) -> Self {
        Self {
            store: SnapshotStore::new(storage),
            policy,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn store(&self) -> &SnapshotStore<S> {
        &self.store
    }

    /// Load a fresh copy of the whole database.
    pub fn snapshot(&self) -> Snapshot {
        self.store.load()
    }

    /// Run the engine with the given entry stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = Entry> + Unpin) {
        while let Some(entry) = stream.next().await {
            // a bad entry should not stop the import, failures are already logged
            let _ = self.apply(entry);
        }
    }

    /// Apply a single ledger entry, resolving its user by email or phone.
    pub fn apply(&mut self, entry: Entry) -> Result<(), ValidationError> {
        let snapshot = self.store.load();
        match entry {
            Entry::Investment {
                user,
                name,
                currency,
                amount,
                note,
            } => {
                let user_id = Self::resolve(&snapshot, &user)?;
                self.record_investment(&user_id, &name, currency, amount, &note)?;
            }
            Entry::Referral { sponsor, amount } => {
                let sponsor_id = Self::resolve(&snapshot, &sponsor)?;
                self.record_referral(&sponsor_id, amount)?;
            }
        }
        Ok(())
    }

    /// Record a pending investment for `user_id`.
    ///
    /// Rejects an empty name and any amount that is not a positive number.
    pub fn record_investment(
        &mut self,
        user_id: &str,
        name: &str,
        currency: Currency,
        amount: f64,
        note: &str,
    ) -> Result<Investment, ValidationError> {
        let result = self.apply_investment(user_id, name, currency, amount, note);
        Self::log_result("investment", user_id, amount, &result);
        result
    }

    /// Credit a referral to `sponsor_id`. The bonus is derived at read time.
    pub fn record_referral(
        &mut self,
        sponsor_id: &str,
        amount: f64,
    ) -> Result<Referral, ValidationError> {
        let result = self.apply_referral(sponsor_id, amount);
        Self::log_result("referral", sponsor_id, amount, &result);
        result
    }

    /// Record a withdrawal request:
    /// - Amount must be finite and within the per-currency limit
    /// - Amount must be positive
    /// - Amount must not exceed the computed balance in that currency
    ///
    /// The request is stored as pending and immediately reduces the balance.
    pub fn request_withdrawal(
        &mut self,
        user_id: &str,
        amount: f64,
        currency: Currency,
        method: &str,
        phone: &str,
    ) -> Result<Withdrawal, ValidationError> {
        let result = self.apply_withdrawal(user_id, amount, currency, method, phone);
        Self::log_result("withdrawal", user_id, amount, &result);
        result
    }

    /// Balances of `user_id`, computed from the full ledger.
    pub fn compute_balances(&self, user_id: &str) -> BalanceSummary {
        Self::balances_in(&self.store.load(), user_id, &self.policy)
    }

    /// Investments of `user_id`, most recent first.
    pub fn list_investments(&self, user_id: &str) -> Vec<Investment> {
        self.store
            .load()
            .investments
            .into_iter()
            .rev()
            .filter(|inv| inv.user_id == user_id)
            .collect()
    }

    /// Withdrawals of `user_id`, most recent first.
    pub fn list_withdrawals(&self, user_id: &str) -> Vec<Withdrawal> {
        self.store
            .load()
            .withdrawals
            .into_iter()
            .rev()
            .filter(|w| w.user_id == user_id)
            .collect()
    }

    pub fn is_withdrawal_eligible(&self, balances: &BalanceSummary) -> bool {
        self.policy.is_withdrawal_eligible(balances)
    }

    /// One statement per user, in registration order.
    pub fn statements(&self) -> Vec<Statement> {
        let snapshot = self.store.load();
        snapshot
            .users
            .iter()
            .map(|user| {
                let balances = Self::balances_in(&snapshot, &user.id, &self.policy);
                Statement {
                    user_id: user.id.clone(),
                    email: user.email.clone(),
                    eligible: self.policy.is_withdrawal_eligible(&balances),
                    balances,
                }
            })
            .collect()
    }
}

/// Private API
impl<S: Storage> Engine<S> {
    /// Small helper to log operation results
    fn log_result<T, E: std::fmt::Display>(
        op: &str,
        user: &str,
        amount: f64,
        result: &Result<T, E>,
    ) {
        match result {
            Ok(_) => info!(user = %user, amount, "{op} applied"),
            Err(e) => info!(user = %user, amount, reason = %e, "{op} skipped"),
        }
    }

    fn resolve(snapshot: &Snapshot, identifier: &str) -> Result<String, ValidationError> {
        snapshot
            .find_by_identifier(identifier)
            .map(|u| u.id.clone())
            .ok_or_else(|| ValidationError::UnknownUser(identifier.to_string()))
    }

    fn ensure_user(snapshot: &Snapshot, user_id: &str) -> Result<(), ValidationError> {
        match snapshot.user(user_id) {
            Some(_) => Ok(()),
            None => Err(ValidationError::UnknownUser(user_id.to_string())),
        }
    }

    fn balances_in(snapshot: &Snapshot, user_id: &str, policy: &Policy) -> BalanceSummary {
        let mut usd = Amount::ZERO;
        let mut cdf = Amount::ZERO;

        for inv in snapshot.investments.iter().filter(|i| i.user_id == user_id) {
            match inv.currency {
                Currency::Usd => usd += inv.amount,
                Currency::Cdf => cdf += inv.amount,
            }
        }

        for w in snapshot.withdrawals.iter().filter(|w| w.user_id == user_id) {
            match w.currency {
                Currency::Usd => usd -= w.amount,
                Currency::Cdf => cdf -= w.amount,
            }
        }

        let bonus: Amount = snapshot
            .referrals
            .iter()
            .filter(|r| r.sponsor_id == user_id)
            .map(|r| r.amount.percent(policy.referral_percent))
            .sum();

        BalanceSummary {
            usd: usd + bonus,
            cdf,
            bonus,
        }
    }

    fn apply_investment(
        &mut self,
        user_id: &str,
        name: &str,
        currency: Currency,
        amount: f64,
        note: &str,
    ) -> Result<Investment, ValidationError> {
        let name = name.trim();
        let amount = match Amount::try_from_float(amount) {
            Some(a) if a.is_positive() && !name.is_empty() => a,
            _ => return Err(ValidationError::InvalidInvestment),
        };

        let mut snapshot = self.store.load();
        Self::ensure_user(&snapshot, user_id)?;

        let investment = Investment::new(user_id, name, currency, amount, note.trim());
        snapshot.investments.push(investment.clone());
        self.store.save(&snapshot);

        Ok(investment)
    }

    fn apply_referral(&mut self, sponsor_id: &str, amount: f64) -> Result<Referral, ValidationError> {
        let amount = Amount::try_from_float(amount)
            .filter(|a| a.is_positive())
            .ok_or(ValidationError::InvalidAmount)?;

        let mut snapshot = self.store.load();
        Self::ensure_user(&snapshot, sponsor_id)?;

        let referral = Referral {
            sponsor_id: sponsor_id.to_string(),
            amount,
        };
        snapshot.referrals.push(referral.clone());
        self.store.save(&snapshot);

        Ok(referral)
    }

    fn apply_withdrawal(
        &mut self,
        user_id: &str,
        amount: f64,
        currency: Currency,
        method: &str,
        phone: &str,
    ) -> Result<Withdrawal, ValidationError> {
        let mut snapshot = self.store.load();
        Self::ensure_user(&snapshot, user_id)?;

        let limit = self.policy.max_withdrawal(currency);
        let amount = match Amount::try_from_float(amount) {
            Some(amount) => amount,
            // beyond the representable range is still above the limit
            None if amount.is_finite() && amount > limit.to_f64() => {
                return Err(ValidationError::AmountExceedsLimit { currency, limit });
            }
            None => return Err(ValidationError::InvalidAmount),
        };

        if amount > limit {
            return Err(ValidationError::AmountExceedsLimit { currency, limit });
        }

        if !amount.is_positive() {
            return Err(ValidationError::InvalidAmount);
        }

        let balances = Self::balances_in(&snapshot, user_id, &self.policy);
        let available = match currency {
            Currency::Usd => balances.usd,
            Currency::Cdf => balances.cdf,
        };
        if available < amount {
            return Err(ValidationError::InsufficientFunds {
                currency,
                available,
                requested: amount,
            });
        }

        let withdrawal = Withdrawal::new(user_id, amount, currency, method.trim(), phone.trim());
        snapshot.withdrawals.push(withdrawal.clone());
        self.store.save(&snapshot);

        Ok(withdrawal)
    }
}
