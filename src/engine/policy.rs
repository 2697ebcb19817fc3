use crate::Amount;
use crate::model::{BalanceSummary, Currency};

/// Business constants of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Share of a referred amount credited to the sponsor, in percent.
    pub referral_percent: u32,
    pub min_password_len: usize,
    /// Withdrawals open once the USD balance reaches this.
    pub eligibility_usd: Amount,
    /// ... or once the CDF balance reaches this.
    pub eligibility_cdf: Amount,
    pub max_withdrawal_usd: Amount,
    pub max_withdrawal_cdf: Amount,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            referral_percent: 5,
            min_password_len: 6,
            eligibility_usd: Amount::from_whole(10),
            eligibility_cdf: Amount::from_whole(30_000),
            max_withdrawal_usd: Amount::from_whole(3),
            max_withdrawal_cdf: Amount::from_whole(10_000),
        }
    }
}

impl Policy {
    /// Per-transaction withdrawal ceiling for a currency.
    pub fn max_withdrawal(&self, currency: Currency) -> Amount {
        match currency {
            Currency::Usd => self.max_withdrawal_usd,
            Currency::Cdf => self.max_withdrawal_cdf,
        }
    }

    pub fn is_withdrawal_eligible(&self, balances: &BalanceSummary) -> bool {
        balances.usd >= self.eligibility_usd || balances.cdf >= self.eligibility_cdf
    }

    /// Length is counted in UTF-16 code units, the way browser clients count it.
    pub fn is_strong_password(&self, password: &str) -> bool {
        password.encode_utf16().count() >= self.min_password_len
    }
}
