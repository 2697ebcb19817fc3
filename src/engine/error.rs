//! Error types for ledger and account operations.

use thiserror::Error;

use crate::Amount;
use crate::model::Currency;

/// Error returned by investment, referral and withdrawal operations.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("investment needs a name and a positive amount")]
    InvalidInvestment,

    #[error("{currency} withdrawals are limited to {limit} per transaction")]
    AmountExceedsLimit { currency: Currency, limit: Amount },

    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("unsupported currency '{0}'")]
    UnsupportedCurrency(String),

    #[error("insufficient {currency} balance: available {available}, requested {requested}")]
    InsufficientFunds {
        currency: Currency,
        available: Amount,
        requested: Amount,
    },

    #[error("user {0} not found")]
    UnknownUser(String),
}

/// Error during login. Never says which of identifier or password was wrong.
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("invalid identifier or password")]
    InvalidCredentials,
}

/// Error during registration, in the order checks are applied.
#[derive(Debug, Error, PartialEq)]
pub enum RegistrationError {
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("email already in use")]
    DuplicateEmail,
    #[error("phone number already in use")]
    DuplicatePhone,
}

/// Error during a password change.
#[derive(Debug, Error, PartialEq)]
pub enum PasswordChangeError {
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("current password is incorrect")]
    WrongOldPassword,
    #[error("new password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("new passwords do not match")]
    PasswordMismatch,
}

/// Error during a profile update.
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("email already in use")]
    DuplicateEmail,
    #[error("phone number already in use")]
    DuplicatePhone,
}
