//! Accounts and the current session.
//!
//! The session is the `sessions.currentUserId` slot of the snapshot; the
//! [`Engine`] handle is the only way to reach it.

use tracing::{debug, info};

use super::{AuthError, Engine, PasswordChangeError, ProfileError, RegistrationError};
use crate::Amount;
use crate::id::{gen_id, now_iso};
use crate::model::User;
use crate::store::Storage;

/// Registration form input. Fields are trimmed before use.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub lastname: String,
    pub firstname: String,
    pub gender: String,
    pub country: String,
    /// International prefix, e.g. `+243`.
    pub dial_code: String,
    /// Local number, appended to `dial_code`.
    pub phone: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    /// Referral code of the sponsor; empty when none.
    pub sponsor_code: String,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub lastname: String,
    pub firstname: String,
    pub gender: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

impl<S: Storage> Engine<S> {
    /// The logged-in user, if the session points at an existing one.
    pub fn current_user(&self) -> Option<User> {
        let snapshot = self.store.load();
        let id = snapshot.sessions.current_user_id.as_deref()?;
        snapshot.user(id).cloned()
    }

    /// Log in with an email or phone and a password.
    pub fn login(&mut self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = identifier.trim();
        let password = password.trim();

        let mut snapshot = self.store.load();
        let user = snapshot
            .users
            .iter()
            .find(|u| (u.email == identifier || u.phone == identifier) && u.password == password)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        snapshot.sessions.current_user_id = Some(user.id.clone());
        self.store.save(&snapshot);

        info!(user = %user.id, "logged in");
        Ok(user)
    }

    /// Register a new user and open a session for them.
    ///
    /// Checks, first failure wins: password length, confirmation, email
    /// uniqueness, phone uniqueness.
    pub fn register(&mut self, registration: Registration) -> Result<User, RegistrationError> {
        let password = registration.password.trim();
        let email = registration.email.trim().to_lowercase();
        let phone = format!(
            "{}{}",
            registration.dial_code.trim(),
            registration.phone.trim()
        );

        if !self.policy.is_strong_password(password) {
            return Err(RegistrationError::WeakPassword {
                min: self.policy.min_password_len,
            });
        }
        if password != registration.password_confirmation.trim() {
            return Err(RegistrationError::PasswordMismatch);
        }

        let mut snapshot = self.store.load();
        if snapshot.users.iter().any(|u| u.email == email) {
            return Err(RegistrationError::DuplicateEmail);
        }
        if snapshot.users.iter().any(|u| u.phone == phone) {
            return Err(RegistrationError::DuplicatePhone);
        }

        let sponsor_code = registration.sponsor_code.trim();
        let user = User {
            id: gen_id("user"),
            lastname: registration.lastname.trim().to_string(),
            firstname: registration.firstname.trim().to_string(),
            gender: registration.gender.trim().to_string(),
            country: registration.country.trim().to_string(),
            phone,
            email,
            password: password.to_string(),
            sponsor_code: (!sponsor_code.is_empty()).then(|| sponsor_code.to_string()),
            ref_code: gen_id("ref"),
            balance_usd: Amount::ZERO,
            balance_cdf: Amount::ZERO,
            bonus_usd: Amount::ZERO,
            created_at: now_iso(),
        };

        snapshot.users.push(user.clone());
        snapshot.sessions.current_user_id = Some(user.id.clone());
        self.store.save(&snapshot);

        info!(user = %user.id, sponsor = ?user.sponsor_code, "registered");
        Ok(user)
    }

    pub fn logout(&mut self) {
        let mut snapshot = self.store.load();
        snapshot.sessions.current_user_id = None;
        self.store.save(&snapshot);
    }

    /// Replace the password of `user_id` after checking the current one.
    pub fn change_password(
        &mut self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), PasswordChangeError> {
        let mut snapshot = self.store.load();
        let min = self.policy.min_password_len;
        let strong = self.policy.is_strong_password(new_password);

        let user = snapshot
            .user_mut(user_id)
            .ok_or_else(|| PasswordChangeError::UserNotFound(user_id.to_string()))?;

        if user.password != old_password {
            return Err(PasswordChangeError::WrongOldPassword);
        }
        if !strong {
            return Err(PasswordChangeError::WeakPassword { min });
        }
        if new_password != confirmation {
            return Err(PasswordChangeError::PasswordMismatch);
        }

        user.password = new_password.to_string();
        self.store.save(&snapshot);

        info!(user = %user_id, "password changed");
        Ok(())
    }

    /// Overwrite the editable profile fields of `user_id`.
    ///
    /// Email and phone must stay unique among the other users.
    pub fn update_profile(
        &mut self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, ProfileError> {
        let mut snapshot = self.store.load();
        if snapshot.user(user_id).is_none() {
            return Err(ProfileError::UserNotFound(user_id.to_string()));
        }

        let email = update.email.trim().to_lowercase();
        let phone = update.phone.trim().to_string();

        let others: Vec<&User> = snapshot.users.iter().filter(|u| u.id != user_id).collect();
        if others.iter().any(|u| u.email == email) {
            return Err(ProfileError::DuplicateEmail);
        }
        if others.iter().any(|u| u.phone == phone) {
            return Err(ProfileError::DuplicatePhone);
        }

        let user = snapshot
            .user_mut(user_id)
            .ok_or_else(|| ProfileError::UserNotFound(user_id.to_string()))?;

        user.lastname = update.lastname.trim().to_string();
        user.firstname = update.firstname.trim().to_string();
        user.gender = update.gender.trim().to_string();
        user.country = update.country.trim().to_string();
        user.phone = phone;
        user.email = email;

        let updated = user.clone();
        self.store.save(&snapshot);

        info!(user = %user_id, "profile updated");
        Ok(updated)
    }

    /// Start a password reset. The outcome is the same whether or not the
    /// account exists; delivery of the reset link is out of band.
    pub fn request_password_reset(&self, identifier: &str) {
        let identifier = identifier.trim();
        let found = self.store.load().find_by_identifier(identifier).is_some();
        debug!(found, "password reset requested");
    }
}
