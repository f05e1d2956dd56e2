//! Account registration and login.
//!
//! The estimation core never looks inside this module; it only receives the
//! [`Identity`] of whoever placed an order. Passwords are stored as argon2
//! PHC strings.

mod store;

pub use store::{FileCredentialStore, InMemoryCredentialStore};

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Credential storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an account. Fails if the email is already registered.
    async fn register(&self, email: &str, password: &SecretString)
    -> Result<Identity, AuthError>;

    /// Check a login attempt.
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError>;
}

/// Stored form of one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub email: String,
    /// Argon2 hash in PHC string format (algorithm, params and salt included).
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Hash a new password under a fresh random salt.
    pub fn new(email: &str, password: &SecretString) -> Result<Self, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();

        Ok(Self {
            email: email.to_string(),
            password_hash,
            created_at: Utc::now(),
        })
    }

    /// Check a password against the stored hash. A hash that fails to parse
    /// never matches.
    pub fn verify(&self, password: &SecretString) -> bool {
        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(email = %self.email, error = %e, "Stored password hash is malformed");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok()
    }

    /// The identity this record authenticates.
    pub fn identity(&self) -> Identity {
        Identity {
            email: self.email.clone(),
        }
    }
}

/// Canonical account key: trimmed and lowercased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject blank credentials before touching storage.
pub(crate) fn check_present(email: &str, password: &SecretString) -> Result<(), AuthError> {
    if email.is_empty() || password.expose_secret().is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}
