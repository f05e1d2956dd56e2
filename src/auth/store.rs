//! Credential store backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock};

use super::{CredentialRecord, CredentialStore, Identity, check_present, normalize_email};
use crate::error::AuthError;
use crate::storage;

/// Accounts kept in a JSON-lines file, one [`CredentialRecord`] per line.
pub struct FileCredentialStore {
    path: PathBuf,
    /// Serializes check-then-append so concurrent registrations can't both
    /// claim the same email.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn find(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let records: Vec<CredentialRecord> = storage::read_records(&self.path).await?;
        Ok(records.into_iter().find(|r| r.email == email))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        check_present(&email, password)?;

        let _guard = self.write_lock.lock().await;
        if self.find(&email).await?.is_some() {
            return Err(AuthError::AlreadyRegistered(email));
        }

        let record = CredentialRecord::new(&email, password)?;
        storage::append_record(&self.path, &record).await?;
        tracing::info!(email = %email, "Registered account");
        Ok(record.identity())
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        check_present(&email, password)?;

        match self.find(&email).await? {
            Some(record) if record.verify(password) => Ok(record.identity()),
            _ => {
                tracing::info!(email = %email, "Rejected login");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Accounts held in memory. Useful for tests and embedding.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        check_present(&email, password)?;

        let mut records = self.records.write().await;
        if records.contains_key(&email) {
            return Err(AuthError::AlreadyRegistered(email));
        }
        let record = CredentialRecord::new(&email, password)?;
        let identity = record.identity();
        records.insert(email, record);
        Ok(identity)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        check_present(&email, password)?;

        let records = self.records.read().await;
        match records.get(&email) {
            Some(record) if record.verify(password) => Ok(record.identity()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}
