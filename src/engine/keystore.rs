//! deploy-lock Keystore Module
//! GitHub tokens in the OS keyring, one entry per API host

use keyring::Entry;
use thiserror::Error;

const SERVICE_NAME: &str = "deploy-lock";

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("Keyring error: {0}")]
    KeyringError(String),
}

pub struct Keystore {
    account: String,
}

impl Keystore {
    /// Keystore for tokens used against `api_url`.
    pub fn new(api_url: &str) -> Self {
        Self {
            account: Self::account_for(api_url),
        }
    }

    /// `github_token@api.github.com` style account name.
    fn account_for(api_url: &str) -> String {
        let host = api_url
            .split("://")
            .nth(1)
            .unwrap_or(api_url)
            .split('/')
            .next()
            .unwrap_or_default();
        format!("github_token@{}", host)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn entry(&self) -> Result<Entry, KeystoreError> {
        Entry::new(SERVICE_NAME, &self.account).map_err(|e| KeystoreError::KeyringError(e.to_string()))
    }

    /// Store GitHub token in OS keyring
    pub fn store_github_token(&self, token: &str) -> Result<(), KeystoreError> {
        self.entry()?
            .set_password(token)
            .map_err(|e| KeystoreError::KeyringError(e.to_string()))
    }

    /// Retrieve GitHub token from OS keyring, `None` when nothing is stored
    pub fn get_github_token(&self) -> Result<Option<String>, KeystoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeystoreError::KeyringError(e.to_string())),
        }
    }

    /// Delete GitHub token from OS keyring. Returns false if none was stored.
    pub fn delete_github_token(&self) -> Result<bool, KeystoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(KeystoreError::KeyringError(e.to_string())),
        }
    }
}
