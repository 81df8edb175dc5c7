//! Private-state providers.
//!
//! The ledger never stores secret keys. Each operation asks a provider for the
//! caller's key at call time; the provider is the only place keys live.

use std::collections::BTreeMap;

use zktoken_common::{Address, SecretKey};

use crate::SimulatorError;

/// Caller-local accessor for the secret key of the current call context.
pub trait SecretKeyProvider {
    fn get_secret_key(&self) -> SecretKey;

    /// Public address of the current caller.
    fn caller_address(&self) -> Address {
        self.get_secret_key().address()
    }
}

/// Private state of a single caller.
#[derive(Clone, Debug)]
pub struct PrivateState {
    secret_key: SecretKey,
}

impl PrivateState {
    pub fn new(secret_key: SecretKey) -> Self {
        Self { secret_key }
    }

    pub fn set_secret_key(&mut self, secret_key: SecretKey) {
        self.secret_key = secret_key;
    }
}

impl SecretKeyProvider for PrivateState {
    fn get_secret_key(&self) -> SecretKey {
        self.secret_key.clone()
    }
}

/// Named secret keys with one active user.
///
/// Switching the active user changes which key the next operation is
/// authenticated with, the way a test switches between wallets.
#[derive(Clone, Debug)]
pub struct KeyStore {
    keys: BTreeMap<String, SecretKey>,
    active: String,
    active_key: SecretKey,
}

impl KeyStore {
    /// Create a store holding a single user, who becomes the active caller.
    pub fn new(name: impl Into<String>, secret_key: SecretKey) -> Self {
        let name = name.into();
        let mut keys = BTreeMap::new();
        keys.insert(name.clone(), secret_key.clone());
        Self {
            keys,
            active: name,
            active_key: secret_key,
        }
    }

    /// Build a store from `(name, key)` pairs; the first pair becomes active.
    pub fn from_users<I, S>(users: I) -> Result<Self, SimulatorError>
    where
        I: IntoIterator<Item = (S, SecretKey)>,
        S: Into<String>,
    {
        let mut iter = users.into_iter();
        let (first_name, first_key) = iter.next().ok_or(SimulatorError::EmptyKeyStore)?;
        let mut store = Self::new(first_name, first_key);
        for (name, key) in iter {
            store.insert(name, key);
        }
        Ok(store)
    }

    /// Add or replace a user's key. The active user is unchanged.
    pub fn insert(&mut self, name: impl Into<String>, secret_key: SecretKey) {
        let name = name.into();
        if name == self.active {
            self.active_key = secret_key.clone();
        }
        self.keys.insert(name, secret_key);
    }

    /// Make `name` the caller of subsequent operations.
    pub fn switch_user(&mut self, name: &str) -> Result<(), SimulatorError> {
        let key = self
            .keys
            .get(name)
            .ok_or_else(|| SimulatorError::UnknownUser(name.to_string()))?;
        self.active_key = key.clone();
        self.active = name.to_string();
        Ok(())
    }

    pub fn active_user(&self) -> &str {
        &self.active
    }

    /// Public address of a named user.
    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.keys.get(name).map(SecretKey::address)
    }

    /// Name of the user whose key commits to `address`, if any.
    pub fn user_for(&self, address: &Address) -> Option<&str> {
        self.keys
            .iter()
            .find(|(_, key)| key.address() == *address)
            .map(|(name, _)| name.as_str())
    }

    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

impl SecretKeyProvider for KeyStore {
    fn get_secret_key(&self) -> SecretKey {
        self.active_key.clone()
    }
}
