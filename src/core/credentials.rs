//! Per-chain explorer API keys over the key-value substrate

use std::sync::Arc;
use tracing::{info, warn};

use crate::models::config::ChainId;
use crate::models::errors::AppResult;
use crate::utils::constants::CREDENTIAL_KEY_PREFIX;
use crate::utils::storage::KeyValueStore;

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn storage_key(chain: ChainId) -> String {
        format!("{}{}", CREDENTIAL_KEY_PREFIX, chain.id())
    }

    /// Overwrite the key for `chain`. No shape validation.
    pub fn set(&self, chain: ChainId, key: &str) -> AppResult<()> {
        self.store.set(&Self::storage_key(chain), key)?;
        info!(chain = %chain.name(), "🔑 Explorer API key saved (key hidden)");
        Ok(())
    }

    /// Stored key, or empty string when none is stored
    pub fn get(&self, chain: ChainId) -> String {
        match self.store.get(&Self::storage_key(chain)) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(chain = %chain.name(), error = %e, "Credential read failed, treating as unset");
                String::new()
            }
        }
    }

    pub fn is_configured(&self, chain: ChainId) -> bool {
        !self.get(chain).is_empty()
    }

    /// Seed keys from the environment, returns how many were written
    pub fn seed(&self, keys: &[(ChainId, String)]) -> AppResult<usize> {
        for (chain, key) in keys {
            self.set(*chain, key)?;
        }
        Ok(keys.len())
    }
}
