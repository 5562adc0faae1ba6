// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::blockchain::{ChainClient, ContractLedger, ExplorerClient};
use crate::config::{AppConfig, HISTORY_CACHE_CAPACITY};
use crate::credentials::CredentialStore;
use crate::error::ClockError;
use crate::storage::{CredentialVault, HistoryCache, StoragePaths, VaultError};
use crate::workflow::Session;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CredentialStore>,
    pub session: Arc<Mutex<Session>>,
    pub ledger: Arc<ContractLedger>,
    pub explorer: Arc<ExplorerClient>,
    pub history: Arc<HistoryCache>,
}

impl AppState {
    /// Open the vault and build every client from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let paths = StoragePaths::new(&config.data_dir);
        let vault = CredentialVault::open(&paths.vault_db())?;

        let chain = Arc::new(ChainClient::new(config.network.clone())?);
        let ledger = ContractLedger::new(chain.clone(), &config.network.contract_address)?;
        let explorer = ExplorerClient::new(&config.network, config.http_timeout)?;

        Ok(Self {
            store: Arc::new(CredentialStore::new(vault, config.kdf, chain)),
            session: Arc::new(Mutex::new(Session::new(config.site, config.policy))),
            ledger: Arc::new(ledger),
            explorer: Arc::new(explorer),
            history: Arc::new(HistoryCache::new(
                HISTORY_CACHE_CAPACITY,
                config.history_cache_ttl,
            )),
        })
    }

    /// Exclusive access to the session, or `Busy` if another operation holds it.
    pub fn session(&self) -> Result<MutexGuard<'_, Session>, ClockError> {
        self.session.try_lock().map_err(|_| ClockError::Busy)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to open credential vault: {0}")]
    Vault(#[from] VaultError),

    #[error("invalid chain configuration: {0}")]
    Chain(#[from] crate::blockchain::ChainError),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::credentials::tests::FAST_KDF;

    /// State over a temporary data directory with cheap key derivation.
    pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            kdf: FAST_KDF,
            ..AppConfig::default()
        };
        (AppState::from_config(&config).unwrap(), dir)
    }

    #[tokio::test]
    async fn concurrent_session_access_is_busy() {
        let (state, _dir) = test_state();
        let _held = state.session().unwrap();
        assert!(matches!(state.session(), Err(ClockError::Busy)));
    }

    #[tokio::test]
    async fn session_is_released_after_use() {
        let (state, _dir) = test_state();
        drop(state.session().unwrap());
        assert!(state.session().is_ok());
    }
}
