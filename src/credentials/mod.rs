// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Store
//!
//! Creates, encrypts, persists and recovers the secret keys that sign clock
//! transactions. The store is the only owner of the [`CredentialVault`]; keys
//! leave it only inside an unlocked [`Signer`].
//!
//! Password-based operations run Argon2id and are CPU-heavy; async callers
//! should run them on the blocking pool.

pub mod cipher;
pub mod keys;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{Balance, ChainClient};
use crate::error::ClockError;
use crate::storage::{CredentialRecord, CredentialVault};
use cipher::{CipherError, KdfParams};

/// Minimum password length, in Unicode scalar values.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// A public identity held in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Position in creation order
    pub index: usize,
    /// Checksummed address
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// An unlocked credential, able to sign transactions.
#[derive(Clone)]
pub struct Signer {
    identity: Identity,
    inner: PrivateKeySigner,
}

impl Signer {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// Wallet for a signing provider.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.inner.clone())
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.identity.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl Signer {
    /// Throwaway signer that never touches a vault.
    pub(crate) fn ephemeral() -> Self {
        let (secret, address) = keys::generate();
        let inner = keys::signer_from_bytes(secret.as_ref()).expect("fresh key is valid");
        Self {
            identity: Identity {
                index: 0,
                address: address.to_checksum(None),
                created_at: Utc::now(),
            },
            inner,
        }
    }
}

/// Password-protected key store.
pub struct CredentialStore {
    vault: CredentialVault,
    kdf: KdfParams,
    chain: Arc<ChainClient>,
}

impl CredentialStore {
    pub fn new(vault: CredentialVault, kdf: KdfParams, chain: Arc<ChainClient>) -> Self {
        Self { vault, kdf, chain }
    }

    /// Generate a new key, seal it under `password` and append it to the vault.
    pub fn create(&self, password: &str) -> Result<Identity, ClockError> {
        validate_password(password)?;

        let (secret, address) = keys::generate();
        let address = address.to_checksum(None);

        let blob = cipher::seal(
            secret.as_ref(),
            password,
            address.to_lowercase().as_bytes(),
            self.kdf,
        )
        .map_err(|e| ClockError::Storage(e.to_string()))?;

        let record = self.vault.append(&address, blob, Utc::now())?;
        let index = self.index_of(&record)?;

        tracing::info!(address = %address, index, "Created credential");
        Ok(identity(&record, index))
    }

    /// Unlock the credential at `index` in creation order (default: first).
    pub fn unlock(&self, password: &str, index: Option<usize>) -> Result<Signer, ClockError> {
        let index = index.unwrap_or(0);
        let record = self.vault.nth(index)?;
        open_record(&record, index, password)
    }

    /// Unlock the credential for a specific address.
    pub fn unlock_address(&self, password: &str, address: &str) -> Result<Signer, ClockError> {
        let record = self
            .vault
            .get(address)?
            .ok_or_else(|| ClockError::NotFound(format!("no credential for {address}")))?;
        let index = self.index_of(&record)?;
        open_record(&record, index, password)
    }

    /// All identities in creation order.
    pub fn identities(&self) -> Result<Vec<Identity>, ClockError> {
        Ok(self
            .vault
            .list()?
            .iter()
            .enumerate()
            .map(|(index, record)| identity(record, index))
            .collect())
    }

    /// Delete every stored credential. Irreversible.
    pub fn reset(&self) -> Result<usize, ClockError> {
        let removed = self.vault.clear()?;
        tracing::warn!(removed, "Credential vault cleared");
        Ok(removed)
    }

    /// Native balance of the signer's address. Never retried.
    pub async fn balance(&self, signer: &Signer) -> Result<Balance, ClockError> {
        Ok(self
            .chain
            .get_native_balance(&signer.identity.address)
            .await?)
    }

    fn index_of(&self, record: &CredentialRecord) -> Result<usize, ClockError> {
        self.vault
            .list()?
            .iter()
            .position(|r| r.seq == record.seq)
            .ok_or_else(|| ClockError::NotFound(format!("credential {}", record.address)))
    }
}

/// Password policy, checked before any key material is generated.
pub fn validate_password(password: &str) -> Result<(), ClockError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ClockError::Validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

fn identity(record: &CredentialRecord, index: usize) -> Identity {
    Identity {
        index,
        address: record.address.clone(),
        created_at: record.created_at,
    }
}

fn open_record(
    record: &CredentialRecord,
    index: usize,
    password: &str,
) -> Result<Signer, ClockError> {
    let secret = cipher::open(&record.blob, password, record.address.to_lowercase().as_bytes())
        .map_err(|e| match e {
            CipherError::Authentication => {
                ClockError::Decryption("invalid password or corrupted data".to_string())
            }
            other => ClockError::Decryption(other.to_string()),
        })?;

    let inner = keys::signer_from_bytes(secret.as_slice()).map_err(ClockError::Decryption)?;

    let stored = Address::from_str(&record.address)
        .map_err(|e| ClockError::Decryption(format!("stored address is invalid: {e}")))?;
    if inner.address() != stored {
        tracing::warn!(address = %record.address, "Decrypted key does not match stored address");
        return Err(ClockError::Decryption(
            "decrypted key does not match stored address".to_string(),
        ));
    }

    Ok(Signer {
        identity: identity(record, index),
        inner,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blockchain::NetworkConfig;

    pub(crate) const FAST_KDF: KdfParams = KdfParams {
        m_cost_kib: 64,
        t_cost: 1,
        p_cost: 1,
    };

    pub(crate) fn temp_store() -> (CredentialStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let vault = CredentialVault::open(&dir.path().join("vault.redb")).unwrap();
        let chain = Arc::new(ChainClient::new(NetworkConfig::bsc_testnet()).unwrap());
        (CredentialStore::new(vault, FAST_KDF, chain), dir)
    }

    #[test]
    fn create_then_unlock_recovers_identity() {
        let (store, _dir) = temp_store();
        let identity = store.create("correct horse battery").unwrap();
        assert_eq!(identity.index, 0);

        let signer = store.unlock("correct horse battery", None).unwrap();
        assert_eq!(signer.identity(), &identity);
        assert_eq!(signer.address().to_checksum(None), identity.address);
    }

    #[test]
    fn short_password_fails_before_key_generation() {
        let (store, _dir) = temp_store();
        let err = store.create("short").unwrap_err();
        assert!(matches!(err, ClockError::Validation(_)));
        assert!(store.identities().unwrap().is_empty());
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // 7 characters, 14 bytes
        assert!(validate_password("ééééééé").is_err());
        assert!(validate_password("éééééééé").is_ok());
    }

    #[test]
    fn wrong_password_is_decryption_error() {
        let (store, _dir) = temp_store();
        store.create("correct horse battery").unwrap();
        let err = store.unlock("wrong horse battery", None).unwrap_err();
        assert!(matches!(err, ClockError::Decryption(_)));
    }

    #[test]
    fn unlock_on_empty_store_is_not_found() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.unlock("whatever123", None),
            Err(ClockError::NotFound(_))
        ));
    }

    #[test]
    fn unlock_by_index_and_address() {
        let (store, _dir) = temp_store();
        let first = store.create("first-password").unwrap();
        let second = store.create("second-password").unwrap();
        assert_eq!(second.index, 1);

        let signer = store.unlock("second-password", Some(1)).unwrap();
        assert_eq!(signer.identity().address, second.address);

        let signer = store
            .unlock_address("first-password", &first.address.to_lowercase())
            .unwrap();
        assert_eq!(signer.identity(), &first);

        assert!(matches!(
            store.unlock("second-password", Some(2)),
            Err(ClockError::NotFound(_))
        ));
        assert!(matches!(
            store.unlock_address("first-password", "0x0000000000000000000000000000000000000001"),
            Err(ClockError::NotFound(_))
        ));
    }

    #[test]
    fn identities_are_listed_in_creation_order() {
        let (store, _dir) = temp_store();
        let a = store.create("password-a").unwrap();
        let b = store.create("password-b").unwrap();
        let listed = store.identities().unwrap();
        assert_eq!(listed, vec![a, b]);
    }

    #[test]
    fn reset_removes_every_credential() {
        let (store, _dir) = temp_store();
        store.create("password-a").unwrap();
        store.create("password-b").unwrap();
        assert_eq!(store.reset().unwrap(), 2);
        assert!(store.identities().unwrap().is_empty());
        assert!(matches!(
            store.unlock("password-a", None),
            Err(ClockError::NotFound(_))
        ));
    }

    #[test]
    fn key_sealed_for_another_address_is_rejected() {
        let (store, _dir) = temp_store();
        let (_, stored_address) = keys::generate();
        let stored_address = stored_address.to_checksum(None);
        let (other_secret, _) = keys::generate();

        // Authenticates under the stored address but holds a different key.
        let blob = cipher::seal(
            other_secret.as_ref(),
            "correct horse battery",
            stored_address.to_lowercase().as_bytes(),
            FAST_KDF,
        )
        .unwrap();
        store
            .vault
            .append(&stored_address, blob, Utc::now())
            .unwrap();

        let err = store.unlock("correct horse battery", None).unwrap_err();
        assert!(matches!(
            err,
            ClockError::Decryption(ref m) if m == "decrypted key does not match stored address"
        ));
    }

    #[test]
    fn signer_debug_hides_key() {
        let (store, _dir) = temp_store();
        store.create("correct horse battery").unwrap();
        let signer = store.unlock("correct horse battery", None).unwrap();
        let debug = format!("{signer:?}");
        assert!(debug.contains(&signer.identity().address));
        assert!(!debug.contains("inner"));
    }
}
