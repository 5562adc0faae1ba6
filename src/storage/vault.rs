// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential vault backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `credentials`: lowercase address → serialized [`CredentialRecord`]
//! - `vault_state`: key → value (sequence counter)
//!
//! Every record carries its own address next to its encrypted blob, so the
//! registry of identities and the blobs can never drift out of alignment.
//! Creation order is kept by a monotonically increasing `seq` assigned inside
//! the same write transaction as the insert.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::credentials::cipher::EncryptedBlob;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: lowercase address → serialized CredentialRecord (JSON bytes).
const CREDENTIALS: TableDefinition<&str, &[u8]> = TableDefinition::new("credentials");

/// Vault state: key → value bytes (e.g., "next_seq" → u64 big-endian).
const VAULT_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("vault_state");

const NEXT_SEQ_KEY: &str = "next_seq";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

// =============================================================================
// Record
// =============================================================================

/// One stored credential: an identity and the blob that unlocks it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Position in creation order (assigned by the vault)
    pub seq: u64,
    /// Checksummed public address of the key inside `blob`
    pub address: String,
    /// Password-encrypted secret key
    pub blob: EncryptedBlob,
    /// When the credential was created
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CredentialVault
// =============================================================================

/// Durable store of encrypted credentials.
pub struct CredentialVault {
    db: Database,
}

impl CredentialVault {
    /// Open (or create) the vault at the given path.
    pub fn open(path: &Path) -> VaultResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CREDENTIALS)?;
            let _ = write_txn.open_table(VAULT_STATE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Append a credential. Never overwrites an existing address.
    ///
    /// The record's `seq` is taken from the vault's sequence counter in the
    /// same transaction; the stored record is returned.
    pub fn append(
        &self,
        address: &str,
        blob: EncryptedBlob,
        created_at: DateTime<Utc>,
    ) -> VaultResult<CredentialRecord> {
        let key = address.to_lowercase();

        let write_txn = self.db.begin_write()?;
        let record = {
            let mut creds = write_txn.open_table(CREDENTIALS)?;
            if creds.get(key.as_str())?.is_some() {
                return Err(VaultError::AlreadyExists(format!("credential {address}")));
            }

            let mut state = write_txn.open_table(VAULT_STATE)?;
            let seq = match state.get(NEXT_SEQ_KEY)? {
                Some(v) => decode_u64(v.value()),
                None => 0,
            };

            let record = CredentialRecord {
                seq,
                address: address.to_string(),
                blob,
                created_at,
            };
            let json = serde_json::to_vec(&record)?;
            creds.insert(key.as_str(), json.as_slice())?;

            let next = (seq + 1).to_be_bytes();
            state.insert(NEXT_SEQ_KEY, next.as_slice())?;
            record
        };
        write_txn.commit()?;

        Ok(record)
    }

    /// Look up a credential by address (case-insensitive).
    pub fn get(&self, address: &str) -> VaultResult<Option<CredentialRecord>> {
        let key = address.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All credentials in creation order.
    pub fn list(&self) -> VaultResult<Vec<CredentialRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;

        let mut records = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            match serde_json::from_slice::<CredentialRecord>(value.value()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable credential record");
                }
            }
        }
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    /// The credential at `index` in creation order.
    pub fn nth(&self, index: usize) -> VaultResult<CredentialRecord> {
        let mut records = self.list()?;
        if records.is_empty() {
            return Err(VaultError::NotFound("no stored credentials".to_string()));
        }
        if index >= records.len() {
            return Err(VaultError::NotFound(format!(
                "credential #{index} (only {} stored)",
                records.len()
            )));
        }
        Ok(records.swap_remove(index))
    }

    /// Remove every credential. Returns how many were removed.
    ///
    /// The sequence counter is kept so positions are never reused.
    pub fn clear(&self) -> VaultResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(CREDENTIALS)?;
            let keys: Vec<String> = table
                .iter()?
                .map(|entry| entry.map(|(k, _)| k.value().to_string()))
                .collect::<Result<_, _>>()?;
            for key in &keys {
                table.remove(key.as_str())?;
            }
            keys.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

fn decode_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);
    u64::from_be_bytes(buf)
}

// =============================================================================
// Tests
// =============================================================================
