// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Durable and in-memory state owned by the service.
//!
//! ## Layout
//!
//! ```text
//! $DATA_DIR/
//!   vault.redb      # Credential vault (encrypted keys + addresses)
//! ```
//!
//! The vault is only ever touched through the credential store
//! (`crate::credentials::CredentialStore`); no other module reads or writes it.
//! Clock history is never persisted; [`HistoryCache`] keeps recent lookups in
//! memory for a short time.

pub mod history_cache;
pub mod paths;
pub mod vault;

pub use history_cache::HistoryCache;
pub use paths::StoragePaths;
pub use vault::{CredentialRecord, CredentialVault, VaultError, VaultResult};
