// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and the
//! OpenAPI document.
//!
//! Requests carrying a password deliberately do not implement `Debug`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{ClockRecord, Receipt};
use crate::credentials::Identity;
use crate::workflow::WorkflowState;

// =============================================================================
// Wallets
// =============================================================================

#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// At least 8 characters
    pub password: String,
}

/// Unlock by `address` if given, otherwise by `index` (default 0).
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct UnlockWalletRequest {
    pub password: String,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetWalletsRequest {
    /// Must be `true`; resetting destroys every stored key
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetWalletsResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletListResponse {
    pub wallets: Vec<Identity>,
}

// =============================================================================
// Clock
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ClockOutRequest {
    /// Overtime in minutes, 0 to 720
    #[serde(default)]
    pub overtime_minutes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClockResponse {
    pub state: WorkflowState,
    /// Location string sent to the contract
    pub location: String,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub address: String,
    /// Newest first
    pub records: Vec<ClockRecord>,
    /// Whether the records were served from the in-memory cache
    pub cached: bool,
}
