// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! geoclock - Geofenced Clock In/Out Service
//!
//! Keeps password-encrypted wallet keys on local disk, checks reported
//! positions against a fixed work site and records clock-in/clock-out events
//! on an EVM contract (BNB Smart Chain testnet by default).
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - RPC client, contract binding and block explorer fallback
//! - `credentials` - Key generation and password-based encryption
//! - `geofence` - Haversine distance and range check
//! - `storage` - Credential vault (redb) and history cache
//! - `workflow` - Session state machine gating contract dispatch

pub mod api;
pub mod blockchain;
pub mod config;
pub mod credentials;
pub mod error;
pub mod geofence;
pub mod models;
pub mod state;
pub mod storage;
pub mod workflow;
