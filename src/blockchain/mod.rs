// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain integration.
//!
//! This module provides:
//! - Native balance queries over JSON-RPC
//! - Typed bindings to the employee clock contract
//! - An Etherscan-compatible explorer client for history fallback
//! - Declarative decoding of clock calls and events

pub mod client;
pub mod contract;
pub mod decode;
pub mod explorer;
pub mod types;

pub use client::{format_amount, ChainClient, ChainError};
pub use contract::ContractLedger;
pub use decode::{format_overtime, validate_overtime, MAX_OVERTIME_MINUTES};
pub use explorer::ExplorerClient;
pub use types::*;
