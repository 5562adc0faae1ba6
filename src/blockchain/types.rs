// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// BNB Smart Chain testnet RPC endpoint.
pub const BSC_TESTNET_RPC_URL: &str = "https://data-seed-prebsc-1-s1.binance.org:8545/";

/// BNB Smart Chain testnet chain ID.
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;

/// Etherscan-compatible API of the BNB Smart Chain testnet explorer.
pub const BSC_TESTNET_EXPLORER_API_URL: &str = "https://api-testnet.bscscan.com/api";

/// Deployed employee clock contract on BNB Smart Chain testnet.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x4ACFE507138b73393Bc97C8913d30f79892eF1f2";

/// Decimals of the native token.
pub const NATIVE_DECIMALS: u8 = 18;

/// Network and contract configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Native token symbol (e.g., "tBNB")
    pub native_symbol: String,
    /// Employee clock contract address
    pub contract_address: String,
    /// Etherscan-compatible explorer API base URL
    pub explorer_api_url: String,
    /// Explorer API key, if any
    pub explorer_api_key: Option<String>,
}

impl NetworkConfig {
    /// BNB Smart Chain testnet with the default contract deployment.
    pub fn bsc_testnet() -> Self {
        Self {
            name: "BNB Smart Chain Testnet".to_string(),
            chain_id: BSC_TESTNET_CHAIN_ID,
            rpc_url: BSC_TESTNET_RPC_URL.to_string(),
            native_symbol: "tBNB".to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            explorer_api_url: BSC_TESTNET_EXPLORER_API_URL.to_string(),
            explorer_api_key: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::bsc_testnet()
    }
}

/// Native balance of an address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Balance {
    /// Address queried
    pub address: String,
    /// Token symbol
    pub symbol: String,
    /// Balance in wei
    pub balance_raw: String,
    /// Balance formatted with decimals
    pub balance_formatted: String,
    pub decimals: u8,
    pub chain_id: u64,
}

/// Which contract function produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClockAction {
    ClockIn,
    ClockOut,
}

/// Where a history record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// `getClockRecords` on the contract
    Contract,
    /// Reconstructed from explorer transaction and log listings
    Explorer,
}

/// One clock-in or clock-out entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClockRecord {
    /// Unix seconds
    pub timestamp: u64,
    /// Location string as sent to the contract
    pub location: String,
    /// Unknown for records returned by `getClockRecords`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ClockAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime_minutes: Option<u64>,
    /// Overtime formatted as "Xh Ym"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub source: RecordSource,
}

/// Confirmation of a mined clock transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Receipt {
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub gas_used: u64,
}
