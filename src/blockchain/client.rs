// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC client for balance queries and signed providers.

use std::str::FromStr;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
};

use super::types::*;

/// Read-only JSON-RPC client.
pub struct ChainClient {
    /// Network configuration
    network: NetworkConfig,
    /// Parsed RPC endpoint
    rpc_url: url::Url,
    /// Alloy HTTP provider
    provider: DynProvider,
}

impl ChainClient {
    /// Create a new client for the specified network.
    ///
    /// No connection is made until the first request.
    pub fn new(network: NetworkConfig) -> Result<Self, ChainError> {
        let rpc_url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.clone())
            .erased();

        Ok(Self {
            network,
            rpc_url,
            provider,
        })
    }

    /// Get the native balance for an address.
    pub async fn get_native_balance(&self, address: &str) -> Result<Balance, ChainError> {
        let addr = Address::from_str(address)
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;

        let balance = self
            .provider
            .get_balance(addr)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;

        Ok(Balance {
            address: addr.to_checksum(None),
            symbol: self.network.native_symbol.clone(),
            balance_raw: balance.to_string(),
            balance_formatted: format_amount(balance, NATIVE_DECIMALS),
            decimals: NATIVE_DECIMALS,
            chain_id: self.network.chain_id,
        })
    }

    /// Read-only provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Provider that signs and sends transactions with `wallet`.
    ///
    /// The chain ID comes from the network configuration, not from the node.
    pub fn signing_provider(&self, wallet: EthereumWallet) -> DynProvider {
        ProviderBuilder::new()
            .disable_recommended_fillers()
            .with_gas_estimation()
            .with_simple_nonce_management()
            .with_chain_id(self.network.chain_id)
            .wallet(wallet)
            .connect_http(self.rpc_url.clone())
            .erased()
    }
}

/// Format a raw amount with the specified number of decimals (at most 6 shown).
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
        }
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Explorer error: {0}")]
    Explorer(String),
}
