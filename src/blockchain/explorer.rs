// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Etherscan-compatible block explorer client.
//!
//! Used as the history archive when the contract cannot be read: clock
//! transactions are listed with `txlist`, clock events with `getLogs`, and
//! both are decoded through the tables in [`super::decode`].

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::client::ChainError;
use super::decode::{decode_call, decode_log};
use super::types::{ClockRecord, NetworkConfig};
use crate::error::ClockError;
use crate::workflow::RecordArchive;

/// Messages returned with status "0" that just mean an empty listing.
const EMPTY_RESULT_MESSAGES: &[&str] = &["No transactions found", "No records found"];

/// Envelope shared by every explorer API response.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// Entry of a `txlist` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerTx {
    pub hash: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub time_stamp: String,
    #[serde(default)]
    pub is_error: String,
}

/// Entry of a `getLogs` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub time_stamp: String,
    pub transaction_hash: String,
}

pub struct ExplorerClient {
    http: Client,
    api_url: url::Url,
    api_key: Option<String>,
    contract: Address,
}

impl ExplorerClient {
    pub fn new(network: &NetworkConfig, timeout: Duration) -> Result<Self, ChainError> {
        let api_url: url::Url = network
            .explorer_api_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::Explorer(format!("invalid API URL: {e}")))?;
        let contract = Address::from_str(&network.contract_address)
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Explorer(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url,
            api_key: network.explorer_api_key.clone(),
            contract,
        })
    }

    /// Transactions sent from or to `address`, newest first.
    pub async fn transactions(&self, address: Address) -> Result<Vec<ExplorerTx>, ChainError> {
        self.query(&[
            ("module", "account".to_string()),
            ("action", "txlist".to_string()),
            ("address", address.to_string()),
            ("startblock", "0".to_string()),
            ("endblock", "99999999".to_string()),
            ("sort", "desc".to_string()),
        ])
        .await
    }

    /// Every log emitted by the clock contract.
    pub async fn contract_logs(&self) -> Result<Vec<ExplorerLog>, ChainError> {
        self.query(&[
            ("module", "logs".to_string()),
            ("action", "getLogs".to_string()),
            ("address", self.contract.to_string()),
            ("fromBlock", "0".to_string()),
            ("toBlock", "latest".to_string()),
        ])
        .await
    }

    async fn query<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ChainError> {
        let mut request = self.http.get(self.api_url.clone()).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChainError::Explorer(format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ChainError::Explorer(e.to_string()))?
            .json::<ExplorerResponse>()
            .await
            .map_err(|e| ChainError::Explorer(format!("invalid response: {e}")))?;

        into_listing(response)
    }
}

impl RecordArchive for ExplorerClient {
    async fn records(&self, employee: Address) -> Result<Vec<ClockRecord>, ClockError> {
        let txs = self.transactions(employee).await?;
        let logs = self.contract_logs().await?;
        Ok(records_from_listings(&txs, &logs, self.contract, employee))
    }
}

fn into_listing<T: DeserializeOwned>(response: ExplorerResponse) -> Result<Vec<T>, ChainError> {
    if response.status == "1" {
        return serde_json::from_value(response.result)
            .map_err(|e| ChainError::Explorer(format!("unexpected result shape: {e}")));
    }

    if EMPTY_RESULT_MESSAGES
        .iter()
        .any(|m| response.message.contains(m))
    {
        return Ok(Vec::new());
    }

    let detail = match response.result {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Err(ChainError::Explorer(format!(
        "{}: {}",
        response.message, detail
    )))
}

/// Rebuild an employee's clock history from raw explorer listings.
///
/// Event-derived records take precedence over call-derived ones for the same
/// transaction. Entries that fail to decode are logged and dropped. Result is
/// newest first.
pub fn records_from_listings(
    txs: &[ExplorerTx],
    logs: &[ExplorerLog],
    contract: Address,
    employee: Address,
) -> Vec<ClockRecord> {
    let employee_topic = employee.into_word();
    let mut by_hash: HashMap<String, ClockRecord> = HashMap::new();

    for log in logs {
        if !same_address(&log.address, contract) {
            continue;
        }
        let Ok(topics) = log
            .topics
            .iter()
            .map(|t| B256::from_str(t))
            .collect::<Result<Vec<_>, _>>()
        else {
            tracing::warn!(tx_hash = %log.transaction_hash, "Skipping log with malformed topics");
            continue;
        };
        if topics.get(1) != Some(&employee_topic) {
            continue;
        }
        let Ok(data) = alloy::hex::decode(&log.data) else {
            tracing::warn!(tx_hash = %log.transaction_hash, "Skipping log with malformed data");
            continue;
        };

        let timestamp = parse_quantity(&log.time_stamp).unwrap_or(0);
        match decode_log(&topics, &data, &log.transaction_hash, timestamp) {
            None => {}
            Some(Ok(record)) => {
                by_hash.insert(log.transaction_hash.to_lowercase(), record);
            }
            Some(Err(e)) => tracing::warn!(error = %e, "Discarding clock event"),
        }
    }

    for tx in txs {
        if !same_address(&tx.to, contract) || tx.is_error == "1" {
            continue;
        }
        let Ok(input) = alloy::hex::decode(&tx.input) else {
            tracing::warn!(tx_hash = %tx.hash, "Skipping transaction with malformed input");
            continue;
        };

        let timestamp = parse_quantity(&tx.time_stamp).unwrap_or(0);
        match decode_call(&input, &tx.hash, timestamp) {
            None => {}
            Some(Ok(record)) => {
                by_hash
                    .entry(tx.hash.to_lowercase())
                    .or_insert(record);
            }
            Some(Err(e)) => tracing::warn!(error = %e, "Discarding clock transaction"),
        }
    }

    let mut records: Vec<ClockRecord> = by_hash.into_values().collect();
    records.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.tx_hash.cmp(&b.tx_hash))
    });
    records
}

/// Parse a quantity the explorer may report either as hex ("0x1a") or decimal.
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some("") => Some(0),
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn same_address(raw: &str, address: Address) -> bool {
    Address::from_str(raw).is_ok_and(|a| a == address)
}
