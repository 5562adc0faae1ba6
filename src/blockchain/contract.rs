// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Employee clock contract bindings.

use std::str::FromStr;
use std::sync::Arc;

use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{DynProvider, PendingTransactionBuilder},
    sol,
};

use super::client::{ChainClient, ChainError};
use super::types::{ClockRecord, Receipt, RecordSource};
use crate::credentials::Signer;
use crate::error::ClockError;
use crate::workflow::ClockLedger;

sol! {
    #[sol(rpc)]
    contract EmployeeClock {
        struct ClockEntry {
            uint256 timestamp;
            string location;
        }

        event ClockedIn(address indexed employee, uint256 timestamp, string location);
        event ClockedOut(address indexed employee, uint256 timestamp, string location, uint256 overtimeMinutes);

        function clockIn(string location) external;
        function clockOut(string location) external;
        function clockOut(string location, uint256 overtimeMinutes) external;
        function getClockRecords(address employee) external view returns (ClockEntry[] memory);
        function isClockedIn(address employee) external view returns (bool);
    }
}

/// [`ClockLedger`] backed by the deployed contract.
pub struct ContractLedger {
    chain: Arc<ChainClient>,
    address: Address,
}

impl ContractLedger {
    pub fn new(chain: Arc<ChainClient>, contract_address: &str) -> Result<Self, ChainError> {
        let address = Address::from_str(contract_address)
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;
        Ok(Self { chain, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn reader(&self) -> EmployeeClock::EmployeeClockInstance<DynProvider> {
        EmployeeClock::new(self.address, self.chain.provider().clone())
    }

    fn writer(&self, signer: &Signer) -> EmployeeClock::EmployeeClockInstance<DynProvider> {
        EmployeeClock::new(self.address, self.chain.signing_provider(signer.wallet()))
    }
}

impl ClockLedger for ContractLedger {
    async fn clock_in(&self, signer: &Signer, location: &str) -> Result<Receipt, ClockError> {
        let pending = self
            .writer(signer)
            .clockIn(location.to_string())
            .send()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;
        Ok(confirm(pending).await?)
    }

    async fn clock_out(
        &self,
        signer: &Signer,
        location: &str,
        overtime_minutes: Option<u64>,
    ) -> Result<Receipt, ClockError> {
        let contract = self.writer(signer);
        let sent = match overtime_minutes {
            None => contract.clockOut_0(location.to_string()).send().await,
            Some(minutes) => {
                contract
                    .clockOut_1(location.to_string(), U256::from(minutes))
                    .send()
                    .await
            }
        };
        let pending = sent.map_err(|e| ChainError::ContractError(e.to_string()))?;
        Ok(confirm(pending).await?)
    }

    async fn clock_records(&self, employee: Address) -> Result<Vec<ClockRecord>, ClockError> {
        let entries = self
            .reader()
            .getClockRecords(employee)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|entry| ClockRecord {
                timestamp: entry.timestamp.saturating_to::<u64>(),
                location: entry.location,
                action: None,
                overtime_minutes: None,
                overtime: None,
                tx_hash: None,
                source: RecordSource::Contract,
            })
            .collect())
    }

    async fn is_clocked_in(&self, employee: Address) -> Result<bool, ClockError> {
        Ok(self
            .reader()
            .isClockedIn(employee)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?)
    }
}

/// Wait until the transaction is mined and check its status.
async fn confirm(pending: PendingTransactionBuilder<Ethereum>) -> Result<Receipt, ChainError> {
    let tx_hash = *pending.tx_hash();
    tracing::info!(tx_hash = %tx_hash, "Clock transaction sent, awaiting receipt");

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;

    if !receipt.status() {
        return Err(ChainError::TransactionFailed(format!(
            "transaction {tx_hash} reverted"
        )));
    }

    Ok(Receipt {
        tx_hash: format!("{:#x}", receipt.transaction_hash),
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}
