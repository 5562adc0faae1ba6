// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote collaborators of the workflow.

use std::future::Future;

use alloy::primitives::Address;

use crate::blockchain::{ClockRecord, Receipt};
use crate::credentials::Signer;
use crate::error::ClockError;

/// The clock contract, as seen by the workflow.
///
/// Dispatch methods resolve once the transaction is mined. Nothing is retried.
pub trait ClockLedger {
    fn clock_in(
        &self,
        signer: &Signer,
        location: &str,
    ) -> impl Future<Output = Result<Receipt, ClockError>> + Send;

    /// `overtime_minutes` selects the two-argument `clockOut` overload.
    fn clock_out(
        &self,
        signer: &Signer,
        location: &str,
        overtime_minutes: Option<u64>,
    ) -> impl Future<Output = Result<Receipt, ClockError>> + Send;

    fn clock_records(
        &self,
        employee: Address,
    ) -> impl Future<Output = Result<Vec<ClockRecord>, ClockError>> + Send;

    fn is_clocked_in(
        &self,
        employee: Address,
    ) -> impl Future<Output = Result<bool, ClockError>> + Send;
}

/// Secondary source of clock history, reconstructed from chain data.
pub trait RecordArchive {
    /// Records of `employee`, newest first.
    fn records(
        &self,
        employee: Address,
    ) -> impl Future<Output = Result<Vec<ClockRecord>, ClockError>> + Send;
}
