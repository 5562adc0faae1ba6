// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Dispatch Workflow
//!
//! Owns the clock session and decides when a clock transaction may be sent.
//!
//! ```text
//!            capture                clock_in
//!   Idle ─────────────► LocationCaptured ─────────► ClockedIn
//!                            ▲                          │
//!                            │ capture                  │ clock_out
//!                            │                          ▼
//!                            └──────────────────── ClockedOut
//! ```
//!
//! A clock call is only dispatched when a signer is unlocked, a position has
//! been captured, and that position is inside the reference site's range.
//! Any failure leaves the session exactly as it was.

pub mod ledger;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{validate_overtime, ClockRecord, Receipt};
use crate::credentials::{Identity, Signer};
use crate::error::ClockError;
use crate::geofence::{GeofenceResult, Position, PositionSource, ReferenceSite};

pub use ledger::{ClockLedger, RecordArchive};

/// Where the session stands in the clock cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    LocationCaptured,
    ClockedIn,
    ClockedOut,
}

/// Extra checks applied before dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Refuse clock-in while clocked in and clock-out while not, consulting
    /// both the session and the contract's `isClockedIn`.
    pub enforce_alternation: bool,
}

/// Serializable view of a [`Session`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSnapshot {
    pub state: WorkflowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence: Option<GeofenceResult>,
    pub site: ReferenceSite,
}

/// The single clock session of this service.
#[derive(Debug)]
pub struct Session {
    signer: Option<Signer>,
    last_position: Option<Position>,
    last_check: Option<GeofenceResult>,
    site: ReferenceSite,
    policy: DispatchPolicy,
    state: WorkflowState,
}

impl Session {
    pub fn new(site: ReferenceSite, policy: DispatchPolicy) -> Self {
        Self {
            signer: None,
            last_position: None,
            last_check: None,
            site,
            policy,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    pub fn position(&self) -> Option<Position> {
        self.last_position
    }

    /// Make `signer` the active identity.
    ///
    /// Switching to a different identity drops any clocked-in/out state,
    /// which belonged to the previous one. The captured position is kept.
    pub fn sign_in(&mut self, signer: Signer) {
        let same = self
            .signer
            .as_ref()
            .is_some_and(|s| s.address() == signer.address());
        if !same {
            self.state = self.rest_state();
        }
        self.signer = Some(signer);
    }

    /// Forget the active identity.
    pub fn sign_out(&mut self) {
        if self.signer.take().is_some() {
            self.state = self.rest_state();
        }
    }

    /// Ask `source` for the current position and evaluate it.
    ///
    /// On failure nothing changes. While clocked in the position is refreshed
    /// but the state stays `ClockedIn`.
    pub async fn capture<S: PositionSource>(
        &mut self,
        source: &S,
    ) -> Result<GeofenceResult, ClockError> {
        let position = source.current_position().await?;
        let check = self.site.evaluate(&position);

        self.last_position = Some(position);
        self.last_check = Some(check);
        if self.state != WorkflowState::ClockedIn {
            self.state = WorkflowState::LocationCaptured;
        }

        tracing::debug!(
            distance_km = check.distance_km,
            within_range = check.within_range,
            "Position captured"
        );
        Ok(check)
    }

    /// Send `clockIn(location)` and wait for the receipt.
    pub async fn clock_in<L: ClockLedger>(&mut self, ledger: &L) -> Result<Receipt, ClockError> {
        let (signer, position) = self.authorize()?;

        if self.policy.enforce_alternation
            && (self.state == WorkflowState::ClockedIn
                || ledger.is_clocked_in(signer.address()).await?)
        {
            return Err(ClockError::Validation("already clocked in".to_string()));
        }

        let location = position.location_encoding();
        let receipt = ledger.clock_in(signer, &location).await?;

        tracing::info!(
            address = %signer.identity().address,
            tx_hash = %receipt.tx_hash,
            "Clocked in"
        );
        self.state = WorkflowState::ClockedIn;
        Ok(receipt)
    }

    /// Send `clockOut(location[, overtime])` and wait for the receipt.
    pub async fn clock_out<L: ClockLedger>(
        &mut self,
        ledger: &L,
        overtime_minutes: Option<u64>,
    ) -> Result<Receipt, ClockError> {
        let (signer, position) = self.authorize()?;
        if let Some(minutes) = overtime_minutes {
            validate_overtime(minutes)?;
        }

        if self.policy.enforce_alternation
            && self.state != WorkflowState::ClockedIn
            && !ledger.is_clocked_in(signer.address()).await?
        {
            return Err(ClockError::Validation("not clocked in".to_string()));
        }

        let location = position.location_encoding();
        let receipt = ledger
            .clock_out(signer, &location, overtime_minutes)
            .await?;

        tracing::info!(
            address = %signer.identity().address,
            tx_hash = %receipt.tx_hash,
            overtime_minutes,
            "Clocked out"
        );
        self.state = WorkflowState::ClockedOut;
        Ok(receipt)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            identity: self.signer.as_ref().map(|s| s.identity().clone()),
            position: self.last_position,
            geofence: self.last_check,
            site: self.site,
        }
    }

    /// Preconditions shared by clock-in and clock-out.
    fn authorize(&self) -> Result<(&Signer, Position), ClockError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| ClockError::Validation("wallet is locked".to_string()))?;
        let position = self
            .last_position
            .ok_or_else(|| ClockError::Validation("location not set".to_string()))?;

        let check = self.site.evaluate(&position);
        if !check.within_range {
            tracing::info!(
                distance_km = check.distance_km,
                max_distance_km = self.site.max_distance_km,
                "Clock request outside geofence"
            );
            return Err(ClockError::OutOfRange {
                distance_km: check.distance_km,
                max_distance_km: self.site.max_distance_km,
            });
        }
        Ok((signer, position))
    }

    fn rest_state(&self) -> WorkflowState {
        if self.last_position.is_some() {
            WorkflowState::LocationCaptured
        } else {
            WorkflowState::Idle
        }
    }
}

/// Clock history of `employee`, newest first.
///
/// Reads the contract first; if that fails the archive is consulted. When
/// both fail the archive's error is returned.
pub async fn fetch_history<L: ClockLedger, A: RecordArchive>(
    ledger: &L,
    archive: &A,
    employee: Address,
) -> Result<Vec<ClockRecord>, ClockError> {
    match ledger.clock_records(employee).await {
        Ok(mut records) => {
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(records)
        }
        Err(primary) => {
            tracing::warn!(
                employee = %employee,
                error = %primary,
                "Contract history unavailable, falling back to explorer"
            );
            archive.records(employee).await
        }
    }
}
