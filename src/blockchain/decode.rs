// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoding of clock calls and events found in explorer listings.
//!
//! Each known function selector and event signature maps to one entry of a
//! static decoder table. Unknown selectors and topics are not errors; they
//! are other traffic to the same contract and are skipped.

use alloy::primitives::{B256, U256};
use alloy::sol_types::{SolCall, SolEvent};

use super::contract::EmployeeClock;
use super::types::{ClockAction, ClockRecord, RecordSource};
use crate::error::ClockError;

/// Upper bound on overtime accepted in either direction (12 hours).
pub const MAX_OVERTIME_MINUTES: u64 = 720;

/// Fields recovered from one call or log.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub location: String,
    /// Only events carry a timestamp; calls take the block's
    pub timestamp: Option<u64>,
    pub overtime: Option<U256>,
}

type DecodeResult = Result<Decoded, alloy::sol_types::Error>;

/// Decoder for transaction input, keyed by function selector.
pub struct CallDecoder {
    pub selector: [u8; 4],
    pub action: ClockAction,
    decode: fn(&[u8]) -> DecodeResult,
}

/// Decoder for a log, keyed by event signature hash (topic0).
pub struct EventDecoder {
    pub topic: B256,
    pub action: ClockAction,
    decode: fn(&[B256], &[u8]) -> DecodeResult,
}

pub static CALL_DECODERS: &[CallDecoder] = &[
    CallDecoder {
        selector: EmployeeClock::clockInCall::SELECTOR,
        action: ClockAction::ClockIn,
        decode: decode_clock_in,
    },
    CallDecoder {
        selector: EmployeeClock::clockOut_0Call::SELECTOR,
        action: ClockAction::ClockOut,
        decode: decode_clock_out,
    },
    CallDecoder {
        selector: EmployeeClock::clockOut_1Call::SELECTOR,
        action: ClockAction::ClockOut,
        decode: decode_clock_out_overtime,
    },
];

pub static EVENT_DECODERS: &[EventDecoder] = &[
    EventDecoder {
        topic: EmployeeClock::ClockedIn::SIGNATURE_HASH,
        action: ClockAction::ClockIn,
        decode: decode_clocked_in,
    },
    EventDecoder {
        topic: EmployeeClock::ClockedOut::SIGNATURE_HASH,
        action: ClockAction::ClockOut,
        decode: decode_clocked_out,
    },
];

fn decode_clock_in(input: &[u8]) -> DecodeResult {
    let call = EmployeeClock::clockInCall::abi_decode(input)?;
    Ok(Decoded {
        location: call.location,
        timestamp: None,
        overtime: None,
    })
}

fn decode_clock_out(input: &[u8]) -> DecodeResult {
    let call = EmployeeClock::clockOut_0Call::abi_decode(input)?;
    Ok(Decoded {
        location: call.location,
        timestamp: None,
        overtime: None,
    })
}

fn decode_clock_out_overtime(input: &[u8]) -> DecodeResult {
    let call = EmployeeClock::clockOut_1Call::abi_decode(input)?;
    Ok(Decoded {
        location: call.location,
        timestamp: None,
        overtime: Some(call.overtimeMinutes),
    })
}

fn decode_clocked_in(topics: &[B256], data: &[u8]) -> DecodeResult {
    let event = EmployeeClock::ClockedIn::decode_raw_log(topics.iter().copied(), data)?;
    Ok(Decoded {
        location: event.location,
        timestamp: Some(event.timestamp.saturating_to::<u64>()),
        overtime: None,
    })
}

fn decode_clocked_out(topics: &[B256], data: &[u8]) -> DecodeResult {
    let event = EmployeeClock::ClockedOut::decode_raw_log(topics.iter().copied(), data)?;
    Ok(Decoded {
        location: event.location,
        timestamp: Some(event.timestamp.saturating_to::<u64>()),
        overtime: Some(event.overtimeMinutes),
    })
}

/// Decode transaction input into a record.
///
/// `None` when the selector is not a clock function. `block_timestamp`
/// is used since calls carry no timestamp of their own.
pub fn decode_call(
    input: &[u8],
    tx_hash: &str,
    block_timestamp: u64,
) -> Option<Result<ClockRecord, ClockError>> {
    let selector: [u8; 4] = input.get(..4)?.try_into().ok()?;
    let decoder = CALL_DECODERS.iter().find(|d| d.selector == selector)?;
    Some(
        (decoder.decode)(input)
            .map_err(|e| ClockError::Decode(format!("call {tx_hash}: {e}")))
            .and_then(|decoded| into_record(decoder.action, decoded, tx_hash, block_timestamp)),
    )
}

/// Decode a log into a record.
///
/// `None` when topic0 is not a clock event.
pub fn decode_log(
    topics: &[B256],
    data: &[u8],
    tx_hash: &str,
    block_timestamp: u64,
) -> Option<Result<ClockRecord, ClockError>> {
    let topic0 = topics.first()?;
    let decoder = EVENT_DECODERS.iter().find(|d| &d.topic == topic0)?;
    Some(
        (decoder.decode)(topics, data)
            .map_err(|e| ClockError::Decode(format!("log {tx_hash}: {e}")))
            .and_then(|decoded| into_record(decoder.action, decoded, tx_hash, block_timestamp)),
    )
}

fn into_record(
    action: ClockAction,
    decoded: Decoded,
    tx_hash: &str,
    block_timestamp: u64,
) -> Result<ClockRecord, ClockError> {
    let overtime_minutes = match decoded.overtime {
        None => None,
        Some(raw) if raw <= U256::from(MAX_OVERTIME_MINUTES) => Some(raw.to::<u64>()),
        Some(raw) => {
            return Err(ClockError::Decode(format!(
                "{tx_hash}: overtime {raw} minutes out of range"
            )))
        }
    };

    Ok(ClockRecord {
        timestamp: decoded.timestamp.unwrap_or(block_timestamp),
        location: decoded.location,
        action: Some(action),
        overtime_minutes,
        overtime: overtime_minutes.map(format_overtime),
        tx_hash: Some(tx_hash.to_string()),
        source: RecordSource::Explorer,
    })
}

/// Check a requested overtime value.
pub fn validate_overtime(minutes: u64) -> Result<u64, ClockError> {
    if minutes > MAX_OVERTIME_MINUTES {
        return Err(ClockError::Validation(format!(
            "overtime must be between 0 and {MAX_OVERTIME_MINUTES} minutes"
        )));
    }
    Ok(minutes)
}

/// Format minutes as "Xh Ym".
pub fn format_overtime(minutes: u64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}
