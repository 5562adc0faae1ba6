// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Short-lived memory of clock history per employee.
//!
//! A history lookup costs a contract call and, on failure, two explorer
//! requests. The last answer for an employee is reused until it is older than
//! the TTL or that employee dispatches a new clock transaction.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use lru::LruCache;

use crate::blockchain::ClockRecord;

struct Fetched {
    records: Vec<ClockRecord>,
    at: Instant,
}

/// Recent history lookups, least recently used evicted first.
pub struct HistoryCache {
    entries: Mutex<LruCache<Address, Fetched>>,
    ttl: Duration,
}

impl HistoryCache {
    /// Remember up to `employees` histories, each for at most `ttl`.
    pub fn new(employees: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(employees).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// History of `employee` if it was fetched less than a TTL ago.
    pub fn fresh(&self, employee: Address) -> Option<Vec<ClockRecord>> {
        let mut entries = self.entries();
        match entries.get(&employee) {
            None => return None,
            Some(fetched) if fetched.at.elapsed() < self.ttl => {
                return Some(fetched.records.clone())
            }
            Some(_) => {}
        }
        entries.pop(&employee);
        None
    }

    pub fn store(&self, employee: Address, records: Vec<ClockRecord>) {
        self.entries().put(
            employee,
            Fetched {
                records,
                at: Instant::now(),
            },
        );
    }

    /// Called after `employee` clocked in or out.
    pub fn forget(&self, employee: Address) {
        self.entries().pop(&employee);
    }

    /// Called when the credential store is reset.
    pub fn clear(&self) {
        self.entries().clear();
    }

    // The cache holds no invariants a panicking writer could break.
    fn entries(&self) -> MutexGuard<'_, LruCache<Address, Fetched>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
