// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// One completed update of a digit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRecord {
    /// Id of the updating worker.
    pub worker: usize,
    /// Zero based round of this worker.
    pub round: u64,
    /// The worker's own slot.
    pub first_index: usize,
    /// The successor slot.
    pub second_index: usize,
    /// Digits of (first, second) before the update.
    pub before: (u8, u8),
    /// Digits of (first, second) after the update.
    pub after: (u8, u8),
}

/// Receiver of per-update records.
///
/// Records of different workers arrive in no particular order.
/// Workers call this after both slots have been released.
pub trait UpdateObserver: Send + Sync {
    fn on_update(&self, record: &UpdateRecord);
}

/// Emits every update as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl UpdateObserver for TracingObserver {
    fn on_update(&self, r: &UpdateRecord) {
        debug!(
            worker = r.worker,
            round = r.round,
            first = r.first_index,
            second = r.second_index,
            "Worker {}: Modified digits[{}] and digits[{}] from {} and {} to {} and {}",
            r.worker + 1,
            r.first_index + 1,
            r.second_index + 1,
            r.before.0,
            r.before.1,
            r.after.0,
            r.after.1,
        );
    }
}

/// Keeps all records in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    records: Mutex<Vec<UpdateRecord>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records received so far, in arrival order.
    pub fn records(&self) -> Vec<UpdateRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of records received from `worker`.
    pub fn count_for(&self, worker: usize) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.worker == worker)
            .count()
    }
}

impl UpdateObserver for RecordingObserver {
    fn on_update(&self, record: &UpdateRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*record);
    }
}


// vim: ts=4 sw=4 expandtab
