// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::{
    digits::{MAX_RING_SIZE, MIN_RING_SIZE},
    error::{Error, Result},
    params::RoundScope,
    sink::DEFAULT_DESTINATION,
    worker::LockOrder,
};
use std::time::Duration;

/// Ring size of the classic exercise: one slot per digit of a nine digit number.
pub const DEFAULT_RING_SIZE: usize = 9;

/// How the workers are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One thread per worker, all running at the same time.
    #[default]
    Concurrent,
    /// All workers on the calling thread, round by round,
    /// each round in worker order `0..N`. The result is reproducible.
    Sequential,
}

/// Configuration of a ring run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig {
    /// Number of slots and workers.
    pub ring_size: usize,
    pub lock_order: LockOrder,
    pub round_scope: RoundScope,
    pub mode: ExecutionMode,
    /// Upper bound for joining the workers.
    /// `None` waits forever, also on a deadlocked ring.
    pub join_timeout: Option<Duration>,
    /// Destination name handed to the result sink.
    pub destination: String,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE,
            lock_order: LockOrder::default(),
            round_scope: RoundScope::default(),
            mode: ExecutionMode::default(),
            join_timeout: None,
            destination: DEFAULT_DESTINATION.to_string(),
        }
    }
}

impl RingConfig {
    /// Set the number of slots and workers.
    pub fn with_ring_size(mut self, ring_size: usize) -> Self {
        self.ring_size = ring_size;
        self
    }

    /// Set the slot locking order of all workers.
    pub fn with_lock_order(mut self, lock_order: LockOrder) -> Self {
        self.lock_order = lock_order;
        self
    }

    /// Set how the requested rounds are applied to the workers.
    pub fn with_round_scope(mut self, round_scope: RoundScope) -> Self {
        self.round_scope = round_scope;
        self
    }

    /// Set the execution mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Give up joining the workers after `timeout`.
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = Some(timeout);
        self
    }

    /// Set the destination name handed to the result sink.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Check that a ring can be built from this configuration.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RING_SIZE..=MAX_RING_SIZE).contains(&self.ring_size) {
            return Err(Error::ResourceInitialization(format!(
                "ring size {} is out of range {MIN_RING_SIZE}..={MAX_RING_SIZE}",
                self.ring_size
            )));
        }
        Ok(())
    }
}


// vim: ts=4 sw=4 expandtab
