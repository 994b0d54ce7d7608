// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::{
    digits::MIN_RING_SIZE,
    observe::{UpdateObserver, UpdateRecord},
    slotlock::{SlotGuard, SlotLock},
    transform::transform,
};
use std::{thread, time::Duration};
use tracing::{debug, trace};

/// Ring of decimal digits, one lock per digit.
pub type DigitRing = SlotLock<u8>;

/// Order in which a worker locks its two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockOrder {
    /// Own slot first, then the successor.
    ///
    /// The last worker locks slot `N-1` and then slot `0`, which closes a
    /// cycle over all workers. With unlucky scheduling every worker holds its
    /// own slot and waits for its successor forever.
    #[default]
    OwnThenSuccessor,
    /// Lower slot index first, regardless of role.
    /// All workers lock in the same global order, so no cycle can form.
    LowerIndexFirst,
}

/// Hook to influence scheduling between the two acquisitions of an update.
pub trait Interleaving: Send + Sync {
    /// Called while `worker` holds its first slot and before it requests the second one.
    fn after_first_acquire(&self, worker: usize, round: u64);
}

/// No scheduling influence.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterleaving;

impl Interleaving for NoInterleaving {
    #[inline]
    fn after_first_acquire(&self, _worker: usize, _round: u64) {}
}

/// Sleep while holding the first slot. Widens the deadlock window.
#[derive(Debug, Clone, Copy)]
pub struct DelayInterleaving(pub Duration);

impl Interleaving for DelayInterleaving {
    fn after_first_acquire(&self, _worker: usize, _round: u64) {
        thread::sleep(self.0);
    }
}

/// One worker of the ring, bound to slot `id` and its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Worker {
    id: usize,
    first_index: usize,
    second_index: usize,
    rounds: u64,
}

impl Worker {
    /// Construct worker `id` of a ring with `ring_size` slots.
    pub fn new(id: usize, ring_size: usize, rounds: u64) -> Worker {
        if ring_size < MIN_RING_SIZE {
            panic!("Ring size must be at least {MIN_RING_SIZE}.");
        }
        if id >= ring_size {
            panic!("Invalid worker id. It must be 0 <= id < ring_size.");
        }
        Worker {
            id,
            first_index: id,
            second_index: (id + 1) % ring_size,
            rounds,
        }
    }

    /// Get the worker id, which is also the index of its first slot.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the index of the first slot.
    #[inline]
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    /// Get the index of the successor slot.
    #[inline]
    pub fn second_index(&self) -> usize {
        self.second_index
    }

    /// Get the number of updates this worker performs.
    #[inline]
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Lock both slots in the given `order`.
    /// Returns the guards as (first, second), independent of the locking order.
    fn acquire_pair<'a>(
        &self,
        ring: &'a DigitRing,
        order: LockOrder,
        interleaving: &dyn Interleaving,
        round: u64,
    ) -> (SlotGuard<'a, u8>, SlotGuard<'a, u8>) {
        let swap = order == LockOrder::LowerIndexFirst && self.second_index < self.first_index;
        let (lead, follow) = if swap {
            (self.second_index, self.first_index)
        } else {
            (self.first_index, self.second_index)
        };

        let lead_guard = ring.acquire(lead);
        trace!(worker = self.id, slot = lead, "holding first slot");
        interleaving.after_first_acquire(self.id, round);
        let follow_guard = ring.acquire(follow);

        if swap {
            (follow_guard, lead_guard)
        } else {
            (lead_guard, follow_guard)
        }
    }

    /// Perform a single update.
    ///
    /// Both slots are released before this returns.
    pub fn step(
        &self,
        ring: &DigitRing,
        round: u64,
        order: LockOrder,
        interleaving: &dyn Interleaving,
    ) -> UpdateRecord {
        let (mut first, mut second) = self.acquire_pair(ring, order, interleaving, round);

        let before = (*first, *second);
        let after = transform(self.id, before.0, before.1);
        *first = after.0;
        *second = after.1;

        second.release();
        first.release();

        UpdateRecord {
            worker: self.id,
            round,
            first_index: self.first_index,
            second_index: self.second_index,
            before,
            after,
        }
    }

    /// Perform all rounds of this worker.
    /// Returns the number of updates.
    pub fn run(
        &self,
        ring: &DigitRing,
        order: LockOrder,
        interleaving: &dyn Interleaving,
        observer: &dyn UpdateObserver,
    ) -> u64 {
        debug!(worker = self.id, rounds = self.rounds, "worker started");
        for round in 0..self.rounds {
            let record = self.step(ring, round, order, interleaving);
            observer.on_update(&record);
        }
        debug!(worker = self.id, "worker finished");
        self.rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{digits::decompose, observe::RecordingObserver};
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_indices() {
        let w = Worker::new(0, 9, 5);
        assert_eq!((w.id(), w.first_index(), w.second_index(), w.rounds()), (0, 0, 1, 5));
        let w = Worker::new(8, 9, 5);
        assert_eq!((w.first_index(), w.second_index()), (8, 0));
        let w = Worker::new(1, 2, 0);
        assert_eq!((w.first_index(), w.second_index()), (1, 0));
    }

    #[test]
    #[should_panic(expected = "must be 0 <= id < ring_size")]
    fn test_invalid_id() {
        Worker::new(9, 9, 1);
    }

    #[test]
    #[should_panic(expected = "at least 2")]
    fn test_ring_too_small() {
        Worker::new(0, 1, 1);
    }

    #[test]
    fn test_step() {
        let ring = DigitRing::new(vec![3, 4, 0]);
        let w = Worker::new(0, 3, 1);
        let r = w.step(&ring, 0, LockOrder::OwnThenSuccessor, &NoInterleaving);
        assert_eq!(r.before, (3, 4));
        assert_eq!(r.after, (4, 5));
        assert_eq!(ring.held_slots(), 0);
        assert_eq!(ring.into_inner(), vec![4, 5, 0]);
    }

    #[test]
    fn test_step_wraps_around() {
        // Worker 2 of 3 updates slot 2 and slot 0.
        let ring = DigitRing::new(vec![2, 0, 7]);
        let w = Worker::new(2, 3, 1);
        for order in [LockOrder::OwnThenSuccessor, LockOrder::LowerIndexFirst] {
            let r = w.step(&ring, 0, order, &NoInterleaving);
            assert_eq!((r.first_index, r.second_index), (2, 0));
            assert_eq!(r.after, transform(2, r.before.0, r.before.1));
        }
        // (7, 2): 3 & 9 = 1 -> (8, 3). (8, 3): 3 & 11 = 3 -> (1, 6).
        assert_eq!(ring.into_inner(), vec![6, 0, 1]);
    }

    #[test]
    fn test_run_counts_rounds() {
        let ring = DigitRing::new(decompose(123456789, 9));
        let observer = RecordingObserver::new();
        let w = Worker::new(4, 9, 7);
        assert_eq!(w.run(&ring, LockOrder::OwnThenSuccessor, &NoInterleaving, &observer), 7);
        assert_eq!(observer.count_for(4), 7);
        let rounds: Vec<u64> = observer.records().iter().map(|r| r.round).collect();
        assert_eq!(rounds, (0..7).collect::<Vec<_>>());
    }

    /// Meets the test thread twice while the worker holds its first slot.
    struct Checkpoint(Barrier);

    impl Interleaving for Checkpoint {
        fn after_first_acquire(&self, _worker: usize, _round: u64) {
            self.0.wait();
            self.0.wait();
        }
    }

    #[test]
    fn test_lower_index_first_takes_slot_zero_first() {
        // Worker 1 of 2 would lock 1 then 0. Hardened, it locks 0 first.
        let ring = Arc::new(DigitRing::new(vec![0, 0]));
        let hook = Arc::new(Checkpoint(Barrier::new(2)));
        let w = Worker::new(1, 2, 1);
        thread::scope(|s| {
            let ring1 = Arc::clone(&ring);
            let hook1 = Arc::clone(&hook);
            s.spawn(move || {
                w.step(&ring1, 0, LockOrder::LowerIndexFirst, &*hook1);
            });
            hook.0.wait();
            assert!(ring.try_acquire(0).is_err());
            assert!(ring.try_acquire(1).is_ok());
            hook.0.wait();
        });
        assert_eq!(ring.held_slots(), 0);
    }
}

// vim: ts=4 sw=4 expandtab
