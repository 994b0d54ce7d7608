// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use std::{
    cell::UnsafeCell,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Condvar, Mutex, MutexGuard, PoisonError, TryLockError, TryLockResult,
    },
};
use tracing::trace;

/// Bookkeeping of one slot lock.
#[derive(Debug, Default)]
struct SlotState {
    /// The slot is currently held by a guard.
    held: bool,
    /// Number of threads blocked in `acquire()` on this slot.
    waiting: usize,
}

#[derive(Debug)]
struct Slot<T> {
    state: Mutex<SlotState>,
    /// Signalled when `held` goes back to false.
    freed: Condvar,
    /// Number of guards currently alive for this slot. Instrumentation only.
    holders: AtomicUsize,
    value: UnsafeCell<T>,
}

impl<T> Slot<T> {
    fn new(value: T) -> Slot<T> {
        Slot {
            state: Mutex::new(SlotState::default()),
            freed: Condvar::new(),
            holders: AtomicUsize::new(0),
            value: UnsafeCell::new(value),
        }
    }

    /// The state only carries plain flags, so a poisoned mutex is still consistent.
    #[inline]
    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed set of values with one exclusive, blocking lock per value.
///
/// Every slot is locked on its own. A thread may hold any number of slots at
/// the same time, which makes it possible to build lock cycles between threads.
/// The lock does not detect such cycles. A blocked [SlotLock::acquire] waits forever.
///
/// # Example
///
/// ```
/// use digit_ring::SlotLock;
/// use std::{sync::Arc, thread};
///
/// let lock = Arc::new(SlotLock::new(vec![1, 2, 3]));
/// let lock0 = Arc::clone(&lock);
///
/// let t = thread::spawn(move || {
///     let mut a = lock0.acquire(0);
///     let mut b = lock0.acquire(1);
///     *a += 10;
///     *b += 20;
/// });
/// t.join().expect("Thread panicked");
///
/// assert_eq!(*lock.acquire(1), 22);
/// let data = Arc::try_unwrap(lock).expect("Arc unwrap failed").into_inner();
/// assert_eq!(data, vec![11, 22, 3]);
/// ```
#[derive(Debug)]
pub struct SlotLock<T> {
    slots: Vec<Slot<T>>,
    /// Number of slots currently held.
    held: AtomicUsize,
    /// Number of threads currently blocked in `acquire()`.
    waiting: AtomicUsize,
    /// Highest number of simultaneous holders ever seen on a single slot.
    peak_holders: AtomicUsize,
}

// SAFETY:
// It is safe to access SlotLock and the contained values (via SlotGuard)
// from multiple threads simultaneously.
// Each value is only reachable through the guard of its slot
// and at most one guard per slot exists at any time.
// T must be Send-able to other threads.
unsafe impl<T> Sync for SlotLock<T> where T: Send {}

impl<'a, T> SlotLock<T> {
    /// Construct a new [SlotLock] with one slot per element of `data`.
    pub fn new(data: Vec<T>) -> SlotLock<T> {
        SlotLock {
            slots: data.into_iter().map(Slot::new).collect(),
            held: AtomicUsize::new(0),
            waiting: AtomicUsize::new(0),
            peak_holders: AtomicUsize::new(0),
        }
    }

    /// Get the number of slots.
    #[inline]
    pub fn data_len(&self) -> usize {
        self.slots.len()
    }

    /// Unwrap this [SlotLock] into the contained values.
    /// This method consumes self.
    pub fn into_inner(self) -> Vec<T> {
        debug_assert_eq!(self.held.load(Ordering::Acquire), 0);
        self.slots
            .into_iter()
            .map(|slot| slot.value.into_inner())
            .collect()
    }

    /// Number of slots that are currently held.
    #[inline]
    pub fn held_slots(&self) -> usize {
        self.held.load(Ordering::Acquire)
    }

    /// Number of threads that are currently blocked waiting for a slot.
    #[inline]
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Highest number of guards that ever existed at the same time for one slot.
    ///
    /// Anything above 1 means that mutual exclusion has been violated.
    #[inline]
    pub fn peak_holders(&self) -> usize {
        self.peak_holders.load(Ordering::Acquire)
    }

    #[inline]
    fn slot(&self, index: usize) -> &Slot<T> {
        match self.slots.get(index) {
            Some(slot) => slot,
            None => panic!("Slot index {index} is out of bounds."),
        }
    }

    /// Lock the slot at `index`.
    ///
    /// Blocks the calling thread until the slot is free.
    /// There is no timeout. Panics, if `index` is out of bounds.
    pub fn acquire(&'a self, index: usize) -> SlotGuard<'a, T> {
        let slot = self.slot(index);
        let mut state = slot.state();
        if state.held {
            state.waiting += 1;
            self.waiting.fetch_add(1, Ordering::AcqRel);
            trace!(slot = index, "slot contended, waiting");
            while state.held {
                state = slot
                    .freed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            state.waiting -= 1;
            self.waiting.fetch_sub(1, Ordering::AcqRel);
        }
        state.held = true;
        drop(state);
        self.grant(index)
    }

    /// Try to lock the slot at `index`.
    ///
    /// * On success: Returns a [SlotGuard] that can be used to access the slot value.
    /// * On failure: Returns [TryLockError::WouldBlock], if the slot is held.
    ///               The locking attempt may be retried by the caller.
    pub fn try_acquire(&'a self, index: usize) -> TryLockResult<SlotGuard<'a, T>> {
        let slot = self.slot(index);
        let mut state = slot.state();
        if state.held {
            TryLockResult::Err(TryLockError::WouldBlock)
        } else {
            state.held = true;
            drop(state);
            TryLockResult::Ok(self.grant(index))
        }
    }

    fn grant(&'a self, index: usize) -> SlotGuard<'a, T> {
        let holders = self.slot(index).holders.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_holders.fetch_max(holders, Ordering::AcqRel);
        self.held.fetch_add(1, Ordering::AcqRel);
        trace!(slot = index, "slot acquired");
        SlotGuard::new(self, index)
    }

    /// Unlock a slot and wake up at most one waiter.
    fn release(&self, index: usize) {
        let slot = self.slot(index);
        // Instrumentation is decremented before the slot becomes free,
        // so the next holder never sees a stale count.
        slot.holders.fetch_sub(1, Ordering::AcqRel);
        self.held.fetch_sub(1, Ordering::AcqRel);
        let mut state = slot.state();
        debug_assert!(state.held);
        state.held = false;
        let wake = state.waiting > 0;
        drop(state);
        if wake {
            slot.freed.notify_one();
        }
        trace!(slot = index, "slot released");
    }

    /// Get a shared reference to the value of slot `index`.
    ///
    /// # SAFETY
    ///
    /// See get_mut().
    #[inline]
    unsafe fn get(&self, index: usize) -> &T {
        // SAFETY: The caller holds the guard of this slot.
        unsafe { &*self.slot(index).value.get() }
    }

    /// Get a mutable reference to the value of slot `index`.
    ///
    /// # SAFETY
    ///
    /// The caller must ensure that:
    /// * The slot is held by the calling guard.
    /// * Immutable and mutable references to the slot value must not coexist.
    #[inline]
    #[allow(clippy::mut_from_ref)] // Slot ownership is tracked by the guard. See SAFETY.
    unsafe fn get_mut(&self, index: usize) -> &mut T {
        // SAFETY: The caller holds the guard of this slot.
        unsafe { &mut *self.slot(index).value.get() }
    }
}

/// Lock guard variable type for [SlotLock].
///
/// The [Deref] and [DerefMut] traits are implemented for this struct.
/// Dropping the guard releases the slot.
#[derive(Debug)]
pub struct SlotGuard<'a, T> {
    /// Reference to the underlying lock.
    lock: &'a SlotLock<T>,
    /// The held slot.
    index: usize,

    /// Suppresses Send and Sync autotraits for SlotGuard.
    _p: PhantomData<*mut T>,
}

impl<'a, T> SlotGuard<'a, T> {
    #[inline]
    fn new(lock: &'a SlotLock<T>, index: usize) -> SlotGuard<'a, T> {
        SlotGuard {
            lock,
            index,
            _p: PhantomData,
        }
    }

    /// Index of the held slot.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Release the slot.
    /// Same as dropping the guard.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<'a, T> Drop for SlotGuard<'a, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.release(self.index);
    }
}

impl<'a, T> Deref for SlotGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: See deref_mut().
        unsafe { self.lock.get(self.index) }
    }
}

impl<'a, T> DerefMut for SlotGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY:
        // The lifetime of the reference is bounded by the lifetime of the guard.
        // The lifetime of the guard is bounded by the lifetime of the slot lock.
        // The slot lock owns the value and hands out at most one guard per slot.
        // The compiler ensures that the DerefMut result cannot be used,
        // if there's also an immutable Deref result.
        unsafe { self.lock.get_mut(self.index) }
    }
}


// vim: ts=4 sw=4 expandtab
