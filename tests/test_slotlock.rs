// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use digit_ring::SlotLock;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_slotlock() {
    // The data that will simultaneously be accessed from the threads.
    let data = vec![10, 11, 12, 13];

    // Embed the data in a SlotLock
    // and clone atomic references to it for the threads.
    let data_lock0 = Arc::new(SlotLock::new(data));
    let data_lock1 = Arc::clone(&data_lock0);
    let data_lock2 = Arc::clone(&data_lock0);

    // Thread barrier, only for demonstration purposes.
    let barrier0 = Arc::new(Barrier::new(2));
    let barrier1 = Arc::clone(&barrier0);

    thread::scope(|s| {
        // Spawn first thread.
        s.spawn(move || {
            {
                let mut a = data_lock0.try_acquire(0).expect("T0: Failed to lock slot 0.");
                let mut b = data_lock0.try_acquire(1).expect("T0: Failed to lock slot 1.");
                *a = 100; // Write to data[0]
                *b = 101; // Write to data[1]
            }
            barrier0.wait(); // Synchronize with second thread.
            {
                let guard = data_lock0.acquire(2);
                assert_eq!(*guard, 200); // Read from data[2]
            }
        });

        // Spawn second thread.
        s.spawn(move || {
            {
                let mut guard = data_lock1.try_acquire(2).expect("T1: Failed to lock slot 2.");
                *guard = 200; // Write to data[2]
            }
            barrier1.wait(); // Synchronize with first thread.
            {
                let guard = data_lock1.acquire(0);
                assert_eq!(*guard, 100); // Read from data[0]
            }
        });
    });

    // Unwrap the data from the lock.
    let data = Arc::try_unwrap(data_lock2)
        .expect("Arc unwrap failed")
        .into_inner();

    // Check the data that has been modified by the threads.
    assert_eq!(data, vec![100, 101, 200, 13]);
}

#[test]
fn test_conflict() {
    let data_lock0 = Arc::new(SlotLock::new(vec![1, 2, 3]));
    let data_lock1 = Arc::clone(&data_lock0);

    let barrier0 = Arc::new(Barrier::new(2));
    let barrier1 = Arc::clone(&barrier0);

    thread::scope(|s| {
        s.spawn(move || {
            let _guard = data_lock0.acquire(1);
            barrier0.wait();
            // try_acquire() conflict happens in second thread.
            barrier0.wait();
        });

        s.spawn(move || {
            barrier1.wait();
            // thread0 holds slot 1.
            assert!(data_lock1.try_acquire(1).is_err());
            assert!(data_lock1.try_acquire(0).is_ok());
            barrier1.wait();
        });
    });
}

#[test]
fn test_handover() {
    // Many threads increment one slot. Every increment must survive.
    let lock = Arc::new(SlotLock::new(vec![0_u64]));
    thread::scope(|s| {
        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            s.spawn(move || {
                for _ in 0..2500 {
                    *lock.acquire(0) += 1;
                }
            });
        }
    });
    assert_eq!(*lock.acquire(0), 10000);
    assert_eq!(lock.peak_holders(), 1);
    assert_eq!(lock.waiting(), 0);
}

// vim: ts=4 sw=4 expandtab
