// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

/// Update rule for the two digits held by worker `worker_id`.
///
/// The increment is `(worker_id + 1) & (digit1 + digit2)`,
/// which is added to both digits modulo 10.
/// Both input digits must be in `0..=9`.
#[inline]
pub fn transform(worker_id: usize, digit1: u8, digit2: u8) -> (u8, u8) {
    debug_assert!(digit1 <= 9 && digit2 <= 9);
    let sum = usize::from(digit1) + usize::from(digit2);
    // The AND result is bounded by sum <= 18.
    let increment = ((worker_id + 1) & sum) as u8;
    ((digit1 + increment) % 10, (digit2 + increment) % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        assert_eq!(transform(0, 3, 4), (4, 5));
        assert_eq!(transform(8, 0, 0), (0, 0));
        assert_eq!(transform(4, 9, 9), (9, 9));
        assert_eq!(transform(5, 7, 7), (3, 3));
        assert_eq!(transform(8, 9, 1), (7, 9));
    }

    #[test]
    fn test_transform_range() {
        for id in 0..19 {
            for d1 in 0..=9 {
                for d2 in 0..=9 {
                    let (n1, n2) = transform(id, d1, d2);
                    assert!(n1 <= 9 && n2 <= 9);
                }
            }
        }
    }

    #[test]
    fn test_zero_is_fixed_point() {
        for id in 0..19 {
            assert_eq!(transform(id, 0, 0), (0, 0));
        }
    }
}

// vim: ts=4 sw=4 expandtab
