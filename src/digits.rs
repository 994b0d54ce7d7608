// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

/// Smallest usable ring. A single slot would be its own successor.
pub const MIN_RING_SIZE: usize = 2;

/// Largest ring whose digits always recompose into a `u64`.
pub const MAX_RING_SIZE: usize = 19;

/// Split `seed` into its `len` low-order decimal digits, most significant first.
///
/// Seeds with fewer digits are left-padded with zeros,
/// seeds with more digits lose their high-order digits.
pub fn decompose(seed: u64, len: usize) -> Vec<u8> {
    let mut digits = vec![0; len];
    let mut rest = seed;
    for digit in digits.iter_mut().rev() {
        *digit = (rest % 10) as u8;
        rest /= 10;
    }
    digits
}

/// Read `digits` as a base-10 numeral, most significant digit first.
///
/// Panics on overflow, which cannot happen for up to [MAX_RING_SIZE] digits.
pub fn recompose(digits: &[u8]) -> u64 {
    digits.iter().fold(0, |acc: u64, &digit| {
        debug_assert!(digit <= 9);
        match acc.checked_mul(10).and_then(|x| x.checked_add(u64::from(digit))) {
            Some(x) => x,
            None => panic!("recompose: Numeral overflows u64."),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose() {
        assert_eq!(decompose(123456789, 9), vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(decompose(42, 9), vec![0, 0, 0, 0, 0, 0, 0, 4, 2]);
        assert_eq!(decompose(0, 3), vec![0, 0, 0]);
        assert_eq!(decompose(9876543210, 9), vec![8, 7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(decompose(u64::MAX, MAX_RING_SIZE)[0], 8);
        assert!(decompose(5, 0).is_empty());
    }

    #[test]
    fn test_recompose() {
        assert_eq!(recompose(&[]), 0);
        assert_eq!(recompose(&[0, 0, 7]), 7);
        assert_eq!(recompose(&decompose(123456789, 9)), 123456789);
        assert_eq!(recompose(&decompose(100000000, 9)), 100000000);
        assert_eq!(recompose(&decompose(1234567890123, 9)), 567890123);
        assert_eq!(recompose(&[9; MAX_RING_SIZE]), 9_999_999_999_999_999_999);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_recompose_overflow() {
        recompose(&[9; MAX_RING_SIZE + 1]);
    }
}

// vim: ts=4 sw=4 expandtab
