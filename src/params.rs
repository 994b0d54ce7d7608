// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::{
    digits::MAX_RING_SIZE,
    error::{Error, Result},
};

/// The two inputs of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParameters {
    /// Number whose low-order decimal digits initialise the ring.
    pub seed: u64,
    /// Number of update rounds. See [RoundScope].
    pub rounds: u64,
}

impl RunParameters {
    /// Construct new [RunParameters].
    pub fn new(seed: u64, rounds: u64) -> Self {
        Self { seed, rounds }
    }
}

/// Source of the run parameters.
///
/// Queried exactly once, before any worker is started.
pub trait ParameterSupplier {
    fn supply(&self) -> Result<RunParameters>;
}

impl ParameterSupplier for RunParameters {
    fn supply(&self) -> Result<RunParameters> {
        Ok(*self)
    }
}

/// Parameters given as decimal text, e.g. command line arguments.
#[derive(Debug, Clone)]
pub struct ArgParameters {
    seed: String,
    rounds: String,
}

impl ArgParameters {
    /// Construct new [ArgParameters] from the decimal texts.
    pub fn new(seed: impl Into<String>, rounds: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            rounds: rounds.into(),
        }
    }
}

fn parse_number(name: &str, text: &str) -> Result<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidParameter(format!("{name} is empty")));
    }
    trimmed
        .parse()
        .map_err(|e| Error::InvalidParameter(format!("{name} {text:?}: {e}")))
}

/// Parse a seed of any length.
/// Only the low-order digits can reach the ring, so longer seeds are cut down
/// to [MAX_RING_SIZE] digits before conversion.
fn parse_seed(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidParameter(format!(
            "seed {text:?}: expected decimal digits"
        )));
    }
    let low = &trimmed[trimmed.len().saturating_sub(MAX_RING_SIZE)..];
    parse_number("seed", low)
}

impl ParameterSupplier for ArgParameters {
    fn supply(&self) -> Result<RunParameters> {
        Ok(RunParameters {
            seed: parse_seed(&self.seed)?,
            rounds: parse_number("rounds", &self.rounds)?,
        })
    }
}

/// How the `rounds` parameter is applied to the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundScope {
    /// Every worker performs `rounds` updates.
    #[default]
    PerWorker,
    /// `rounds` is the total over all workers.
    /// The first `rounds % workers` workers perform one extra update.
    Total,
}

impl RoundScope {
    /// Number of updates for `worker` out of `workers`.
    /// An empty ring performs no updates.
    pub fn rounds_for(self, worker: usize, workers: usize, rounds: u64) -> u64 {
        if workers == 0 {
            return 0;
        }
        match self {
            RoundScope::PerWorker => rounds,
            RoundScope::Total => {
                let workers = workers as u64;
                rounds / workers + u64::from((worker as u64) < rounds % workers)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digits::{decompose, recompose};

    #[test]
    fn test_arg_parameters() {
        let p = ArgParameters::new("123456789", " 5 ").supply().unwrap();
        assert_eq!(p, RunParameters::new(123456789, 5));
        let p = ArgParameters::new("000000042", "0").supply().unwrap();
        assert_eq!(p, RunParameters::new(42, 0));
    }

    #[test]
    fn test_arg_parameters_invalid() {
        for (seed, rounds) in [
            ("-1", "1"),
            ("+1", "1"),
            ("abc", "1"),
            ("12x4", "1"),
            ("", "1"),
            ("1", "-3"),
            ("1", "x"),
        ] {
            let err = ArgParameters::new(seed, rounds).supply().unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{seed} {rounds}");
        }
    }

    #[test]
    fn test_long_seed_keeps_low_order_digits() {
        let p = ArgParameters::new("1234567890123456789012", "0").supply().unwrap();
        assert_eq!(p.seed, 4567890123456789012);
        assert_eq!(recompose(&decompose(p.seed, 9)), 456789012);
        let p = ArgParameters::new("99999999999999999999999999", "1").supply().unwrap();
        assert_eq!(p.seed, 9_999_999_999_999_999_999);
    }

    #[test]
    fn test_fixed_parameters() {
        let p = RunParameters::new(7, 3);
        assert_eq!(p.supply().unwrap(), p);
    }

    #[test]
    fn test_round_scope() {
        assert_eq!(RoundScope::PerWorker.rounds_for(3, 9, 10), 10);
        let split: Vec<u64> = (0..9).map(|w| RoundScope::Total.rounds_for(w, 9, 20)).collect();
        assert_eq!(split, vec![3, 3, 2, 2, 2, 2, 2, 2, 2]);
        assert_eq!(split.iter().sum::<u64>(), 20);
        assert_eq!(RoundScope::Total.rounds_for(8, 9, 0), 0);
        assert_eq!(RoundScope::Total.rounds_for(0, 0, 5), 0);
        assert_eq!(RoundScope::PerWorker.rounds_for(0, 0, 5), 0);
    }
}

// vim: ts=4 sw=4 expandtab
