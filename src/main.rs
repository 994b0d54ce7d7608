// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

//! Run the digit ring once and save the final number.

use clap::{Parser, ValueEnum};
use digit_ring::{
    ArgParameters, Coordinator, Error, ExecutionMode, FileSink, LockOrder, RingConfig,
    RoundScope, RunReport, DEFAULT_DESTINATION, DEFAULT_RING_SIZE,
};
use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LockOrderArg {
    /// Own slot, then successor. May deadlock.
    OwnThenSuccessor,
    /// Lower slot index first. Never deadlocks.
    LowerIndexFirst,
}

impl From<LockOrderArg> for LockOrder {
    fn from(arg: LockOrderArg) -> Self {
        match arg {
            LockOrderArg::OwnThenSuccessor => LockOrder::OwnThenSuccessor,
            LockOrderArg::LowerIndexFirst => LockOrder::LowerIndexFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoundScopeArg {
    /// Every worker performs ROUNDS updates.
    PerWorker,
    /// ROUNDS updates in total, split over the workers.
    Total,
}

impl From<RoundScopeArg> for RoundScope {
    fn from(arg: RoundScopeArg) -> Self {
        match arg {
            RoundScopeArg::PerWorker => RoundScope::PerWorker,
            RoundScopeArg::Total => RoundScope::Total,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "digit-ring", version, about)]
struct Args {
    /// Number whose decimal digits initialise the ring.
    seed: String,

    /// Number of update rounds.
    rounds: String,

    /// Number of slots and workers.
    #[arg(long, default_value_t = DEFAULT_RING_SIZE)]
    ring_size: usize,

    /// Slot locking order of the workers.
    #[arg(long, value_enum, default_value_t = LockOrderArg::OwnThenSuccessor)]
    lock_order: LockOrderArg,

    /// How ROUNDS is applied to the workers.
    #[arg(long, value_enum, default_value_t = RoundScopeArg::PerWorker)]
    round_scope: RoundScopeArg,

    /// Run the workers one after another on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Give up joining the workers after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory the result file is written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Name of the result file.
    #[arg(long, default_value = DEFAULT_DESTINATION)]
    destination: String,
}

impl Args {
    fn config(&self) -> RingConfig {
        let mode = if self.sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        };
        let mut config = RingConfig::default()
            .with_ring_size(self.ring_size)
            .with_lock_order(self.lock_order.into())
            .with_round_scope(self.round_scope.into())
            .with_mode(mode)
            .with_destination(self.destination.clone());
        if let Some(ms) = self.timeout_ms {
            config = config.with_join_timeout(Duration::from_millis(ms));
        }
        config
    }
}

fn run(args: &Args) -> digit_ring::Result<RunReport> {
    let coordinator =
        Coordinator::new(args.config()).with_sink(Arc::new(FileSink::new(&args.output_dir)));
    coordinator.run_from(&ArgParameters::new(&args.seed, &args.rounds))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "digit_ring=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(report) => {
            for (i, digit) in report.digits.iter().enumerate() {
                println!("Final digit[{}]: {}", i + 1, digit);
            }
            match &report.persist_error {
                None => println!(
                    "Final result saved to {}",
                    args.output_dir.join(&args.destination).display()
                ),
                Some(e) => eprintln!("Final result not saved: {e}"),
            }
            println!("Final result: {}", report.aggregate);
            ExitCode::SUCCESS
        }
        Err(e @ Error::DeadlockSuspected { .. }) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

// vim: ts=4 sw=4 expandtab
