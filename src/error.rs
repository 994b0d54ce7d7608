// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

//! Error types.

use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Result type for ring runs.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a ring run.
#[derive(Debug, Error)]
pub enum Error {
    /// The ring or its workers could not be set up. No worker has run.
    #[error("resource initialization failed: {0}")]
    ResourceInitialization(String),

    /// Not all workers finished within the join timeout.
    /// The blocked workers are left parked; their slots are never force-released.
    #[error(
        "deadlock suspected: {finished} of {workers} workers finished within {timeout:?} \
         ({held_slots} slots held, {waiting} workers blocked)"
    )]
    DeadlockSuspected {
        timeout: Duration,
        finished: usize,
        workers: usize,
        held_slots: usize,
        waiting: usize,
    },

    /// A worker thread panicked. The ring contents are undefined.
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    /// A run parameter could not be parsed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors of a result sink.
///
/// These are reported, but never fail the run.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination is not a plain file name.
    #[error("invalid destination name: {0:?}")]
    InvalidDestination(String),

    /// Writing the result failed.
    #[error("failed to persist result to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// vim: ts=4 sw=4 expandtab
