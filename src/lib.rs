// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

mod config;
mod coordinator;
mod digits;
mod error;
mod observe;
mod params;
mod sink;
mod slotlock;
mod transform;
mod worker;

pub use config::{ExecutionMode, RingConfig, DEFAULT_RING_SIZE};
pub use coordinator::{Coordinator, RunHandle, RunReport};
pub use digits::{decompose, recompose, MAX_RING_SIZE, MIN_RING_SIZE};
pub use error::{Error, Result, SinkError};
pub use observe::{RecordingObserver, TracingObserver, UpdateObserver, UpdateRecord};
pub use params::{ArgParameters, ParameterSupplier, RoundScope, RunParameters};
pub use sink::{FileSink, LogSink, MemorySink, ResultSink, DEFAULT_DESTINATION};
pub use slotlock::{SlotGuard, SlotLock};
pub use transform::transform;
pub use worker::{DelayInterleaving, DigitRing, Interleaving, LockOrder, NoInterleaving, Worker};

// vim: ts=4 sw=4 expandtab
