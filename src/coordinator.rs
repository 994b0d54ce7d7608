// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::{
    config::{ExecutionMode, RingConfig},
    digits::{decompose, recompose},
    error::{Error, Result, SinkError},
    observe::{TracingObserver, UpdateObserver},
    params::{ParameterSupplier, RunParameters},
    sink::{LogSink, ResultSink},
    worker::{DigitRing, Interleaving, NoInterleaving, Worker},
};
use std::{
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Condvar, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};

/// Result of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Ring contents before any update.
    pub initial: Vec<u8>,
    /// Ring contents after all workers finished.
    pub digits: Vec<u8>,
    /// `digits` read as a decimal number.
    pub aggregate: u64,
    /// Total number of updates performed by all workers.
    pub updates: u64,
    /// Set, if the result sink failed. `aggregate` is valid regardless.
    pub persist_error: Option<SinkError>,
}

/// Runs all workers of a ring and hands the result to a [ResultSink].
///
/// # Example
///
/// ```
/// use digit_ring::{Coordinator, ExecutionMode, RingConfig, RunParameters};
///
/// let config = RingConfig::default().with_mode(ExecutionMode::Sequential);
/// let report = Coordinator::new(config)
///     .run(RunParameters::new(100000000, 1))
///     .expect("Run failed");
/// assert_eq!(report.aggregate, 210000000);
/// ```
pub struct Coordinator {
    config: RingConfig,
    observer: Arc<dyn UpdateObserver>,
    interleaving: Arc<dyn Interleaving>,
    sink: Arc<dyn ResultSink>,
}

/// Body of a worker thread.
type WorkerBody = Box<dyn FnOnce() -> u64 + Send + 'static>;

fn spawn_thread(worker: usize, body: WorkerBody) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new()
        .name(format!("ring-worker-{worker}"))
        .spawn(body)
}

impl Coordinator {
    /// Construct a new [Coordinator].
    /// Updates are traced, the result is only logged.
    pub fn new(config: RingConfig) -> Coordinator {
        Coordinator {
            config,
            observer: Arc::new(TracingObserver),
            interleaving: Arc::new(NoInterleaving),
            sink: Arc::new(LogSink),
        }
    }

    /// Replace the receiver of per-update records.
    pub fn with_observer(mut self, observer: Arc<dyn UpdateObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Install a scheduling hook.
    /// A hook that waits for other workers hangs [ExecutionMode::Sequential] runs.
    pub fn with_interleaving(mut self, interleaving: Arc<dyn Interleaving>) -> Self {
        self.interleaving = interleaving;
        self
    }

    /// Replace the receiver of the aggregate result.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Get the run configuration.
    #[inline]
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Fetch the parameters from `supplier` and run.
    pub fn run_from(&self, supplier: &dyn ParameterSupplier) -> Result<RunReport> {
        let params = supplier.supply()?;
        self.run(params)
    }

    /// Run to completion.
    pub fn run(&self, params: RunParameters) -> Result<RunReport> {
        self.start(params)?.wait()
    }

    /// Build the ring and start all workers.
    ///
    /// In [ExecutionMode::Sequential] all updates are done before this returns.
    pub fn start(&self, params: RunParameters) -> Result<RunHandle> {
        let config = &self.config;
        config.validate()?;
        let n = config.ring_size;

        info!(
            seed = params.seed,
            rounds = params.rounds,
            ring_size = n,
            lock_order = ?config.lock_order,
            mode = ?config.mode,
            "starting ring run"
        );

        let initial = decompose(params.seed, n);
        debug!(digits = ?initial, "ring initialized");
        let ring = Arc::new(DigitRing::new(initial.clone()));

        let workers: Vec<Worker> = (0..n)
            .map(|id| {
                let rounds = config.round_scope.rounds_for(id, n, params.rounds);
                Worker::new(id, n, rounds)
            })
            .collect();

        let pending = match config.mode {
            ExecutionMode::Sequential => Pending::Finished {
                updates: self.run_sequential(&ring, &workers)?,
            },
            ExecutionMode::Concurrent => self.spawn_workers(&ring, workers)?,
        };

        Ok(RunHandle {
            ring,
            initial,
            pending,
            join_timeout: config.join_timeout,
            destination: config.destination.clone(),
            sink: Arc::clone(&self.sink),
        })
    }

    fn run_sequential(&self, ring: &DigitRing, workers: &[Worker]) -> Result<u64> {
        let max_rounds = workers.iter().map(Worker::rounds).max().unwrap_or(0);
        let mut updates = 0;
        for round in 0..max_rounds {
            for worker in workers.iter().filter(|w| round < w.rounds()) {
                // Slots are released by the guards while unwinding.
                let step = panic::catch_unwind(AssertUnwindSafe(|| {
                    let record =
                        worker.step(ring, round, self.config.lock_order, &*self.interleaving);
                    self.observer.on_update(&record);
                }));
                if step.is_err() {
                    error!(worker = worker.id(), "worker panicked");
                    return Err(Error::WorkerPanicked { worker: worker.id() });
                }
                updates += 1;
            }
        }
        Ok(updates)
    }

    fn spawn_workers(&self, ring: &Arc<DigitRing>, workers: Vec<Worker>) -> Result<Pending> {
        self.spawn_workers_with(ring, workers, spawn_thread)
    }

    /// Spawn one thread per worker through `spawn`.
    /// All threads wait at a gate until every spawn has succeeded.
    fn spawn_workers_with<F>(
        &self,
        ring: &Arc<DigitRing>,
        workers: Vec<Worker>,
        mut spawn: F,
    ) -> Result<Pending>
    where
        F: FnMut(usize, WorkerBody) -> io::Result<JoinHandle<u64>>,
    {
        let gate = Arc::new(StartGate::default());
        let (done_tx, done_rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(workers.len());

        for worker in workers {
            let ring = Arc::clone(ring);
            let worker_gate = Arc::clone(&gate);
            let observer = Arc::clone(&self.observer);
            let interleaving = Arc::clone(&self.interleaving);
            let notice = CompletionNotice {
                worker: worker.id(),
                done: done_tx.clone(),
            };
            let order = self.config.lock_order;

            let spawned = spawn(
                worker.id(),
                Box::new(move || {
                    let _notice = notice;
                    if !worker_gate.wait() {
                        return 0;
                    }
                    worker.run(&ring, order, &*interleaving, &*observer)
                }),
            );

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Nobody has touched the ring yet. Send the spawned workers home.
                    gate.set(GateState::Aborted);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(Error::ResourceInitialization(format!(
                        "failed to spawn worker {}: {e}",
                        worker.id()
                    )));
                }
            }
        }
        drop(done_tx);

        gate.set(GateState::Open);
        debug!(workers = handles.len(), "all workers released");

        Ok(Pending::Threads {
            handles,
            done: done_rx,
        })
    }
}

/// Workers that are running or have already finished.
enum Pending {
    Threads {
        handles: Vec<JoinHandle<u64>>,
        done: Receiver<usize>,
    },
    Finished {
        updates: u64,
    },
}

/// A started run.
pub struct RunHandle {
    ring: Arc<DigitRing>,
    initial: Vec<u8>,
    pending: Pending,
    join_timeout: Option<Duration>,
    destination: String,
    sink: Arc<dyn ResultSink>,
}

impl RunHandle {
    /// The shared ring. For observation only.
    #[inline]
    pub fn ring(&self) -> &Arc<DigitRing> {
        &self.ring
    }

    /// Ring contents before any update.
    #[inline]
    pub fn initial(&self) -> &[u8] {
        &self.initial
    }

    /// Wait for all workers, then recompose and persist the result.
    ///
    /// Without a join timeout this blocks forever on a deadlocked ring.
    pub fn wait(self) -> Result<RunReport> {
        let RunHandle {
            ring,
            initial,
            pending,
            join_timeout,
            destination,
            sink,
        } = self;

        let updates = match pending {
            Pending::Finished { updates } => updates,
            Pending::Threads { handles, done } => join_workers(&ring, handles, &done, join_timeout)?,
        };

        // All workers are gone. Nobody contends for the slots anymore.
        let digits: Vec<u8> = (0..ring.data_len()).map(|i| *ring.acquire(i)).collect();
        let aggregate = recompose(&digits);
        info!(digits = ?digits, aggregate, updates, "ring run finished");

        let persist_error = match sink.persist(&destination, aggregate) {
            Ok(()) => None,
            Err(e) => {
                warn!(destination = %destination, error = %e, "failed to persist result");
                Some(e)
            }
        };

        Ok(RunReport {
            initial,
            digits,
            aggregate,
            updates,
            persist_error,
        })
    }
}

fn join_workers(
    ring: &DigitRing,
    handles: Vec<JoinHandle<u64>>,
    done: &Receiver<usize>,
    join_timeout: Option<Duration>,
) -> Result<u64> {
    let workers = handles.len();

    if let Some(timeout) = join_timeout {
        let deadline = Instant::now() + timeout;
        let mut finished = 0;
        while finished < workers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match done.recv_timeout(remaining) {
                Ok(_) => finished += 1,
                Err(RecvTimeoutError::Timeout) => {
                    let err = Error::DeadlockSuspected {
                        timeout,
                        finished,
                        workers,
                        held_slots: ring.held_slots(),
                        waiting: ring.waiting(),
                    };
                    // The blocked threads are detached. They keep the ring alive.
                    error!(%err, "giving up on joining the workers");
                    return Err(err);
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    let mut updates = 0;
    let mut panicked = None;
    for (worker, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(n) => updates += n,
            Err(_) => {
                error!(worker, "worker panicked");
                panicked.get_or_insert(worker);
            }
        }
    }
    match panicked {
        Some(worker) => Err(Error::WorkerPanicked { worker }),
        None => Ok(updates),
    }
}

/// Reports the end of a worker thread, also when it unwinds.
struct CompletionNotice {
    worker: usize,
    done: Sender<usize>,
}

impl Drop for CompletionNotice {
    fn drop(&mut self) {
        // The receiver is gone, if the coordinator already gave up waiting.
        let _ = self.done.send(self.worker);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GateState {
    #[default]
    Closed,
    Open,
    Aborted,
}

/// Holds all workers back until every one of them has been spawned.
#[derive(Debug, Default)]
struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl StartGate {
    /// Block while the gate is closed. Returns true, if the worker may run.
    fn wait(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while *state == GateState::Closed {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *state == GateState::Open
    }

    fn set(&self, new: GateState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = new;
        self.changed.notify_all();
    }
}


// vim: ts=4 sw=4 expandtab
