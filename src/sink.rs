// -*- coding: utf-8 -*-
//
// Copyright 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use crate::error::SinkError;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::info;

/// Default destination name of the aggregate result.
pub const DEFAULT_DESTINATION: &str = "p1_result.txt";

/// Receiver of the aggregate result. Called once per run, after all workers joined.
pub trait ResultSink: Send + Sync {
    fn persist(&self, destination: &str, value: u64) -> Result<(), SinkError>;
}

/// Only logs the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn persist(&self, destination: &str, value: u64) -> Result<(), SinkError> {
        info!(destination, value, "final result");
        Ok(())
    }
}

/// Writes the result as decimal text into a file inside `dir`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the result for `destination` is written to.
    pub fn path(&self, destination: &str) -> Result<PathBuf, SinkError> {
        // Only plain file names. No directories, no "..".
        if Path::new(destination).file_name() != Some(OsStr::new(destination)) {
            return Err(SinkError::InvalidDestination(destination.to_string()));
        }
        Ok(self.dir.join(destination))
    }
}

impl ResultSink for FileSink {
    fn persist(&self, destination: &str, value: u64) -> Result<(), SinkError> {
        let path = self.path(destination)?;
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, format!("{value}\n")).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), value, "result saved");
        Ok(())
    }
}

/// Keeps every persisted result in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(String, u64)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, u64)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ResultSink for MemorySink {
    fn persist(&self, destination: &str, value: u64) -> Result<(), SinkError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((destination.to_string(), value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let sink = FileSink::new(&out);
        sink.persist(DEFAULT_DESTINATION, 210000000).unwrap();
        let text = fs::read_to_string(out.join(DEFAULT_DESTINATION)).unwrap();
        assert_eq!(text, "210000000\n");

        // Overwrite.
        sink.persist(DEFAULT_DESTINATION, 7).unwrap();
        let text = fs::read_to_string(out.join(DEFAULT_DESTINATION)).unwrap();
        assert_eq!(text, "7\n");
    }

    #[test]
    fn test_file_sink_invalid_destination() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        for dest in ["", "..", "a/b.txt", "/abs.txt"] {
            assert!(
                matches!(sink.persist(dest, 1), Err(SinkError::InvalidDestination(_))),
                "{dest}"
            );
        }
    }

    #[test]
    fn test_file_sink_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let sink = FileSink::new(&blocker);
        assert!(matches!(
            sink.persist(DEFAULT_DESTINATION, 1),
            Err(SinkError::Io { .. })
        ));
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.persist("a", 1).unwrap();
        sink.persist("b", 2).unwrap();
        assert_eq!(sink.entries(), vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert!(LogSink.persist("c", 3).is_ok());
    }
}

// vim: ts=4 sw=4 expandtab
