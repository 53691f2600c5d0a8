// Copyright (C) 2026 the tracing-gelf authors
//
// This file is part of tracing-gelf.
//
// tracing-gelf is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-gelf is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-gelf.  If
// not, see <http://www.gnu.org/licenses/>.

//! An append-only file sink that never blocks the logging thread.
//!
//! [`PersistentWriter`] buffers records in an [`ObservableQueue`] and appends them to its file
//! in batches from the queue's notification thread. A call to
//! [`write_line`](PersistentWriter::write_line) therefore costs one lock-protected push,
//! however slow the disk is. Failed appends are retried with doubling backoff and then
//! dropped with a diagnostic; a logging call must never crash, or hang, its host.
//!
//! File access is serialized by an *instance-scoped* lock, not a process-wide one: two writers
//! on different files never contend, and two writers on the *same* file are a configuration
//! mistake this crate does not try to referee (each batch is still written atomically with
//! respect to the other writer's batches, since both hold their own file open in append mode).

use crate::{
    error::{Error, Result},
    queue::ObservableQueue,
    transport::Transport,
};

use backtrace::Backtrace;
use tracing::warn;

use std::{
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};

const APPEND_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// An append-only, queue-buffered file sink.
pub struct PersistentWriter {
    path: PathBuf,
    queue: ObservableQueue<String>,
    // Serializes drain-and-append so racing notifications cannot interleave batches or write
    // records out of order.
    io_lock: Mutex<()>,
}

impl PersistentWriter {
    /// Construct a writer appending to the file at `path` (created if absent).
    ///
    /// The file is opened once up-front so that an unusable path fails the construction
    /// rather than the first (asynchronous, and therefore silent) append.
    pub fn new(path: impl Into<PathBuf>) -> Result<Arc<PersistentWriter>> {
        let path = path.into();
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|err| Error::Transport {
                source: Box::new(err),
                back: Backtrace::new(),
            })?;

        let writer = Arc::new(PersistentWriter {
            path,
            queue: ObservableQueue::new(),
            io_lock: Mutex::new(()),
        });
        // The queue owns the listener and the writer owns the queue, so the listener holds a
        // Weak back-reference to keep the writer droppable.
        let weak: Weak<PersistentWriter> = Arc::downgrade(&writer);
        writer.queue.on_enqueued(move || {
            if let Some(writer) = weak.upgrade() {
                writer.flush();
            }
        });
        Ok(writer)
    }

    /// Queue one line for appending; returns immediately.
    pub fn write_line(&self, line: impl Into<Option<String>>) {
        self.queue.enqueue(line);
    }

    /// Records queued but not yet written.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue and append the batch now.
    ///
    /// Runs from the queue's notification thread after every enqueue; public so callers can
    /// force out buffered records at shutdown.
    pub fn flush(&self) {
        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let batch = self.queue.dequeue_all();
        if batch.is_empty() {
            return;
        }

        let mut delay = INITIAL_BACKOFF;
        for attempt in 1..=APPEND_ATTEMPTS {
            match self.append(&batch) {
                Ok(()) => return,
                Err(err) if attempt < APPEND_ATTEMPTS => {
                    warn!(
                        error = %err,
                        attempt = attempt,
                        "append failed; retrying in {:?}",
                        delay
                    );
                    std::thread::sleep(delay);
                    delay *= 2;
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        dropped = batch.len(),
                        path = %self.path.display(),
                        "append failed; dropping batch"
                    );
                }
            }
        }
    }

    fn append(&self, batch: &[String]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut buf = String::with_capacity(batch.iter().map(|l| l.len() + 1).sum());
        for line in batch {
            buf.push_str(line);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())
    }
}

/// A [`PersistentWriter`] can stand in for a network transport, e.g. underneath a
/// [`Layer`](crate::layer::Layer): each payload becomes one line.
impl Transport for PersistentWriter {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.write_line(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn read_lines(path: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn batches_reach_the_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = PersistentWriter::new(&path).unwrap();

        for i in 0..5 {
            writer.write_line(format!("record {}", i));
        }
        writer.flush();

        assert_eq!(writer.pending(), 0);
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "record 0");
        assert_eq!(lines[4], "record 4");
    }

    #[test]
    fn notification_drains_without_an_explicit_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = PersistentWriter::new(&path).unwrap();

        writer.write_line("hands-off".to_string());

        // The drain happens on the notification thread; poll rather than assume timing.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while writer.pending() > 0 {
            assert!(std::time::Instant::now() < deadline, "drain never happened");
            std::thread::sleep(Duration::from_millis(10));
        }
        writer.flush(); // settle any in-flight batch
        assert_eq!(read_lines(&path), vec!["hands-off".to_string()]);
    }

    #[test]
    fn none_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = PersistentWriter::new(&path).unwrap();

        writer.write_line(None);
        assert_eq!(writer.pending(), 0);
        writer.flush();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unusable_path_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        // The directory itself is not an appendable file.
        assert!(PersistentWriter::new(dir.path()).is_err());
    }

    #[test]
    fn acts_as_a_transport() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = PersistentWriter::new(&path).unwrap();

        assert_eq!(writer.send(b"{\"level\":6}").unwrap(), 11);
        writer.flush();
        assert_eq!(read_lines(&path), vec!["{\"level\":6}".to_string()]);
    }
}
