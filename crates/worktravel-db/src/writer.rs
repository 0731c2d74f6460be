// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, error, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use worktravel_app::Snapshot;

use crate::Store;

const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

struct WriteJob {
    seq: u64,
    snapshot: Snapshot,
}

/// Single background writer that owns the [`Store`]. Submissions never block
/// the caller; queued snapshots collapse to the newest one before writing.
pub struct SnapshotWriter {
    tx: Option<Sender<WriteJob>>,
    handle: Option<JoinHandle<Store>>,
    last_seq: u64,
}

impl SnapshotWriter {
    pub fn spawn(store: Store) -> Result<Self> {
        let last_seq = store.last_applied_seq()?;
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("snapshot-writer".to_owned())
            .spawn(move || run_writer(store, rx))
            .context("spawn snapshot writer thread")?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            last_seq,
        })
    }

    /// Queues `snapshot` and returns the sequence number stamped on it.
    /// Fails when the writer thread can no longer accept work.
    pub fn submit(&mut self, snapshot: Snapshot) -> Result<u64> {
        self.last_seq += 1;
        let seq = self.last_seq;
        let Some(tx) = &self.tx else {
            error!("event=snapshot_dropped seq={seq} reason=writer_closed");
            bail!("snapshot writer is closed");
        };
        if tx.send(WriteJob { seq, snapshot }).is_err() {
            error!("event=snapshot_dropped seq={seq} reason=writer_gone");
            bail!("snapshot writer stopped; changes are no longer saved");
        }
        Ok(seq)
    }

    pub fn last_submitted_seq(&self) -> u64 {
        self.last_seq
    }

    /// Closes the queue, waits up to `timeout` for pending writes, and hands
    /// the store back.
    pub fn shutdown(mut self, timeout: Duration) -> Result<Store> {
        drop(self.tx.take());
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("snapshot writer already shut down"))?;

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                bail!(
                    "snapshot writer still busy after {timeout:?}; the last change may not be saved"
                );
            }
            thread::sleep(SHUTDOWN_POLL);
        }

        handle
            .join()
            .map_err(|_| anyhow!("snapshot writer thread panicked"))
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("event=snapshot_writer_panicked");
        }
    }
}

fn run_writer(store: Store, rx: Receiver<WriteJob>) -> Store {
    while let Ok(mut job) = rx.recv() {
        while let Ok(next) = rx.try_recv() {
            if next.seq > job.seq {
                job = next;
            }
        }

        match store.save_snapshot(job.seq, &job.snapshot) {
            Ok(true) => debug!(
                "event=snapshot_written seq={} items={} completed={}",
                job.seq,
                job.snapshot.todos.len(),
                job.snapshot.completed.len()
            ),
            Ok(false) => warn!("event=snapshot_stale seq={}", job.seq),
            Err(error) => error!(
                "event=snapshot_write_failed seq={} error={error:#}",
                job.seq
            ),
        }
    }
    store
}
