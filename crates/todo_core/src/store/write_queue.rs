//! Serialized background writer for full-collection snapshots.
//!
//! # Responsibility
//! - Take ownership of the key-value store after the initial load.
//! - Apply queued snapshots on one writer thread, in enqueue order.
//!
//! # Invariants
//! - Callers never block on a write; only `flush` waits.
//! - Writes are never reordered, so the last enqueued snapshot is the one
//!   left in storage.
//! - Back-to-back snapshots for the same key collapse into the latest one.
//! - Failed writes are logged and counted, never retried.

use crate::storage::KeyValueStore;
use log::{debug, error, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WRITER_THREAD_NAME: &str = "todo-writer";

enum WriteCommand {
    Write { key: String, snapshot: String },
    Flush(Sender<()>),
}

/// Handle to the writer thread.
pub struct WriteQueue {
    sender: Option<Sender<WriteCommand>>,
    worker: Option<JoinHandle<()>>,
    failed_writes: Arc<AtomicU64>,
}

impl WriteQueue {
    /// Moves `kv` onto a freshly spawned writer thread.
    pub fn spawn<S>(kv: S) -> std::io::Result<Self>
    where
        S: KeyValueStore + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let failed_writes = Arc::new(AtomicU64::new(0));
        let worker_failures = Arc::clone(&failed_writes);
        let worker = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(&kv, &receiver, &worker_failures))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            failed_writes,
        })
    }

    /// Queues a full-replace write of `snapshot` under `key`.
    pub fn enqueue(&self, key: &str, snapshot: String) {
        let command = WriteCommand::Write {
            key: key.to_string(),
            snapshot,
        };
        if !self.send(command) {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            error!(
                "event=todos_persist module=store status=error error_code=writer_unavailable"
            );
        }
    }

    /// Blocks until every write queued before this call has been applied.
    pub fn flush(&self) {
        let (ack_sender, ack_receiver) = mpsc::channel();
        if self.send(WriteCommand::Flush(ack_sender)) {
            // Err only when the writer died; nothing left to wait for then.
            let _ = ack_receiver.recv();
        } else {
            warn!("event=todos_flush module=store status=skipped reason=writer_unavailable");
        }
    }

    /// Number of writes that failed since the queue was spawned.
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    fn send(&self, command: WriteCommand) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| sender.send(command).is_ok())
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain what is queued and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=todos_writer_join module=store status=error error_code=writer_panicked");
            }
        }
    }
}

fn run_writer<S: KeyValueStore>(
    kv: &S,
    receiver: &Receiver<WriteCommand>,
    failed_writes: &AtomicU64,
) {
    let mut lookahead: Option<WriteCommand> = None;

    loop {
        let command = match lookahead.take() {
            Some(command) => command,
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            WriteCommand::Write { key, mut snapshot } => {
                let mut coalesced = 0_usize;
                while let Ok(next) = receiver.try_recv() {
                    match next {
                        WriteCommand::Write {
                            key: next_key,
                            snapshot: next_snapshot,
                        } if next_key == key => {
                            snapshot = next_snapshot;
                            coalesced += 1;
                        }
                        other => {
                            lookahead = Some(other);
                            break;
                        }
                    }
                }
                if !write_snapshot(kv, &key, &snapshot, coalesced) {
                    failed_writes.fetch_add(1, Ordering::Relaxed);
                }
            }
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

fn write_snapshot<S: KeyValueStore>(kv: &S, key: &str, snapshot: &str, coalesced: usize) -> bool {
    let started_at = Instant::now();
    match kv.set(key, snapshot) {
        Ok(()) => {
            debug!(
                "event=todos_persist module=store status=ok bytes={} coalesced={} duration_ms={}",
                snapshot.len(),
                coalesced,
                started_at.elapsed().as_millis()
            );
            true
        }
        Err(err) => {
            error!(
                "event=todos_persist module=store status=error bytes={} duration_ms={} error_code=kv_set_failed error={}",
                snapshot.len(),
                started_at.elapsed().as_millis(),
                err
            );
            false
        }
    }
}
