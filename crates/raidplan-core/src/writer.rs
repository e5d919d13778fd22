#![deny(unsafe_code)]

//! Background write-through for the progress store.
//!
//! Saves are queued on a channel and drained by one thread in the order they
//! were committed, so the store lock is never held across sink I/O.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::progress::{ProgressSink, ProgressState};

/// Result of the most recent save attempt, shared with the writer thread.
pub(crate) type PersistStatus = Arc<Mutex<Option<String>>>;

enum WriteCommand {
    Save {
        version: u64,
        state: Arc<ProgressState>,
        catalog_fingerprint: Option<String>,
    },
    Flush(Sender<()>),
    Shutdown,
}

pub(crate) struct PersistWriter {
    commands: Sender<WriteCommand>,
    handle: Option<JoinHandle<()>>,
}

impl PersistWriter {
    pub(crate) fn spawn(sink: Box<dyn ProgressSink>, status: PersistStatus) -> Self {
        let (commands, rx) = mpsc::channel();
        let handle = thread::spawn(move || drain(&*sink, &status, &rx));
        Self {
            commands,
            handle: Some(handle),
        }
    }

    /// Queue a save. Never blocks.
    pub(crate) fn save(
        &self,
        version: u64,
        state: Arc<ProgressState>,
        catalog_fingerprint: Option<String>,
    ) {
        let command = WriteCommand::Save {
            version,
            state,
            catalog_fingerprint,
        };
        if self.commands.send(command).is_err() {
            error!(version, "progress writer stopped; save dropped");
        }
    }

    /// Queue a flush marker; the receiver fires once every earlier save ran.
    pub(crate) fn flush_marker(&self) -> Receiver<()> {
        let (done, marker) = mpsc::channel();
        // A stopped writer drops `done`, which also wakes the receiver.
        let _ = self.commands.send(WriteCommand::Flush(done));
        marker
    }
}

impl Drop for PersistWriter {
    fn drop(&mut self) {
        let _ = self.commands.send(WriteCommand::Shutdown);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("progress writer panicked");
        }
    }
}

fn drain(sink: &dyn ProgressSink, status: &PersistStatus, commands: &Receiver<WriteCommand>) {
    for command in commands {
        match command {
            WriteCommand::Save {
                version,
                state,
                catalog_fingerprint,
            } => {
                let persisted = state.to_persisted(catalog_fingerprint);
                let outcome = sink.persist(&persisted);
                let mut last_error = status.lock().unwrap_or_else(PoisonError::into_inner);
                match outcome {
                    Ok(()) => {
                        debug!(version, "progress persisted");
                        *last_error = None;
                    }
                    Err(err) => {
                        error!(error = %err, version, "failed to persist progress");
                        *last_error = Some(err.to_string());
                    }
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
            WriteCommand::Shutdown => break,
        }
    }
}
