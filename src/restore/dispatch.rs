// glacier-restore/src/restore/dispatch.rs
use std::time::Duration;

use crate::errors::Result;
use crate::storage::{ObjectStore, RestoreTask};
use crate::utils::Console;

pub const DEFAULT_MAX_TRIES: u32 = 10;

/// Wait before retrying a throttled or conflicting restore.
pub const COOLDOWN: Duration = Duration::from_secs(60);

/// How the dispatcher reacts to a remote error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    AlreadyInProgress,
    WrongStorageClass,
    ExpeditedThrottled,
    ConflictingOperation,
    NotFound,
    Fatal,
}

impl Signal {
    pub fn classify(code: &str) -> Self {
        match code {
            "RestoreAlreadyInProgress" => Signal::AlreadyInProgress,
            "InvalidObjectState" | "ObjectAlreadyInActiveTierError" => Signal::WrongStorageClass,
            "GlacierExpeditedRetrievalNotAvailable" => Signal::ExpeditedThrottled,
            "OperationAborted" => Signal::ConflictingOperation,
            "NoSuchKey" | "NotFound" => Signal::NotFound,
            _ => Signal::Fatal,
        }
    }
}

/// Terminal, non-error results of dispatching one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Requested,
    AlreadyInProgress,
    NotArchival,
    Vanished,
    Exhausted,
}

pub struct Dispatcher<'a> {
    store: &'a dyn ObjectStore,
    console: &'a Console,
    max_tries: u32,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a dyn ObjectStore, console: &'a Console, max_tries: u32) -> Self {
        Self {
            store,
            console,
            max_tries,
        }
    }

    /// Issues the restore request, retrying throttled or conflicting attempts after a
    /// cooldown. Gives up quietly once `max_tries` attempts have been made.
    pub async fn restore(&self, task: &RestoreTask) -> Result<DispatchOutcome> {
        let object = &task.object;
        for attempt in 1..=self.max_tries {
            let err = match self.store.restore_object(task).await {
                Ok(()) => {
                    let detail = match task.target.retention_days() {
                        Some(days) => format!("{}, {} days", task.tier, days),
                        None => task.tier.to_string(),
                    };
                    self.console.line(format!("{}: restore requested ({})", object, detail));
                    return Ok(DispatchOutcome::Requested);
                }
                Err(err) => err,
            };

            match Signal::classify(&err.code) {
                Signal::AlreadyInProgress => {
                    self.console.line(format!("{}: restore already in progress", object));
                    return Ok(DispatchOutcome::AlreadyInProgress);
                }
                Signal::WrongStorageClass => {
                    self.console.line(format!("{}: not archival, skipped ({})", object, err.code));
                    return Ok(DispatchOutcome::NotArchival);
                }
                Signal::NotFound => {
                    self.console.line(format!("{}: object no longer exists, skipped", object));
                    return Ok(DispatchOutcome::Vanished);
                }
                Signal::ExpeditedThrottled | Signal::ConflictingOperation => {
                    tracing::warn!(
                        "{}: {} on attempt {}/{}",
                        object,
                        err.code,
                        attempt,
                        self.max_tries
                    );
                    if attempt < self.max_tries {
                        self.console.line(format!(
                            "{}: {}, retrying in {}s",
                            object,
                            err.code,
                            COOLDOWN.as_secs()
                        ));
                        tokio::time::sleep(COOLDOWN).await;
                    }
                }
                Signal::Fatal => return Err(err.for_object(object)),
            }
        }

        self.console.line(format!(
            "{}: giving up after {} attempts",
            object, self.max_tries
        ));
        Ok(DispatchOutcome::Exhausted)
    }
}
