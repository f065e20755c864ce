// glacier-restore/src/status/mod.rs
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::{RestoreError, Result};
use crate::storage::{ARCHIVAL_CLASSES, ObjectRef, ObjectStore};
use crate::utils::{Console, Counter};

static EXPIRY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"expiry-date="([^"]*)""#).expect("valid expiry-date pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusResult {
    NotArchival,
    Restored(String),
    Restoring,
    NeedsRestore(ObjectRef),
}

/// Tallies shared by every status check of a run.
#[derive(Debug)]
pub struct StatusCounters {
    pub restored: Counter,
    pub not_archival: Counter,
}

impl Default for StatusCounters {
    fn default() -> Self {
        Self {
            restored: Counter::new("restored"),
            not_archival: Counter::new("not-archival"),
        }
    }
}

fn is_archival(storage_class: Option<&str>) -> bool {
    storage_class.is_some_and(|class| ARCHIVAL_CLASSES.contains(&class))
}

fn restore_completed(restore: &str) -> bool {
    restore.contains(r#"ongoing-request="false""#)
}

/// Pulls the expiry timestamp out of a completed restore header.
pub fn parse_expiry(restore: &str) -> Option<String> {
    EXPIRY_DATE
        .captures(restore)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Checks one object's restore state.
///
/// Every call either bumps exactly one of the two counters or returns
/// `Restoring` / `NeedsRestore`.
pub async fn check_status(
    store: &dyn ObjectStore,
    object: &ObjectRef,
    counters: &StatusCounters,
    console: &Console,
) -> Result<StatusResult> {
    let head = store
        .head_object(object)
        .await
        .map_err(|e| e.for_object(object))?;

    if !is_archival(head.storage_class.as_deref()) {
        counters.not_archival.increment();
        console.line(format!(
            "{}: not archival ({})",
            object,
            head.storage_class.as_deref().unwrap_or("STANDARD")
        ));
        return Ok(StatusResult::NotArchival);
    }

    match head.restore.as_deref() {
        Some(restore) if restore_completed(restore) => {
            let expiry = parse_expiry(restore).ok_or_else(|| RestoreError::MalformedRestoreState {
                locator: object.to_string(),
                raw: restore.to_string(),
            })?;
            counters.restored.increment();
            console.line(format!("{}: restored until {}", object, expiry));
            Ok(StatusResult::Restored(expiry))
        }
        Some(_) => {
            console.line(format!("{}: restoring", object));
            Ok(StatusResult::Restoring)
        }
        None => {
            console.line(format!("{}: needs restore", object));
            Ok(StatusResult::NeedsRestore(object.clone()))
        }
    }
}
