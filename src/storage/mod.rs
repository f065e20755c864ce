// glacier-restore/src/storage/mod.rs
pub(crate) mod s3_client;
#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::errors::{RestoreError, Result};

pub use s3_client::S3ObjectStore;

/// Storage classes that must be restored before the object can be read.
pub const ARCHIVAL_CLASSES: &[&str] = &["GLACIER", "DEEP_ARCHIVE"];

const SCHEME: &str = "s3";

/// A remote object and its size in bytes (0 when the size is unknown).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, size: u64) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            size,
        }
    }

    /// Builds an object reference from an `s3://bucket/key` locator.
    pub fn from_locator(locator: &str, size: u64) -> Result<Self> {
        let (bucket, key) = parse_s3_uri(locator)?;
        if key.is_empty() {
            return Err(RestoreError::InvalidLocator(locator.to_string()));
        }
        Ok(Self::new(bucket, key, size))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", SCHEME, self.bucket, self.key)
    }
}

/// Splits an `s3://bucket/path` locator into bucket and path. The path may be empty.
///
/// The scheme and bucket are validated with `url`; the path is taken verbatim from the
/// input because `Url` would percent-encode characters that are legal in object keys.
pub fn parse_s3_uri(locator: &str) -> Result<(String, String)> {
    let invalid = || RestoreError::InvalidLocator(locator.to_string());
    let locator = locator.trim();
    // `Url` silently drops these, which would shift the key offset below.
    if locator.contains(['\t', '\n', '\r']) {
        return Err(invalid());
    }
    let uri = url::Url::parse(locator).map_err(|_| invalid())?;
    if uri.scheme() != SCHEME {
        return Err(invalid());
    }
    let bucket = uri
        .host_str()
        .filter(|b| !b.is_empty())
        .ok_or_else(invalid)?
        .to_string();

    let rest = locator
        .get(SCHEME.len() + 3..)
        .ok_or_else(invalid)?;
    let path = match rest.split_once('/') {
        Some((_, path)) => path.to_string(),
        None => String::new(),
    };
    Ok((bucket, path))
}

/// Restore speed/cost class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Tier {
    Expedited,
    Standard,
    Bulk,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Expedited, Tier::Standard, Tier::Bulk];

    /// Maps the interactive menu answer ("1", "2", "3") to a tier.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Tier::Expedited),
            "2" => Some(Tier::Standard),
            "3" => Some(Tier::Bulk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Expedited => "Expedited",
            Tier::Standard => "Standard",
            Tier::Bulk => "Bulk",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a restored copy ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    /// Temporary copy next to the archived object, kept for `days`.
    InPlace { days: i32 },
    /// Copy written to another bucket under the same key.
    Destination { bucket: String },
}

impl RestoreTarget {
    pub fn retention_days(&self) -> Option<i32> {
        match self {
            RestoreTarget::InPlace { days } => Some(*days),
            RestoreTarget::Destination { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTask {
    pub object: ObjectRef,
    pub tier: Tier,
    pub target: RestoreTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub key: String,
    pub size: u64,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub entries: Vec<PageEntry>,
    pub next_token: Option<String>,
}

/// The metadata fields status classification looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    pub storage_class: Option<String>,
    pub restore: Option<String>,
}

/// A failed remote call, reduced to the remote error code and a printable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn for_object(self, object: &ObjectRef) -> RestoreError {
        RestoreError::Remote {
            locator: object.to_string(),
            code: self.code,
            message: self.message,
        }
    }
}

/// The remote operations the restore engine needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<String>,
    ) -> std::result::Result<ListPage, RemoteError>;

    async fn head_object(&self, object: &ObjectRef) -> std::result::Result<ObjectHead, RemoteError>;

    async fn restore_object(&self, task: &RestoreTask) -> std::result::Result<(), RemoteError>;
}
