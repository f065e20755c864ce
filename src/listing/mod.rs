// glacier-restore/src/listing/mod.rs
use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::errors::{RestoreError, Result};
use crate::storage::{ObjectStore, parse_s3_uri};

/// Where the working set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Every object under an `s3://bucket/prefix` locator.
    Prefix(String),
    /// A newline-delimited file of `s3://bucket/key` locators.
    List(PathBuf),
}

/// One listed object: its full locator and size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub locator: String,
    pub size: u64,
}

/// Resolves the working set, in listing order.
pub async fn list_objects(store: &dyn ObjectStore, source: &Source) -> Result<Vec<ListedObject>> {
    match source {
        Source::Prefix(locator) => list_prefix(store, locator).await,
        Source::List(path) => read_locator_list(path),
    }
}

/// Pages through a prefix listing until a page comes back without a continuation token.
pub async fn list_prefix(store: &dyn ObjectStore, locator: &str) -> Result<Vec<ListedObject>> {
    let (bucket, prefix) = parse_s3_uri(locator)?;
    tracing::info!("Listing s3://{}/{}", bucket, prefix);

    let mut objects = Vec::new();
    let mut token = None;
    let mut first_page = true;
    loop {
        let page = store
            .list_page(&bucket, &prefix, token.take())
            .await
            .map_err(|e| RestoreError::Remote {
                locator: locator.to_string(),
                code: e.code,
                message: e.message,
            })?;

        let before = objects.len();
        objects.extend(
            page.entries
                .into_iter()
                .filter(|entry| entry.key.starts_with(&prefix))
                .map(|entry| ListedObject {
                    locator: format!("s3://{}/{}", bucket, entry.key),
                    size: entry.size,
                }),
        );
        if first_page && objects.len() == before {
            return Err(RestoreError::EmptyResult { bucket, prefix });
        }
        first_page = false;

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    tracing::info!("Listed {} objects under {}", objects.len(), locator);
    Ok(objects)
}

/// Reads one locator per line; sizes are unknown and reported as 0.
pub fn read_locator_list(path: &Path) -> Result<Vec<ListedObject>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read object list at {}", path.display()))?;
    let objects: Vec<ListedObject> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| ListedObject {
            locator: line.to_string(),
            size: 0,
        })
        .collect();
    tracing::info!("Read {} locators from {}", objects.len(), path.display());
    Ok(objects)
}
