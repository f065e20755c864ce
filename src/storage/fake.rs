// In-memory ObjectStore for unit tests.
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ListPage, ObjectHead, ObjectRef, ObjectStore, PageEntry, RemoteError, RestoreTask};

/// Pages are served in order: page 0 for no token, page `i` for token `page-i`.
#[derive(Default)]
pub struct FakeStore {
    pages: Vec<ListPage>,
    heads: HashMap<String, ObjectHead>,
    restore_script: Mutex<HashMap<String, VecDeque<Result<(), RemoteError>>>>,
    pub list_calls: Mutex<Vec<Option<String>>>,
    pub restore_calls: Mutex<Vec<RestoreTask>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listing page; every page but the last links to the next one.
    pub fn with_pages(mut self, pages: Vec<Vec<(&str, u64)>>) -> Self {
        let count = pages.len();
        self.pages = pages
            .into_iter()
            .enumerate()
            .map(|(index, entries)| ListPage {
                entries: entries
                    .into_iter()
                    .map(|(key, size)| PageEntry {
                        key: key.to_string(),
                        size,
                    })
                    .collect(),
                next_token: (index + 1 < count).then(|| format!("page-{}", index + 1)),
            })
            .collect();
        self
    }

    pub fn with_head(mut self, key: &str, storage_class: Option<&str>, restore: Option<&str>) -> Self {
        self.heads.insert(
            key.to_string(),
            ObjectHead {
                storage_class: storage_class.map(str::to_owned),
                restore: restore.map(str::to_owned),
            },
        );
        self
    }

    /// Queues responses for successive restore calls on `key`; once drained, calls succeed.
    pub fn with_restore_responses(self, key: &str, responses: Vec<Result<(), RemoteError>>) -> Self {
        self.restore_script
            .lock()
            .unwrap()
            .insert(key.to_string(), responses.into());
        self
    }

    pub fn restore_call_count(&self) -> usize {
        self.restore_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn list_page(
        &self,
        _bucket: &str,
        _prefix: &str,
        token: Option<String>,
    ) -> Result<ListPage, RemoteError> {
        self.list_calls.lock().unwrap().push(token.clone());
        let index = match token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| RemoteError::new("InvalidToken", token.clone()))?,
        };
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn head_object(&self, object: &ObjectRef) -> Result<ObjectHead, RemoteError> {
        tokio::task::yield_now().await;
        self.heads
            .get(&object.key)
            .cloned()
            .ok_or_else(|| RemoteError::new("NotFound", format!("no head for {}", object.key)))
    }

    async fn restore_object(&self, task: &RestoreTask) -> Result<(), RemoteError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;

        self.restore_calls.lock().unwrap().push(task.clone());
        let response = self
            .restore_script
            .lock()
            .unwrap()
            .get_mut(&task.object.key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(()));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
