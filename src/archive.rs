//! Error Archive
//!
//! Process-local store of full error-attribute sets keyed by opaque tokens,
//! so a simplified error beacon link can redisplay the full diagnostic page
//! later. Entries are volatile and time-bounded: a background sweep evicts
//! anything older than the configured timeout, while a successful lookup pins
//! the entry against eviction for good.

use crate::error::ErrorPagesError;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Open-ended attribute set describing one archived error response.
pub type ErrorAttributes = HashMap<String, Value>;

/// Attribute marking an entry as served from the archive.
pub const ARCHIVED_KEY: &str = "archived";

/// Attribute holding the entry's own token, kept for eviction bookkeeping.
pub const ID_KEY: &str = "id";

/// Attribute holding the insertion timestamp in epoch milliseconds.
pub const INSERTED_AT_KEY: &str = "insertedAtMs";

// Age marker that can never trigger eviction; written on successful reads.
const PINNED_SENTINEL: i64 = i64::MAX;

/// Time-bounded in-memory archive of error-attribute sets.
///
/// Reads, writes and sweep removals are individually atomic with respect to
/// each other; request threads and the sweep task share one map.
pub struct ErrorArchive {
    entries: RwLock<HashMap<String, ErrorAttributes>>,
    timeout: Duration,
}

impl ErrorArchive {
    /// Create an archive whose entries expire after `timeout` unless viewed.
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Eviction timeout, exposed so a 404 page can explain the expiry.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Store `attributes` under `id`, stamping the archive bookkeeping fields.
    ///
    /// Ids are globally-unique random tokens; a collision silently overwrites.
    pub fn put(&self, id: &str, mut attributes: ErrorAttributes) {
        attributes.insert(ARCHIVED_KEY.to_string(), json!(true));
        attributes.insert(ID_KEY.to_string(), json!(id));
        attributes.insert(INSERTED_AT_KEY.to_string(), json!(now_ms()));

        self.entries.write().insert(id.to_string(), attributes);
        debug!(id, "archived error attributes");
    }

    /// Look up an archived entry.
    ///
    /// A successful read pins the entry: once displayed it is exempt from the
    /// timeout. A miss is a first-class failure the boundary layer maps to a
    /// 404-equivalent.
    pub fn get(&self, id: &str) -> Result<ErrorAttributes, ErrorPagesError> {
        let mut entries = self.entries.write();
        match entries.get_mut(id) {
            Some(attributes) => {
                attributes.insert(INSERTED_AT_KEY.to_string(), json!(PINNED_SENTINEL));
                Ok(attributes.clone())
            }
            None => Err(ErrorPagesError::ArchiveNotFound {
                id: id.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Remove every entry older than the timeout.
    ///
    /// Expired ids are collected first and removed afterwards; the map is
    /// never structurally mutated while being iterated.
    pub fn sweep(&self) {
        let deadline = now_ms();
        let timeout_ms = self.timeout.as_millis() as i64;

        let expired: Vec<String> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|(_, attributes)| {
                    let inserted_at = attributes
                        .get(INSERTED_AT_KEY)
                        .and_then(Value::as_i64)
                        .unwrap_or(PINNED_SENTINEL);
                    deadline.saturating_sub(inserted_at) > timeout_ms
                })
                .map(|(id, _)| id.clone())
                .collect()
        };

        if expired.is_empty() {
            return;
        }

        let mut entries = self.entries.write();
        for id in &expired {
            entries.remove(id);
        }
        debug!(evicted = expired.len(), "swept expired archive entries");
    }

    /// Start the periodic sweep, once, at system initialization.
    ///
    /// The sweep runs at the same period as the timeout itself, on its own
    /// task, for the life of the process.
    pub fn start_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let archive = Arc::clone(self);
        info!(timeout_ms = archive.timeout.as_millis() as u64, "starting archive sweeper");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(archive.timeout);
            // The first tick of an interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                archive.sweep();
            }
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
