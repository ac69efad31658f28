//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Key-value stores backing the roster cache
//!
//! The store holds two entries, the raw roster payload and the time it was
//! written. Expiry is decided by the reader, the store never drops entries on
//! its own.

use crate::error::{RosterError, RosterResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Persistent string key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str);

    /// Remove `key` if present
    async fn remove(&self, key: &str);
}

/// Process local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    async fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Store persisted as a JSON object in a single file
///
/// Every write rewrites the file on the blocking pool. Writes are serialized
/// and each one takes its snapshot under the write lock, so the file always
/// ends up holding the latest entries. Write failures are logged and the
/// in-memory state stays authoritative until the next successful write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: DashMap<String, String>,
    writes: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, creating it on first write
    pub fn open(path: impl AsRef<Path>) -> RosterResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                RosterError::Store(format!("Failed to read {}: {}", path.display(), e))
            })?;
            if !content.trim().is_empty() {
                let stored: BTreeMap<String, String> =
                    serde_json::from_str(&content).map_err(|e| {
                        RosterError::Store(format!("Failed to parse {}: {}", path.display(), e))
                    })?;
                for (key, value) in stored {
                    entries.insert(key, value);
                }
            }
            tracing::debug!("Opened cache store at {} with {} entries", path.display(), entries.len());
        } else {
            tracing::debug!("Cache store {} does not exist yet", path.display());
        }

        Ok(Self {
            path,
            entries,
            writes: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) {
        let _guard = self.writes.lock().await;

        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let path = self.path.clone();

        let result = tokio::task::spawn_blocking(move || write_snapshot(&path, &snapshot))
            .await
            .map_err(|e| e.to_string())
            .and_then(|written| written);

        if let Err(e) = result {
            tracing::warn!("Failed to persist cache store {}: {}", self.path.display(), e);
        }
    }
}

fn write_snapshot(path: &Path, snapshot: &BTreeMap<String, String>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| e.to_string())?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(path, json).map_err(|e| e.to_string())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist().await;
    }

    async fn remove(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.persist().await;
        }
    }
}
