// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup Manager
//!
//! Snapshots of all three domains under `<prefix><epoch-ms>` keys, capped to
//! a retention count. Ordering always uses the parsed numeric timestamp, so
//! keys of different widths sort correctly.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::iso8601;
use crate::codec;
use crate::config::StorageKeys;
use crate::error::{CacheError, CacheResult};
use crate::migration::SCHEMA_VERSION;
use crate::model::{Dialog, Domain, PersistedState, Settings, User};
use crate::store::KvStore;

/// A persisted backup snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    #[serde(default)]
    pub setting: Option<Settings>,
    #[serde(default)]
    pub users: Option<Vec<User>>,
    #[serde(default)]
    pub dialogs: Option<Vec<Dialog>>,
    pub timestamp: u64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_at: String,
}

impl BackupSnapshot {
    pub fn new(state: PersistedState, timestamp: u64) -> Self {
        Self {
            setting: state.setting,
            users: state.users,
            dialogs: state.dialogs,
            timestamp,
            version: SCHEMA_VERSION.to_string(),
            created_at: iso8601(timestamp),
        }
    }
}

/// A backup key and its timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub key: String,
    pub timestamp: u64,
}

/// Outcome of writing a snapshot back to the primary keys.
///
/// Domains are written independently; a failure in one does not undo the
/// others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub written: Vec<Domain>,
    pub failed: Vec<Domain>,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn record(&mut self, domain: Domain, ok: bool) {
        if ok {
            self.written.push(domain);
        } else {
            self.failed.push(domain);
        }
    }
}

pub struct BackupManager<'a> {
    store: &'a dyn KvStore,
    keys: &'a StorageKeys,
    retention: usize,
}

impl<'a> BackupManager<'a> {
    pub fn new(store: &'a dyn KvStore, keys: &'a StorageKeys, retention: usize) -> Self {
        Self {
            store,
            keys,
            retention,
        }
    }

    /// Backups, newest first.
    pub fn list(&self) -> CacheResult<Vec<BackupEntry>> {
        let mut entries: Vec<BackupEntry> = self
            .store
            .keys_with_prefix(&self.keys.backup_prefix)?
            .into_iter()
            .filter_map(|key| {
                let timestamp = self.keys.backup_timestamp(&key)?;
                Some(BackupEntry { key, timestamp })
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Writes a snapshot of `state` and enforces retention.
    ///
    /// Two backups in the same millisecond get consecutive timestamps.
    pub fn create(&self, state: PersistedState, now_ms: u64) -> CacheResult<String> {
        let mut timestamp = now_ms;
        while self.store.contains(&self.keys.backup_key(timestamp))? {
            timestamp += 1;
        }
        let key = self.keys.backup_key(timestamp);
        let snapshot = BackupSnapshot::new(state, timestamp);
        self.store.set(&key, &codec::encode(&snapshot)?)?;
        info!(key = %key, "backup created");

        self.clean_old()?;
        Ok(key)
    }

    /// Evicts the oldest backups beyond the retention cap.
    pub fn clean_old(&self) -> CacheResult<usize> {
        let entries = self.list()?;
        let mut removed = 0;
        for entry in entries.iter().skip(self.retention) {
            self.store.remove(&entry.key)?;
            debug!(key = %entry.key, "evicted old backup");
            removed += 1;
        }
        Ok(removed)
    }

    /// Reads a snapshot.
    pub fn load(&self, key: &str) -> CacheResult<BackupSnapshot> {
        let raw = self
            .store
            .get(key)?
            .ok_or_else(|| CacheError::BackupNotFound(key.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Removes every key under the backup prefix.
    pub fn remove_all(&self) -> CacheResult<usize> {
        let keys = self.store.keys_with_prefix(&self.keys.backup_prefix)?;
        for key in &keys {
            self.store.remove(key)?;
        }
        Ok(keys.len())
    }
}
