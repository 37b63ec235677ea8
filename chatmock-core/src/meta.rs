// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Metadata Tracker
//!
//! A small persisted record read at startup to pick a recovery strategy.
//! `normalExit` is cleared on teardown and set again once the page has fully
//! loaded, so a crash between the two leaves it `false`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::codec;
use crate::error::CacheResult;
use crate::migration::SCHEMA_VERSION;
use crate::store::KvStore;

/// Persisted cache metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_exit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_save: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_import_recovery: Option<bool>,
    /// Unknown fields are preserved across read-modify-write cycles.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CacheMeta {
    /// Whether the previous session did not reach its normal-exit mark.
    pub fn ended_abnormally(&self) -> bool {
        !self.normal_exit.unwrap_or(false)
    }

    pub fn needs_import_recovery(&self) -> bool {
        self.needs_import_recovery.unwrap_or(false)
    }
}

/// Partial metadata update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MetaPatch {
    pub normal_exit: Option<bool>,
    pub last_update: Option<u64>,
    pub last_save: Option<u64>,
    pub version: Option<String>,
    pub needs_import_recovery: Option<bool>,
}

impl MetaPatch {
    pub fn apply(self, meta: &mut CacheMeta) {
        if let Some(v) = self.normal_exit {
            meta.normal_exit = Some(v);
        }
        if let Some(v) = self.last_update {
            meta.last_update = Some(v);
        }
        if let Some(v) = self.last_save {
            meta.last_save = Some(v);
        }
        if let Some(v) = self.version {
            meta.version = Some(v);
        }
        if let Some(v) = self.needs_import_recovery {
            meta.needs_import_recovery = Some(v);
        }
    }
}

/// Reads and merges the metadata record under a fixed key.
pub struct MetaTracker<'a> {
    store: &'a dyn KvStore,
    key: &'a str,
}

impl<'a> MetaTracker<'a> {
    pub fn new(store: &'a dyn KvStore, key: &'a str) -> Self {
        Self { store, key }
    }

    /// Current metadata, or `None` when absent, unreadable or corrupt.
    pub fn get(&self) -> Option<CacheMeta> {
        match self.store.get(self.key) {
            Ok(Some(raw)) => codec::decode(self.key, &raw),
            Ok(None) => None,
            Err(e) => {
                debug!(key = self.key, error = %e, "metadata unreadable");
                None
            }
        }
    }

    /// Read-modify-write merge of `patch` into the stored record.
    pub fn update(&self, patch: MetaPatch) -> CacheResult<CacheMeta> {
        let mut meta = self.get().unwrap_or_default();
        patch.apply(&mut meta);
        self.store.set(self.key, &codec::encode(&meta)?)?;
        Ok(meta)
    }

    /// Sets the normal-exit flag and stamps `lastUpdate`.
    pub fn set_normal_exit(&self, normal: bool, now_ms: u64) -> CacheResult<CacheMeta> {
        self.update(MetaPatch {
            normal_exit: Some(normal),
            last_update: Some(now_ms),
            ..MetaPatch::default()
        })
    }

    /// Stamps `lastSave` and the current schema version after a write.
    pub fn record_save(&self, now_ms: u64) -> CacheResult<CacheMeta> {
        self.update(MetaPatch {
            last_save: Some(now_ms),
            version: Some(SCHEMA_VERSION.to_string()),
            ..MetaPatch::default()
        })
    }

    pub fn set_import_pending(&self, pending: bool) -> CacheResult<CacheMeta> {
        self.update(MetaPatch {
            needs_import_recovery: Some(pending),
            ..MetaPatch::default()
        })
    }
}
