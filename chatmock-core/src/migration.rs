// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persisted Data Migration Framework
//!
//! Persisted domains carry a schema version in the cache metadata. Each
//! migration has a version number, a name and a callback that rewrites the
//! stored blobs. The runner applies pending migrations in order and records
//! the version after every step, so a failing step leaves the data at the
//! last version that completed.

use serde_json::Value;
use tracing::{info, warn};

use crate::config::StorageKeys;
use crate::error::{CacheError, CacheResult};
use crate::meta::{MetaPatch, MetaTracker};
use crate::model::Domain;
use crate::store::KvStore;

/// Schema version tag written with every save.
pub const SCHEMA_VERSION: &str = "2.0";

/// Numeric schema version matching [`SCHEMA_VERSION`].
pub const CURRENT_SCHEMA: u32 = 2;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    pub action: MigrationAction,
}

/// The action a migration performs.
pub enum MigrationAction {
    /// Marks the starting layout. Nothing to rewrite.
    Baseline,
    /// Rewrites persisted blobs in place.
    Callback(fn(&dyn KvStore, &StorageKeys) -> CacheResult<()>),
}

/// Runs migrations against a key/value store.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations and returns the resulting version.
    pub fn run(
        store: &dyn KvStore,
        keys: &StorageKeys,
        migrations: &[Migration],
    ) -> CacheResult<u32> {
        let current_version = Self::current_version(store, keys)?;

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(current_version);
        }

        // Verify migrations are in order
        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(CacheError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        let tracker = MetaTracker::new(store, &keys.meta);
        let mut version = current_version;
        for migration in pending {
            if let MigrationAction::Callback(cb) = &migration.action {
                cb(store, keys).map_err(|e| {
                    CacheError::Migration(format!(
                        "Migration v{} '{}' failed: {}",
                        migration.version, migration.name, e
                    ))
                })?;
            }

            tracker.update(MetaPatch {
                version: Some(schema_tag(migration.version)),
                ..MetaPatch::default()
            })?;
            version = migration.version;
            info!(version, name = migration.name, "applied cache migration");
        }

        Ok(version)
    }

    /// Returns the schema version of the persisted data.
    ///
    /// Data without a version tag predates versioning and counts as v1. An
    /// empty store is already current.
    pub fn current_version(store: &dyn KvStore, keys: &StorageKeys) -> CacheResult<u32> {
        let tagged = MetaTracker::new(store, &keys.meta)
            .get()
            .and_then(|meta| meta.version)
            .and_then(|tag| parse_schema_tag(&tag));
        if let Some(version) = tagged {
            return Ok(version);
        }

        for domain in Domain::ALL {
            if store.contains(keys.domain(domain))? {
                return Ok(1);
            }
        }
        Ok(CURRENT_SCHEMA)
    }
}

/// Formats a numeric schema version as its persisted tag ("2.0").
pub fn schema_tag(version: u32) -> String {
    format!("{version}.0")
}

/// Parses a persisted tag ("2.0", "2") back to its major version.
pub fn parse_schema_tag(tag: &str) -> Option<u32> {
    tag.split('.').next()?.trim().parse().ok()
}

/// Returns all registered migrations in version order.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "baseline_layout",
            action: MigrationAction::Baseline,
        },
        Migration {
            version: 2,
            name: "dialog_flags_to_bool",
            action: MigrationAction::Callback(migrate_v2_flags_to_bool),
        },
    ]
}

const FLAG_FIELDS: [&str; 2] = ["is_me", "is_blocked"];
const TRANSIENT_FIELDS: [&str; 2] = ["isEditing", "editContent"];

/// v2: integer `is_me` / `is_blocked` flags become booleans and the
/// transient editor fields are dropped.
fn migrate_v2_flags_to_bool(store: &dyn KvStore, keys: &StorageKeys) -> CacheResult<()> {
    for domain in [Domain::Users, Domain::Dialogs] {
        let key = keys.domain(domain);
        let Some(raw) = store.get(key)? else {
            continue;
        };
        let mut value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "skipping undecodable entry during migration");
                continue;
            }
        };

        let Some(items) = value.as_array_mut() else {
            continue;
        };
        let mut changed = false;
        for item in items.iter_mut().filter_map(Value::as_object_mut) {
            for field in FLAG_FIELDS {
                if let Some(n) = item.get(field).and_then(Value::as_i64) {
                    item.insert(field.to_string(), Value::Bool(n != 0));
                    changed = true;
                }
            }
            if domain == Domain::Dialogs {
                for field in TRANSIENT_FIELDS {
                    changed |= item.remove(field).is_some();
                }
            }
        }

        if changed {
            store.set(key, &serde_json::to_string(&value)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_schema_tags() {
        assert_eq!(schema_tag(2), SCHEMA_VERSION);
        assert_eq!(parse_schema_tag("2.0"), Some(2));
        assert_eq!(parse_schema_tag("1"), Some(1));
        assert_eq!(parse_schema_tag("beta"), None);
    }

    #[test]
    fn test_fresh_store_is_current() {
        let store = MemoryStore::new();
        let keys = StorageKeys::default();
        assert_eq!(
            MigrationRunner::current_version(&store, &keys).unwrap(),
            CURRENT_SCHEMA
        );
        assert_eq!(
            MigrationRunner::run(&store, &keys, &all_migrations()).unwrap(),
            CURRENT_SCHEMA
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_out_of_order_migrations_rejected() {
        let store = MemoryStore::new();
        let keys = StorageKeys::default();
        store.set(&keys.dialogs, "[]").unwrap();
        let migrations = vec![
            Migration {
                version: 3,
                name: "b",
                action: MigrationAction::Baseline,
            },
            Migration {
                version: 2,
                name: "a",
                action: MigrationAction::Baseline,
            },
        ];
        assert!(matches!(
            MigrationRunner::run(&store, &keys, &migrations),
            Err(CacheError::Migration(_))
        ));
    }
}
