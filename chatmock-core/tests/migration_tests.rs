// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cache Migration Tests
//!
//! Data written before the layout was versioned is upgraded in place when
//! the service starts, without losing anything the application stored.

mod common;

use chatmock_core::migration::{all_migrations, MigrationRunner, CURRENT_SCHEMA};
use chatmock_core::*;
use common::*;
use serde_json::Value;

const LEGACY_DIALOGS: &str = r#"[
    {"id": "dialog-1", "type": "text", "is_me": 1, "content": "旧数据", "isEditing": true, "editContent": "草稿"},
    {"id": "dialog-2", "type": "image", "is_me": 0, "is_blocked": 1, "image": "data:image/png;base64,AA"}
]"#;

const LEGACY_USERS: &str = r#"[{"id": 1, "name": "我", "is_me": 1, "color": "red"}]"#;

fn legacy_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.set("wechat_dialogs", LEGACY_DIALOGS).unwrap();
    store.set("wechat_users", LEGACY_USERS).unwrap();
    store
}

#[test]
fn test_unversioned_data_counts_as_v1() {
    let store = legacy_store();
    let keys = StorageKeys::default();
    assert_eq!(MigrationRunner::current_version(&store, &keys).unwrap(), 1);
}

#[test]
fn test_legacy_flags_become_booleans() {
    let h = Harness::with_store(legacy_store(), CacheConfig::default());

    let raw: Value = serde_json::from_str(&h.raw("wechat_dialogs").unwrap()).unwrap();
    assert_eq!(raw[0]["is_me"], Value::Bool(true));
    assert_eq!(raw[1]["is_blocked"], Value::Bool(true));
    assert!(raw[0].get("isEditing").is_none());
    assert!(raw[0].get("editContent").is_none());

    let users: Value = serde_json::from_str(&h.raw("wechat_users").unwrap()).unwrap();
    assert_eq!(users[0]["is_me"], Value::Bool(true));
    assert_eq!(users[0]["color"], "red");

    let meta = h.service.get_meta().unwrap();
    assert_eq!(meta.version.as_deref(), Some(SCHEMA_VERSION));
}

#[test]
fn test_migrated_data_is_restored() {
    let mut h = Harness::with_store(legacy_store(), CacheConfig::default());
    let app = h.register(MemoryApp::new());

    let app = app.borrow();
    assert_eq!(app.dialogs.len(), 2);
    assert!(app.dialogs[0].is_me);
    assert!(!app.dialogs[0].is_editing);
    assert!(app.dialogs[1].is_blocked);
    assert_eq!(app.users[0].extra.get("color"), Some(&Value::from("red")));
}

#[test]
fn test_migration_is_idempotent() {
    let store = legacy_store();
    let keys = StorageKeys::default();
    assert_eq!(
        MigrationRunner::run(&store, &keys, &all_migrations()).unwrap(),
        CURRENT_SCHEMA
    );
    let once = store.get("wechat_dialogs").unwrap();
    assert_eq!(
        MigrationRunner::run(&store, &keys, &all_migrations()).unwrap(),
        CURRENT_SCHEMA
    );
    assert_eq!(store.get("wechat_dialogs").unwrap(), once);
}

#[test]
fn test_newer_schema_left_untouched() {
    let store = legacy_store();
    store
        .set("wechat_cache_meta", r#"{"normalExit":true,"version":"3.0"}"#)
        .unwrap();
    let h = Harness::with_store(store, CacheConfig::default());
    assert_eq!(h.raw("wechat_dialogs").as_deref(), Some(LEGACY_DIALOGS));
}

#[test]
fn test_corrupt_entry_is_skipped() {
    let store = MemoryStore::new();
    store.set("wechat_dialogs", "{broken").unwrap();
    store.set("wechat_users", LEGACY_USERS).unwrap();
    let h = Harness::with_store(store, CacheConfig::default());

    assert_eq!(h.raw("wechat_dialogs").as_deref(), Some("{broken"));
    assert_eq!(h.service.get::<Vec<Dialog>>("wechat_dialogs"), None);
    assert_eq!(h.service.get::<Vec<User>>("wechat_users").unwrap().len(), 1);
}
