// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key/Value Store Tests
//!
//! Both backends behave the same way under the operations the cache uses,
//! and the service survives a store that refuses every operation.

mod common;

use std::rc::Rc;

use chatmock_core::*;
use common::*;
use tempfile::TempDir;

fn exercise_contract(store: &dyn KvStore) {
    assert_eq!(store.get("wechat_dialogs").unwrap(), None);
    assert!(!store.contains("wechat_dialogs").unwrap());

    store.set("wechat_dialogs", "[]").unwrap();
    store.set("wechat_dialogs", "[1]").unwrap();
    store.set("wechat_backup_5", "{}").unwrap();
    store.set("wechat_backup_10", "{}").unwrap();
    store.set("other", "x").unwrap();

    assert_eq!(store.get("wechat_dialogs").unwrap().as_deref(), Some("[1]"));
    let mut backups = store.keys_with_prefix("wechat_backup_").unwrap();
    backups.sort();
    assert_eq!(backups, vec!["wechat_backup_10", "wechat_backup_5"]);
    assert_eq!(store.keys().unwrap().len(), 4);

    store.remove("wechat_dialogs").unwrap();
    store.remove("wechat_dialogs").unwrap();
    assert_eq!(store.get("wechat_dialogs").unwrap(), None);
}

#[test]
fn test_memory_store_contract() {
    exercise_contract(&MemoryStore::new());
}

#[test]
fn test_sqlite_store_contract() {
    exercise_contract(&SqliteStore::in_memory().unwrap());
}

#[test]
fn test_sqlite_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    {
        let store = SqliteStore::open(&path).unwrap();
        store.set("wechat_users", r#"[{"id":1,"name":"我","is_me":true}]"#).unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    let users: Vec<User> =
        serde_json::from_str(&store.get("wechat_users").unwrap().unwrap()).unwrap();
    assert_eq!(users, vec![User::new(1, "我", true)]);
}

#[test]
fn test_service_over_sqlite_restores_after_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let clock: Rc<dyn Clock> = Rc::new(ManualClock::new(T0));

    {
        let mut service = CacheService::new(
            SqliteStore::open(&path).unwrap(),
            Rc::clone(&clock),
            CacheConfig::default(),
        );
        let app: AppHandle = Rc::new(std::cell::RefCell::new(sample_app()));
        service.register_app(app);
        assert!(service.save_all());
        service.on_before_unload();
    }

    let mut service = CacheService::new(
        SqliteStore::open(&path).unwrap(),
        clock,
        CacheConfig::default(),
    );
    let app = Rc::new(std::cell::RefCell::new(MemoryApp::new()));
    let handle: AppHandle = app.clone();
    service.register_app(handle);

    assert_eq!(app.borrow().dialogs, sample_dialogs());
    assert_eq!(app.borrow().users, sample_users());
}

#[test]
fn test_unavailable_store_degrades_quietly() {
    let store = MemoryStore::new();
    store.set_unavailable(true);
    let mut h = Harness::with_store(store, CacheConfig::default());

    assert!(!h.service.set("wechat_dialogs", &sample_dialogs()));
    assert_eq!(h.service.get::<Vec<Dialog>>("wechat_dialogs"), None);
    assert!(!h.service.has_valid_cache_data());
    assert!(h.service.list_backups().is_empty());
    assert!(h.toasts().contains(&"保存失败：存储空间不足".to_string()));
}

#[test]
fn test_quota_exceeded_keeps_previous_value() {
    let mut h = Harness::with_store(MemoryStore::with_quota(2048), CacheConfig::default());
    let small = sample_dialogs();
    assert!(h.service.set("wechat_dialogs", &small));

    let huge = vec![Dialog::text("dialog-9", true, "长".repeat(4096))];
    assert!(!h.service.set("wechat_dialogs", &huge));

    assert_eq!(h.service.get::<Vec<Dialog>>("wechat_dialogs"), Some(small));
    assert_eq!(
        h.count_events(|e| matches!(e, CacheEvent::SaveFailed { .. })),
        1
    );
}
