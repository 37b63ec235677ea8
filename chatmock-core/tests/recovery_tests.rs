// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recovery Tests
//!
//! Startup strategy selection, the guard sequence as seen through the
//! service, and the timed fallbacks for applications that never register.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use chatmock_core::*;
use common::*;

fn recovered_sources(h: &Harness) -> Vec<RecoverySource> {
    h.events()
        .into_iter()
        .filter_map(|e| match e {
            CacheEvent::RecoveryApplied { source, .. } => Some(source),
            _ => None,
        })
        .collect()
}

/// A harness whose application can only be found through a locator.
fn with_slot(store: MemoryStore) -> (Harness, Rc<RefCell<Option<AppHandle>>>) {
    let mut h = Harness::with_store(store, CacheConfig::default());
    let slot = Rc::new(RefCell::new(None));
    h.service.add_locator(Box::new(SlotLocator {
        slot: Rc::clone(&slot),
    }));
    (h, slot)
}

fn mount(slot: &Rc<RefCell<Option<AppHandle>>>) -> Rc<RefCell<MemoryApp>> {
    let app = Rc::new(RefCell::new(MemoryApp::new()));
    let handle: AppHandle = app.clone();
    *slot.borrow_mut() = Some(handle);
    app
}

// =============================================================================
// Startup strategy
// =============================================================================

#[test]
fn test_empty_store_arms_nothing() {
    let h = Harness::new();
    assert!(!h.service.has_valid_cache_data());
    assert_eq!(h.service.pending_tasks(), 0);
    assert_eq!(h.service.status_text(), "初始化中...");
}

#[test]
fn test_crash_recovery_on_registration() {
    let mut h = Harness::with_store(seeded_store(false), CacheConfig::default());
    let app = h.register(MemoryApp::new());

    assert_eq!(app.borrow().dialogs, sample_dialogs());
    assert_eq!(app.borrow().users, sample_users());
    assert_eq!(app.borrow().setting, sample_settings());
    assert!(app.borrow().renders >= 1);
    assert_eq!(recovered_sources(&h), vec![RecoverySource::CrashRecovery]);
    // Crash recovery itself is silent; the notice follows a moment later.
    assert!(h.toasts().is_empty());

    h.advance(2000);
    assert_eq!(
        h.toasts(),
        vec!["检测到异常退出，已自动恢复您的聊天记录！".to_string()]
    );
    assert!(h.statuses().contains(&"已恢复上次会话".to_string()));
}

#[test]
fn test_crash_notice_before_registration_waits_for_application() {
    let mut h = Harness::with_store(seeded_store(false), CacheConfig::default());

    // The notice fires with no application around: nothing is spent.
    h.advance(2500);
    assert_eq!(h.service.recovery().attempts(), 0);
    assert!(h.toasts().is_empty());

    let app = h.register(MemoryApp::new());
    assert_eq!(app.borrow().dialogs, sample_dialogs());
    assert_eq!(app.borrow().users, sample_users());
    assert!(h.service.recovery().has_recovered());
    assert_eq!(recovered_sources(&h), vec![RecoverySource::CrashRecovery]);
    assert_eq!(
        h.toasts(),
        vec!["检测到异常退出，已自动恢复您的聊天记录！".to_string()]
    );

    h.advance(60_000);
    assert_eq!(recovered_sources(&h), vec![RecoverySource::CrashRecovery]);
}

#[test]
fn test_crash_notice_dropped_after_wait_timeout() {
    let mut h = Harness::with_store(seeded_store(false), CacheConfig::default());
    h.advance(10_000);

    h.register(MemoryApp::new());
    assert!(recovered_sources(&h).is_empty());
    assert!(h.toasts().is_empty());
    assert_eq!(h.service.recovery().attempts(), 0);
}

#[test]
fn test_auto_restore_after_normal_exit() {
    let mut h = Harness::with_store(seeded_store(true), CacheConfig::default());
    h.register(MemoryApp::new());

    assert_eq!(recovered_sources(&h), vec![RecoverySource::AutoRestore]);
    assert_eq!(h.toasts(), vec!["缓存数据已恢复到应用！".to_string()]);
    assert!(h.service.recovery().has_recovered());
}

#[test]
fn test_pending_import_is_recovered_first() {
    let store = seeded_store(true);
    store
        .set(
            "wechat_cache_meta",
            r#"{"normalExit":true,"version":"2.0","needsImportRecovery":true}"#,
        )
        .unwrap();
    let mut h = Harness::with_store(store, CacheConfig::default());
    h.register(MemoryApp::new());

    assert_eq!(recovered_sources(&h), vec![RecoverySource::ImportRecovery]);
    assert_eq!(h.toasts(), vec!["导入的数据已恢复到应用！".to_string()]);
    let meta = h.service.get_meta().unwrap();
    assert!(!meta.needs_import_recovery());
}

#[test]
fn test_settings_merge_keeps_live_fields() {
    let mut h = Harness::with_store(seeded_store(true), CacheConfig::default());
    let mut live = MemoryApp::new();
    live.setting.insert("title", "旧标题");
    live.setting.insert("signal", 3);
    let app = h.register(live);

    let app = app.borrow();
    let setting = &app.setting;
    assert_eq!(setting.get("title"), Some(&serde_json::json!("群聊")));
    assert_eq!(setting.get("signal"), Some(&serde_json::json!(3)));
    assert_eq!(setting.get("battery"), Some(&serde_json::json!(80)));
}

#[test]
fn test_on_app_ready_runs_after_registration() {
    let mut h = Harness::new();
    let ran = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&ran);
    h.service.on_app_ready(move |_| *counter.borrow_mut() += 1);
    assert_eq!(*ran.borrow(), 0);

    h.register(sample_app());
    assert_eq!(*ran.borrow(), 1);

    let counter = Rc::clone(&ran);
    h.service.on_app_ready(move |_| *counter.borrow_mut() += 1);
    assert_eq!(*ran.borrow(), 2);
}

// =============================================================================
// Guards
// =============================================================================

#[test]
fn test_recovery_is_idempotent() {
    let (mut h, slot) = with_slot(seeded_store(true));
    mount(&slot);

    assert!(h.service.perform_recovery(RecoverySource::AutoRestore, false));
    h.advance(6000);
    assert!(!h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert_eq!(recovered_sources(&h).len(), 1);
}

#[test]
fn test_rate_limit_between_attempts() {
    let (mut h, slot) = with_slot(seeded_store(true));

    // No application yet: the attempt counts but applies nothing.
    assert!(!h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert_eq!(h.service.recovery().attempts(), 1);

    mount(&slot);
    h.advance(2000);
    assert!(!h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert_eq!(h.service.recovery().attempts(), 1);

    h.advance(3000);
    assert!(h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert_eq!(h.service.recovery().attempts(), 2);
}

#[test]
fn test_attempt_cap_without_application() {
    let mut h = Harness::with_store(seeded_store(true), CacheConfig::default());

    for _ in 0..3 {
        assert!(!h.service.perform_recovery(RecoverySource::AutoRestore, false));
        h.advance(6000);
    }
    assert_eq!(h.service.recovery().attempts(), 3);
    assert!(!h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert_eq!(h.service.recovery().attempts(), 3);
    assert!(!h.service.recovery().has_recovered());
}

#[test]
fn test_in_flight_blocks_second_attempt() {
    let (mut h, _slot) = with_slot(seeded_store(true));
    assert!(!h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert!(h.service.recovery().is_recovering());
    assert!(!h.service.perform_recovery(RecoverySource::CrashRecovery, false));

    h.advance(1000);
    assert!(!h.service.recovery().is_recovering());
}

#[test]
fn test_force_bypasses_guards() {
    let (mut h, slot) = with_slot(seeded_store(true));
    mount(&slot);
    assert!(h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert!(h.service.perform_recovery(RecoverySource::FallbackRecovery, true));
    assert_eq!(h.service.recovery().attempts(), 2);
}

#[test]
fn test_no_data_rejects_without_counting() {
    let (mut h, slot) = with_slot(MemoryStore::new());
    mount(&slot);
    assert!(!h.service.perform_recovery(RecoverySource::AutoRestore, false));
    assert_eq!(h.service.recovery().attempts(), 0);
}

// =============================================================================
// Fallbacks
// =============================================================================

#[test]
fn test_fallback_recovers_late_application() {
    let (mut h, slot) = with_slot(seeded_store(true));
    h.service.on_load();

    h.advance(3000);
    let app = mount(&slot);
    h.advance(2000);

    assert_eq!(app.borrow().dialogs, sample_dialogs());
    assert_eq!(recovered_sources(&h), vec![RecoverySource::FallbackRecovery]);
    assert!(h.toasts().contains(&"已通过保险机制恢复缓存数据".to_string()));
}

#[test]
fn test_final_fallback_when_application_is_very_late() {
    let (mut h, slot) = with_slot(seeded_store(true));
    h.service.on_load();

    h.advance(5000);
    assert!(recovered_sources(&h).is_empty());
    h.advance(1000);
    let app = mount(&slot);
    h.advance(2000);

    assert_eq!(app.borrow().users, sample_users());
    assert_eq!(
        recovered_sources(&h),
        vec![RecoverySource::FinalFallbackRecovery]
    );
    assert!(h
        .toasts()
        .contains(&"已通过最终保险机制恢复缓存数据".to_string()));
}

#[test]
fn test_fallback_skipped_after_recovery() {
    let mut h = Harness::with_store(seeded_store(true), CacheConfig::default());
    h.service.on_load();
    h.register(MemoryApp::new());
    h.clear_events();

    h.advance(10_000);
    assert!(recovered_sources(&h).is_empty());
}

#[test]
fn test_wait_timeout_abandons_startup_recovery() {
    let mut h = Harness::with_store(seeded_store(true), CacheConfig::default());
    h.advance(10_000);

    // Registering afterwards no longer triggers the startup recovery.
    h.register(MemoryApp::new());
    assert!(recovered_sources(&h).is_empty());
    assert!(h.service.manual_load());
    assert_eq!(recovered_sources(&h), vec![RecoverySource::AutoRestore]);
}
