// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Status Line and Notification Tests

mod common;

use chatmock_core::*;
use common::*;

// =============================================================================
// Status line
// =============================================================================

#[test]
fn test_repeated_nominal_status_reported_once() {
    let mut h = Harness::new();
    assert!(h.service.update_cache_status("缓存正常"));
    h.clock.advance_ms(300);
    assert!(!h.service.update_cache_status("缓存正常"));
    assert_eq!(h.statuses(), vec!["缓存正常".to_string()]);
}

#[test]
fn test_nominal_status_throttled_after_change() {
    let mut h = Harness::new();
    h.service.update_cache_status("保存中...");
    h.clock.advance_ms(400);
    assert!(!h.service.update_cache_status("缓存正常"));
    assert_eq!(h.service.status_text(), "保存中...");

    h.clock.advance_ms(600);
    assert!(h.service.update_cache_status("缓存正常"));
}

#[test]
fn test_outcome_status_reverts_after_five_seconds() {
    let mut h = Harness::new();
    h.service.update_cache_status("全部保存完成");
    h.advance(4999);
    assert_eq!(h.service.status_text(), "全部保存完成");
    h.advance(1);
    assert_eq!(h.service.status_text(), "缓存正常");
    assert_eq!(
        h.statuses(),
        vec!["全部保存完成".to_string(), "缓存正常".to_string()]
    );
}

#[test]
fn test_newer_status_cancels_pending_revert() {
    let mut h = Harness::new();
    h.service.update_cache_status("保存中...");
    h.advance(1500);
    h.service.update_cache_status("已保存");

    // The in-progress revert would have fired at 2000 ms.
    h.advance(1000);
    assert_eq!(h.service.status_text(), "已保存");
    h.advance(2000);
    assert_eq!(h.service.status_text(), "缓存正常");
}

#[test]
fn test_save_flow_statuses() {
    let mut h = Harness::new();
    h.register(sample_app());
    h.clear_events();

    h.service.deferred_save(Domain::Dialogs);
    assert_eq!(h.service.status_text(), "保存中...");
    h.advance(2000);
    assert_eq!(h.service.status_text(), "已保存");
    assert_eq!(
        h.count_events(|e| matches!(e, CacheEvent::Saved { key } if key == "wechat_dialogs")),
        1
    );
}

// =============================================================================
// Notifications
// =============================================================================

#[test]
fn test_notification_expires() {
    let mut h = Harness::new();
    let id = h
        .service
        .show_notification("数据导出成功", NotificationKind::Success);
    assert_eq!(h.service.notifications().len(), 1);

    h.advance(4499);
    assert_eq!(h.service.notifications().len(), 1);
    h.advance(1);
    assert!(h.service.notifications().is_empty());
    assert!(h
        .events()
        .contains(&CacheEvent::NotificationDismissed { id }));
    assert_eq!(
        h.count_events(|e| *e == CacheEvent::NotificationContainerRemoved),
        1
    );
}

#[test]
fn test_notification_cap_evicts_oldest() {
    let mut h = Harness::new();
    let ids: Vec<u64> = (0..6)
        .map(|i| {
            h.service
                .show_notification(&format!("消息{i}"), NotificationKind::Info)
        })
        .collect();

    assert_eq!(h.service.notifications().len(), 5);
    let visible: Vec<u64> = h.service.notifications().visible().map(|n| n.id).collect();
    assert_eq!(visible, ids[1..].to_vec());
    assert!(h
        .events()
        .contains(&CacheEvent::NotificationDismissed { id: ids[0] }));
    // The container stays while other toasts are visible.
    assert_eq!(
        h.count_events(|e| *e == CacheEvent::NotificationContainerRemoved),
        0
    );
}

#[test]
fn test_manual_dismiss_cancels_expiry() {
    let mut h = Harness::new();
    let id = h
        .service
        .show_notification("请先选择用户", NotificationKind::Error);
    assert!(h.service.dismiss_notification(id));
    assert!(!h.service.dismiss_notification(id));
    assert_eq!(h.service.pending_tasks(), 0);
}

#[test]
fn test_render_content_uses_configured_path() {
    let h = Harness::with_config(CacheConfig::default().with_emoji_base_path("/emoji/"));
    assert_eq!(
        h.service.render_content("[:emoji:3:]<"),
        r#"<img src="/emoji/1 (3).gif" alt="[表情3]" class="inline-emoji">&lt;"#
    );
}
