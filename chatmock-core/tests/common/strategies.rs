// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for the persisted domains.

use chatmock_core::{Dialog, DialogKind, EntityId, Settings, User};
use proptest::prelude::*;
use serde_json::{Map, Value};

// ============================================================
// Scalar Strategies
// ============================================================

/// Pass-through field names. The `x_` prefix keeps them clear of the
/// fields the cache interprets.
pub fn extra_key_strategy() -> impl Strategy<Value = String> {
    "x_[a-z]{1,8}"
}

/// JSON values that survive a text round trip exactly.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        ".{0,20}".prop_map(Value::String),
        Just(Value::Null),
    ]
}

pub fn extra_map_strategy() -> impl Strategy<Value = Map<String, Value>> {
    proptest::collection::btree_map(extra_key_strategy(), json_value_strategy(), 0..4)
        .prop_map(|m| m.into_iter().collect())
}

pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop_oneof![
        (0i64..10_000).prop_map(EntityId::Number),
        "[a-z][a-z0-9]{0,7}".prop_map(EntityId::Text),
    ]
}

pub fn dialog_kind_strategy() -> impl Strategy<Value = DialogKind> {
    prop_oneof![
        Just(DialogKind::Text),
        Just(DialogKind::Image),
        Just(DialogKind::Notice),
        Just(DialogKind::RedPacket),
        Just(DialogKind::Transfer),
        "(voice|time|video)".prop_map(DialogKind::Other),
    ]
}

// ============================================================
// Domain Strategies
// ============================================================

pub fn settings_strategy() -> impl Strategy<Value = Settings> {
    proptest::collection::btree_map("[a-zA-Z_]{1,12}", json_value_strategy(), 0..6)
        .prop_map(|m| Settings::from(m.into_iter().collect::<Map<String, Value>>()))
}

pub fn user_strategy() -> impl Strategy<Value = User> {
    (
        entity_id_strategy(),
        ".{0,16}",
        any::<bool>(),
        proptest::option::of("data:image/png;base64,[A-Za-z0-9]{0,16}"),
        extra_map_strategy(),
    )
        .prop_map(|(id, name, is_me, avatar, extra)| {
            let mut user = User::new(id, name, is_me);
            user.avatar = avatar;
            user.extra = extra;
            user
        })
}

pub fn dialog_strategy() -> impl Strategy<Value = Dialog> {
    (
        "dialog-[0-9]{1,13}",
        dialog_kind_strategy(),
        any::<bool>(),
        proptest::option::of(entity_id_strategy()),
        proptest::option::of(".{0,40}"),
        any::<bool>(),
        extra_map_strategy(),
    )
        .prop_map(|(id, kind, is_me, user_id, content, is_blocked, extra)| {
            let mut dialog = Dialog::text(id, is_me, "");
            dialog.kind = kind;
            dialog.user_id = user_id;
            dialog.content = content;
            dialog.is_blocked = is_blocked;
            dialog.extra = extra;
            dialog
        })
}
