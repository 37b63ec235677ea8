// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::formats::Flexible;
use serde_with::{serde_as, BoolFromInt, PickFirst};

use super::EntityId;

/// A chat participant.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    #[serde(default, alias = "displayName")]
    pub name: String,
    /// Whether this user is the phone owner (messages render on the right).
    #[serde_as(as = "PickFirst<(_, BoolFromInt<Flexible>)>")]
    #[serde(default, alias = "isSelf")]
    pub is_me: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Fields owned by the application that the cache passes through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, is_me: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_me,
            avatar: None,
            extra: Map::new(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}
