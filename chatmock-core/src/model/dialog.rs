// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::EntityId;

/// Notice inserted after a message the recipient refused.
pub const BLOCKED_NOTICE: &str = "消息已发出，但被对方拒绝了。";

/// Message kind, persisted as the `type` string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DialogKind {
    #[default]
    Text,
    Image,
    Notice,
    RedPacket,
    Transfer,
    /// A kind this layer does not interpret (voice, time divider, ...).
    Other(String),
}

impl DialogKind {
    pub fn as_str(&self) -> &str {
        match self {
            DialogKind::Text => "text",
            DialogKind::Image => "image",
            DialogKind::Notice => "notice",
            DialogKind::RedPacket => "redpacket",
            DialogKind::Transfer => "transfer",
            DialogKind::Other(kind) => kind,
        }
    }
}

impl From<String> for DialogKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "text" => DialogKind::Text,
            "image" => DialogKind::Image,
            "notice" => DialogKind::Notice,
            "redpacket" => DialogKind::RedPacket,
            "transfer" => DialogKind::Transfer,
            _ => DialogKind::Other(kind),
        }
    }
}

impl From<DialogKind> for String {
    fn from(kind: DialogKind) -> Self {
        match kind {
            DialogKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the conversation.
///
/// `edit_content` and `is_editing` are transient editor state. They may be
/// persisted incidentally but nothing depends on reading them back.
///
/// Decoding never rejects an object. A known field holding an unexpected
/// JSON type is kept verbatim in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Dialog {
    pub id: String,
    pub kind: DialogKind,
    pub is_me: bool,
    pub user_id: Option<EntityId>,
    pub content: Option<String>,
    /// Inline image data (usually a data URL).
    pub image: Option<String>,
    pub is_blocked: bool,
    pub edit_content: Option<String>,
    pub is_editing: bool,
    /// Kind-specific fields (amounts, remarks, ...) passed through untouched.
    pub extra: Map<String, Value>,
}

/// Removes the first present key of `keys`.
fn take(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<(String, Value)> {
    keys.iter().find_map(|key| fields.remove_entry(*key))
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn take_flag(fields: &mut Map<String, Value>, keys: &[&str]) -> bool {
    let Some((key, value)) = take(fields, keys) else {
        return false;
    };
    match as_flag(&value) {
        Some(flag) => flag,
        None => {
            fields.insert(key, value);
            false
        }
    }
}

fn take_text(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    match take(fields, keys)? {
        (_, Value::String(text)) => Some(text),
        (_, Value::Null) => None,
        (key, other) => {
            fields.insert(key, other);
            None
        }
    }
}

fn take_entity(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<EntityId> {
    match take(fields, keys)? {
        (_, Value::String(text)) => Some(EntityId::Text(text)),
        (_, Value::Null) => None,
        (key, Value::Number(n)) => match n.as_i64() {
            Some(n) => Some(EntityId::Number(n)),
            None => {
                fields.insert(key, Value::Number(n));
                None
            }
        },
        (key, other) => {
            fields.insert(key, other);
            None
        }
    }
}

impl From<Map<String, Value>> for Dialog {
    fn from(mut fields: Map<String, Value>) -> Self {
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Null) | None => String::new(),
            Some(other) => {
                let id = match &other {
                    Value::Number(n) => n.to_string(),
                    _ => String::new(),
                };
                fields.insert("id".to_string(), other);
                id
            }
        };
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => DialogKind::from(kind),
            Some(Value::Null) | None => DialogKind::default(),
            Some(other) => {
                fields.insert("type".to_string(), other);
                DialogKind::default()
            }
        };
        let is_me = take_flag(&mut fields, &["is_me", "isSelf"]);
        let user_id = take_entity(&mut fields, &["user_id", "userId"]);
        let content = take_text(&mut fields, &["content"]);
        let image = take_text(&mut fields, &["image"]);
        let is_blocked = take_flag(&mut fields, &["is_blocked"]);
        let edit_content = take_text(&mut fields, &["editContent"]);
        let is_editing = take_flag(&mut fields, &["isEditing"]);

        Self {
            id,
            kind,
            is_me,
            user_id,
            content,
            image,
            is_blocked,
            edit_content,
            is_editing,
            extra: fields,
        }
    }
}

impl From<Dialog> for Map<String, Value> {
    fn from(dialog: Dialog) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(dialog.id));
        fields.insert("type".to_string(), Value::String(dialog.kind.into()));
        fields.insert("is_me".to_string(), Value::Bool(dialog.is_me));
        if let Some(user_id) = dialog.user_id {
            let user_id = match user_id {
                EntityId::Number(n) => Value::from(n),
                EntityId::Text(text) => Value::String(text),
            };
            fields.insert("user_id".to_string(), user_id);
        }
        if let Some(content) = dialog.content {
            fields.insert("content".to_string(), Value::String(content));
        }
        if let Some(image) = dialog.image {
            fields.insert("image".to_string(), Value::String(image));
        }
        if dialog.is_blocked {
            fields.insert("is_blocked".to_string(), Value::Bool(true));
        }
        if let Some(edit_content) = dialog.edit_content {
            fields.insert("editContent".to_string(), Value::String(edit_content));
        }
        if dialog.is_editing {
            fields.insert("isEditing".to_string(), Value::Bool(true));
        }
        // Verbatim values of mistyped known fields win over the defaults.
        fields.extend(dialog.extra);
        fields
    }
}

impl Dialog {
    fn bare(id: impl Into<String>, kind: DialogKind) -> Self {
        Self {
            id: id.into(),
            kind,
            is_me: false,
            user_id: None,
            content: None,
            image: None,
            is_blocked: false,
            edit_content: None,
            is_editing: false,
            extra: Map::new(),
        }
    }

    /// Time-derived dialog id.
    pub fn time_id(now_ms: u64) -> String {
        format!("dialog-{now_ms}")
    }

    pub fn text(id: impl Into<String>, is_me: bool, content: impl Into<String>) -> Self {
        let mut dialog = Self::bare(id, DialogKind::Text);
        dialog.is_me = is_me;
        dialog.content = Some(content.into());
        dialog
    }

    pub fn image(
        id: impl Into<String>,
        is_me: bool,
        user_id: EntityId,
        image: impl Into<String>,
    ) -> Self {
        let mut dialog = Self::bare(id, DialogKind::Image);
        dialog.is_me = is_me;
        dialog.user_id = Some(user_id);
        dialog.image = Some(image.into());
        dialog
    }

    /// System notice rendered centered in the conversation.
    pub fn notice(id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut dialog = Self::bare(id, DialogKind::Notice);
        dialog.content = Some(content.into());
        dialog.extra.insert("is_system".to_string(), Value::from(1));
        dialog
    }

    pub fn with_user(mut self, user_id: impl Into<EntityId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Whether the dialog was generated by the system rather than a user.
    pub fn is_system(&self) -> bool {
        match self.extra.get("is_system") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }
}
