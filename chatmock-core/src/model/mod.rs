// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persisted data model.
//!
//! The chat application owns three data domains: a free-form settings
//! object, the user list and the dialog (message) list. Field names follow
//! the persisted snake_case layout; the camelCase spellings are accepted on
//! input.

mod dialog;
mod settings;
mod user;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use dialog::{Dialog, DialogKind, BLOCKED_NOTICE};
pub use settings::Settings;
pub use user::User;

/// One of the three persisted data domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Setting,
    Users,
    Dialogs,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Setting, Domain::Users, Domain::Dialogs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Setting => "setting",
            Domain::Users => "users",
            Domain::Dialogs => "dialogs",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier that the application may store as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Number(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{n}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

/// The three data domains as read back from the store.
///
/// `None` means absent or unreadable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub setting: Option<Settings>,
    pub users: Option<Vec<User>>,
    pub dialogs: Option<Vec<Dialog>>,
}

impl PersistedState {
    /// Whether there is anything worth restoring: at least one dialog, one
    /// user or one settings field.
    pub fn has_valid_data(&self) -> bool {
        self.dialogs.as_ref().is_some_and(|d| !d.is_empty())
            || self.users.as_ref().is_some_and(|u| !u.is_empty())
            || self.setting.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// User-facing export / import file.
///
/// Every domain is optional on import and applied independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setting: Option<Settings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogs: Option<Vec<Dialog>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ExportFile {
    /// Whether the file carries none of the three domains.
    pub fn is_empty(&self) -> bool {
        self.setting.is_none() && self.users.is_none() && self.dialogs.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_valid_data() {
        let mut state = PersistedState::default();
        assert!(!state.has_valid_data());

        state.setting = Some(Settings::default());
        state.users = Some(Vec::new());
        assert!(!state.has_valid_data());

        state.dialogs = Some(vec![Dialog::text("dialog-1", true, "hi")]);
        assert!(state.has_valid_data());
    }

    #[test]
    fn test_entity_id_accepts_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"[1, "u-2"]"#).unwrap();
        assert_eq!(ids, vec![EntityId::Number(1), EntityId::from("u-2")]);
        assert_eq!(ids[0].to_string(), "1");
    }

    #[test]
    fn test_export_file_partial() {
        let file: ExportFile =
            serde_json::from_str(r#"{"dialogs": [], "exportTime": "x"}"#).unwrap();
        assert!(file.setting.is_none());
        assert_eq!(file.dialogs, Some(Vec::new()));
        assert_eq!(file.export_time.as_deref(), Some("x"));
        assert!(!file.is_empty());
    }
}
