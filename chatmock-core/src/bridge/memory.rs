// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use serde_json::Value;

use super::ChatApp;
use crate::model::{Dialog, EntityId, Settings, User};

/// In-memory chat application.
///
/// Used by native hosts without a UI and as the reference behaviour for
/// the application side of [`ChatApp`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryApp {
    pub setting: Settings,
    pub users: Vec<User>,
    pub dialogs: Vec<Dialog>,
    /// Index into `users` of the selected author.
    pub selected: Option<usize>,
    /// Number of render requests received.
    pub renders: u32,
}

impl MemoryApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    pub fn with_dialogs(mut self, dialogs: Vec<Dialog>) -> Self {
        self.dialogs = dialogs;
        self
    }

    pub fn select_user(&mut self, index: usize) {
        self.selected = (index < self.users.len()).then_some(index);
    }

    fn next_user_id(&self) -> i64 {
        self.users
            .iter()
            .filter_map(|u| match u.id {
                EntityId::Number(n) => Some(n),
                EntityId::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }

    fn mark_claimed(&mut self, index: usize) {
        if let Some(dialog) = self.dialogs.get_mut(index) {
            dialog
                .extra
                .insert("is_received".to_string(), Value::Bool(true));
        }
    }
}

impl ChatApp for MemoryApp {
    fn settings(&self) -> Option<Settings> {
        Some(self.setting.clone())
    }

    fn users(&self) -> Option<Vec<User>> {
        Some(self.users.clone())
    }

    fn dialogs(&self) -> Option<Vec<Dialog>> {
        Some(self.dialogs.clone())
    }

    fn set_settings(&mut self, settings: Settings) {
        self.setting = settings;
    }

    fn set_users(&mut self, users: Vec<User>) {
        self.users = users;
    }

    fn set_dialogs(&mut self, dialogs: Vec<Dialog>) {
        self.dialogs = dialogs;
    }

    fn request_render(&mut self) {
        self.renders += 1;
    }

    fn add_dialog(&mut self, dialog: Dialog) {
        self.dialogs.push(dialog);
    }

    fn delete_dialog(&mut self, index: usize) {
        if index < self.dialogs.len() {
            self.dialogs.remove(index);
        }
    }

    fn clean_dialogs(&mut self) {
        self.dialogs.clear();
    }

    fn add_user(&mut self) {
        let id = self.next_user_id();
        self.users
            .push(User::new(id, format!("用户{id}"), self.users.is_empty()));
    }

    fn delete_user(&mut self, index: usize) {
        if index >= self.users.len() {
            return;
        }
        let removed = self.users.remove(index);
        self.dialogs
            .retain(|d| d.user_id.as_ref() != Some(&removed.id));
        if self.selected == Some(index) {
            self.selected = None;
        }
    }

    fn claim_red_packet(&mut self, index: usize) {
        self.mark_claimed(index);
    }

    fn claim_transfer(&mut self, index: usize) {
        self.mark_claimed(index);
    }

    fn selected_user(&self) -> Option<User> {
        self.selected.and_then(|i| self.users.get(i)).cloned()
    }
}
