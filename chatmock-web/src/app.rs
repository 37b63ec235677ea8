// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The editor's view-model seen through [`ChatApp`].
//!
//! Fields cross the boundary as JSON so the core only ever deals with its
//! own model types.

use chatmock_core::codec;
use chatmock_core::{ChatApp, Dialog, Settings, User};
use js_sys::{Array, Function, Reflect, JSON};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};

use crate::error::describe;

pub struct JsApp {
    vm: JsValue,
}

impl JsApp {
    pub fn new(vm: JsValue) -> Self {
        Self { vm }
    }

    fn field(&self, name: &str) -> Option<JsValue> {
        Reflect::get(&self.vm, &JsValue::from_str(name))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.field(name)?;
        let text = JSON::stringify(&value).ok()?.as_string()?;
        match serde_json::from_str(&text) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(field = name, error = %e, "application field not decodable");
                None
            }
        }
    }

    /// Like [`read`](Self::read), but one malformed element only drops
    /// itself.
    fn read_list<T: DeserializeOwned>(&self, name: &str) -> Option<Vec<T>> {
        let value = self.field(name)?;
        let text = JSON::stringify(&value).ok()?.as_string()?;
        codec::decode_list(name, &text)
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                warn!(field = name, error = %e, "value not encodable");
                return;
            }
        };
        let result = JSON::parse(&text)
            .and_then(|js| Reflect::set(&self.vm, &JsValue::from_str(name), &js));
        if let Err(e) = result {
            warn!(field = name, error = %describe(&e), "application field not writable");
        }
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Option<JsValue> {
        let Some(function) = self.field(method).and_then(|f| f.dyn_into::<Function>().ok())
        else {
            warn!(method, "application method missing");
            return None;
        };
        let args: Array = args.iter().collect();
        match function.apply(&self.vm, &args) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(method, error = %describe(&e), "application method threw");
                None
            }
        }
    }

    fn call_with_index(&self, method: &str, index: usize) {
        self.call(method, &[JsValue::from_f64(index as f64)]);
    }
}

impl ChatApp for JsApp {
    fn settings(&self) -> Option<Settings> {
        self.read("setting")
    }

    fn users(&self) -> Option<Vec<User>> {
        self.read_list("users")
    }

    fn dialogs(&self) -> Option<Vec<Dialog>> {
        self.read_list("dialogs")
    }

    fn set_settings(&mut self, settings: Settings) {
        self.write("setting", &settings);
    }

    fn set_users(&mut self, users: Vec<User>) {
        self.write("users", &users);
    }

    fn set_dialogs(&mut self, dialogs: Vec<Dialog>) {
        self.write("dialogs", &dialogs);
    }

    fn request_render(&mut self) {
        if self.field("$forceUpdate").is_some() {
            self.call("$forceUpdate", &[]);
        }
    }

    fn add_dialog(&mut self, dialog: Dialog) {
        let arg = serde_json::to_string(&dialog)
            .ok()
            .and_then(|text| JSON::parse(&text).ok());
        match arg {
            Some(arg) => {
                self.call("addDialog", &[arg]);
            }
            None => warn!(id = %dialog.id, "dialog not encodable"),
        }
    }

    fn delete_dialog(&mut self, index: usize) {
        self.call_with_index("deleteDialog", index);
    }

    // The editor's own handler prompts again; the service already asked.
    fn clean_dialogs(&mut self) {
        self.write::<[Dialog; 0]>("dialogs", &[]);
    }

    fn add_user(&mut self) {
        self.call("addUser", &[]);
    }

    fn delete_user(&mut self, index: usize) {
        self.call_with_index("delUser", index);
    }

    fn claim_red_packet(&mut self, index: usize) {
        self.call_with_index("redpacketGet", index);
    }

    fn claim_transfer(&mut self, index: usize) {
        self.call_with_index("transferGet", index);
    }

    fn selected_user(&self) -> Option<User> {
        let user = self.call("getSelectedUser", &[])?;
        if user.is_undefined() || user.is_null() {
            return None;
        }
        let text = JSON::stringify(&user).ok()?.as_string()?;
        serde_json::from_str(&text).ok()
    }
}
