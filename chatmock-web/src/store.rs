// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! `window.localStorage` as a [`KvStore`].

use chatmock_core::{KvStore, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::error::{describe, WebError};

const QUOTA_ERROR: &str = "QuotaExceededError";

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// Binds to the window's local storage. Fails in private modes that
    /// disable it.
    pub fn new(window: &web_sys::Window) -> Result<Self, WebError> {
        let storage = window
            .local_storage()
            .map_err(|e| WebError::StorageUnavailable(describe(&e)))?
            .ok_or_else(|| WebError::StorageUnavailable("not provided".to_string()))?;
        Ok(Self { storage })
    }
}

fn unavailable(err: JsValue) -> StoreError {
    StoreError::Unavailable(describe(&err))
}

fn is_quota_error(err: &JsValue) -> bool {
    js_sys::Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
        .is_some_and(|name| name == QUOTA_ERROR)
}

impl KvStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(unavailable)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|e| {
            if is_quota_error(&e) {
                StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed: key.len() + value.len(),
                }
            } else {
                unavailable(e)
            }
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(unavailable)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let len = self.storage.length().map_err(unavailable)?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = self.storage.key(i).map_err(unavailable)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
