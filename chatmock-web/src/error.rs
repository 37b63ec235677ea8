// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Browser-facing error types.

use chatmock_core::CacheError;
use wasm_bindgen::JsValue;

/// Errors surfaced to JavaScript callers.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("No window object")]
    NoWindow,

    #[error("localStorage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("JavaScript error: {0}")]
    Js(String),
}

impl From<CacheError> for WebError {
    fn from(err: CacheError) -> Self {
        WebError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for WebError {
    fn from(err: serde_json::Error) -> Self {
        WebError::Serialization(err.to_string())
    }
}

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Best-effort description of a thrown JavaScript value.
pub(crate) fn describe(value: &JsValue) -> String {
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
