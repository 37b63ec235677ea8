// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Serialization Layer
//!
//! JSON encoding of persisted values. Decoding never fails past this
//! boundary: corrupt or foreign data reads as absent and is logged.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::CacheResult;

/// Encodes a value as compact JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Encodes a value as indented JSON (export files).
pub fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Decodes the value stored under `key`.
///
/// Malformed input and a literal `null` both yield `None`.
pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str::<Option<T>>(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "discarding undecodable cache entry");
            None
        }
    }
}

/// Decodes a stored list element by element. Elements that do not decode
/// are dropped and logged; the rest survive.
pub fn decode_list<T: DeserializeOwned>(key: &str, raw: &str) -> Option<Vec<T>> {
    let items: Vec<Value> = decode(key, raw)?;
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, index, error = %e, "dropping undecodable list element");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        warn!(key, kept = decoded.len(), total, "list partially decoded");
    }
    Some(decoded)
}
