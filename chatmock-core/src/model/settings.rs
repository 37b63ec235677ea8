// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Shallow field union. Fields of `other` win.
    pub fn merge(&mut self, other: &Settings) {
        for (field, value) in &other.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_unrelated_fields() {
        let mut live = Settings::new();
        live.insert("title", "live");
        live.insert("battery", 80);

        let mut persisted = Settings::new();
        persisted.insert("title", "persisted");
        persisted.insert("signal", 3);

        live.merge(&persisted);
        assert_eq!(live.get("title"), Some(&json!("persisted")));
        assert_eq!(live.get("battery"), Some(&json!(80)));
        assert_eq!(live.get("signal"), Some(&json!(3)));
        assert_eq!(live.len(), 3);
    }
}
