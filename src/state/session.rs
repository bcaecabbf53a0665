//! Session data
//!
//! A session is the conversation-scoped JSON object loaded by the session
//! middleware before an update is processed and written back afterwards.
//! Every mutating method marks the session dirty; an untouched session is
//! never written back.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::utils::errors::Result;

/// Session field holding the scene bookkeeping
pub const SCENES_KEY: &str = "__scenes";

/// Per-conversation session object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// `None` once the session has been cleared; the store key is then deleted
    data: Option<Map<String, Value>>,
    dirty: bool,
}

impl Session {
    /// Wrap loaded or default data; a fresh session is clean
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data: Some(data),
            dirty: false,
        }
    }

    /// Shallow-merge `loaded` over `defaults`; loaded fields win
    pub fn merge_defaults(defaults: Map<String, Value>, loaded: Map<String, Value>) -> Map<String, Value> {
        let mut merged = defaults;
        for (key, value) in loaded {
            merged.insert(key, value);
        }
        merged
    }

    /// Raw field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// Typed field value
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Store a serializable value under `key`
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.insert(key, value);
        Ok(())
    }

    /// Store a raw JSON value under `key`
    pub fn insert(&mut self, key: &str, value: Value) {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        self.dirty = true;
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.as_mut().and_then(|d| d.remove(key));
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Drop the whole session; the store entry is deleted at the end of the update
    pub fn clear(&mut self) {
        self.data = None;
        self.dirty = true;
    }

    pub fn is_cleared(&self) -> bool {
        self.data.is_none()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force a write-back even if no field changed
    pub fn touch(&mut self) {
        self.dirty = true;
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    /// Value to persist, `None` when the session was cleared
    pub fn to_value(&self) -> Option<Value> {
        self.data.as_ref().map(|d| Value::Object(d.clone()))
    }
}

/// Scene bookkeeping stored under [`SCENES_KEY`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Unix seconds after which the record is discarded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Map<String, Value>>,
}

impl SceneSessionData {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires.map_or(false, |expires| expires < now)
    }
}
