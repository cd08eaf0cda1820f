//! Field-level change tracking.
//!
//! A [`ChangeTracker`] holds a flat map of fields. Each field is either a JSON
//! value or a nested tracker fixed at construction. Local writes mark fields
//! dirty; [`ChangeTracker::capture_changes`] emits a minimal patch and clears
//! the dirty state, nested trackers included.
//!
//! A dirty field remembers the value it had at the last sync. Writing that
//! value back clears the field again, so a capture only reports fields whose
//! final value differs from the synced one.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::{InteractiveError, Result};

/// Key of the value inside a metadata entry.
pub const VALUE_KEY: &str = "value";
/// Key of the etag inside a metadata entry.
pub const ETAG_KEY: &str = "etag";

/// How field values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerKind {
    /// Fields hold their values directly.
    #[default]
    Plain,
    /// Fields hold `{"value": .., "etag": ..}` entries. Local writes replace
    /// `value` and keep whatever etag the entry already carried.
    Metadata,
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Value(Value),
    Nested(ChangeTracker),
}

/// Diff-capturing field container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeTracker {
    kind: TrackerKind,
    data: BTreeMap<String, Slot>,
    intrinsic: BTreeSet<String>,
    // Dirty field -> stored value at the last sync (`None` when absent).
    dirty: BTreeMap<String, Option<Value>>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker whose fields are etag-stamped metadata entries.
    pub fn metadata() -> Self {
        Self {
            kind: TrackerKind::Metadata,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> TrackerKind {
        self.kind
    }

    /// Declare an intrinsic field, emitted by every capture. `Value::Null`
    /// declares the field without a value; it is emitted once one arrives.
    pub fn with_intrinsic(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !value.is_null() {
            self.data.insert(key.clone(), Slot::Value(value));
        }
        self.intrinsic.insert(key);
        self
    }

    /// Attach a nested tracker under `key`.
    pub fn with_nested(mut self, key: impl Into<String>, child: ChangeTracker) -> Self {
        self.data.insert(key.into(), Slot::Nested(child));
        self
    }

    pub fn is_intrinsic(&self, key: &str) -> bool {
        self.intrinsic.contains(key)
    }

    pub fn is_dirty(&self, key: &str) -> bool {
        self.dirty.contains_key(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Current value of a field. For metadata trackers this is the entry's
    /// `value`, not the whole entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.data.get(key)? {
            Slot::Value(v) => match self.kind {
                TrackerKind::Plain => Some(v),
                TrackerKind::Metadata => v.get(VALUE_KEY),
            },
            Slot::Nested(_) => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Raw stored entry (the `{value, etag}` pair for metadata trackers).
    pub fn entry(&self, key: &str) -> Option<&Value> {
        match self.data.get(key)? {
            Slot::Value(v) => Some(v),
            Slot::Nested(_) => None,
        }
    }

    /// Etag of a metadata entry.
    pub fn etag(&self, key: &str) -> Option<&str> {
        self.entry(key)?.get(ETAG_KEY)?.as_str()
    }

    pub fn nested(&self, key: &str) -> Option<&ChangeTracker> {
        match self.data.get(key)? {
            Slot::Nested(child) => Some(child),
            Slot::Value(_) => None,
        }
    }

    pub fn nested_mut(&mut self, key: &str) -> Option<&mut ChangeTracker> {
        match self.data.get_mut(key)? {
            Slot::Nested(child) => Some(child),
            Slot::Value(_) => None,
        }
    }

    /// Names of the fields currently holding a value or a nested tracker.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Set one field. Returns whether anything changed.
    ///
    /// - Writing the current value is a no-op.
    /// - Writing `null` removes the field and records a tombstone.
    /// - Writing into a nested tracker assigns the object field by field.
    /// - Intrinsic fields only accept their current value.
    pub fn set(&mut self, key: &str, value: Value) -> Result<bool> {
        if let Some(Slot::Nested(child)) = self.data.get_mut(key) {
            return match value {
                Value::Object(fields) => child.assign_map(fields),
                other => Err(InteractiveError::InvalidField {
                    field: key.to_string(),
                    reason: format!("nested tracker expects an object, got {other}"),
                }),
            };
        }

        let current = self.get(key);
        if current == Some(&value) || (current.is_none() && value.is_null()) {
            return Ok(false);
        }

        if self.intrinsic.contains(key) {
            return Err(InteractiveError::InvalidField {
                field: key.to_string(),
                reason: "intrinsic fields are immutable".into(),
            });
        }

        let previous = self.entry(key).cloned();
        let stored = if value.is_null() {
            self.data.remove(key);
            None
        } else {
            let stored = match self.kind {
                TrackerKind::Plain => value,
                TrackerKind::Metadata => {
                    let mut entry = Map::new();
                    if let Some(etag) = self.entry(key).and_then(|e| e.get(ETAG_KEY)) {
                        entry.insert(ETAG_KEY.to_string(), etag.clone());
                    }
                    entry.insert(VALUE_KEY.to_string(), value);
                    Value::Object(entry)
                }
            };
            self.data.insert(key.to_string(), Slot::Value(stored.clone()));
            Some(stored)
        };

        match self.dirty.get(key).map(|baseline| *baseline == stored) {
            None => {
                self.dirty.insert(key.to_string(), previous);
            }
            Some(true) => {
                self.dirty.remove(key);
            }
            Some(false) => {}
        }
        Ok(true)
    }

    /// Set every field of a JSON object. Not all-or-nothing: fields before a
    /// failing one stay applied.
    pub fn assign(&mut self, fields: Value) -> Result<bool> {
        match fields {
            Value::Object(map) => self.assign_map(map),
            other => Err(InteractiveError::InvalidField {
                field: "<root>".into(),
                reason: format!("assign expects an object, got {other}"),
            }),
        }
    }

    pub fn assign_map(&mut self, fields: Map<String, Value>) -> Result<bool> {
        let mut changed = false;
        for (key, value) in fields {
            changed |= self.set(&key, value)?;
        }
        Ok(changed)
    }

    /// Merge remote state without marking anything dirty. Fields with a
    /// pending local edit are skipped.
    pub fn apply_update(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if self.dirty.contains_key(key) {
                tracing::trace!(field = %key, "remote update skipped, local edit pending");
                continue;
            }

            if let Some(Slot::Nested(child)) = self.data.get_mut(key) {
                match value {
                    Value::Object(fields) => child.apply_update(fields),
                    other => {
                        tracing::warn!(field = %key, value = %other, "non-object update for nested tracker ignored");
                    }
                }
                continue;
            }

            if value.is_null() {
                self.data.remove(key);
                continue;
            }

            let stored = match self.kind {
                TrackerKind::Metadata if value.get(VALUE_KEY).is_none() => {
                    let mut entry = Map::new();
                    entry.insert(VALUE_KEY.to_string(), value.clone());
                    Value::Object(entry)
                }
                _ => value.clone(),
            };
            self.data.insert(key.clone(), Slot::Value(stored));
        }
    }

    /// True when this tracker or any nested tracker holds unsaved edits.
    pub fn has_changed(&self) -> bool {
        !self.dirty.is_empty()
            || self.data.values().any(|slot| match slot {
                Slot::Nested(child) => child.has_changed(),
                Slot::Value(_) => false,
            })
    }

    /// Emit the pending patch and clear all dirty state.
    ///
    /// The patch holds every intrinsic field, every dirty field (`null` for
    /// removed ones) and, for each changed nested tracker, its own patch.
    pub fn capture_changes(&mut self) -> Map<String, Value> {
        let mut out = Map::new();

        for key in &self.intrinsic {
            if let Some(Slot::Value(v)) = self.data.get(key) {
                out.insert(key.clone(), v.clone());
            }
        }

        for key in std::mem::take(&mut self.dirty).into_keys() {
            let value = match self.data.get(&key) {
                Some(Slot::Value(v)) => v.clone(),
                Some(Slot::Nested(_)) => continue,
                None => Value::Null,
            };
            out.insert(key, value);
        }

        for (key, slot) in &mut self.data {
            if let Slot::Nested(child) = slot {
                if child.has_changed() {
                    out.insert(key.clone(), Value::Object(child.capture_changes()));
                }
            }
        }

        out
    }

    /// Adopt the current state as the synced baseline without a patch.
    pub fn mark_synced(&mut self) {
        self.dirty.clear();
        for slot in self.data.values_mut() {
            if let Slot::Nested(child) = slot {
                child.mark_synced();
            }
        }
    }

    /// Full state as JSON, nested trackers expanded.
    pub fn snapshot(&self) -> Value {
        let map = self
            .data
            .iter()
            .map(|(k, slot)| {
                let v = match slot {
                    Slot::Value(v) => v.clone(),
                    Slot::Nested(child) => child.snapshot(),
                };
                (k.clone(), v)
            })
            .collect();
        Value::Object(map)
    }
}
