//! Identity-bearing tracked resources.
//!
//! A [`Resource`] is a [`ChangeTracker`] with a fixed identity field, an
//! intrinsic `etag`, a nested `meta` metadata tracker, and listeners that fire
//! when the server pushes an update or deletes the resource. Scenes,
//! controls, groups and participants are all resources with different field
//! names.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::protocol::Method;

use super::tracker::ChangeTracker;

/// Field carrying the resource-level etag.
pub const ETAG_FIELD: &str = "etag";
/// Field carrying the metadata tracker.
pub const META_FIELD: &str = "meta";

static NULL: Value = Value::Null;

type Listener = Box<dyn FnMut(&Method) + Send>;

/// Tracked resource with update/delete notifications.
pub struct Resource {
    id_field: String,
    fields: ChangeTracker,
    on_update: Vec<Listener>,
    on_delete: Vec<Listener>,
}

impl Resource {
    /// New resource identified by `id` under `id_field` (e.g. `sceneID`).
    pub fn new(id_field: impl Into<String>, id: impl Into<Value>) -> Self {
        let id_field = id_field.into();
        let fields = ChangeTracker::new()
            .with_intrinsic(id_field.clone(), id.into())
            .with_intrinsic(ETAG_FIELD, Value::Null)
            .with_nested(META_FIELD, ChangeTracker::metadata());
        Self {
            id_field,
            fields,
            on_update: Vec::new(),
            on_delete: Vec::new(),
        }
    }

    /// Resource whose fields are pre-populated as already synced.
    pub fn from_remote(id_field: impl Into<String>, id: impl Into<Value>, state: &Map<String, Value>) -> Self {
        let mut resource = Self::new(id_field, id);
        resource.fields.apply_update(state);
        resource
    }

    pub fn id(&self) -> &Value {
        self.fields.get(&self.id_field).unwrap_or(&NULL)
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn etag(&self) -> Option<&str> {
        self.fields.get_str(ETAG_FIELD)
    }

    pub fn fields(&self) -> &ChangeTracker {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut ChangeTracker {
        &mut self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<bool> {
        self.fields.set(key, value)
    }

    pub fn assign(&mut self, fields: Value) -> Result<bool> {
        self.fields.assign(fields)
    }

    /// Metadata tracker.
    pub fn meta(&self) -> Option<&ChangeTracker> {
        self.fields.nested(META_FIELD)
    }

    pub fn meta_mut(&mut self) -> Option<&mut ChangeTracker> {
        self.fields.nested_mut(META_FIELD)
    }

    pub fn has_changed(&self) -> bool {
        self.fields.has_changed()
    }

    pub fn capture_changes(&mut self) -> Map<String, Value> {
        self.fields.capture_changes()
    }

    pub fn mark_synced(&mut self) {
        self.fields.mark_synced();
    }

    /// Full state, e.g. for create calls.
    pub fn snapshot(&self) -> Value {
        self.fields.snapshot()
    }

    /// Register a listener for server-pushed updates.
    pub fn on_update<F>(&mut self, f: F)
    where
        F: FnMut(&Method) + Send + 'static,
    {
        self.on_update.push(Box::new(f));
    }

    /// Register a listener for server-side deletion.
    pub fn on_delete<F>(&mut self, f: F)
    where
        F: FnMut(&Method) + Send + 'static,
    {
        self.on_delete.push(Box::new(f));
    }

    /// Merge a server push and notify update listeners with the call that
    /// carried it.
    pub fn apply_changes(&mut self, change: &Map<String, Value>, origin: &Method) {
        self.fields.apply_update(change);
        for listener in &mut self.on_update {
            listener(origin);
        }
    }

    /// Notify delete listeners.
    pub fn on_deleted(&mut self, origin: &Method) {
        for listener in &mut self.on_delete {
            listener(origin);
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id_field", &self.id_field)
            .field("fields", &self.fields)
            .field("on_update", &self.on_update.len())
            .field("on_delete", &self.on_delete.len())
            .finish()
    }
}
