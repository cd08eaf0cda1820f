//! Change-tracking data model.
//!
//! Local edits accumulate in a [`ChangeTracker`]; a capture turns them into a
//! minimal patch for an update call. Server pushes are merged with
//! `apply_update`, which never echoes remote state back as a local change.

mod resource;
mod tracker;

pub use resource::{Resource, ETAG_FIELD, META_FIELD};
pub use tracker::{ChangeTracker, TrackerKind, ETAG_KEY, VALUE_KEY};
