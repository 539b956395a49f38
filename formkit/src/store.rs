//! Path-addressed value store
//!
//! A single nested JSON object holds every value for a root form and all of
//! its descendants, addressed by the same dot-separated paths as the entry
//! registry. The store itself is deliberately dumb: it walks paths and
//! creates intermediate objects on write. Whether a write is *allowed* at a
//! given path is the owning form's concern, because that requires the
//! registry.

use serde_json::Value;

use crate::path::EntryPath;

/// The value tree of a form: parameter names and values, or subform names
/// and nested value objects.
pub type FormValues = serde_json::Map<String, Value>;

/// Single source of truth for all of a root form's values.
#[derive(Debug, Clone, Default)]
pub(crate) struct ValueStore {
    root: FormValues,
}

impl ValueStore {
    pub fn new(values: FormValues) -> Self {
        Self { root: values }
    }

    /// The entire value tree.
    pub fn root(&self) -> &FormValues {
        &self.root
    }

    /// Read the value at a path. The root path returns the whole store as an
    /// object; a missing intermediate segment yields `None`.
    pub fn value_at(&self, path: &EntryPath) -> Option<Value> {
        if path.is_root() {
            return Some(Value::Object(self.root.clone()));
        }
        let mut current = &self.root;
        let mut segments = path.segments().peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return current.get(segment).cloned();
            }
            current = current.get(segment)?.as_object()?;
        }
        None
    }

    /// Read the object subtree at a path, for form-kind entries. Missing or
    /// non-object values yield an empty object.
    pub fn subtree_at(&self, path: &EntryPath) -> FormValues {
        match self.value_at(path) {
            Some(Value::Object(map)) => map,
            _ => FormValues::new(),
        }
    }

    /// Write the value at a path, creating intermediate objects as needed.
    /// Writing at the root path replaces the whole tree (the value must be an
    /// object).
    pub fn set(&mut self, path: &EntryPath, value: Value) {
        if path.is_root() {
            if let Value::Object(map) = value {
                self.root = map;
            } else {
                tracing::error!("refusing to replace the value store root with a non-object");
            }
            return;
        }
        let mut current = &mut self.root;
        let mut segments = path.segments().peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), value);
                return;
            }
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(FormValues::new()));
            if !slot.is_object() {
                // A leaf is in the way of a deeper path; replace it.
                *slot = Value::Object(FormValues::new());
            }
            match slot {
                Value::Object(next) => current = next,
                _ => return,
            }
        }
    }
}

/// Read the value at a path inside a detached value tree (e.g. a snapshot's
/// copied values). Same resolution rules as [`ValueStore::value_at`].
pub(crate) fn value_in(values: &FormValues, path: &EntryPath) -> Option<Value> {
    if path.is_root() {
        return Some(Value::Object(values.clone()));
    }
    let mut current = values;
    let mut segments = path.segments().peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            return current.get(segment).cloned();
        }
        current = current.get(segment)?.as_object()?;
    }
    None
}

/// The object subtree of `values` at `path`; empty when missing or not an
/// object.
pub(crate) fn subtree_of(values: &FormValues, path: &EntryPath) -> FormValues {
    match value_in(values, path) {
        Some(Value::Object(map)) => map,
        _ => FormValues::new(),
    }
}
