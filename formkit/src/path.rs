//! Dot-separated entry paths
//!
//! Every entry in a form is addressed by a path of dot-separated identifiers
//! relative to its root form (`drivers.advanced.maxDrivers`). The empty path
//! addresses the root form itself. A path is assigned exactly once, when an
//! entry is attached to a form, and never changes afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FormError, Result};

/// A path addressing one entry relative to its root form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryPath(String);

impl EntryPath {
    /// The root path (empty string), addressing the root form.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse a path, validating every segment.
    pub fn parse(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Ok(Self::root());
        }
        for segment in path.split('.') {
            validate_id(segment)?;
        }
        Ok(Self(path))
    }

    /// Build the path of a child entry with the given id.
    pub fn join(&self, id: &str) -> Result<Self> {
        validate_id(id)?;
        if self.is_root() {
            Ok(Self(id.to_string()))
        } else {
            Ok(Self(format!("{}.{}", self.0, id)))
        }
    }

    /// Append another (possibly multi-segment) path underneath this one.
    pub fn concat(&self, other: &EntryPath) -> Self {
        if self.is_root() {
            other.clone()
        } else if other.is_root() {
            self.clone()
        } else {
            Self(format!("{}.{}", self.0, other.0))
        }
    }

    /// The parent path, or `None` for the root path.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rsplit_once('.') {
            Some((parent, _)) => Some(Self(parent.to_string())),
            None => Some(Self::root()),
        }
    }

    /// The final segment (the entry's own id), or `""` for the root path.
    pub fn id(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((_, id)) => id,
            None => &self.0,
        }
    }

    /// Iterate over the path's segments. Empty for the root path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// True for the empty (root) path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `other` is this path or lies underneath it.
    pub fn contains(&self, other: &EntryPath) -> bool {
        if self.is_root() {
            return true;
        }
        other.0 == self.0 || other.0.starts_with(&format!("{}.", self.0))
    }

    /// The raw string form of the path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for EntryPath {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Validate a single path segment: non-empty, no `.` separator characters.
pub(crate) fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains('.') {
        return Err(FormError::InvalidId { id: id.to_string() });
    }
    Ok(())
}
