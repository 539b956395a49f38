//! Error types for the form engine
//!
//! `FormError` covers configuration mistakes made by the embedding
//! application: duplicate registrations, invalid ids, kind mismatches and the
//! like. These fail eagerly and synchronously. Failed business-rule
//! validation is *not* an error — it is a [`ValidationStatus`] value.
//!
//! [`ValidationStatus`]: crate::ValidationStatus

use thiserror::Error;

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors that can occur when building or operating a form
#[derive(Debug, Error)]
pub enum FormError {
    /// An entry id was empty or contained a path separator
    #[error("invalid entry id: {id:?} (ids must be non-empty and must not contain '.')")]
    InvalidId { id: String },

    /// An entry is already registered at the path
    #[error("an entry already exists at path \"{path}\"")]
    DuplicatePath { path: String },

    /// The parent entry has not been attached to the form yet
    #[error("parent at path \"{path}\" is not attached to the form")]
    ParentNotAttached { path: String },

    /// Parameters are leaves and cannot contain child entries
    #[error("cannot attach \"{id}\" under parameter \"{parent}\": parameters cannot contain entries")]
    ParameterNesting { parent: String, id: String },

    /// No entry is registered at the path
    #[error("no entry registered at path \"{path}\"")]
    EntryNotFound { path: String },

    /// The entry at the path is not of the requested kind
    #[error("entry \"{path}\" is a {actual}, not a {expected}")]
    EntryKindMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// `initialize()` may only be called once per form
    #[error("form is already initialized")]
    AlreadyInitialized,

    /// A stored value could not be read or written as the requested type
    #[error("value at \"{path}\" has an unexpected type: {source}")]
    ValueType {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
