//! Error types for action operations

use formkit::FormError;
use thiserror::Error;

/// Result type for action operations
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Errors that can occur while driving an action's lifecycle
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action's form is only available after `initialize()` succeeds
    #[error("action is not yet initialized")]
    NotInitialized,

    /// A forced validation finished without producing an overall status.
    /// This indicates a bug in the form engine, not bad input.
    #[error("form validation finished without an overall status")]
    MissingValidationStatus,

    /// A form configuration error surfaced during the lifecycle
    #[error(transparent)]
    Form(#[from] FormError),

    /// Generic action failure
    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    /// Create a generic failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
