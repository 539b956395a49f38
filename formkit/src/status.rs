//! Validation status value types

use serde::{Deserialize, Serialize};

/// Severity of a validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Validation passed
    Ok,
    /// Validation passed with a warning worth surfacing
    Warn,
    /// Validation failed
    Error,
    /// The validation attempt was superseded before it finished
    Canceled,
}

impl ValidationLevel {
    /// Get the string representation of this level
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Ok => "ok",
            ValidationLevel::Warn => "warn",
            ValidationLevel::Error => "error",
            ValidationLevel::Canceled => "canceled",
        }
    }
}

/// The immutable result of validating a single entry or a whole form.
///
/// Validation outcomes are always values, never errors: a failed business
/// rule produces an `Error`-level status, and a superseded validation
/// attempt produces a `Canceled`-level status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatus {
    /// Severity level of this status
    pub level: ValidationLevel,
    /// Optional user-facing message
    pub message: Option<String>,
    /// True when this status was produced by a forced (non-cancelable)
    /// validation pass, e.g. final validation before submission
    pub forced: bool,
}

impl ValidationStatus {
    /// Create a status with the given level and message.
    pub fn new(level: ValidationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: Some(message.into()),
            forced: false,
        }
    }

    /// A passing status with no message.
    pub fn ok() -> Self {
        Self {
            level: ValidationLevel::Ok,
            message: None,
            forced: false,
        }
    }

    /// A warning status.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(ValidationLevel::Warn, message)
    }

    /// A failing status.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ValidationLevel::Error, message)
    }

    /// A canceled status.
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ValidationLevel::Canceled, message)
    }

    /// Mark this status as produced by a forced validation pass.
    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    /// True if the level is `Ok`.
    pub fn is_ok(&self) -> bool {
        self.level == ValidationLevel::Ok
    }

    /// True if the level is `Error`.
    pub fn is_error(&self) -> bool {
        self.level == ValidationLevel::Error
    }
}
