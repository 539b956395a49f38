//! Entry metadata, dynamic properties and validator callbacks
//!
//! Every node in a form's structural tree (form, section or parameter) is
//! described by an [`EntryData`] record held in the root form's registry.
//! The set of entry kinds is closed, so code dispatches on the
//! [`EntryKind`] discriminator rather than probing capabilities.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::path::EntryPath;
use crate::status::ValidationStatus;
use crate::store::FormValues;

/// The kind of an entry. Closed set: forms (including subforms), sections
/// and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A root form or nested subform; carries a value subtree
    Form,
    /// A pure grouping container; carries no value
    Section,
    /// A leaf with a single value
    Parameter,
}

impl EntryKind {
    /// Get the string representation of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Form => "form",
            EntryKind::Section => "section",
            EntryKind::Parameter => "parameter",
        }
    }

    /// True for kinds that hold a value in the store (forms and parameters).
    pub fn bears_value(&self) -> bool {
        !matches!(self, EntryKind::Section)
    }
}

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub(crate) type EntrySyncValidator =
    Arc<dyn Fn(&ValidatorContext) -> ValidationStatus + Send + Sync>;
pub(crate) type EntryAsyncValidator =
    Arc<dyn Fn(ValidatorContext) -> BoxFuture<ValidationStatus> + Send + Sync>;
pub(crate) type FormSyncValidator = Arc<dyn Fn(&FormValues) -> ValidationStatus + Send + Sync>;
pub(crate) type FormAsyncValidator = Arc<dyn Fn(FormValues) -> BoxFuture<ValidationStatus> + Send + Sync>;
pub(crate) type DynamicEval = Arc<dyn Fn(&FormValues) -> Value + Send + Sync>;

/// What a parameter validator gets to look at: the parameter's current value
/// plus the resolved values of its declared dependencies.
///
/// Dependencies let a reusable parameter validate against a sibling without
/// knowing the sibling's path: a postal-code parameter can declare it needs a
/// `country` dependency, and the form wires that name to whichever parameter
/// holds the selected country.
#[derive(Debug, Clone)]
pub struct ValidatorContext {
    label: String,
    value: Value,
    dependencies: HashMap<String, Value>,
}

impl ValidatorContext {
    pub(crate) fn new(label: String, value: Value, dependencies: HashMap<String, Value>) -> Self {
        Self {
            label,
            value,
            dependencies,
        }
    }

    /// The value being validated. `Null` when the parameter has no value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The parameter's display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The raw value of a declared dependency.
    ///
    /// Logs an error and returns `None` when the dependency name was never
    /// declared on the parameter.
    pub fn dependency(&self, name: &str) -> Option<&Value> {
        match self.dependencies.get(name) {
            Some(value) => Some(value),
            None => {
                tracing::error!(
                    parameter = %self.label,
                    dependency = name,
                    "parameter is missing a declared dependency"
                );
                None
            }
        }
    }

    /// The value of a declared dependency as a string.
    ///
    /// Returns `None` for a missing or null dependency. A non-string value is
    /// coerced to its string form with a warning.
    pub fn dependency_as_string(&self, name: &str) -> Option<String> {
        match self.dependency(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => {
                tracing::warn!(
                    parameter = %self.label,
                    dependency = name,
                    "parameter dependency is not a string; coercing"
                );
                Some(other.to_string())
            }
        }
    }
}

/// Which entry property a dynamic evaluator drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicTarget {
    Hidden,
    Disabled,
    Required,
    Label,
    Placeholder,
}

impl DynamicTarget {
    fn as_str(&self) -> &'static str {
        match self {
            DynamicTarget::Hidden => "hidden",
            DynamicTarget::Disabled => "disabled",
            DynamicTarget::Required => "required",
            DynamicTarget::Label => "label",
            DynamicTarget::Placeholder => "placeholder",
        }
    }
}

/// A property computed as a function of the current form values, re-evaluated
/// on every value change.
#[derive(Clone)]
pub(crate) struct DynamicProperty {
    pub target: DynamicTarget,
    pub eval: DynamicEval,
}

/// Registry record for a single attached entry.
#[derive(Clone)]
pub(crate) struct EntryData {
    pub id: String,
    pub path: EntryPath,
    pub kind: EntryKind,
    pub label: Option<String>,
    pub description: Option<String>,
    pub order: i32,
    pub hidden: bool,
    pub disabled: bool,
    pub excluded: bool,
    pub required: bool,
    pub dirty: bool,
    pub placeholder: Option<String>,
    /// Dependency name → path of the parameter that provides it
    pub dependencies: IndexMap<String, EntryPath>,
    pub dynamic: Vec<DynamicProperty>,
    pub on_validate_sync: Option<EntrySyncValidator>,
    pub on_validate_async: Option<EntryAsyncValidator>,
    /// Value buffered until `Form::initialize()` flushes it into the store
    pub initial_value: Option<Value>,
}

impl EntryData {
    pub(crate) fn new(id: String, path: EntryPath, kind: EntryKind) -> Self {
        Self {
            id,
            path,
            kind,
            label: None,
            description: None,
            order: 0,
            hidden: false,
            disabled: false,
            excluded: false,
            required: false,
            dirty: false,
            placeholder: None,
            dependencies: IndexMap::new(),
            dynamic: Vec::new(),
            on_validate_sync: None,
            on_validate_async: None,
            initial_value: None,
        }
    }

    /// The label shown to users: the configured label, or the id with its
    /// first letter capitalized.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => capitalize_first(&self.id),
        }
    }

    /// Apply a freshly evaluated dynamic value to its target property.
    /// Returns true when the property actually changed.
    pub(crate) fn apply_dynamic_value(&mut self, target: DynamicTarget, value: Value) -> bool {
        match target {
            DynamicTarget::Hidden => {
                let hidden = coerce_bool(&value, &self.path, target);
                std::mem::replace(&mut self.hidden, hidden) != hidden
            }
            DynamicTarget::Disabled => {
                let disabled = coerce_bool(&value, &self.path, target);
                std::mem::replace(&mut self.disabled, disabled) != disabled
            }
            DynamicTarget::Required => {
                let required = coerce_bool(&value, &self.path, target);
                std::mem::replace(&mut self.required, required) != required
            }
            DynamicTarget::Label => {
                let label = coerce_string(value);
                std::mem::replace(&mut self.label, label.clone()) != label
            }
            DynamicTarget::Placeholder => {
                let placeholder = coerce_string(value);
                std::mem::replace(&mut self.placeholder, placeholder.clone()) != placeholder
            }
        }
    }
}

/// Interpret a dynamic evaluation result as a boolean. Non-boolean values are
/// coerced by truthiness with a diagnostic warning.
fn coerce_bool(value: &Value, path: &EntryPath, target: DynamicTarget) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        other => {
            tracing::warn!(
                path = %path,
                property = target.as_str(),
                "dynamic property evaluated to a non-boolean value; coercing"
            );
            match other {
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                Value::String(s) => !s.is_empty(),
                _ => true,
            }
        }
    }
}

fn coerce_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Uppercase the first character of an identifier for display.
pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
