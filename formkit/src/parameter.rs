//! Parameters — leaf entries holding a single typed value
//!
//! A parameter is defined with an inert [`ParameterDef`] builder and comes to
//! life when attached to a form through a container's `param()` factory,
//! which returns a typed [`Parameter<T>`] handle. Values live in the root
//! form's value store; the handle serializes on write and deserializes on
//! read.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::entry::{
    BoxFuture, DynamicProperty, DynamicTarget, EntryData, EntryKind, ValidatorContext,
};
use crate::error::{FormError, Result};
use crate::form::FormShared;
use crate::path::EntryPath;
use crate::status::ValidationStatus;
use crate::store::FormValues;

/// Builder for a parameter. Inert until attached: constructing a def has no
/// side effects, and a value set here is buffered until the owning form's
/// `initialize()` flushes it into the store.
pub struct ParameterDef {
    entry: EntryData,
    dependencies: Vec<(String, String)>,
}

impl ParameterDef {
    /// Start defining a parameter with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            entry: EntryData::new(id.into(), EntryPath::root(), EntryKind::Parameter),
            dependencies: Vec::new(),
        }
    }

    /// Short, friendly label. Defaults to the id with its first letter
    /// capitalized.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.entry.label = Some(label.into());
        self
    }

    /// Long-form description, e.g. for a tooltip.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = Some(description.into());
        self
    }

    /// Fail validation when the value is missing or null.
    pub fn required(mut self, required: bool) -> Self {
        self.entry.required = required;
        self
    }

    /// Text shown in place of a missing value.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.entry.placeholder = Some(placeholder.into());
        self
    }

    /// Display ordering relative to siblings.
    pub fn order(mut self, order: i32) -> Self {
        self.entry.order = order;
        self
    }

    /// Visually hide the parameter; its value stays in the form.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.entry.hidden = hidden;
        self
    }

    /// Disable interaction.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.entry.disabled = disabled;
        self
    }

    /// Exclude the parameter from validation and dynamic evaluation while
    /// keeping it registered.
    pub fn excluded(mut self, excluded: bool) -> Self {
        self.entry.excluded = excluded;
        self
    }

    /// Buffer an initial value, flushed into the store by
    /// `Form::initialize()`.
    pub fn value(mut self, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.entry.initial_value = Some(value),
            Err(error) => {
                tracing::error!(id = %self.entry.id, %error, "initial value failed to serialize; ignoring");
            }
        }
        self
    }

    /// Declare a named dependency on another parameter, given by its path
    /// relative to the root form. Validators read dependencies through
    /// [`ValidatorContext`].
    pub fn dependency(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.dependencies.push((name.into(), path.into()));
        self
    }

    /// Compute `hidden` from the current form values on every change.
    pub fn dynamic_hidden<F>(self, f: F) -> Self
    where
        F: Fn(&FormValues) -> bool + Send + Sync + 'static,
    {
        self.dynamic(DynamicTarget::Hidden, move |values| Value::Bool(f(values)))
    }

    /// Compute `disabled` from the current form values on every change.
    pub fn dynamic_disabled<F>(self, f: F) -> Self
    where
        F: Fn(&FormValues) -> bool + Send + Sync + 'static,
    {
        self.dynamic(DynamicTarget::Disabled, move |values| Value::Bool(f(values)))
    }

    /// Compute `required` from the current form values on every change.
    pub fn dynamic_required<F>(self, f: F) -> Self
    where
        F: Fn(&FormValues) -> bool + Send + Sync + 'static,
    {
        self.dynamic(DynamicTarget::Required, move |values| Value::Bool(f(values)))
    }

    /// Compute the label from the current form values on every change.
    pub fn dynamic_label<F>(self, f: F) -> Self
    where
        F: Fn(&FormValues) -> String + Send + Sync + 'static,
    {
        self.dynamic(DynamicTarget::Label, move |values| Value::String(f(values)))
    }

    /// Compute the placeholder from the current form values on every change.
    pub fn dynamic_placeholder<F>(self, f: F) -> Self
    where
        F: Fn(&FormValues) -> String + Send + Sync + 'static,
    {
        self.dynamic(DynamicTarget::Placeholder, move |values| {
            Value::String(f(values))
        })
    }

    /// Drive any dynamic target from a raw evaluator. Boolean targets coerce
    /// non-boolean results by truthiness with a warning.
    pub fn dynamic<F>(mut self, target: DynamicTarget, f: F) -> Self
    where
        F: Fn(&FormValues) -> Value + Send + Sync + 'static,
    {
        self.entry.dynamic.push(DynamicProperty {
            target,
            eval: Arc::new(f),
        });
        self
    }

    /// Custom synchronous validation. Never runs when a required parameter
    /// has no value — the presence check always wins.
    pub fn on_validate_sync<F>(mut self, f: F) -> Self
    where
        F: Fn(&ValidatorContext) -> ValidationStatus + Send + Sync + 'static,
    {
        self.entry.on_validate_sync = Some(Arc::new(f));
        self
    }

    /// Custom asynchronous validation. Skipped entirely when the parameter's
    /// synchronous result is already an error.
    pub fn on_validate_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ValidatorContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ValidationStatus> + Send + 'static,
    {
        self.entry.on_validate_async =
            Some(Arc::new(move |ctx| Box::pin(f(ctx)) as BoxFuture<ValidationStatus>));
        self
    }

    /// Convert into registry data, parsing declared dependency paths.
    pub(crate) fn into_entry_data(self) -> Result<EntryData> {
        let mut entry = self.entry;
        for (name, path) in self.dependencies {
            entry.dependencies.insert(name, EntryPath::parse(path)?);
        }
        Ok(entry)
    }
}

/// A typed handle to an attached parameter.
///
/// Handles are cheap to clone and remain valid for the lifetime of the
/// owning form.
pub struct Parameter<T> {
    shared: Arc<FormShared>,
    path: EntryPath,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Parameter<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Parameter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("path", &self.path)
            .finish()
    }
}

impl<T> Parameter<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(shared: Arc<FormShared>, path: EntryPath) -> Self {
        Self {
            shared,
            path,
            _marker: PhantomData,
        }
    }

    pub(crate) fn shared(&self) -> &Arc<FormShared> {
        &self.shared
    }

    /// The parameter's path relative to the root form.
    pub fn path(&self) -> &EntryPath {
        &self.path
    }

    /// The parameter's id (the final path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Read the current value. `None` when missing or null; a value of the
    /// wrong shape is a configuration error.
    pub fn value(&self) -> Result<Option<T>> {
        match self.shared.value_at(&self.path) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| FormError::ValueType {
                    path: self.path.to_string(),
                    source,
                }),
        }
    }

    /// Write a new value through the root form's store, firing change events
    /// and dynamic property re-evaluation.
    pub fn set_value(&self, value: T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| FormError::ValueType {
            path: self.path.to_string(),
            source,
        })?;
        self.shared.update_value(&self.path, value);
        Ok(())
    }

    /// The display label (configured label or capitalized id).
    pub fn label(&self) -> String {
        self.shared
            .with_entry(&self.path, |e| e.display_label())
            .unwrap_or_else(|| self.path.id().to_string())
    }

    pub fn set_label(&self, label: impl Into<String>) {
        let label = label.into();
        self.shared.with_entry_mut(&self.path, |e| e.label = Some(label));
    }

    /// True when this parameter or any ancestor section is hidden.
    pub fn hidden(&self) -> bool {
        self.shared.cascaded_flag(&self.path, |e| e.hidden)
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.shared.with_entry_mut(&self.path, |e| e.hidden = hidden);
    }

    /// True when this parameter or any ancestor section is disabled.
    pub fn disabled(&self) -> bool {
        self.shared.cascaded_flag(&self.path, |e| e.disabled)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.shared
            .with_entry_mut(&self.path, |e| e.disabled = disabled);
    }

    pub fn required(&self) -> bool {
        self.shared
            .with_entry(&self.path, |e| e.required)
            .unwrap_or(false)
    }

    pub fn set_required(&self, required: bool) {
        self.shared
            .with_entry_mut(&self.path, |e| e.required = required);
    }

    pub fn placeholder(&self) -> Option<String> {
        self.shared
            .with_entry(&self.path, |e| e.placeholder.clone())
            .flatten()
    }

    /// True once the value has been written through the store after
    /// initialization.
    pub fn dirty(&self) -> bool {
        self.shared
            .with_entry(&self.path, |e| e.dirty)
            .unwrap_or(false)
    }

    /// This parameter's status in the current validation snapshot.
    pub fn validation_status(&self) -> Option<ValidationStatus> {
        self.shared.current_snapshot().entry_status(&self.path)
    }
}
