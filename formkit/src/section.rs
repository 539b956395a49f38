//! Sections — pure grouping containers
//!
//! A section owns an ordered collection of child entries but no value of its
//! own. Hiding or disabling a section cascades to everything underneath it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::entry::{DynamicProperty, DynamicTarget, EntryData, EntryKind};
use crate::error::Result;
use crate::form::{FormShared, SubForm, SubFormDef};
use crate::parameter::{Parameter, ParameterDef};
use crate::path::EntryPath;
use crate::store::FormValues;

/// Builder for a section. Inert until attached.
pub struct SectionDef {
    entry: EntryData,
}

impl SectionDef {
    /// Start defining a section with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            entry: EntryData::new(id.into(), EntryPath::root(), EntryKind::Section),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.entry.label = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = Some(description.into());
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.entry.order = order;
        self
    }

    /// Hide the section and, by cascade, all of its descendants.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.entry.hidden = hidden;
        self
    }

    /// Disable the section and, by cascade, all of its descendants.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.entry.disabled = disabled;
        self
    }

    pub fn excluded(mut self, excluded: bool) -> Self {
        self.entry.excluded = excluded;
        self
    }

    /// Compute `hidden` from the current form values on every change.
    pub fn dynamic_hidden<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormValues) -> bool + Send + Sync + 'static,
    {
        self.entry.dynamic.push(DynamicProperty {
            target: DynamicTarget::Hidden,
            eval: Arc::new(move |values| Value::Bool(f(values))),
        });
        self
    }

    /// Compute `disabled` from the current form values on every change.
    pub fn dynamic_disabled<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormValues) -> bool + Send + Sync + 'static,
    {
        self.entry.dynamic.push(DynamicProperty {
            target: DynamicTarget::Disabled,
            eval: Arc::new(move |values| Value::Bool(f(values))),
        });
        self
    }

    pub(crate) fn into_entry_data(self) -> EntryData {
        self.entry
    }
}

/// A handle to an attached section.
#[derive(Clone)]
pub struct Section {
    shared: Arc<FormShared>,
    path: EntryPath,
}

impl std::fmt::Debug for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section")
            .field("path", &self.path)
            .finish()
    }
}

impl Section {
    pub(crate) fn new(shared: Arc<FormShared>, path: EntryPath) -> Self {
        Self { shared, path }
    }

    /// The section's path relative to the root form.
    pub fn path(&self) -> &EntryPath {
        &self.path
    }

    /// The section's id (the final path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn label(&self) -> String {
        self.shared
            .with_entry(&self.path, |e| e.display_label())
            .unwrap_or_else(|| self.path.id().to_string())
    }

    /// True when this section or any ancestor section is hidden.
    pub fn hidden(&self) -> bool {
        self.shared.cascaded_flag(&self.path, |e| e.hidden)
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.shared.with_entry_mut(&self.path, |e| e.hidden = hidden);
    }

    /// True when this section or any ancestor section is disabled.
    pub fn disabled(&self) -> bool {
        self.shared.cascaded_flag(&self.path, |e| e.disabled)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.shared
            .with_entry_mut(&self.path, |e| e.disabled = disabled);
    }

    /// Number of direct children.
    pub fn child_entries_count(&self) -> usize {
        self.shared.child_count(&self.path)
    }

    // --- Child factories ---

    /// Attach a parameter inside this section and return its typed handle.
    pub fn param<T>(&self, def: ParameterDef) -> Result<Parameter<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.shared.attach_parameter(&self.path, def)
    }

    /// Attach a nested section.
    pub fn section(&self, def: SectionDef) -> Result<Section> {
        self.shared.attach_section(&self.path, def)
    }

    /// Attach a nested subform.
    pub fn sub_form(&self, def: SubFormDef) -> Result<SubForm> {
        self.shared.attach_sub_form(&self.path, def)
    }

    /// Look up a previously attached parameter by id.
    pub fn get_param<T>(&self, id: &str) -> Result<Parameter<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.shared.get_parameter(&self.path, id)
    }

    /// Look up a previously attached nested section by id.
    pub fn get_section(&self, id: &str) -> Result<Section> {
        self.shared.get_section(&self.path, id)
    }
}
