//! Forms and subforms
//!
//! A root [`Form`] owns exactly one entry registry and one value store for
//! itself and every descendant. Nested [`SubForm`]s are views over the root's
//! registry and store, scoped under their own paths — they never hold copies,
//! which is what keeps multi-entry evaluation and validation consistent
//! without locking beyond short critical sections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::entry::{
    BoxFuture, DynamicEval, DynamicTarget, EntryData, EntryKind, FormAsyncValidator,
    FormSyncValidator, ValidatorContext,
};
use crate::error::{FormError, Result};
use crate::events::{Emitter, Subscription};
use crate::parameter::{Parameter, ParameterDef};
use crate::path::EntryPath;
use crate::registry::EntryRegistry;
use crate::section::{Section, SectionDef};
use crate::snapshot::ValidationSnapshot;
use crate::status::ValidationStatus;
use crate::store::{FormValues, ValueStore};

/// State shared by a root form and every handle derived from it.
pub(crate) struct FormShared {
    registry: Mutex<EntryRegistry>,
    store: Mutex<ValueStore>,
    /// Copy of the construction-time values, used by `reset()`
    initial_values: FormValues,
    initialized: AtomicBool,
    pub(crate) emitter: Emitter,
    /// The current validation snapshot. Superseded whenever `validate()`
    /// creates a newer one.
    current: Mutex<Arc<ValidationSnapshot>>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) on_validate_sync: Mutex<Option<FormSyncValidator>>,
    pub(crate) on_validate_async: Mutex<Option<FormAsyncValidator>>,
}

impl FormShared {
    // --- Lock access with poison recovery ---

    pub(crate) fn registry(&self) -> MutexGuard<'_, EntryRegistry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn store(&self) -> MutexGuard<'_, ValueStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn current_lock(&self) -> MutexGuard<'_, Arc<ValidationSnapshot>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn current_snapshot(&self) -> Arc<ValidationSnapshot> {
        self.current_lock().clone()
    }

    // --- Entry access ---

    pub(crate) fn with_entry<R>(
        &self,
        path: &EntryPath,
        f: impl FnOnce(&EntryData) -> R,
    ) -> Option<R> {
        self.registry().lookup(path).map(f)
    }

    pub(crate) fn with_entry_mut<R>(
        &self,
        path: &EntryPath,
        f: impl FnOnce(&mut EntryData) -> R,
    ) -> Option<R> {
        self.registry().lookup_mut(path).map(f)
    }

    /// A flag that cascades down from ancestor containers: true when set on
    /// the entry itself or on any entry above it.
    pub(crate) fn cascaded_flag(&self, path: &EntryPath, f: fn(&EntryData) -> bool) -> bool {
        let registry = self.registry();
        let mut cursor = Some(path.clone());
        while let Some(p) = cursor {
            if !p.is_root() {
                if let Some(entry) = registry.lookup(&p) {
                    if f(entry) {
                        return true;
                    }
                }
            }
            cursor = p.parent();
        }
        false
    }

    pub(crate) fn child_count(&self, path: &EntryPath) -> usize {
        self.registry().lookup_children(path).len()
    }

    // --- Value access and mutation ---

    pub(crate) fn value_at(&self, path: &EntryPath) -> Option<Value> {
        self.store().value_at(path)
    }

    pub(crate) fn subtree_at(&self, path: &EntryPath) -> FormValues {
        self.store().subtree_at(path)
    }

    /// Update a single value by path.
    ///
    /// Misuse degrades silently by design: updating an unregistered path or a
    /// section logs an error and no-ops, so one misconfigured field cannot
    /// take down a whole form interaction.
    pub(crate) fn update_value(&self, path: &EntryPath, value: Value) {
        let kind = {
            let registry = self.registry();
            match registry.lookup(path) {
                None => {
                    tracing::error!(path = %path, "cannot update value: no entry registered at path");
                    return;
                }
                Some(entry) if !entry.kind.bears_value() => {
                    tracing::error!(
                        path = %path,
                        kind = entry.kind.as_str(),
                        "cannot update value: entry kind does not hold a value"
                    );
                    return;
                }
                Some(entry) => entry.kind,
            }
        };

        let Some((new_root, old_root)) = ({
            let mut store = self.store();
            if store.value_at(path).as_ref() == Some(&value) {
                None
            } else {
                let old = store.root().clone();
                store.set(path, value);
                Some((store.root().clone(), old))
            }
        }) else {
            return;
        };

        if kind == EntryKind::Parameter {
            self.with_entry_mut(path, |e| e.dirty = true);
        }
        self.values_changed(&new_root, &old_root);
    }

    /// Replace the value subtree at `base` wholesale. No-op when equal.
    pub(crate) fn set_values_at(&self, base: &EntryPath, values: FormValues) {
        let Some((new_root, old_root)) = ({
            let mut store = self.store();
            if store.subtree_at(base) == values {
                None
            } else {
                let old = store.root().clone();
                store.set(base, Value::Object(values));
                Some((store.root().clone(), old))
            }
        }) else {
            return;
        };
        self.values_changed(&new_root, &old_root);
    }

    fn values_changed(&self, new_values: &FormValues, old_values: &FormValues) {
        self.update_dynamic_properties(new_values);
        self.emitter.emit_change(new_values, old_values);
    }

    /// Recompute every dynamic property against `values`. Returns true when
    /// anything changed. Evaluators run with no internal lock held.
    pub(crate) fn update_dynamic_properties(&self, values: &FormValues) -> bool {
        let evals: Vec<(EntryPath, DynamicTarget, DynamicEval)> = {
            let registry = self.registry();
            let mut evals = Vec::new();
            registry.for_each(|entry| {
                if entry.excluded {
                    return;
                }
                for prop in &entry.dynamic {
                    evals.push((entry.path.clone(), prop.target, prop.eval.clone()));
                }
            });
            evals
        };
        if evals.is_empty() {
            return false;
        }

        let computed: Vec<(EntryPath, DynamicTarget, Value)> = evals
            .into_iter()
            .map(|(path, target, eval)| {
                let value = eval(values);
                (path, target, value)
            })
            .collect();

        let mut changed = false;
        let mut registry = self.registry();
        for (path, target, value) in computed {
            if let Some(entry) = registry.lookup_mut(&path) {
                if entry.apply_dynamic_value(target, value) {
                    changed = true;
                }
            }
        }
        changed
    }

    /// Recompute dynamic properties and fire a change event when anything
    /// moved.
    pub(crate) fn evaluate(&self) -> bool {
        let values = self.store().root().clone();
        let changed = self.update_dynamic_properties(&values);
        if changed {
            self.emitter.emit_change(&values, &values);
        }
        changed
    }

    /// Flush buffered initial values into the store. May only run once.
    pub(crate) fn initialize_once(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(FormError::AlreadyInitialized);
        }
        let flushes: Vec<(EntryPath, Value)> = {
            let mut registry = self.registry();
            let paths = registry.paths();
            let mut flushes = Vec::new();
            for path in paths {
                if let Some(entry) = registry.lookup_mut(&path) {
                    if let Some(value) = entry.initial_value.take() {
                        if entry.kind.bears_value() {
                            flushes.push((path, value));
                        }
                    }
                }
            }
            flushes
        };
        if flushes.is_empty() {
            return Ok(());
        }

        let (new_root, old_root) = {
            let mut store = self.store();
            let old = store.root().clone();
            for (path, value) in flushes {
                store.set(&path, value);
            }
            (store.root().clone(), old)
        };
        if new_root != old_root {
            self.values_changed(&new_root, &old_root);
        }
        Ok(())
    }

    // --- Attachment and typed lookup ---

    pub(crate) fn attach_parameter<T>(
        self: &Arc<Self>,
        base: &EntryPath,
        def: ParameterDef,
    ) -> Result<Parameter<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let entry = def.into_entry_data()?;
        let path = self.registry().attach(base, entry)?;
        Ok(Parameter::new(self.clone(), path))
    }

    pub(crate) fn attach_section(self: &Arc<Self>, base: &EntryPath, def: SectionDef) -> Result<Section> {
        let path = self.registry().attach(base, def.into_entry_data())?;
        Ok(Section::new(self.clone(), path))
    }

    pub(crate) fn attach_sub_form(self: &Arc<Self>, base: &EntryPath, def: SubFormDef) -> Result<SubForm> {
        let path = self.registry().attach(base, def.into_entry_data())?;
        Ok(SubForm::new(self.clone(), path))
    }

    fn lookup_typed(&self, base: &EntryPath, id: &str, expected: EntryKind) -> Result<EntryPath> {
        let path = base.join(id)?;
        let registry = self.registry();
        let entry = registry
            .lookup_relative(base, id)
            .ok_or_else(|| FormError::EntryNotFound {
                path: path.to_string(),
            })?;
        if entry.kind != expected {
            return Err(FormError::EntryKindMismatch {
                path: path.to_string(),
                expected: expected.as_str(),
                actual: entry.kind.as_str(),
            });
        }
        Ok(path)
    }

    pub(crate) fn get_parameter<T>(self: &Arc<Self>, base: &EntryPath, id: &str) -> Result<Parameter<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let path = self.lookup_typed(base, id, EntryKind::Parameter)?;
        Ok(Parameter::new(self.clone(), path))
    }

    pub(crate) fn get_section(self: &Arc<Self>, base: &EntryPath, id: &str) -> Result<Section> {
        let path = self.lookup_typed(base, id, EntryKind::Section)?;
        Ok(Section::new(self.clone(), path))
    }

    pub(crate) fn get_sub_form(self: &Arc<Self>, base: &EntryPath, id: &str) -> Result<SubForm> {
        let path = self.lookup_typed(base, id, EntryKind::Form)?;
        Ok(SubForm::new(self.clone(), path))
    }
}

/// Builder for a root form.
pub struct FormBuilder {
    values: FormValues,
    title: Option<String>,
    description: Option<String>,
    on_validate_sync: Option<FormSyncValidator>,
    on_validate_async: Option<FormAsyncValidator>,
}

impl FormBuilder {
    fn new() -> Self {
        Self {
            values: FormValues::new(),
            title: None,
            description: None,
            on_validate_sync: None,
            on_validate_async: None,
        }
    }

    /// The form's initial values (also the target of `reset()`).
    pub fn values(mut self, values: FormValues) -> Self {
        self.values = values;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Form-level synchronous validation over the whole value tree.
    pub fn on_validate_sync<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormValues) -> ValidationStatus + Send + Sync + 'static,
    {
        self.on_validate_sync = Some(Arc::new(f));
        self
    }

    /// Form-level asynchronous validation over the whole value tree.
    pub fn on_validate_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ValidationStatus> + Send + 'static,
    {
        self.on_validate_async =
            Some(Arc::new(move |values| Box::pin(f(values)) as BoxFuture<ValidationStatus>));
        self
    }

    pub fn build(self) -> Form {
        let root_entry = EntryData::new(String::new(), EntryPath::root(), EntryKind::Form);
        let initial_snapshot = Arc::new(ValidationSnapshot::new(self.values.clone(), true, false));
        let shared = Arc::new(FormShared {
            registry: Mutex::new(EntryRegistry::new(root_entry)),
            store: Mutex::new(ValueStore::new(self.values.clone())),
            initial_values: self.values,
            initialized: AtomicBool::new(false),
            emitter: Emitter::new(),
            current: Mutex::new(initial_snapshot),
            title: self.title,
            description: self.description,
            on_validate_sync: Mutex::new(self.on_validate_sync),
            on_validate_async: Mutex::new(self.on_validate_async),
        });
        Form { shared }
    }
}

/// A root form: the single owner of an entry registry and value store for an
/// entire entry tree.
///
/// Handles are cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct Form {
    pub(crate) shared: Arc<FormShared>,
}

impl Form {
    /// Start building a form.
    pub fn builder() -> FormBuilder {
        FormBuilder::new()
    }

    /// A form with the given initial values and no form-level validators.
    pub fn new(values: FormValues) -> Self {
        Self::builder().values(values).build()
    }

    pub fn title(&self) -> Option<&str> {
        self.shared.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.shared.description.as_deref()
    }

    // --- Values ---

    /// A read-only snapshot of the current values.
    pub fn values(&self) -> FormValues {
        self.shared.store().root().clone()
    }

    /// Replace all values. No-op when equal to the current values; otherwise
    /// fires a change event and re-evaluates dynamic properties.
    pub fn set_values(&self, values: FormValues) {
        self.shared.set_values_at(&EntryPath::root(), values);
    }

    /// Update a single value by dot-separated path. Misuse (unknown path,
    /// section target) logs an error and no-ops.
    pub fn update_value(&self, path: &str, value: impl Serialize) {
        let path = match EntryPath::parse(path) {
            Ok(path) => path,
            Err(error) => {
                tracing::error!(%error, "cannot update value: invalid path");
                return;
            }
        };
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(path = %path, %error, "cannot update value: serialization failed");
                return;
            }
        };
        self.shared.update_value(&path, value);
    }

    /// Reset the form to the values it was constructed with.
    pub fn reset(&self) {
        let initial = self.shared.initial_values.clone();
        self.set_values(initial);
    }

    /// Flush buffered initial parameter values into the store. Must be called
    /// after all entries are attached; calling twice is an error.
    pub fn initialize(&self) -> Result<()> {
        self.shared.initialize_once()
    }

    /// Re-evaluate dynamic properties. Returns true when anything changed
    /// (and a change event fired).
    pub fn evaluate(&self) -> bool {
        self.shared.evaluate()
    }

    // --- Structure ---

    /// Attach a parameter directly under the form root.
    pub fn param<T>(&self, def: ParameterDef) -> Result<Parameter<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.shared.attach_parameter(&EntryPath::root(), def)
    }

    /// Attach a section directly under the form root.
    pub fn section(&self, def: SectionDef) -> Result<Section> {
        self.shared.attach_section(&EntryPath::root(), def)
    }

    /// Attach a subform directly under the form root.
    pub fn sub_form(&self, def: SubFormDef) -> Result<SubForm> {
        self.shared.attach_sub_form(&EntryPath::root(), def)
    }

    /// Look up a top-level parameter by id; fails if the entry is another
    /// kind.
    pub fn get_param<T>(&self, id: &str) -> Result<Parameter<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.shared.get_parameter(&EntryPath::root(), id)
    }

    /// Look up a top-level section by id.
    pub fn get_section(&self, id: &str) -> Result<Section> {
        self.shared.get_section(&EntryPath::root(), id)
    }

    /// Look up a top-level subform by id.
    pub fn get_sub_form(&self, id: &str) -> Result<SubForm> {
        self.shared.get_sub_form(&EntryPath::root(), id)
    }

    /// Total number of registered entries, nested ones included.
    pub fn all_entries_count(&self) -> usize {
        self.shared.registry().len()
    }

    /// Number of direct children of the form root.
    pub fn child_entries_count(&self) -> usize {
        self.shared.child_count(&EntryPath::root())
    }

    /// Paths of every registered entry in pre-order.
    pub fn entry_paths(&self) -> Vec<EntryPath> {
        self.shared.registry().paths()
    }

    /// The kind of the entry at a path, if one is registered there. Rendering
    /// layers use this to pick a control without probing capabilities.
    pub fn entry_kind(&self, path: &EntryPath) -> Option<EntryKind> {
        self.shared.with_entry(path, |e| e.kind)
    }

    // --- Events ---

    /// Subscribe to value changes. The handler receives the new and old
    /// value trees and may re-enter the form.
    pub fn on_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(&FormValues, &FormValues) + Send + Sync + 'static,
    {
        self.shared.emitter.on_change(EntryPath::root(), Arc::new(f))
    }

    /// Subscribe to validation events. Fires once after the synchronous pass
    /// and once more when validation fully resolves.
    pub fn on_validate<F>(&self, f: F) -> Subscription
    where
        F: Fn(&Arc<ValidationSnapshot>) + Send + Sync + 'static,
    {
        self.shared.emitter.on_validate(Arc::new(f))
    }

    /// Remove a previously registered handler.
    pub fn off(&self, subscription: Subscription) {
        self.shared.emitter.off(subscription);
    }

    // --- Form-level validators (settable after construction so wrappers can
    //     wire their own hooks) ---

    pub fn set_on_validate_sync<F>(&self, f: F)
    where
        F: Fn(&FormValues) -> ValidationStatus + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.shared.on_validate_sync.lock() {
            *slot = Some(Arc::new(f));
        }
    }

    pub fn set_on_validate_async<F, Fut>(&self, f: F)
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ValidationStatus> + Send + 'static,
    {
        if let Ok(mut slot) = self.shared.on_validate_async.lock() {
            *slot = Some(Arc::new(move |values| {
                Box::pin(f(values)) as BoxFuture<ValidationStatus>
            }));
        }
    }
}

/// Builder for a nested subform entry.
pub struct SubFormDef {
    entry: EntryData,
    values: Option<FormValues>,
    on_validate_sync: Option<FormSyncValidator>,
    on_validate_async: Option<FormAsyncValidator>,
}

impl SubFormDef {
    /// Start defining a subform with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            entry: EntryData::new(id.into(), EntryPath::root(), EntryKind::Form),
            values: None,
            on_validate_sync: None,
            on_validate_async: None,
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

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.entry.hidden = hidden;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.entry.disabled = disabled;
        self
    }

    pub fn excluded(mut self, excluded: bool) -> Self {
        self.entry.excluded = excluded;
        self
    }

    /// Buffer the subform's initial value subtree, flushed by the root
    /// form's `initialize()`.
    pub fn values(mut self, values: FormValues) -> Self {
        self.values = Some(values);
        self
    }

    /// Subform-level synchronous validation over the subform's value
    /// subtree.
    pub fn on_validate_sync<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormValues) -> ValidationStatus + Send + Sync + 'static,
    {
        self.on_validate_sync = Some(Arc::new(f));
        self
    }

    /// Subform-level asynchronous validation over the subform's value
    /// subtree.
    pub fn on_validate_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ValidationStatus> + Send + 'static,
    {
        self.on_validate_async =
            Some(Arc::new(move |values| Box::pin(f(values)) as BoxFuture<ValidationStatus>));
        self
    }

    fn into_entry_data(self) -> EntryData {
        let mut entry = self.entry;
        entry.initial_value = self.values.map(Value::Object);

        // Entry-level validator callbacks see the subform's subtree as the
        // "value" under validation.
        if let Some(f) = self.on_validate_sync {
            entry.on_validate_sync = Some(Arc::new(move |ctx: &ValidatorContext| {
                match ctx.value().as_object() {
                    Some(map) => f(map),
                    None => f(&FormValues::new()),
                }
            }));
        }
        if let Some(f) = self.on_validate_async {
            entry.on_validate_async = Some(Arc::new(move |ctx: ValidatorContext| {
                let values = ctx.value().as_object().cloned().unwrap_or_default();
                f(values)
            }));
        }
        entry
    }
}

/// A handle to a nested subform.
///
/// Shares the root form's registry and value store, scoped under its own
/// path. Orchestration (`validate`, `wait_for_validation`) lives on the root
/// form only.
#[derive(Clone)]
pub struct SubForm {
    shared: Arc<FormShared>,
    path: EntryPath,
}

impl SubForm {
    pub(crate) fn new(shared: Arc<FormShared>, path: EntryPath) -> Self {
        Self { shared, path }
    }

    /// The subform's path relative to the root form.
    pub fn path(&self) -> &EntryPath {
        &self.path
    }

    /// The subform's id (the final path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn label(&self) -> String {
        self.shared
            .with_entry(&self.path, |e| e.display_label())
            .unwrap_or_else(|| self.path.id().to_string())
    }

    pub fn hidden(&self) -> bool {
        self.shared.cascaded_flag(&self.path, |e| e.hidden)
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.shared.with_entry_mut(&self.path, |e| e.hidden = hidden);
    }

    pub fn disabled(&self) -> bool {
        self.shared.cascaded_flag(&self.path, |e| e.disabled)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.shared
            .with_entry_mut(&self.path, |e| e.disabled = disabled);
    }

    /// A read-only snapshot of the subform's value subtree.
    pub fn values(&self) -> FormValues {
        self.shared.subtree_at(&self.path)
    }

    /// Replace the subform's value subtree wholesale.
    pub fn set_values(&self, values: FormValues) {
        self.shared.set_values_at(&self.path, values);
    }

    /// Update a single value by path relative to the subform.
    pub fn update_value(&self, path: &str, value: impl Serialize) {
        let relative = match EntryPath::parse(path) {
            Ok(path) => path,
            Err(error) => {
                tracing::error!(%error, "cannot update value: invalid path");
                return;
            }
        };
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(path = %relative, %error, "cannot update value: serialization failed");
                return;
            }
        };
        self.shared.update_value(&self.path.concat(&relative), value);
    }

    /// Number of direct children.
    pub fn child_entries_count(&self) -> usize {
        self.shared.child_count(&self.path)
    }

    // --- Child factories ---

    /// Attach a parameter inside this subform.
    pub fn param<T>(&self, def: ParameterDef) -> Result<Parameter<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.shared.attach_parameter(&self.path, def)
    }

    /// Attach a section inside this subform.
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

    /// Look up a previously attached section by id.
    pub fn get_section(&self, id: &str) -> Result<Section> {
        self.shared.get_section(&self.path, id)
    }

    /// Look up a previously attached nested subform by id.
    pub fn get_sub_form(&self, id: &str) -> Result<SubForm> {
        self.shared.get_sub_form(&self.path, id)
    }

    /// Subscribe to changes within this subform's subtree. The handler
    /// receives subtree values.
    pub fn on_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(&FormValues, &FormValues) + Send + Sync + 'static,
    {
        self.shared.emitter.on_change(self.path.clone(), Arc::new(f))
    }

    /// Remove a previously registered handler.
    pub fn off(&self, subscription: Subscription) {
        self.shared.emitter.off(subscription);
    }
}
