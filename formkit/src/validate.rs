//! Validation orchestration
//!
//! `Form::validate()` runs in two phases. The synchronous pass executes at
//! call time, before the returned future is ever polled: the new snapshot
//! supersedes the current one immediately and sync results are observable
//! straight away. The asynchronous pass lives in the returned future: an
//! optional debounce delay, a supersession check, concurrent dispatch of all
//! eligible async validators, a second supersession check, then aggregation.
//!
//! Cancellation is cooperative and snapshot-scoped. Nothing aborts in-flight
//! validator futures; a superseded snapshot resolves early with a `canceled`
//! status and orphaned results are discarded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use tokio::task::JoinSet;

use crate::entry::{EntryAsyncValidator, EntryKind, EntrySyncValidator, ValidatorContext};
use crate::form::{Form, FormShared};
use crate::parameter::Parameter;
use crate::path::EntryPath;
use crate::snapshot::{ValidationOpts, ValidationSnapshot};
use crate::status::{ValidationLevel, ValidationStatus};
use crate::store::{value_in, FormValues};

// If there is an async validation in progress, how long to wait before
// running another round of async validators.
const ASYNC_VALIDATION_DELAY: Duration = Duration::from_millis(300);

/// Everything the orchestrator needs to validate one entry, captured out of
/// the registry so no lock is held while validators run.
struct ValidationJob {
    path: EntryPath,
    kind: EntryKind,
    label: String,
    required: bool,
    dependencies: IndexMap<String, EntryPath>,
    on_validate_sync: Option<EntrySyncValidator>,
    on_validate_async: Option<EntryAsyncValidator>,
}

impl ValidationJob {
    fn from_entry(entry: &crate::entry::EntryData) -> Self {
        Self {
            path: entry.path.clone(),
            kind: entry.kind,
            label: entry.display_label(),
            required: entry.required,
            dependencies: entry.dependencies.clone(),
            on_validate_sync: entry.on_validate_sync.clone(),
            on_validate_async: entry.on_validate_async.clone(),
        }
    }

    fn context(&self, values: &FormValues) -> ValidatorContext {
        let value = value_in(values, &self.path).unwrap_or(Value::Null);
        let dependencies: HashMap<String, Value> = self
            .dependencies
            .iter()
            .map(|(name, path)| {
                (
                    name.clone(),
                    value_in(values, path).unwrap_or(Value::Null),
                )
            })
            .collect();
        ValidatorContext::new(self.label.clone(), value, dependencies)
    }

    /// Sync validation for a single parameter: the presence check wins over
    /// any custom rule.
    fn parameter_sync_status(&self, values: &FormValues) -> ValidationStatus {
        let ctx = self.context(values);
        if self.required && ctx.value().is_null() {
            ValidationStatus::error(format!("{} is required", self.label))
        } else if let Some(validator) = &self.on_validate_sync {
            validator(&ctx)
        } else {
            ValidationStatus::ok()
        }
    }

    /// Async validation for a single parameter; `ok` when no validator is
    /// configured.
    async fn parameter_async_status(&self, values: &FormValues) -> ValidationStatus {
        match &self.on_validate_async {
            Some(validator) => validator(self.context(values)).await,
            None => ValidationStatus::ok(),
        }
    }
}

impl FormShared {
    fn collect_jobs(&self) -> Vec<ValidationJob> {
        let registry = self.registry();
        let mut jobs = Vec::new();
        registry.for_each(|entry| {
            if entry.excluded || entry.kind == EntryKind::Section {
                return;
            }
            jobs.push(ValidationJob::from_entry(entry));
        });
        jobs
    }

    fn job_at(&self, path: &EntryPath) -> Option<ValidationJob> {
        self.registry().lookup(path).map(ValidationJob::from_entry)
    }

    /// Synchronous validation pass over every entry, then the form-level
    /// callback.
    pub(crate) fn run_sync_pass(&self, snapshot: &Arc<ValidationSnapshot>, opts: ValidationOpts) {
        let jobs = self.collect_jobs();
        for job in &jobs {
            let status = match job.kind {
                EntryKind::Parameter => job.parameter_sync_status(snapshot.values()),
                EntryKind::Form => match &job.on_validate_sync {
                    Some(validator) => {
                        let ctx = job.context(snapshot.values());
                        validator(&ctx)
                    }
                    None => continue,
                },
                EntryKind::Section => continue,
            };
            snapshot.set_entry_status(job.path.clone(), status.with_forced(opts.force));
        }

        let form_validator = self
            .on_validate_sync
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        if let Some(validator) = form_validator {
            let status = validator(snapshot.values());
            snapshot.set_on_validate_sync_status(status.with_forced(opts.force));
        }

        snapshot.mark_sync_complete();
    }

    /// Asynchronous validation pass: dispatch every eligible validator
    /// concurrently, await them all, then merge.
    pub(crate) async fn run_async_pass(
        &self,
        snapshot: &Arc<ValidationSnapshot>,
        opts: ValidationOpts,
    ) {
        let jobs = self.collect_jobs();
        let mut set: JoinSet<(EntryPath, ValidationStatus)> = JoinSet::new();
        for job in jobs {
            let Some(validator) = job.on_validate_async.clone() else {
                continue;
            };
            if job.kind == EntryKind::Parameter
                && snapshot
                    .entry_status(&job.path)
                    .is_some_and(|status| status.is_error())
            {
                // No point validating further: sync validation already
                // failed for this parameter.
                continue;
            }
            let ctx = job.context(snapshot.values());
            let path = job.path.clone();
            set.spawn(async move { (path, validator(ctx).await) });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(error) => {
                    tracing::error!(%error, "async validator task failed");
                }
            }
        }

        if !opts.force && snapshot.is_superseded() {
            // Superseded while awaiting: discard the results. The caller
            // marks the snapshot canceled.
            return;
        }

        for (path, status) in results {
            if snapshot
                .entry_status(&path)
                .is_some_and(|existing| existing.is_error())
            {
                continue;
            }
            snapshot.set_entry_status(path, status.with_forced(opts.force));
        }

        let form_validator = self
            .on_validate_async
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        if let Some(validator) = form_validator {
            let status = validator(snapshot.values().clone()).await;
            snapshot.set_on_validate_async_status(status.with_forced(opts.force));
        }

        snapshot.mark_async_complete();
    }

    /// Cooperative supersession check. A superseded, non-forced snapshot is
    /// marked canceled and its completion resolved so waiters never hang.
    pub(crate) fn check_superseded(
        &self,
        snapshot: &Arc<ValidationSnapshot>,
        opts: ValidationOpts,
    ) -> bool {
        if !opts.force && snapshot.is_superseded() {
            snapshot.set_overall_status(ValidationStatus::canceled("Validation canceled"));
            snapshot.resolve_completion();
            return true;
        }
        false
    }

    /// Aggregate per-entry statuses into an overall status.
    ///
    /// Entry-level errors trump form-level checks; the form-level async
    /// result trumps the sync one, but only while the status is still ok.
    pub(crate) fn finalize_overall(&self, snapshot: &Arc<ValidationSnapshot>) {
        let statuses = snapshot.entry_statuses();
        let errors: Vec<&ValidationStatus> = statuses
            .values()
            .filter(|s| s.level == ValidationLevel::Error)
            .collect();
        let warnings: Vec<&ValidationStatus> = statuses
            .values()
            .filter(|s| s.level == ValidationLevel::Warn)
            .collect();

        let mut overall = if !errors.is_empty() {
            match errors.as_slice() {
                [single] => (*single).clone(),
                many => ValidationStatus::error(format!("{} errors found", many.len())),
            }
        } else if !warnings.is_empty() {
            match warnings.as_slice() {
                [single] => (*single).clone(),
                many => ValidationStatus::warn(format!("{} warnings found", many.len())),
            }
        } else {
            ValidationStatus::ok()
        };

        if overall.is_ok() {
            if let Some(status) = snapshot.on_validate_sync_status() {
                if !status.is_ok() {
                    overall = status;
                }
            }
        }
        if overall.is_ok() {
            if let Some(status) = snapshot.on_validate_async_status() {
                if !status.is_ok() {
                    overall = status;
                }
            }
        }

        snapshot.set_overall_status(overall.with_forced(snapshot.forced()));
    }
}

impl Form {
    /// Run full validation: the synchronous pass happens immediately, the
    /// asynchronous pass when the returned future is awaited.
    ///
    /// The new snapshot supersedes the form's current one the moment this
    /// method is called. Unless `opts.force` is set, the attempt resolves to
    /// a `canceled` status if yet another `validate()` call supersedes it
    /// before the async pass finishes — in a rapid burst of calls only the
    /// last one completes.
    pub fn validate(
        &self,
        opts: ValidationOpts,
    ) -> impl Future<Output = Arc<ValidationSnapshot>> + Send + 'static {
        let shared = self.shared.clone();
        let values = shared.store().root().clone();
        let snapshot = Arc::new(ValidationSnapshot::new(values, false, opts.force));

        let previous_in_progress = {
            let mut current = shared.current_lock();
            let previous = std::mem::replace(&mut *current, snapshot.clone());
            let in_progress = !previous.completion_resolved();
            previous.supersede();
            in_progress
        };

        shared.run_sync_pass(&snapshot, opts);

        // Let consumers react to fast sync-only results before async work
        // finishes.
        shared.emitter.emit_validate(&snapshot);

        async move {
            // Yield before any async validation so a newer validate() call
            // gets a chance to supersede this one. Go more slowly when an
            // async validation was already in flight, to avoid hammering
            // expensive validators.
            if opts.force || snapshot.is_initial() || !previous_in_progress {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(ASYNC_VALIDATION_DELAY).await;
            }

            if shared.check_superseded(&snapshot, opts) {
                return snapshot;
            }

            shared.run_async_pass(&snapshot, opts).await;

            if shared.check_superseded(&snapshot, opts) {
                return snapshot;
            }

            // This snapshot is done and becomes the in-effect snapshot.
            snapshot.resolve_completion();
            shared.finalize_overall(&snapshot);
            *shared.current_lock() = snapshot.clone();
            shared.emitter.emit_validate(&snapshot);

            if snapshot.overall_status().is_none() {
                // Hitting this indicates a bug: the status is always set by
                // finalize_overall.
                tracing::error!("validation finished without an overall status");
            }

            snapshot
        }
    }

    /// Run only the synchronous validation pass against a snapshot. This is
    /// the building block `validate()` composes; most callers want
    /// `validate()` itself.
    pub fn validate_sync(&self, snapshot: &Arc<ValidationSnapshot>, opts: ValidationOpts) {
        self.shared.run_sync_pass(snapshot, opts);
    }

    /// Run only the asynchronous validation pass against a snapshot. This is
    /// the building block `validate()` composes; most callers want
    /// `validate()` itself.
    pub async fn validate_async(&self, snapshot: &Arc<ValidationSnapshot>, opts: ValidationOpts) {
        self.shared.run_async_pass(snapshot, opts).await;
    }

    /// Wait for the result of the *last* `validate()` call in any burst of
    /// calls.
    ///
    /// Yields once so synchronous chains of `validate()` calls enqueue first,
    /// then keeps waiting as long as newer snapshots keep superseding the one
    /// being awaited. Returns `None` when no validation has ever run.
    pub async fn wait_for_validation(&self) -> Option<ValidationStatus> {
        tokio::task::yield_now().await;
        loop {
            let snapshot = self.validation_snapshot();
            snapshot.wait().await;
            // If the snapshot we awaited is still current, we're done.
            // Otherwise loop onto the newer one.
            if Arc::ptr_eq(&snapshot, &self.validation_snapshot()) {
                break;
            }
        }
        self.validation_status()
    }

    /// The current validation snapshot. Note that a newer `validate()` call
    /// replaces it immediately.
    pub fn validation_snapshot(&self) -> Arc<ValidationSnapshot> {
        self.shared.current_snapshot()
    }

    /// The overall status of the current snapshot, if validation has run.
    pub fn validation_status(&self) -> Option<ValidationStatus> {
        self.shared.current_snapshot().overall_status()
    }

    /// Per-entry statuses of the current snapshot, keyed by path.
    pub fn entry_validation_status(&self) -> IndexMap<EntryPath, ValidationStatus> {
        self.shared.current_snapshot().entry_statuses()
    }

    /// Externally pin a validation status onto the form. The next
    /// `validate()` call replaces it.
    pub fn force_validation_status(&self, status: ValidationStatus) {
        self.shared.current_snapshot().set_overall_status(status);
    }
}

impl<T> Parameter<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Validate just this parameter synchronously against the current
    /// values: the required presence check first, then any custom sync rule.
    /// Used by renderers for immediate per-field feedback; full-form
    /// validation goes through `Form::validate`.
    pub fn validate_sync(&self) -> ValidationStatus {
        let shared = self.shared();
        let Some(job) = shared.job_at(self.path()) else {
            return ValidationStatus::ok();
        };
        let values = shared.store().root().clone();
        job.parameter_sync_status(&values)
    }

    /// Validate just this parameter asynchronously against the current
    /// values. Always `ok` when no async validator is configured.
    pub async fn validate_async(&self) -> ValidationStatus {
        let shared = self.shared();
        let Some(job) = shared.job_at(self.path()) else {
            return ValidationStatus::ok();
        };
        let values = shared.store().root().clone();
        job.parameter_async_status(&values).await
    }
}
