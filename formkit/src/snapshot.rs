//! Validation snapshots
//!
//! Each call to `Form::validate()` produces a fresh, versioned snapshot: a
//! copy of the values being validated plus per-entry and overall statuses.
//! The snapshot becomes the form's *current* snapshot immediately and is
//! superseded the instant a newer one is created. Supersession is expressed
//! through an explicit cancellation token rather than object identity: the
//! newer snapshot cancels the older one's token, and the orchestrator
//! consults the token at its suspension points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::path::EntryPath;
use crate::signal::CompletionSignal;
use crate::status::ValidationStatus;
use crate::store::FormValues;

/// Options for a validation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOpts {
    /// Force this validation through to the end: it cannot be canceled by
    /// subsequent `validate()` calls. Used for final validation before
    /// submission.
    pub force: bool,
}

impl ValidationOpts {
    /// Options for a forced (non-cancelable) validation run.
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// One point-in-time validation attempt.
pub struct ValidationSnapshot {
    values: FormValues,
    is_initial: bool,
    forced: bool,
    entry_status: Mutex<IndexMap<EntryPath, ValidationStatus>>,
    on_validate_sync_status: Mutex<Option<ValidationStatus>>,
    on_validate_async_status: Mutex<Option<ValidationStatus>>,
    overall_status: Mutex<Option<ValidationStatus>>,
    sync_complete: AtomicBool,
    async_complete: AtomicBool,
    cancellation: CancellationToken,
    completion: CompletionSignal,
}

impl ValidationSnapshot {
    pub(crate) fn new(values: FormValues, is_initial: bool, forced: bool) -> Self {
        let completion = if is_initial {
            // The seeded initial snapshot represents "no validation has run";
            // it must not look like an in-flight attempt.
            CompletionSignal::resolved()
        } else {
            CompletionSignal::new()
        };
        Self {
            values,
            is_initial,
            forced,
            entry_status: Mutex::new(IndexMap::new()),
            on_validate_sync_status: Mutex::new(None),
            on_validate_async_status: Mutex::new(None),
            overall_status: Mutex::new(None),
            sync_complete: AtomicBool::new(false),
            async_complete: AtomicBool::new(false),
            cancellation: CancellationToken::new(),
            completion,
        }
    }

    /// The values this snapshot was created from (copied at creation time).
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// True for the placeholder snapshot a form starts out with, before any
    /// `validate()` call.
    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    /// True when this snapshot was produced by a forced validation run.
    pub fn forced(&self) -> bool {
        self.forced
    }

    /// The status recorded for one entry.
    pub fn entry_status(&self, path: &EntryPath) -> Option<ValidationStatus> {
        self.entry_status.lock().ok()?.get(path).cloned()
    }

    /// All per-entry statuses recorded so far, in registration order.
    pub fn entry_statuses(&self) -> IndexMap<EntryPath, ValidationStatus> {
        self.entry_status
            .lock()
            .map(|map| map.clone())
            .unwrap_or_default()
    }

    /// The aggregated status, set once validation finishes (or is canceled).
    pub fn overall_status(&self) -> Option<ValidationStatus> {
        self.overall_status.lock().ok().and_then(|s| s.clone())
    }

    /// Result of the form-level synchronous validation callback, if any ran.
    pub fn on_validate_sync_status(&self) -> Option<ValidationStatus> {
        self.on_validate_sync_status.lock().ok().and_then(|s| s.clone())
    }

    /// Result of the form-level asynchronous validation callback, if any ran.
    pub fn on_validate_async_status(&self) -> Option<ValidationStatus> {
        self.on_validate_async_status.lock().ok().and_then(|s| s.clone())
    }

    /// True once the synchronous validation pass has finished.
    pub fn sync_validation_complete(&self) -> bool {
        self.sync_complete.load(Ordering::Acquire)
    }

    /// True once the asynchronous validation pass has finished.
    pub fn async_validation_complete(&self) -> bool {
        self.async_complete.load(Ordering::Acquire)
    }

    /// True once this snapshot has been superseded by a newer one.
    pub fn is_superseded(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Wait until this snapshot's validation resolves (successfully or via
    /// cancellation).
    pub async fn wait(&self) {
        self.completion.wait().await;
    }

    // --- Internal mutation, used by the orchestrator ---

    pub(crate) fn set_entry_status(&self, path: EntryPath, status: ValidationStatus) {
        if let Ok(mut map) = self.entry_status.lock() {
            map.insert(path, status);
        }
    }

    pub(crate) fn set_on_validate_sync_status(&self, status: ValidationStatus) {
        if let Ok(mut slot) = self.on_validate_sync_status.lock() {
            *slot = Some(status);
        }
    }

    pub(crate) fn set_on_validate_async_status(&self, status: ValidationStatus) {
        if let Ok(mut slot) = self.on_validate_async_status.lock() {
            *slot = Some(status);
        }
    }

    pub(crate) fn set_overall_status(&self, status: ValidationStatus) {
        if let Ok(mut slot) = self.overall_status.lock() {
            *slot = Some(status);
        }
    }

    pub(crate) fn mark_sync_complete(&self) {
        self.sync_complete.store(true, Ordering::Release);
    }

    pub(crate) fn mark_async_complete(&self) {
        self.async_complete.store(true, Ordering::Release);
    }

    /// Cancel this snapshot's token. Called when a newer snapshot supersedes
    /// it; forced runs ignore their token.
    pub(crate) fn supersede(&self) {
        self.cancellation.cancel();
    }

    pub(crate) fn resolve_completion(&self) {
        self.completion.resolve();
    }

    pub(crate) fn completion_resolved(&self) -> bool {
        self.completion.is_resolved()
    }
}
