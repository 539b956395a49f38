//! Change/validate event bus
//!
//! Per-form emitter with synchronous, same-tick dispatch. Handlers are
//! invoked without any internal lock held, so they are free to re-enter the
//! form (the computed-value pattern: a change handler that writes other
//! values back into the form).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::path::EntryPath;
use crate::snapshot::ValidationSnapshot;
use crate::store::{subtree_of, FormValues};

/// Handle returned by `on_change`/`on_validate`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type ChangeHandler = Arc<dyn Fn(&FormValues, &FormValues) + Send + Sync>;
type ValidateHandler = Arc<dyn Fn(&Arc<ValidationSnapshot>) + Send + Sync>;

struct ChangeListener {
    id: u64,
    /// Listeners registered through a subform handle only see changes within
    /// that subform's subtree, delivered as subtree values.
    scope: EntryPath,
    handler: ChangeHandler,
}

struct ValidateListener {
    id: u64,
    handler: ValidateHandler,
}

#[derive(Default)]
pub(crate) struct Emitter {
    next_id: AtomicU64,
    change: Mutex<Vec<ChangeListener>>,
    validate: Mutex<Vec<ValidateListener>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change(&self, scope: EntryPath, handler: ChangeHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.change.lock() {
            listeners.push(ChangeListener { id, scope, handler });
        }
        Subscription(id)
    }

    pub fn on_validate(&self, handler: ValidateHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.validate.lock() {
            listeners.push(ValidateListener { id, handler });
        }
        Subscription(id)
    }

    pub fn off(&self, subscription: Subscription) {
        if let Ok(mut listeners) = self.change.lock() {
            listeners.retain(|l| l.id != subscription.0);
        }
        if let Ok(mut listeners) = self.validate.lock() {
            listeners.retain(|l| l.id != subscription.0);
        }
    }

    /// Notify change listeners. Root-scoped listeners always fire; scoped
    /// listeners fire only when their subtree actually changed, and receive
    /// subtree values.
    pub fn emit_change(&self, new_values: &FormValues, old_values: &FormValues) {
        let listeners: Vec<(EntryPath, ChangeHandler)> = match self.change.lock() {
            Ok(listeners) => listeners
                .iter()
                .map(|l| (l.scope.clone(), l.handler.clone()))
                .collect(),
            Err(_) => return,
        };
        for (scope, handler) in listeners {
            if scope.is_root() {
                handler(new_values, old_values);
            } else {
                let new_subtree = subtree_of(new_values, &scope);
                let old_subtree = subtree_of(old_values, &scope);
                if new_subtree != old_subtree {
                    handler(&new_subtree, &old_subtree);
                }
            }
        }
    }

    /// Notify validate listeners with a snapshot.
    pub fn emit_validate(&self, snapshot: &Arc<ValidationSnapshot>) {
        let listeners: Vec<ValidateHandler> = match self.validate.lock() {
            Ok(listeners) => listeners.iter().map(|l| l.handler.clone()).collect(),
            Err(_) => return,
        };
        for handler in listeners {
            handler(snapshot);
        }
    }
}
