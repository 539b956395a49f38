//! Action lifecycle
//!
//! An [`Action`] pairs a form with the operation it configures: load data,
//! build the form, and — once the user submits — validate with `force` so the
//! result can never be superseded, then run the operation. [`ActionHost`]
//! drives that lifecycle and exposes one-shot wait points for UI code.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use formkit::{CompletionSignal, Form, FormValues, ValidationOpts, ValidationStatus};

use crate::error::{ActionError, ActionResult};

/// A user-defined action backed by a form.
#[async_trait]
pub trait Action: Send + Sync + 'static {
    /// A globally unique friendly name, used for logging.
    fn action_name(&self) -> &str;

    /// Load whatever the action needs and produce the form's initial values.
    async fn on_initialize(&self) -> ActionResult<FormValues>;

    /// Construct the action's form from the initial values. Entries are
    /// attached here; the host calls `initialize()` on the result.
    fn build_form(&self, initial_values: FormValues) -> formkit::Result<Form>;

    /// Perform the operation with the validated form values.
    async fn on_execute(&self, values: FormValues) -> ActionResult<()>;

    /// Optional form-level synchronous validation.
    fn on_validate_sync(&self, _values: &FormValues) -> ValidationStatus {
        ValidationStatus::ok()
    }

    /// Optional form-level asynchronous validation.
    async fn on_validate_async(&self, _values: FormValues) -> ValidationStatus {
        ValidationStatus::ok()
    }
}

/// The result of one `execute()` run, success or failure.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    /// Failure detail when `on_execute` failed
    pub error: Option<String>,
    /// The validation status the run ended with
    pub validation_status: ValidationStatus,
}

struct HostState {
    form: Option<Form>,
    is_initialized: bool,
    is_initializing: bool,
    initialization: CompletionSignal,
    is_executing: bool,
    execution: CompletionSignal,
    last_result: Option<ExecutionResult>,
}

/// Drives an [`Action`] through initialization and execution.
pub struct ActionHost<A: Action> {
    action: Arc<A>,
    state: Mutex<HostState>,
}

impl<A: Action> ActionHost<A> {
    pub fn new(action: A) -> Self {
        Self {
            action: Arc::new(action),
            state: Mutex::new(HostState {
                form: None,
                is_initialized: false,
                is_initializing: false,
                initialization: CompletionSignal::new(),
                is_executing: false,
                execution: CompletionSignal::new(),
                last_result: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The underlying action.
    pub fn action(&self) -> &A {
        self.action.as_ref()
    }

    /// The action's form. Only available after `initialize()` succeeds.
    pub fn form(&self) -> ActionResult<Form> {
        self.state().form.clone().ok_or(ActionError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.state().is_initialized
    }

    /// The result of the most recent `execute()` run, if any.
    pub fn last_execution_result(&self) -> Option<ExecutionResult> {
        self.state().last_result.clone()
    }

    /// Run `on_initialize`, build and initialize the form, and wire the
    /// action's validation hooks into it.
    ///
    /// The initialization signal always resolves, even on failure — waiting
    /// for initialization is not where errors are handled; they surface from
    /// this method instead.
    pub async fn initialize(&self) -> ActionResult<()> {
        self.state().is_initializing = true;
        let outcome = self.initialize_inner().await;

        let mut state = self.state();
        state.is_initializing = false;
        if outcome.is_ok() {
            state.is_initialized = true;
        }
        state.initialization.resolve();
        outcome
    }

    async fn initialize_inner(&self) -> ActionResult<()> {
        let initial_values = self.action.on_initialize().await?;
        let form = self.action.build_form(initial_values)?;

        let action = self.action.clone();
        form.set_on_validate_sync(move |values| action.on_validate_sync(values));
        let action = self.action.clone();
        form.set_on_validate_async(move |values| {
            let action = action.clone();
            async move { action.on_validate_async(values).await }
        });

        form.initialize()?;
        self.state().form = Some(form);
        Ok(())
    }

    /// Resolves once any in-flight initialization finishes. Immediate when
    /// none is running.
    pub async fn wait_for_initialization(&self) {
        let signal = {
            let state = self.state();
            if !state.is_initializing || state.initialization.is_resolved() {
                return;
            }
            state.initialization.clone()
        };
        signal.wait().await;
    }

    /// Resolves once any in-flight execution finishes, returning its result.
    /// Immediate when none is running.
    pub async fn wait_for_execution(&self) -> Option<ExecutionResult> {
        let signal = {
            let state = self.state();
            if !state.is_executing {
                return if state.execution.is_resolved() {
                    state.last_result.clone()
                } else {
                    None
                };
            }
            state.execution.clone()
        };
        signal.wait().await;
        self.last_execution_result()
    }

    /// Validate with `force` and, if the form is valid, run `on_execute`.
    ///
    /// A forced validation can never be superseded, so exactly this code path
    /// always gets a conclusive, non-canceled status. Validation failure is a
    /// normal unsuccessful result, not an error; an execution failure
    /// additionally pins its status onto the form for display.
    pub async fn execute(&self) -> ActionResult<ExecutionResult> {
        let form = self.form()?;
        {
            let mut state = self.state();
            state.is_executing = true;
            if state.execution.is_resolved() {
                // Re-arm for this run; execution can happen again and again.
                state.execution = CompletionSignal::new();
            }
        }

        let outcome = self.execute_inner(&form).await;

        let mut state = self.state();
        state.is_executing = false;
        match outcome {
            Ok(result) => {
                state.last_result = Some(result.clone());
                state.execution.resolve();
                drop(state);
                // An on_execute failure pins its status onto the form for
                // display; a plain validation failure already left its own
                // status there.
                if !result.success && result.error.is_some() {
                    form.force_validation_status(result.validation_status.clone());
                }
                Ok(result)
            }
            Err(error) => {
                state.execution.resolve();
                Err(error)
            }
        }
    }

    async fn execute_inner(&self, form: &Form) -> ActionResult<ExecutionResult> {
        // The values validation ran against, in case they change mid-flight.
        let values = form.values();

        let snapshot = form.validate(ValidationOpts::forced()).await;
        let validation_status = snapshot
            .overall_status()
            .ok_or(ActionError::MissingValidationStatus)?;

        if validation_status.is_error() {
            // Validation failed: early out without executing.
            return Ok(ExecutionResult {
                success: false,
                error: None,
                validation_status,
            });
        }

        match self.action.on_execute(values).await {
            Ok(()) => Ok(ExecutionResult {
                success: true,
                error: None,
                validation_status,
            }),
            Err(error) => {
                tracing::warn!(
                    action = self.action.action_name(),
                    %error,
                    "action failed to execute"
                );
                Ok(ExecutionResult {
                    success: false,
                    error: Some(error.to_string()),
                    validation_status: ValidationStatus::error(error.to_string()),
                })
            }
        }
    }
}
