//! Reactive form engine for management-console UIs
//!
//! `formkit` models a form as a tree of entries — the root form, grouping
//! sections, leaf parameters and nested subforms — addressed by dot-separated
//! paths. One value store per root form is the single source of truth for
//! every value in the tree; entry handles read and write through it.
//!
//! # Architecture
//!
//! - **Path-addressed**: one registry and one value store per root form,
//!   shared by every nested subform
//! - **Two-phase attach**: entry defs are inert builders; registration
//!   happens in an explicit `attach`, so failed construction has no side
//!   effects
//! - **Reactive**: dynamic properties (hidden, disabled, labels, ...) are
//!   re-evaluated from the current values on every change, and change/validate
//!   events dispatch synchronously
//! - **Cancelable validation**: each `validate()` call produces a versioned
//!   snapshot; rapid repeated calls debounce the async phase and supersede
//!   in-flight attempts through an explicit cancellation token, so only the
//!   last call completes
//!
//! # Basic usage
//!
//! ```rust
//! use formkit::{Form, ParameterDef, ValidationOpts, ValidationStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let form = Form::builder().title("New park").build();
//!
//! form.param::<String>(
//!     ParameterDef::new("parkName")
//!         .label("Park name")
//!         .required(true),
//! )?;
//! form.param::<String>(ParameterDef::new("state").required(true).on_validate_async(
//!     |ctx| {
//!         let value = ctx.value().as_str().map(str::to_string);
//!         async move {
//!             match value {
//!                 Some(state) if state.len() == 2 => ValidationStatus::ok(),
//!                 _ => ValidationStatus::error("State must be exactly 2 characters"),
//!             }
//!         }
//!     },
//! ))?;
//! form.initialize()?;
//!
//! form.update_value("parkName", "Yosemite");
//! form.update_value("state", "CA");
//! let snapshot = form.validate(ValidationOpts::default()).await;
//! assert!(snapshot.overall_status().is_some_and(|s| s.is_ok()));
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
mod events;
mod form;
mod parameter;
mod path;
mod registry;
mod section;
mod signal;
mod snapshot;
mod status;
mod store;
mod validate;

// Re-exports
pub use entry::{DynamicTarget, EntryKind, ValidatorContext};
pub use error::{FormError, Result};
pub use events::Subscription;
pub use form::{Form, FormBuilder, SubForm, SubFormDef};
pub use parameter::{Parameter, ParameterDef};
pub use path::EntryPath;
pub use section::{Section, SectionDef};
pub use signal::CompletionSignal;
pub use snapshot::{ValidationOpts, ValidationSnapshot};
pub use status::{ValidationLevel, ValidationStatus};
pub use store::FormValues;
