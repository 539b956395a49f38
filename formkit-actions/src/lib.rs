//! Action lifecycle wrapper around `formkit` forms
//!
//! An action is an operation configured by a form: create a pool, edit a
//! node, scale a deployment. This crate pairs the two. [`Action`] is the
//! user-supplied half (load data, build the form, perform the operation);
//! [`ActionHost`] drives it: `initialize()` builds and seeds the form,
//! `execute()` runs a forced — and therefore conclusive — validation and only
//! invokes the operation when the form is valid.
//!
//! ## Basic usage
//!
//! ```rust,ignore
//! let host = ActionHost::new(CreatePoolAction::default());
//! host.initialize().await?;
//!
//! host.form()?.update_value("poolName", "render-farm");
//! let result = host.execute().await?;
//! if !result.success {
//!     // validation or execution failure; status is on the form for display
//! }
//! ```

mod action;
mod error;

// Re-exports
pub use action::{Action, ActionHost, ExecutionResult};
pub use error::{ActionError, ActionResult};
