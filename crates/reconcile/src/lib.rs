//! # Reconcile
//!
//! Resumable reconciliation of declarative resources against a remote
//! provisioning API.
//!
//! ## Core Concepts
//!
//! - **Handler**: runs single steps of create/read/update/delete/list for one
//!   resource type ([`ResourceHandler`])
//! - **Driver**: loops over steps, classifies remote faults and suspends when
//!   the remote side is not ready ([`reconcile`])
//! - **Context**: the only state that survives between invocations
//!   ([`CallbackContext`])
//! - **Policy**: how long to keep trying ([`StabilizationPolicy`])
//!
//! ## Example
//!
//! ```
//! use reconcile::{
//!     CallbackContext, Operation, Outcome, Request, Resolved, ResourceHandler,
//!     StabilizationPolicy, Step, StepResult, Transition, reconcile,
//! };
//!
//! struct Echo;
//!
//! impl ResourceHandler for Echo {
//!     type Model = String;
//!
//!     fn type_name(&self) -> &'static str {
//!         "Example::Echo"
//!     }
//!
//!     fn step(
//!         &self,
//!         request: &Request<String>,
//!         _step: Step,
//!         _context: &mut CallbackContext,
//!     ) -> StepResult<String> {
//!         Ok(Transition::Done(Resolved::Model(request.desired.clone())))
//!     }
//! }
//!
//! let request = Request::new(Operation::Read, "hello".to_string());
//! let outcome = reconcile(&Echo, &request, None, &StabilizationPolicy::default());
//! assert_eq!(outcome, Outcome::Success(Resolved::Model("hello".to_string())));
//! ```
//!
//! ## Suspension
//!
//! A step that cannot finish yet returns [`StepError::Pending`], or fails
//! with a fault that classifies as still sequencing. The driver then returns
//! [`Outcome::InProgress`] with the step recorded in the context, unless the
//! retry budget is spent, in which case the outcome is
//! [`ErrorKind::NotStabilized`].

pub mod classify;
pub mod context;
pub mod envelope;
pub mod handler;
pub mod machine;
pub mod stabilize;
pub mod token;
pub mod types;

// Re-export main types at crate root
pub use classify::{Classification, classify};
pub use context::{CallbackContext, Step};
pub use envelope::{HandlerRequest, HandlerResponse, Status, invoke};
pub use handler::{ResourceHandler, StepError, StepResult, Transition};
pub use machine::reconcile;
pub use stabilize::StabilizationPolicy;
pub use token::{fetch_token, with_fresh_token};
pub use types::{ErrorKind, Operation, Outcome, Request, Resolved};
