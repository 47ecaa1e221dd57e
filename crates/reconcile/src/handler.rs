//! Handler trait for one resource type
//!
//! A handler only knows how to run a single step. The driver in
//! [`crate::machine`] owns the loop, the retry budget, fault classification
//! and suspension.

use crate::context::{CallbackContext, Step};
use crate::types::{ErrorKind, Request, Resolved};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// What a successful step leads to
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<M> {
    /// Run another step in this invocation
    Next(Step),
    /// The operation is finished
    Done(Resolved<M>),
}

/// Why a step did not complete
#[derive(Debug, Error)]
pub enum StepError {
    /// Local validation failed; no remote call was made
    #[error("{0}")]
    Invalid(String),

    /// The provisioning API failed; the driver classifies it
    #[error(transparent)]
    Remote(#[from] wafkit::Error),

    /// The remote side has not converged yet; retry this step later
    #[error("{0}")]
    Pending(String),

    /// A terminal failure decided by the handler itself
    #[error("{kind}: {message}")]
    Failed { kind: ErrorKind, message: String },
}

impl StepError {
    /// Shorthand for a validation failure
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Shorthand for an explicit "not found"
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }
}

impl From<rulekit::ConversionError> for StepError {
    fn from(err: rulekit::ConversionError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Result type for one step.
pub type StepResult<M> = std::result::Result<Transition<M>, StepError>;

/// Reconciliation logic for one resource type
pub trait ResourceHandler {
    /// Declarative model of the resource
    type Model: Clone + Serialize + DeserializeOwned;

    /// Type name used in requests, e.g. `WAFv2::IPSet`
    fn type_name(&self) -> &'static str;

    /// Run one step of `request.operation`
    ///
    /// Steps may record identifiers in `context`; they survive suspension.
    fn step(
        &self,
        request: &Request<Self::Model>,
        step: Step,
        context: &mut CallbackContext,
    ) -> StepResult<Self::Model>;
}
