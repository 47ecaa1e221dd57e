//! Core types for reconciliation

use crate::context::CallbackContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the framework asked a handler to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Canonical failure taxonomy reported to the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidRequest,
    ServiceLimitExceeded,
    ResourceConflict,
    ServiceInternalError,
    InvalidCredentials,
    NotStabilized,
    GeneralServiceException,
}

impl ErrorKind {
    /// The code sent in handler responses
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::InvalidRequest => "InvalidRequest",
            Self::ServiceLimitExceeded => "ServiceLimitExceeded",
            Self::ResourceConflict => "ResourceConflict",
            Self::ServiceInternalError => "ServiceInternalError",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::NotStabilized => "NotStabilized",
            Self::GeneralServiceException => "GeneralServiceException",
        }
    }

    /// Whether re-running the same request later may succeed
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::ServiceLimitExceeded | Self::ServiceInternalError | Self::ResourceConflict
        )
    }

    /// Get a user-friendly description of this error kind
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::ServiceLimitExceeded => "Service limit exceeded",
            Self::ResourceConflict => "Conflicting concurrent change",
            Self::ServiceInternalError => "Service internal error",
            Self::InvalidCredentials => "Invalid credentials",
            Self::NotStabilized => "Resource did not stabilize",
            Self::GeneralServiceException => "Unexpected service error",
        }
    }

    /// Get actionable advice for resolving this error kind
    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            Self::NotFound => "Check the identifier and scope, the resource may have been deleted",
            Self::AlreadyExists => "Pick another name or import the existing resource",
            Self::InvalidRequest => "Fix the desired state and try again",
            Self::ServiceLimitExceeded => "Wait and retry, or request a limit increase",
            Self::ResourceConflict => "Another change is in flight, retry once it completes",
            Self::ServiceInternalError => "Retry later",
            Self::InvalidCredentials => "Check credentials and permissions for the endpoint",
            Self::NotStabilized => "The remote side never converged, check its status and retry",
            Self::GeneralServiceException => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A finished operation's result
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<M> {
    /// The resource as it now stands
    Model(M),
    /// One page of a list operation
    Page {
        models: Vec<M>,
        next_token: Option<String>,
    },
    /// The resource is gone
    Deleted,
}

/// Result of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<M> {
    /// Done
    Success(Resolved<M>),
    /// Not done yet; invoke again after the delay with this context
    InProgress {
        context: CallbackContext,
        delay_seconds: u64,
    },
    /// Done, unsuccessfully
    Failed { kind: ErrorKind, message: String },
}

impl<M> Outcome<M> {
    /// Shorthand for a failure
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Check if the outcome is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }

    /// Check if the outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure kind, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// One invocation's input, with the states already decoded
#[derive(Debug, Clone)]
pub struct Request<M> {
    pub operation: Operation,
    pub desired: M,
    pub previous: Option<M>,
    pub next_token: Option<String>,
}

impl<M> Request<M> {
    /// A request with no previous state or page token
    pub fn new(operation: Operation, desired: M) -> Self {
        Self {
            operation,
            desired,
            previous: None,
            next_token: None,
        }
    }

    /// Attach the previous state
    #[must_use]
    pub fn with_previous(mut self, previous: M) -> Self {
        self.previous = Some(previous);
        self
    }
}
