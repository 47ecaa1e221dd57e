//! Error types for provisioning API calls.
//!
//! Remote failures arrive as typed [`Fault`]s carrying the service's fault
//! name and message. Transport problems and undecodable payloads are kept
//! separate so callers can tell "the service said no" from "we never got a
//! usable answer".

use std::fmt;
use thiserror::Error;

/// Result type alias for provisioning API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message prefix the service uses when identifying input was absent.
///
/// Whatever category such a fault carries, it means the resource never
/// existed.
pub const MISSING_INFORMATION_PREFIX: &str = "Critical information is missing";

/// Fault categories reported by the provisioning API.
///
/// The service names each fault (`WAFNonexistentItemException`, ...); this
/// enum is the closed set the rest of the workspace reasons about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FaultCategory {
    /// An item with the same name already exists in the scope.
    DuplicateItem,
    /// The referenced item does not exist.
    NonexistentItem,
    /// A parameter failed service-side validation.
    InvalidParameter,
    /// The operation is not valid for the item's current state.
    InvalidOperation,
    /// An account or resource limit would be exceeded.
    LimitsExceeded,
    /// The service-linked role could not be created or used.
    ServiceLinkedRoleError,
    /// The service failed internally.
    InternalError,
    /// The supplied mutation token is stale.
    OptimisticLock,
    /// The item is still referenced by another resource.
    AssociatedItem,
    /// The item exists but is still being sequenced and cannot be used yet.
    UnavailableEntity,
    /// A tagging request was rejected.
    TagOperation,
    /// Tagging failed internally.
    TagOperationInternalError,
    /// The resource referenced by ARN is not valid for this operation.
    InvalidResource,
    /// A required subscription is missing.
    SubscriptionNotFound,
    /// The caller is not allowed to perform the operation.
    AccessDenied,
    /// The caller is being rate limited.
    Throttling,
    /// A fault name this crate does not know.
    Unknown(String),
}

impl FaultCategory {
    /// Parse a wire fault name.
    ///
    /// Accepts both the bare name and the namespaced form
    /// (`com.amazonaws.wafv2#WAFNonexistentItemException`).
    pub fn from_type_name(name: &str) -> Self {
        let bare = name.rsplit('#').next().unwrap_or(name);
        let bare = bare.split(':').next().unwrap_or(bare).trim();
        match bare {
            "WAFDuplicateItemException" => Self::DuplicateItem,
            "WAFNonexistentItemException" => Self::NonexistentItem,
            "WAFInvalidParameterException" => Self::InvalidParameter,
            "WAFInvalidOperationException" => Self::InvalidOperation,
            "WAFLimitsExceededException" => Self::LimitsExceeded,
            "WAFServiceLinkedRoleErrorException" => Self::ServiceLinkedRoleError,
            "WAFInternalErrorException" => Self::InternalError,
            "WAFOptimisticLockException" => Self::OptimisticLock,
            "WAFAssociatedItemException" => Self::AssociatedItem,
            "WAFUnavailableEntityException" => Self::UnavailableEntity,
            "WAFTagOperationException" => Self::TagOperation,
            "WAFTagOperationInternalErrorException" => Self::TagOperationInternalError,
            "WAFInvalidResourceException" => Self::InvalidResource,
            "WAFSubscriptionNotFoundException" => Self::SubscriptionNotFound,
            "AccessDeniedException" => Self::AccessDenied,
            "ThrottlingException" | "TooManyRequestsException" => Self::Throttling,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire name of this fault.
    pub fn type_name(&self) -> &str {
        match self {
            Self::DuplicateItem => "WAFDuplicateItemException",
            Self::NonexistentItem => "WAFNonexistentItemException",
            Self::InvalidParameter => "WAFInvalidParameterException",
            Self::InvalidOperation => "WAFInvalidOperationException",
            Self::LimitsExceeded => "WAFLimitsExceededException",
            Self::ServiceLinkedRoleError => "WAFServiceLinkedRoleErrorException",
            Self::InternalError => "WAFInternalErrorException",
            Self::OptimisticLock => "WAFOptimisticLockException",
            Self::AssociatedItem => "WAFAssociatedItemException",
            Self::UnavailableEntity => "WAFUnavailableEntityException",
            Self::TagOperation => "WAFTagOperationException",
            Self::TagOperationInternalError => "WAFTagOperationInternalErrorException",
            Self::InvalidResource => "WAFInvalidResourceException",
            Self::SubscriptionNotFound => "WAFSubscriptionNotFoundException",
            Self::AccessDenied => "AccessDeniedException",
            Self::Throttling => "ThrottlingException",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A typed fault returned by the provisioning API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category}: {message}")]
pub struct Fault {
    /// What kind of fault this is.
    pub category: FaultCategory,
    /// The service's message, kept verbatim.
    pub message: String,
}

impl Fault {
    /// Create a fault.
    pub fn new(category: FaultCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// Whether the service complained that identifying input was absent.
    pub fn is_missing_information(&self) -> bool {
        self.message.starts_with(MISSING_INFORMATION_PREFIX)
    }
}

/// Errors that can occur while talking to the provisioning API.
#[derive(Debug, Error)]
pub enum Error {
    /// The service answered with a typed fault.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// The request did not produce a usable HTTP exchange.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Create a fault error.
    pub fn fault(category: FaultCategory, message: impl Into<String>) -> Self {
        Self::Fault(Fault::new(category, message))
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// The typed fault, if the service produced one.
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Whether this fault means the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.as_fault().is_some_and(|fault| {
            fault.category == FaultCategory::NonexistentItem || fault.is_missing_information()
        })
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
