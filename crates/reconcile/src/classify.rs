//! Maps provisioning faults onto [`ErrorKind`]
//!
//! "Still sequencing" is not an error kind: it is reported separately so the
//! driver can feed it to the stabilization policy.

use crate::types::{ErrorKind, Operation};
use wafkit::{Error, FaultCategory};

/// How the driver should treat a remote failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Stop with this kind
    Terminal(ErrorKind),
    /// The resource is not usable yet; try again later
    StillSequencing,
}

/// Classify a remote failure in the context of an operation
pub fn classify(error: &Error, operation: Operation) -> Classification {
    let classification = match error {
        Error::Fault(fault) if fault.is_missing_information() => {
            Classification::Terminal(ErrorKind::NotFound)
        }
        Error::Fault(fault) => classify_category(&fault.category, operation),
        Error::Http {
            status: Some(401 | 403),
            ..
        } => Classification::Terminal(ErrorKind::InvalidCredentials),
        Error::Http {
            status: Some(429), ..
        } => Classification::Terminal(ErrorKind::ServiceLimitExceeded),
        Error::Http {
            status: None | Some(500..=599),
            ..
        } => Classification::Terminal(ErrorKind::ServiceInternalError),
        Error::Http { .. } | Error::InvalidResponse(_) => {
            Classification::Terminal(ErrorKind::GeneralServiceException)
        }
    };
    log::debug!("{operation}: {error} classified as {classification:?}");
    classification
}

fn classify_category(category: &FaultCategory, operation: Operation) -> Classification {
    let kind = match category {
        FaultCategory::DuplicateItem => ErrorKind::AlreadyExists,
        FaultCategory::NonexistentItem => ErrorKind::NotFound,
        FaultCategory::InvalidParameter
        | FaultCategory::InvalidOperation
        | FaultCategory::InvalidResource
        | FaultCategory::TagOperation
        | FaultCategory::SubscriptionNotFound => ErrorKind::InvalidRequest,
        FaultCategory::LimitsExceeded | FaultCategory::Throttling => {
            ErrorKind::ServiceLimitExceeded
        }
        FaultCategory::ServiceLinkedRoleError => {
            // Role creation lags behind the first create or update
            if matches!(operation, Operation::Create | Operation::Update) {
                return Classification::StillSequencing;
            }
            ErrorKind::ServiceLimitExceeded
        }
        FaultCategory::InternalError | FaultCategory::TagOperationInternalError => {
            ErrorKind::ServiceInternalError
        }
        FaultCategory::OptimisticLock | FaultCategory::AssociatedItem => {
            ErrorKind::ResourceConflict
        }
        FaultCategory::UnavailableEntity => return Classification::StillSequencing,
        FaultCategory::AccessDenied => ErrorKind::InvalidCredentials,
        FaultCategory::Unknown(_) => ErrorKind::GeneralServiceException,
    };
    Classification::Terminal(kind)
}
