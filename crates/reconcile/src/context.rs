//! Continuation state carried between invocations
//!
//! The framework hands the context back verbatim on the next invocation.
//! Nothing here is persisted by this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a handler is in its flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    /// Validate input
    Start,
    /// Look at the remote side before mutating
    CheckExisting,
    /// Issue the create, update or delete call
    Mutate,
    /// Bring tags in line
    SyncTags,
    /// Poll until a delete is visible
    AwaitDeletion,
    /// Read back the final state
    Finalize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::CheckExisting => "check-existing",
            Self::Mutate => "mutate",
            Self::SyncTags => "sync-tags",
            Self::AwaitDeletion => "await-deletion",
            Self::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Continuation context for one reconciliation attempt
///
/// Optional members are omitted from JSON when absent and read back as
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackContext {
    /// Attempts left before giving up
    pub retries_remaining: i32,
    /// Step to resume at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Step>,
    /// Identifier assigned by the service, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_id: Option<String>,
    /// ARN assigned by the service, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_arn: Option<String>,
}

impl CallbackContext {
    /// A fresh context with the given budget
    pub fn new(retries_remaining: i32) -> Self {
        Self {
            retries_remaining,
            stage: None,
            captured_id: None,
            captured_arn: None,
        }
    }

    /// Step to start or resume at
    pub fn resume_step(&self) -> Step {
        self.stage.unwrap_or(Step::Start)
    }

    /// Remember the identity the service assigned
    pub fn capture(&mut self, id: Option<&str>, arn: Option<&str>) {
        if let Some(id) = id {
            self.captured_id = Some(id.to_string());
        }
        if let Some(arn) = arn {
            self.captured_arn = Some(arn.to_string());
        }
    }
}
