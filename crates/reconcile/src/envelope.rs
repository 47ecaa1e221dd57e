//! JSON envelopes exchanged with the framework
//!
//! States travel as raw JSON so one request type serves every resource type;
//! [`invoke`] decodes them into the handler's model.

use crate::context::CallbackContext;
use crate::handler::ResourceHandler;
use crate::machine::reconcile;
use crate::stabilize::StabilizationPolicy;
use crate::types::{ErrorKind, Operation, Outcome, Request, Resolved};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One invocation as the framework sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerRequest {
    pub operation: Operation,
    pub resource_type: String,
    #[serde(default)]
    pub desired_state: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_context: Option<CallbackContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Progress status of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Failed,
    InProgress,
}

/// One invocation's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_model: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_models: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_context: Option<CallbackContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_delay_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl HandlerResponse {
    fn empty(status: Status) -> Self {
        Self {
            status,
            resource_model: None,
            resource_models: None,
            callback_context: None,
            callback_delay_seconds: None,
            error_code: None,
            message: None,
            next_token: None,
        }
    }

    /// A failed response
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(kind),
            message: Some(message.into()),
            ..Self::empty(Status::Failed)
        }
    }

    /// Encode an outcome
    pub fn from_outcome<M: Serialize>(outcome: Outcome<M>) -> Self {
        match outcome {
            Outcome::Success(resolved) => match encode_resolved(resolved) {
                Ok(response) => response,
                Err(err) => Self::failed(
                    ErrorKind::GeneralServiceException,
                    format!("could not encode result: {err}"),
                ),
            },
            Outcome::InProgress {
                context,
                delay_seconds,
            } => Self {
                callback_context: Some(context),
                callback_delay_seconds: Some(delay_seconds),
                ..Self::empty(Status::InProgress)
            },
            Outcome::Failed { kind, message } => Self::failed(kind, message),
        }
    }

    /// Check if no further invocation is expected
    pub fn is_terminal(&self) -> bool {
        self.status != Status::InProgress
    }
}

fn encode_resolved<M: Serialize>(resolved: Resolved<M>) -> serde_json::Result<HandlerResponse> {
    let response = match resolved {
        Resolved::Model(model) => HandlerResponse {
            resource_model: Some(serde_json::to_value(model)?),
            ..HandlerResponse::empty(Status::Success)
        },
        Resolved::Page { models, next_token } => HandlerResponse {
            resource_models: Some(
                models
                    .into_iter()
                    .map(serde_json::to_value)
                    .collect::<serde_json::Result<_>>()?,
            ),
            next_token,
            ..HandlerResponse::empty(Status::Success)
        },
        Resolved::Deleted => HandlerResponse::empty(Status::Success),
    };
    Ok(response)
}

fn decode<M: DeserializeOwned>(label: &str, value: Value) -> Result<M, String> {
    // Read, delete and list requests may carry no desired state at all
    let value = if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| format!("invalid {label}: {e}"))
}

/// Decode a request, run one invocation, and encode the outcome
pub fn invoke<H: ResourceHandler>(
    handler: &H,
    request: HandlerRequest,
    policy: &StabilizationPolicy,
) -> HandlerResponse {
    if request.resource_type != handler.type_name() {
        return HandlerResponse::failed(
            ErrorKind::InvalidRequest,
            format!(
                "handler for {} cannot serve {}",
                handler.type_name(),
                request.resource_type
            ),
        );
    }

    let desired: H::Model = match decode("desiredState", request.desired_state) {
        Ok(model) => model,
        Err(message) => return HandlerResponse::failed(ErrorKind::InvalidRequest, message),
    };
    let previous = match request.previous_state.map(|v| decode("previousState", v)) {
        None => None,
        Some(Ok(model)) => Some(model),
        Some(Err(message)) => return HandlerResponse::failed(ErrorKind::InvalidRequest, message),
    };

    let decoded = Request {
        operation: request.operation,
        desired,
        previous,
        next_token: request.next_token,
    };
    HandlerResponse::from_outcome(reconcile(
        handler,
        &decoded,
        request.callback_context,
        policy,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Step;
    use crate::handler::{StepResult, Transition};
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Widget {
        #[serde(default)]
        name: Option<String>,
    }

    struct Widgets;

    impl ResourceHandler for Widgets {
        type Model = Widget;

        fn type_name(&self) -> &'static str {
            "Test::Widget"
        }

        fn step(
            &self,
            request: &Request<Widget>,
            _step: Step,
            _context: &mut CallbackContext,
        ) -> StepResult<Widget> {
            match request.operation {
                Operation::Delete => Ok(Transition::Done(Resolved::Deleted)),
                Operation::List => Ok(Transition::Done(Resolved::Page {
                    models: vec![request.desired.clone()],
                    next_token: Some("2".to_string()),
                })),
                _ => Ok(Transition::Done(Resolved::Model(request.desired.clone()))),
            }
        }
    }

    fn parse(value: Value) -> HandlerRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_success_carries_model() {
        let request = parse(json!({
            "operation": "READ",
            "resourceType": "Test::Widget",
            "desiredState": { "Name": "a" }
        }));
        let response = invoke(&Widgets, request, &StabilizationPolicy::default());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "status": "SUCCESS", "resourceModel": { "Name": "a" } })
        );
    }

    #[test]
    fn test_list_carries_page_token() {
        let request = parse(json!({
            "operation": "LIST",
            "resourceType": "Test::Widget",
            "nextToken": "1"
        }));
        let response = invoke(&Widgets, request, &StabilizationPolicy::default());
        assert_eq!(response.resource_models.as_ref().map(Vec::len), Some(1));
        assert_eq!(response.next_token.as_deref(), Some("2"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let request = parse(json!({
            "operation": "DELETE",
            "resourceType": "Test::Gadget"
        }));
        let response = invoke(&Widgets, request, &StabilizationPolicy::default());
        assert_eq!(response.status, Status::Failed);
        assert_eq!(response.error_code, Some(ErrorKind::InvalidRequest));
    }

    #[test]
    fn test_in_progress_encoding() {
        let outcome: Outcome<Widget> = Outcome::InProgress {
            context: CallbackContext::new(149),
            delay_seconds: 10,
        };
        let response = HandlerResponse::from_outcome(outcome);
        assert!(!response.is_terminal());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "IN_PROGRESS",
                "callbackContext": { "retriesRemaining": 149 },
                "callbackDelaySeconds": 10
            })
        );
    }

    #[test]
    fn test_failed_encoding() {
        let response = HandlerResponse::failed(ErrorKind::NotStabilized, "gave up");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "status": "FAILED", "errorCode": "NotStabilized", "message": "gave up" })
        );
    }
}
