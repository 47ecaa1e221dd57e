//! The reconciliation driver
//!
//! One call to [`reconcile`] is one invocation. Steps run back to back until
//! the handler finishes, fails, or reports that the remote side is not ready.
//! In the last case the current step and the decremented budget go into the
//! returned context so the next invocation resumes at exactly that step.

use crate::classify::{Classification, classify};
use crate::context::{CallbackContext, Step};
use crate::handler::{ResourceHandler, StepError, Transition};
use crate::stabilize::StabilizationPolicy;
use crate::types::{ErrorKind, Outcome, Request};

/// Upper bound on steps within one invocation.
const MAX_STEPS: usize = 32;

/// Run one invocation of `handler`
///
/// `context` is whatever the previous invocation returned, or `None` on the
/// first one.
pub fn reconcile<H: ResourceHandler>(
    handler: &H,
    request: &Request<H::Model>,
    context: Option<CallbackContext>,
    policy: &StabilizationPolicy,
) -> Outcome<H::Model> {
    let mut context = context.unwrap_or_else(|| policy.fresh_context());
    let mut step = context.resume_step();
    let resource_type = handler.type_name();
    let operation = request.operation;

    for _ in 0..MAX_STEPS {
        log::debug!("{resource_type} {operation}: {step}");
        let error = match handler.step(request, step, &mut context) {
            Ok(Transition::Next(next)) => {
                step = next;
                continue;
            }
            Ok(Transition::Done(resolved)) => {
                log::info!("{resource_type} {operation}: done");
                return Outcome::Success(resolved);
            }
            Err(error) => error,
        };

        return match error {
            StepError::Invalid(message) => Outcome::failed(ErrorKind::InvalidRequest, message),
            StepError::Failed { kind, message } => Outcome::failed(kind, message),
            StepError::Pending(reason) => suspend(context, step, &reason, policy),
            StepError::Remote(err) => match classify(&err, operation) {
                Classification::StillSequencing => suspend(context, step, &err.to_string(), policy),
                Classification::Terminal(kind) => {
                    let message = err
                        .as_fault()
                        .map_or_else(|| err.to_string(), |fault| fault.message.clone());
                    Outcome::failed(kind, message)
                }
            },
        };
    }

    Outcome::failed(
        ErrorKind::GeneralServiceException,
        format!("{resource_type} {operation} did not finish within {MAX_STEPS} steps"),
    )
}

/// Hand control back to the framework, or give up if the budget is spent.
fn suspend<M>(
    mut context: CallbackContext,
    step: Step,
    reason: &str,
    policy: &StabilizationPolicy,
) -> Outcome<M> {
    if !policy.should_continue(context.retries_remaining) {
        log::warn!("retry budget exhausted at {step}: {reason}");
        return Outcome::failed(
            ErrorKind::NotStabilized,
            format!("resource did not stabilize: {reason}"),
        );
    }

    context.retries_remaining = policy.next_remaining(context.retries_remaining);
    context.stage = Some(step);
    log::info!(
        "not ready at {step} ({reason}), {} attempts left",
        context.retries_remaining
    );
    Outcome::InProgress {
        context,
        delay_seconds: policy.delay_seconds(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Operation, Resolved};
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use wafkit::types::{IpAddressVersion, IpSet};
    use wafkit::{Backend, Fault, FaultCategory, MockBackend, Scope};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Named {
        name: String,
    }

    /// Creates an IP set, then reads it back.
    struct IpSets<'a> {
        backend: &'a MockBackend,
    }

    impl ResourceHandler for IpSets<'_> {
        type Model = Named;

        fn type_name(&self) -> &'static str {
            "Test::IPSet"
        }

        fn step(
            &self,
            request: &Request<Named>,
            step: Step,
            context: &mut CallbackContext,
        ) -> crate::handler::StepResult<Named> {
            match step {
                Step::Start if request.desired.name.is_empty() => {
                    Err(StepError::invalid("Name is required"))
                }
                Step::Start => Ok(Transition::Next(Step::Mutate)),
                Step::Mutate => {
                    let set = IpSet {
                        name: request.desired.name.clone(),
                        id: None,
                        arn: None,
                        description: None,
                        ip_address_version: IpAddressVersion::Ipv4,
                        addresses: vec![],
                    };
                    let summary = self.backend.create_ip_set(Scope::Regional, &set, &[])?;
                    context.capture(Some(&summary.id), Some(&summary.arn));
                    Ok(Transition::Next(Step::Finalize))
                }
                _ => Ok(Transition::Done(Resolved::Model(request.desired.clone()))),
            }
        }
    }

    fn request(name: &str) -> Request<Named> {
        Request::new(
            Operation::Create,
            Named {
                name: name.to_string(),
            },
        )
    }

    fn sequencing() -> Fault {
        Fault::new(FaultCategory::UnavailableEntity, "still sequencing")
    }

    /// Re-invoke with the returned context until a terminal outcome.
    fn converge(
        handler: &IpSets<'_>,
        policy: &StabilizationPolicy,
    ) -> (usize, Outcome<Named>) {
        let request = request("office");
        let mut context = None;
        let mut in_progress = 0;
        loop {
            match reconcile(handler, &request, context.take(), policy) {
                Outcome::InProgress {
                    context: next,
                    delay_seconds,
                } => {
                    assert_eq!(delay_seconds, 10);
                    in_progress += 1;
                    context = Some(next);
                }
                terminal => return (in_progress, terminal),
            }
        }
    }

    #[test]
    fn test_suspends_and_resumes_at_the_same_step() {
        let backend = MockBackend::new();
        backend.fail_next("CreateIPSet", sequencing());
        let handler = IpSets { backend: &backend };
        let policy = StabilizationPolicy::default();

        let first = reconcile(&handler, &request("office"), None, &policy);
        let Outcome::InProgress { context, .. } = first else {
            panic!("expected InProgress, got {first:?}");
        };
        assert_eq!(context.retries_remaining, 149);
        assert_eq!(context.stage, Some(Step::Mutate));

        let second = reconcile(&handler, &request("office"), Some(context), &policy);
        assert!(second.is_success());
        assert_eq!(backend.call_count("CreateIPSet"), 2);
    }

    #[test]
    fn test_budget_bounds_in_progress_responses() {
        let backend = MockBackend::new();
        backend.fail_times("CreateIPSet", sequencing(), 1000);
        let handler = IpSets { backend: &backend };

        let (in_progress, outcome) = converge(&handler, &StabilizationPolicy::default());
        assert_eq!(in_progress, 150);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NotStabilized));
    }

    #[test]
    fn test_fewer_sequencing_faults_than_budget() {
        let backend = MockBackend::new();
        backend.fail_times("CreateIPSet", sequencing(), 7);
        let handler = IpSets { backend: &backend };

        let (in_progress, outcome) = converge(&handler, &StabilizationPolicy::default());
        assert_eq!(in_progress, 7);
        assert!(outcome.is_success());
    }

    #[test]
    fn test_small_budget() {
        let backend = MockBackend::new();
        backend.fail_times("CreateIPSet", sequencing(), 10);
        let handler = IpSets { backend: &backend };
        let policy =
            StabilizationPolicy::from_window(Duration::from_secs(10), Duration::from_secs(30));

        let (in_progress, outcome) = converge(&handler, &policy);
        assert_eq!(in_progress, 3);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NotStabilized));
    }

    #[test]
    fn test_validation_failure_makes_no_calls() {
        let backend = MockBackend::new();
        let handler = IpSets { backend: &backend };

        let outcome = reconcile(&handler, &request(""), None, &StabilizationPolicy::default());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidRequest));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_remote_message_is_kept_verbatim() {
        let backend = MockBackend::new();
        backend.fail_next(
            "CreateIPSet",
            Fault::new(FaultCategory::LimitsExceeded, "You have reached the IP set limit."),
        );
        let handler = IpSets { backend: &backend };

        let outcome = reconcile(
            &handler,
            &request("office"),
            None,
            &StabilizationPolicy::default(),
        );
        assert_eq!(
            outcome,
            Outcome::failed(
                ErrorKind::ServiceLimitExceeded,
                "You have reached the IP set limit."
            )
        );
    }
}
