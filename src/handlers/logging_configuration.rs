//! Logging configurations
//!
//! Identified by the ARN of the web ACL they belong to. Putting a
//! configuration for a web ACL that already has one silently replaces it, so
//! create looks before it writes.

use super::common::{
    changed, reject_immutable, reject_missing, reject_read_only, require, scope_of_arn, supplied,
};
use reconcile::{
    CallbackContext, ErrorKind, Operation, Request, Resolved, ResourceHandler, Step, StepError,
    StepResult, Transition,
};
use rulekit::FieldToMatch;
use rulekit::convert::{field_from_wire, field_to_wire};
use serde::{Deserialize, Serialize};
use wafkit::Backend;
use wafkit::types::{LoggingConfiguration, LoggingFilter};

pub const TYPE_NAME: &str = "AWS::WAFv2::LoggingConfiguration";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LoggingConfigurationModel {
    /// Fixed at create time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_arn: Option<String>,
    /// Fixed at create time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_destination_configs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redacted_fields: Option<Vec<FieldToMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_filter: Option<LoggingFilter>,
    /// Computed by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_by_firewall_manager: Option<bool>,
}

impl LoggingConfigurationModel {
    fn to_wire(&self) -> Result<LoggingConfiguration, StepError> {
        let redacted_fields = self
            .redacted_fields
            .as_deref()
            .map(|fields| fields.iter().map(field_to_wire).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        Ok(LoggingConfiguration {
            resource_arn: require("ResourceArn", self.resource_arn.as_ref())?.clone(),
            log_destination_configs: require(
                "LogDestinationConfigs",
                self.log_destination_configs.as_ref(),
            )?
            .clone(),
            redacted_fields,
            managed_by_firewall_manager: None,
            logging_filter: self.logging_filter.clone(),
        })
    }

    fn from_wire(wire: &LoggingConfiguration) -> Result<Self, StepError> {
        let redacted_fields = wire
            .redacted_fields
            .as_deref()
            .map(|fields| fields.iter().map(field_from_wire).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        Ok(Self {
            resource_arn: Some(wire.resource_arn.clone()),
            log_destination_configs: Some(wire.log_destination_configs.clone()),
            redacted_fields,
            logging_filter: wire.logging_filter.clone(),
            managed_by_firewall_manager: Some(wire.managed_by_firewall_manager.unwrap_or(false)),
        })
    }
}

pub struct LoggingConfigurationHandler<'a> {
    backend: &'a dyn Backend,
}

impl<'a> LoggingConfigurationHandler<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    fn validate(request: &Request<LoggingConfigurationModel>) -> Result<(), StepError> {
        let desired = &request.desired;
        match request.operation {
            Operation::Create => {
                let missing: Vec<&str> = [
                    desired.resource_arn.is_none().then_some("ResourceArn"),
                    desired
                        .log_destination_configs
                        .is_none()
                        .then_some("LogDestinationConfigs"),
                ]
                .into_iter()
                .flatten()
                .collect();
                reject_missing(&missing)?;
                reject_read_only(
                    &supplied(
                        "ManagedByFirewallManager",
                        &desired.managed_by_firewall_manager,
                        None,
                    )
                    .into_iter()
                    .collect::<Vec<_>>(),
                )
            }
            Operation::Update => {
                require("ResourceArn", desired.resource_arn.as_ref())?;
                require("LogDestinationConfigs", desired.log_destination_configs.as_ref())?;
                let previous = request.previous.as_ref();
                if let Some(previous) = previous {
                    let immutable: Vec<&str> = [
                        changed("ResourceArn", &desired.resource_arn, &previous.resource_arn),
                        changed(
                            "LogDestinationConfigs",
                            &desired.log_destination_configs,
                            &previous.log_destination_configs,
                        ),
                    ]
                    .into_iter()
                    .flatten()
                    .collect();
                    reject_immutable(&immutable)?;
                }
                reject_read_only(
                    &supplied(
                        "ManagedByFirewallManager",
                        &desired.managed_by_firewall_manager,
                        previous.map(|p| &p.managed_by_firewall_manager),
                    )
                    .into_iter()
                    .collect::<Vec<_>>(),
                )
            }
            Operation::Read | Operation::Delete => {
                require("ResourceArn", desired.resource_arn.as_ref())?;
                Ok(())
            }
            Operation::List => Ok(()),
        }
    }

    fn read(&self, resource_arn: &str) -> Result<LoggingConfigurationModel, StepError> {
        let current = self.backend.get_logging_configuration(resource_arn)?;
        LoggingConfigurationModel::from_wire(&current)
    }

    /// Look before writing: create must not replace, update must not invent
    fn check_existing(
        &self,
        request: &Request<LoggingConfigurationModel>,
    ) -> StepResult<LoggingConfigurationModel> {
        let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
        let exists = match self.backend.get_logging_configuration(resource_arn) {
            Ok(_) => true,
            Err(err) if err.is_not_found() => false,
            Err(err) => return Err(err.into()),
        };

        match (request.operation, exists) {
            (Operation::Create, true) => Err(StepError::Failed {
                kind: ErrorKind::AlreadyExists,
                message: format!("a logging configuration already exists for {resource_arn}"),
            }),
            (Operation::Update, false) => Err(StepError::not_found(format!(
                "no logging configuration exists for {resource_arn}"
            ))),
            (Operation::Delete, false) => {
                log::info!("logging configuration for {resource_arn} is already gone");
                Ok(Transition::Done(Resolved::Deleted))
            }
            _ => Ok(Transition::Next(Step::Mutate)),
        }
    }

    fn put(
        &self,
        request: &Request<LoggingConfigurationModel>,
    ) -> StepResult<LoggingConfigurationModel> {
        let wire = request.desired.to_wire()?;
        self.backend.put_logging_configuration(&wire)?;
        log::info!("put logging configuration for {}", wire.resource_arn);
        Ok(Transition::Next(Step::Finalize))
    }

    fn delete(
        &self,
        request: &Request<LoggingConfigurationModel>,
    ) -> StepResult<LoggingConfigurationModel> {
        let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
        match self.backend.delete_logging_configuration(resource_arn) {
            Ok(()) => log::info!("deleted logging configuration for {resource_arn}"),
            Err(err) if err.is_not_found() => {
                log::info!("logging configuration for {resource_arn} is already gone");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(Transition::Done(Resolved::Deleted))
    }

    fn list(
        &self,
        request: &Request<LoggingConfigurationModel>,
    ) -> StepResult<LoggingConfigurationModel> {
        let scope = request
            .desired
            .resource_arn
            .as_deref()
            .map_or(wafkit::Scope::Regional, scope_of_arn);
        let page = self
            .backend
            .list_logging_configurations(scope, request.next_token.as_deref())?;

        let models = page
            .items
            .into_iter()
            .map(|config| LoggingConfigurationModel {
                resource_arn: Some(config.resource_arn),
                ..LoggingConfigurationModel::default()
            })
            .collect();
        Ok(Transition::Done(Resolved::Page {
            models,
            next_token: page.next_marker,
        }))
    }
}

impl ResourceHandler for LoggingConfigurationHandler<'_> {
    type Model = LoggingConfigurationModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn step(
        &self,
        request: &Request<LoggingConfigurationModel>,
        step: Step,
        _context: &mut CallbackContext,
    ) -> StepResult<LoggingConfigurationModel> {
        match (request.operation, step) {
            (Operation::List, Step::Start) => {
                Self::validate(request)?;
                self.list(request)
            }
            (Operation::Read, Step::Start) => {
                Self::validate(request)?;
                Ok(Transition::Next(Step::Finalize))
            }
            (_, Step::Start) => {
                Self::validate(request)?;
                Ok(Transition::Next(Step::CheckExisting))
            }
            (
                Operation::Create | Operation::Update | Operation::Delete,
                Step::CheckExisting,
            ) => self.check_existing(request),
            (Operation::Create | Operation::Update, Step::Mutate) => self.put(request),
            (Operation::Delete, Step::Mutate) => self.delete(request),
            (Operation::Create | Operation::Read | Operation::Update, Step::Finalize) => {
                let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
                Ok(Transition::Done(Resolved::Model(self.read(resource_arn)?)))
            }
            (operation, step) => Err(StepError::invalid(format!(
                "{TYPE_NAME} {operation} has no {step} step"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{Outcome, StabilizationPolicy, reconcile};
    use rulekit::model::JsonBody;
    use wafkit::types::{
        ActionCondition, ActionValue, Condition, DefaultAction, Filter, FilterBehavior,
        FilterRequirement, VisibilityConfig, WebAcl,
    };
    use wafkit::{Fault, FaultCategory, MockBackend, Scope};

    const FIREHOSE: &str = "arn:aws:firehose:us-east-1:123456789012:deliverystream/aws-waf-logs";

    fn web_acl(mock: &MockBackend) -> String {
        let acl = WebAcl {
            name: "edge".to_string(),
            id: None,
            arn: None,
            default_action: DefaultAction::default(),
            description: None,
            rules: vec![],
            visibility_config: VisibilityConfig {
                sampled_requests_enabled: false,
                cloud_watch_metrics_enabled: false,
                metric_name: "edge".to_string(),
            },
            capacity: None,
            label_namespace: None,
            custom_response_bodies: None,
        };
        mock.create_web_acl(Scope::Regional, &acl, &[]).unwrap().arn
    }

    fn logging(resource_arn: &str) -> LoggingConfigurationModel {
        LoggingConfigurationModel {
            resource_arn: Some(resource_arn.to_string()),
            log_destination_configs: Some(vec![FIREHOSE.to_string()]),
            redacted_fields: Some(vec![FieldToMatch::header("authorization")]),
            logging_filter: Some(LoggingFilter {
                default_behavior: FilterBehavior::Keep,
                filters: vec![Filter {
                    behavior: FilterBehavior::Drop,
                    requirement: FilterRequirement::MeetsAny,
                    conditions: vec![Condition {
                        action_condition: Some(ActionCondition {
                            action: ActionValue::Allow,
                        }),
                        label_name_condition: None,
                    }],
                }],
            }),
            managed_by_firewall_manager: None,
        }
    }

    fn model(outcome: Outcome<LoggingConfigurationModel>) -> LoggingConfigurationModel {
        match outcome {
            Outcome::Success(Resolved::Model(model)) => model,
            other => panic!("expected a model, got {other:?}"),
        }
    }

    #[test]
    fn test_create_populates_read_only_flag() {
        let mock = MockBackend::new();
        let arn = web_acl(&mock);
        let handler = LoggingConfigurationHandler::new(&mock);

        let created = model(reconcile(
            &handler,
            &Request::new(Operation::Create, logging(&arn)),
            None,
            &StabilizationPolicy::default(),
        ));
        assert_eq!(created.managed_by_firewall_manager, Some(false));
        assert_eq!(created.redacted_fields, logging(&arn).redacted_fields);
        assert_eq!(created.logging_filter, logging(&arn).logging_filter);
    }

    #[test]
    fn test_create_over_existing_is_already_exists() {
        let mock = MockBackend::new();
        let arn = web_acl(&mock);
        let handler = LoggingConfigurationHandler::new(&mock);
        let policy = StabilizationPolicy::default();
        let request = Request::new(Operation::Create, logging(&arn));

        assert!(reconcile(&handler, &request, None, &policy).is_success());
        let again = reconcile(&handler, &request, None, &policy);
        assert_eq!(again.error_kind(), Some(ErrorKind::AlreadyExists));
        assert_eq!(mock.call_count("PutLoggingConfiguration"), 1);
    }

    #[test]
    fn test_destinations_are_immutable() {
        let mock = MockBackend::new();
        let handler = LoggingConfigurationHandler::new(&mock);
        let previous = logging("arn:acl");
        let mut desired = previous.clone();
        desired.log_destination_configs = Some(vec!["arn:other".to_string()]);

        let outcome = reconcile(
            &handler,
            &Request::new(Operation::Update, desired).with_previous(previous),
            None,
            &StabilizationPolicy::default(),
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidRequest));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mock = MockBackend::new();
        let handler = LoggingConfigurationHandler::new(&mock);
        let desired = logging("arn:acl");

        let outcome = reconcile(
            &handler,
            &Request::new(Operation::Update, desired.clone()).with_previous(desired),
            None,
            &StabilizationPolicy::default(),
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NotFound));
        assert_eq!(mock.call_count("PutLoggingConfiguration"), 0);
    }

    #[test]
    fn test_redacted_json_body_uses_wire_conversion() {
        let mock = MockBackend::new();
        let arn = web_acl(&mock);
        let handler = LoggingConfigurationHandler::new(&mock);
        let mut desired = logging(&arn);
        desired.redacted_fields = Some(vec![FieldToMatch::JsonBody(JsonBody {
            match_pattern: rulekit::model::JsonMatchPattern {
                all: None,
                included_paths: Some(vec!["/password".to_string()]),
            },
            match_scope: wafkit::statement::JsonMatchScope::Value,
            invalid_fallback_behavior: None,
        })]);

        let created = model(reconcile(
            &handler,
            &Request::new(Operation::Create, desired.clone()),
            None,
            &StabilizationPolicy::default(),
        ));
        assert_eq!(created.redacted_fields, desired.redacted_fields);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mock = MockBackend::new();
        let arn = web_acl(&mock);
        let handler = LoggingConfigurationHandler::new(&mock);
        let policy = StabilizationPolicy::default();
        assert!(
            reconcile(
                &handler,
                &Request::new(Operation::Create, logging(&arn)),
                None,
                &policy,
            )
            .is_success()
        );

        let request = Request::new(Operation::Delete, logging(&arn));
        assert!(reconcile(&handler, &request, None, &policy).is_success());
        assert!(reconcile(&handler, &request, None, &policy).is_success());
        assert_eq!(mock.call_count("DeleteLoggingConfiguration"), 1);
    }

    fn missing_information() -> Fault {
        Fault::new(
            FaultCategory::InvalidParameter,
            "Critical information is missing in your request",
        )
    }

    #[test]
    fn test_delete_with_missing_information_succeeds() {
        let mock = MockBackend::new();
        let handler = LoggingConfigurationHandler::new(&mock);
        mock.fail_next("GetLoggingConfiguration", missing_information());

        let outcome = reconcile(
            &handler,
            &Request::new(Operation::Delete, logging("arn:acl")),
            None,
            &StabilizationPolicy::default(),
        );
        assert_eq!(outcome, Outcome::Success(Resolved::Deleted));
        assert_eq!(mock.call_count("DeleteLoggingConfiguration"), 0);
    }

    #[test]
    fn test_create_proceeds_when_lookup_reports_missing_information() {
        let mock = MockBackend::new();
        let arn = web_acl(&mock);
        let handler = LoggingConfigurationHandler::new(&mock);
        mock.fail_next("GetLoggingConfiguration", missing_information());

        let created = model(reconcile(
            &handler,
            &Request::new(Operation::Create, logging(&arn)),
            None,
            &StabilizationPolicy::default(),
        ));
        assert_eq!(created.resource_arn, Some(arn));
        assert_eq!(mock.call_count("PutLoggingConfiguration"), 1);
    }

    #[test]
    fn test_list_returns_resource_arns() {
        let mock = MockBackend::new();
        let arn = web_acl(&mock);
        let handler = LoggingConfigurationHandler::new(&mock);
        let policy = StabilizationPolicy::default();
        let create = Request::new(Operation::Create, logging(&arn));
        assert!(reconcile(&handler, &create, None, &policy).is_success());

        let list = Request::new(Operation::List, LoggingConfigurationModel::default());
        let Outcome::Success(Resolved::Page { models, next_token }) =
            reconcile(&handler, &list, None, &policy)
        else {
            panic!("expected a page");
        };
        assert_eq!(next_token, None);
        assert_eq!(
            models,
            vec![LoggingConfigurationModel {
                resource_arn: Some(arn),
                ..LoggingConfigurationModel::default()
            }]
        );
    }
}
