//! Rule groups

use super::common::{changed, supplied};
use super::lockable::{LockableHandler, LockableKind, Resource};
use reconcile::StepError;
use rulekit::Rule;
use rulekit::convert::{rules_from_wire, rules_to_wire};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wafkit::types::{CustomResponseBody, RuleGroup, VisibilityConfig};
use wafkit::{Backend, Page, ResourceRef, Scope, Summary, Tag, Versioned};

pub const TYPE_NAME: &str = "AWS::WAFv2::RuleGroup";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RuleGroupSpec {
    /// Fixed at create time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_config: Option<VisibilityConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_response_bodies: Option<BTreeMap<String, CustomResponseBody>>,
    /// Computed by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_namespace: Option<String>,
}

pub struct RuleGroupKind;

pub type RuleGroupHandler<'a> = LockableHandler<'a, RuleGroupKind>;

impl LockableKind for RuleGroupKind {
    const TYPE_NAME: &'static str = TYPE_NAME;
    type Spec = RuleGroupSpec;
    type Wire = RuleGroup;

    fn missing(spec: &RuleGroupSpec) -> Vec<&'static str> {
        [
            spec.capacity.is_none().then_some("Capacity"),
            spec.visibility_config.is_none().then_some("VisibilityConfig"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn immutable(desired: &RuleGroupSpec, previous: &RuleGroupSpec) -> Vec<&'static str> {
        changed("Capacity", &desired.capacity, &previous.capacity)
            .into_iter()
            .collect()
    }

    fn read_only(desired: &RuleGroupSpec, previous: Option<&RuleGroupSpec>) -> Vec<&'static str> {
        supplied(
            "LabelNamespace",
            &desired.label_namespace,
            previous.map(|p| &p.label_namespace),
        )
        .into_iter()
        .collect()
    }

    fn to_wire(
        name: &str,
        description: Option<&str>,
        spec: &RuleGroupSpec,
    ) -> Result<RuleGroup, StepError> {
        let rules = rules_to_wire(spec.rules.as_deref().unwrap_or_default())?;
        Ok(RuleGroup {
            name: name.to_string(),
            id: None,
            arn: None,
            capacity: spec
                .capacity
                .ok_or_else(|| StepError::invalid("Capacity is required"))?,
            description: description.map(str::to_string),
            rules,
            visibility_config: spec
                .visibility_config
                .clone()
                .ok_or_else(|| StepError::invalid("VisibilityConfig is required"))?,
            label_namespace: None,
            custom_response_bodies: spec.custom_response_bodies.clone(),
        })
    }

    fn from_wire(wire: &RuleGroup) -> Result<RuleGroupSpec, StepError> {
        Ok(RuleGroupSpec {
            capacity: Some(wire.capacity),
            rules: Some(rules_from_wire(&wire.rules)?),
            visibility_config: Some(wire.visibility_config.clone()),
            custom_response_bodies: wire.custom_response_bodies.clone(),
            label_namespace: wire.label_namespace.clone(),
        })
    }

    fn create(
        backend: &dyn Backend,
        scope: Scope,
        wire: &RuleGroup,
        tags: &[Tag],
    ) -> wafkit::Result<Summary> {
        backend.create_rule_group(scope, wire, tags)
    }

    fn get(backend: &dyn Backend, target: &ResourceRef) -> wafkit::Result<Versioned<RuleGroup>> {
        backend.get_rule_group(target)
    }

    fn update(
        backend: &dyn Backend,
        target: &ResourceRef,
        wire: &RuleGroup,
        lock_token: &str,
    ) -> wafkit::Result<String> {
        backend.update_rule_group(target, wire, lock_token)
    }

    fn delete(
        backend: &dyn Backend,
        target: &ResourceRef,
        lock_token: &str,
    ) -> wafkit::Result<()> {
        backend.delete_rule_group(target, lock_token)
    }

    fn list(
        backend: &dyn Backend,
        scope: Scope,
        marker: Option<&str>,
    ) -> wafkit::Result<Page<Summary>> {
        backend.list_rule_groups(scope, marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::lockable::Identity;
    use reconcile::{
        ErrorKind, Operation, Outcome, Request, Resolved, StabilizationPolicy, reconcile,
    };
    use rulekit::Statement;
    use rulekit::model::{GeoMatch, Not};
    use wafkit::MockBackend;
    use wafkit::types::RuleAction;

    type RuleGroupModel = Resource<RuleGroupSpec>;

    fn visibility(name: &str) -> VisibilityConfig {
        VisibilityConfig {
            sampled_requests_enabled: false,
            cloud_watch_metrics_enabled: true,
            metric_name: name.to_string(),
        }
    }

    fn group(name: &str) -> RuleGroupModel {
        let outside_home = Statement::Not(Not {
            statement: Box::new(Statement::GeoMatch(GeoMatch {
                country_codes: vec!["BR".to_string(), "PT".to_string()],
                forwarded_ip_config: None,
            })),
        });
        Resource {
            identity: Identity {
                name: Some(name.to_string()),
                scope: Some(Scope::Regional),
                ..Identity::default()
            },
            spec: RuleGroupSpec {
                capacity: Some(50),
                rules: Some(vec![Rule {
                    name: "geo".to_string(),
                    priority: 0,
                    statement: outside_home,
                    action: Some(RuleAction::default()),
                    override_action: None,
                    rule_labels: None,
                    visibility_config: visibility("geo"),
                }]),
                visibility_config: Some(visibility(name)),
                ..RuleGroupSpec::default()
            },
        }
    }

    fn model(outcome: Outcome<RuleGroupModel>) -> RuleGroupModel {
        match outcome {
            Outcome::Success(Resolved::Model(model)) => model,
            other => panic!("expected a model, got {other:?}"),
        }
    }

    #[test]
    fn test_create_and_read_back_nested_rules() {
        let mock = MockBackend::new();
        let handler = RuleGroupHandler::new(&mock);
        let policy = StabilizationPolicy::default();

        let created = model(reconcile(
            &handler,
            &Request::new(Operation::Create, group("geo-block")),
            None,
            &policy,
        ));
        assert_eq!(created.spec.capacity, Some(50));
        assert_eq!(created.spec.rules, group("geo-block").spec.rules);
        assert_eq!(created.identity.tags, Some(vec![]));
        assert!(created.spec.label_namespace.is_some());

        let read = model(reconcile(
            &handler,
            &Request::new(Operation::Read, created.clone()),
            None,
            &policy,
        ));
        assert_eq!(read, created);
    }

    #[test]
    fn test_capacity_is_create_only() {
        let mock = MockBackend::new();
        let handler = RuleGroupHandler::new(&mock);
        let policy = StabilizationPolicy::default();
        let previous = model(reconcile(
            &handler,
            &Request::new(Operation::Create, group("geo-block")),
            None,
            &policy,
        ));
        mock.clear_calls();

        let mut desired = previous.clone();
        desired.spec.capacity = Some(100);
        let outcome = reconcile(
            &handler,
            &Request::new(Operation::Update, desired).with_previous(previous),
            None,
            &policy,
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidRequest));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_duplicate_name_already_exists() {
        let mock = MockBackend::new();
        let handler = RuleGroupHandler::new(&mock);
        let policy = StabilizationPolicy::default();
        let request = Request::new(Operation::Create, group("geo-block"));

        assert!(reconcile(&handler, &request, None, &policy).is_success());
        let again = reconcile(&handler, &request, None, &policy);
        assert_eq!(again.error_kind(), Some(ErrorKind::AlreadyExists));
    }

    #[test]
    fn test_list_pages_identifiers_only() {
        let mock = MockBackend::new().with_page_size(2);
        let handler = RuleGroupHandler::new(&mock);
        let policy = StabilizationPolicy::default();
        for name in ["a", "b", "c"] {
            let created = reconcile(
                &handler,
                &Request::new(Operation::Create, group(name)),
                None,
                &policy,
            );
            assert!(created.is_success());
        }

        let mut request = Request::new(Operation::List, RuleGroupModel::default());
        let Outcome::Success(Resolved::Page { models, next_token }) =
            reconcile(&handler, &request, None, &policy)
        else {
            panic!("expected a page");
        };
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| m.spec == RuleGroupSpec::default()));
        assert!(models.iter().all(|m| m.identity.id.is_some()));
        assert!(next_token.is_some());

        request.next_token = next_token;
        let Outcome::Success(Resolved::Page { models, next_token }) =
            reconcile(&handler, &request, None, &policy)
        else {
            panic!("expected a page");
        };
        assert_eq!(models.len(), 1);
        assert_eq!(next_token, None);
    }
}
