//! Regex pattern sets

use super::lockable::{LockableHandler, LockableKind, Resource};
use reconcile::StepError;
use serde::{Deserialize, Serialize};
use wafkit::types::{Regex, RegexPatternSet};
use wafkit::{Backend, Page, ResourceRef, Scope, Summary, Tag, Versioned};

pub const TYPE_NAME: &str = "AWS::WAFv2::RegexPatternSet";

/// Patterns are plain strings here and `{"RegexString": ...}` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RegexPatternSetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_expression_list: Option<Vec<String>>,
}

pub struct RegexPatternSetKind;

pub type RegexPatternSetHandler<'a> = LockableHandler<'a, RegexPatternSetKind>;

impl LockableKind for RegexPatternSetKind {
    const TYPE_NAME: &'static str = TYPE_NAME;
    type Spec = RegexPatternSetSpec;
    type Wire = RegexPatternSet;

    fn missing(spec: &RegexPatternSetSpec) -> Vec<&'static str> {
        spec.regular_expression_list
            .is_none()
            .then_some("RegularExpressionList")
            .into_iter()
            .collect()
    }

    fn to_wire(
        name: &str,
        description: Option<&str>,
        spec: &RegexPatternSetSpec,
    ) -> Result<RegexPatternSet, StepError> {
        let patterns = spec
            .regular_expression_list
            .as_deref()
            .ok_or_else(|| StepError::invalid("RegularExpressionList is required"))?;
        Ok(RegexPatternSet {
            name: name.to_string(),
            id: None,
            arn: None,
            description: description.map(str::to_string),
            regular_expression_list: patterns
                .iter()
                .map(|p| Regex {
                    regex_string: p.clone(),
                })
                .collect(),
        })
    }

    fn from_wire(wire: &RegexPatternSet) -> Result<RegexPatternSetSpec, StepError> {
        Ok(RegexPatternSetSpec {
            regular_expression_list: Some(
                wire.regular_expression_list
                    .iter()
                    .map(|r| r.regex_string.clone())
                    .collect(),
            ),
        })
    }

    fn create(
        backend: &dyn Backend,
        scope: Scope,
        wire: &RegexPatternSet,
        tags: &[Tag],
    ) -> wafkit::Result<Summary> {
        backend.create_regex_pattern_set(scope, wire, tags)
    }

    fn get(
        backend: &dyn Backend,
        target: &ResourceRef,
    ) -> wafkit::Result<Versioned<RegexPatternSet>> {
        backend.get_regex_pattern_set(target)
    }

    fn update(
        backend: &dyn Backend,
        target: &ResourceRef,
        wire: &RegexPatternSet,
        lock_token: &str,
    ) -> wafkit::Result<String> {
        backend.update_regex_pattern_set(target, wire, lock_token)
    }

    fn delete(
        backend: &dyn Backend,
        target: &ResourceRef,
        lock_token: &str,
    ) -> wafkit::Result<()> {
        backend.delete_regex_pattern_set(target, lock_token)
    }

    fn list(
        backend: &dyn Backend,
        scope: Scope,
        marker: Option<&str>,
    ) -> wafkit::Result<Page<Summary>> {
        backend.list_regex_pattern_sets(scope, marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::lockable::Identity;
    use reconcile::{
        ErrorKind, Operation, Outcome, Request, Resolved, StabilizationPolicy, reconcile,
    };
    use wafkit::MockBackend;

    type RegexPatternSetModel = Resource<RegexPatternSetSpec>;

    fn bots() -> RegexPatternSetModel {
        Resource {
            identity: Identity {
                name: Some("bots".to_string()),
                scope: Some(Scope::Regional),
                tags: Some(vec![Tag::new("env", "prod"), Tag::new("team", "edge")]),
                ..Identity::default()
            },
            spec: RegexPatternSetSpec {
                regular_expression_list: Some(vec!["^curl/".to_string(), "bot$".to_string()]),
            },
        }
    }

    #[test]
    fn test_patterns_round_trip_through_the_wire() {
        let mock = MockBackend::new();
        let handler = RegexPatternSetHandler::new(&mock);

        let outcome = reconcile(
            &handler,
            &Request::new(Operation::Create, bots()),
            None,
            &StabilizationPolicy::default(),
        );
        let Outcome::Success(Resolved::Model(created)) = outcome else {
            panic!("expected a model, got {outcome:?}");
        };
        assert_eq!(created.spec, bots().spec);
        assert_eq!(created.identity.tags, bots().identity.tags);
    }

    #[test]
    fn test_reordered_tags_cause_no_tag_calls() {
        let mock = MockBackend::new();
        let handler = RegexPatternSetHandler::new(&mock);
        let policy = StabilizationPolicy::default();
        let request = Request::new(Operation::Create, bots());
        let Outcome::Success(Resolved::Model(previous)) =
            reconcile(&handler, &request, None, &policy)
        else {
            panic!("create failed");
        };

        let mut desired = previous.clone();
        if let Some(tags) = desired.identity.tags.as_mut() {
            tags.reverse();
        }
        let outcome = reconcile(
            &handler,
            &Request::new(Operation::Update, desired).with_previous(previous),
            None,
            &policy,
        );
        assert!(outcome.is_success());
        assert_eq!(mock.call_count("TagResource"), 0);
        assert_eq!(mock.call_count("UntagResource"), 0);
    }

    #[test]
    fn test_read_requires_identifiers() {
        let mock = MockBackend::new();
        let handler = RegexPatternSetHandler::new(&mock);

        let outcome = reconcile(
            &handler,
            &Request::new(Operation::Read, bots()),
            None,
            &StabilizationPolicy::default(),
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidRequest));
        assert!(mock.calls().is_empty());
    }
}
