//! Web ACLs

use super::common::supplied;
use super::lockable::{LockableHandler, LockableKind, Resource};
use reconcile::StepError;
use rulekit::Rule;
use rulekit::convert::{rules_from_wire, rules_to_wire};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wafkit::types::{CustomResponseBody, DefaultAction, VisibilityConfig, WebAcl};
use wafkit::{Backend, Page, ResourceRef, Scope, Summary, Tag, Versioned};

pub const TYPE_NAME: &str = "AWS::WAFv2::WebACL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct WebAclSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_action: Option<DefaultAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_config: Option<VisibilityConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_response_bodies: Option<BTreeMap<String, CustomResponseBody>>,
    /// Computed by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    /// Computed by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_namespace: Option<String>,
}

pub struct WebAclKind;

pub type WebAclHandler<'a> = LockableHandler<'a, WebAclKind>;

impl LockableKind for WebAclKind {
    const TYPE_NAME: &'static str = TYPE_NAME;
    type Spec = WebAclSpec;
    type Wire = WebAcl;

    fn missing(spec: &WebAclSpec) -> Vec<&'static str> {
        [
            spec.default_action.is_none().then_some("DefaultAction"),
            spec.visibility_config.is_none().then_some("VisibilityConfig"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn read_only(desired: &WebAclSpec, previous: Option<&WebAclSpec>) -> Vec<&'static str> {
        [
            supplied("Capacity", &desired.capacity, previous.map(|p| &p.capacity)),
            supplied(
                "LabelNamespace",
                &desired.label_namespace,
                previous.map(|p| &p.label_namespace),
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn to_wire(
        name: &str,
        description: Option<&str>,
        spec: &WebAclSpec,
    ) -> Result<WebAcl, StepError> {
        let rules = rules_to_wire(spec.rules.as_deref().unwrap_or_default())?;
        Ok(WebAcl {
            name: name.to_string(),
            id: None,
            arn: None,
            default_action: spec
                .default_action
                .clone()
                .ok_or_else(|| StepError::invalid("DefaultAction is required"))?,
            description: description.map(str::to_string),
            rules,
            visibility_config: spec
                .visibility_config
                .clone()
                .ok_or_else(|| StepError::invalid("VisibilityConfig is required"))?,
            capacity: None,
            label_namespace: None,
            custom_response_bodies: spec.custom_response_bodies.clone(),
        })
    }

    fn from_wire(wire: &WebAcl) -> Result<WebAclSpec, StepError> {
        Ok(WebAclSpec {
            default_action: Some(wire.default_action.clone()),
            rules: Some(rules_from_wire(&wire.rules)?),
            visibility_config: Some(wire.visibility_config.clone()),
            custom_response_bodies: wire.custom_response_bodies.clone(),
            capacity: Some(wire.capacity.unwrap_or_default()),
            label_namespace: wire.label_namespace.clone(),
        })
    }

    fn create(
        backend: &dyn Backend,
        scope: Scope,
        wire: &WebAcl,
        tags: &[Tag],
    ) -> wafkit::Result<Summary> {
        backend.create_web_acl(scope, wire, tags)
    }

    fn get(backend: &dyn Backend, target: &ResourceRef) -> wafkit::Result<Versioned<WebAcl>> {
        backend.get_web_acl(target)
    }

    fn update(
        backend: &dyn Backend,
        target: &ResourceRef,
        wire: &WebAcl,
        lock_token: &str,
    ) -> wafkit::Result<String> {
        backend.update_web_acl(target, wire, lock_token)
    }

    fn delete(
        backend: &dyn Backend,
        target: &ResourceRef,
        lock_token: &str,
    ) -> wafkit::Result<()> {
        backend.delete_web_acl(target, lock_token)
    }

    fn list(
        backend: &dyn Backend,
        scope: Scope,
        marker: Option<&str>,
    ) -> wafkit::Result<Page<Summary>> {
        backend.list_web_acls(scope, marker)
    }
}
