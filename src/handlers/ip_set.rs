//! IP sets

use super::common::changed;
use super::lockable::{LockableHandler, LockableKind, Resource};
use reconcile::StepError;
use serde::{Deserialize, Serialize};
use wafkit::types::{IpAddressVersion, IpSet};
use wafkit::{Backend, Page, ResourceRef, Scope, Summary, Tag, Versioned};

pub const TYPE_NAME: &str = "AWS::WAFv2::IPSet";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct IpSetSpec {
    /// Fixed at create time
    #[serde(rename = "IPAddressVersion", skip_serializing_if = "Option::is_none")]
    pub ip_address_version: Option<IpAddressVersion>,
    /// Required, may be empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<String>>,
}

pub struct IpSetKind;

pub type IpSetHandler<'a> = LockableHandler<'a, IpSetKind>;

impl LockableKind for IpSetKind {
    const TYPE_NAME: &'static str = TYPE_NAME;
    type Spec = IpSetSpec;
    type Wire = IpSet;

    fn missing(spec: &IpSetSpec) -> Vec<&'static str> {
        [
            spec.ip_address_version.is_none().then_some("IPAddressVersion"),
            spec.addresses.is_none().then_some("Addresses"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn immutable(desired: &IpSetSpec, previous: &IpSetSpec) -> Vec<&'static str> {
        changed(
            "IPAddressVersion",
            &desired.ip_address_version,
            &previous.ip_address_version,
        )
        .into_iter()
        .collect()
    }

    fn to_wire(
        name: &str,
        description: Option<&str>,
        spec: &IpSetSpec,
    ) -> Result<IpSet, StepError> {
        Ok(IpSet {
            name: name.to_string(),
            id: None,
            arn: None,
            description: description.map(str::to_string),
            ip_address_version: spec
                .ip_address_version
                .ok_or_else(|| StepError::invalid("IPAddressVersion is required"))?,
            addresses: spec.addresses.clone().unwrap_or_default(),
        })
    }

    fn from_wire(wire: &IpSet) -> Result<IpSetSpec, StepError> {
        Ok(IpSetSpec {
            ip_address_version: Some(wire.ip_address_version),
            addresses: Some(wire.addresses.clone()),
        })
    }

    fn create(
        backend: &dyn Backend,
        scope: Scope,
        wire: &IpSet,
        tags: &[Tag],
    ) -> wafkit::Result<Summary> {
        backend.create_ip_set(scope, wire, tags)
    }

    fn get(backend: &dyn Backend, target: &ResourceRef) -> wafkit::Result<Versioned<IpSet>> {
        backend.get_ip_set(target)
    }

    fn update(
        backend: &dyn Backend,
        target: &ResourceRef,
        wire: &IpSet,
        lock_token: &str,
    ) -> wafkit::Result<String> {
        backend.update_ip_set(target, wire, lock_token)
    }

    fn delete(
        backend: &dyn Backend,
        target: &ResourceRef,
        lock_token: &str,
    ) -> wafkit::Result<()> {
        backend.delete_ip_set(target, lock_token)
    }

    fn list(
        backend: &dyn Backend,
        scope: Scope,
        marker: Option<&str>,
    ) -> wafkit::Result<Page<Summary>> {
        backend.list_ip_sets(scope, marker)
    }
}
