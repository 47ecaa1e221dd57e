//! One handler for every resource type guarded by mutation tokens
//!
//! Web ACLs, rule groups, IP sets and regex pattern sets share identity
//! (name, id, scope), tagging, and the create/read/update/delete/list flow.
//! What differs per type lives behind [`LockableKind`].

use super::common::{
    changed, read_tags, reject_immutable, reject_missing, reject_read_only, require, supplied,
    sync_tags, validate_name,
};
use reconcile::{
    CallbackContext, Operation, Request, Resolved, ResourceHandler, Step, StepError, StepResult,
    Transition, with_fresh_token,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use wafkit::{Backend, Lockable, Page, ResourceRef, Scope, Summary, Tag, Versioned};

/// Identity and tags common to every lockable resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Identity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// Declarative model: identity plus the type-specific members
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource<S> {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub spec: S,
}

/// What distinguishes one lockable resource type from another
pub trait LockableKind {
    /// Type name used in requests
    const TYPE_NAME: &'static str;

    /// Type-specific declarative members
    type Spec: Clone + Default + Serialize + DeserializeOwned;

    /// Wire shape of the resource
    type Wire: Lockable;

    /// Required members that are absent
    fn missing(spec: &Self::Spec) -> Vec<&'static str>;

    /// Create-only members that differ from the previous state
    fn immutable(_desired: &Self::Spec, _previous: &Self::Spec) -> Vec<&'static str> {
        Vec::new()
    }

    /// Read-only members the caller tried to set
    fn read_only(_desired: &Self::Spec, _previous: Option<&Self::Spec>) -> Vec<&'static str> {
        Vec::new()
    }

    fn to_wire(
        name: &str,
        description: Option<&str>,
        spec: &Self::Spec,
    ) -> Result<Self::Wire, StepError>;

    fn from_wire(wire: &Self::Wire) -> Result<Self::Spec, StepError>;

    fn create(
        backend: &dyn Backend,
        scope: Scope,
        wire: &Self::Wire,
        tags: &[Tag],
    ) -> wafkit::Result<Summary>;
    fn get(backend: &dyn Backend, target: &ResourceRef) -> wafkit::Result<Versioned<Self::Wire>>;
    fn update(
        backend: &dyn Backend,
        target: &ResourceRef,
        wire: &Self::Wire,
        lock_token: &str,
    ) -> wafkit::Result<String>;
    fn delete(backend: &dyn Backend, target: &ResourceRef, lock_token: &str)
    -> wafkit::Result<()>;
    fn list(
        backend: &dyn Backend,
        scope: Scope,
        marker: Option<&str>,
    ) -> wafkit::Result<Page<Summary>>;
}

/// Handler for one lockable resource type
pub struct LockableHandler<'a, K> {
    backend: &'a dyn Backend,
    kind: PhantomData<K>,
}

impl<'a, K: LockableKind> LockableHandler<'a, K> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            kind: PhantomData,
        }
    }

    fn validate(request: &Request<Resource<K::Spec>>) -> Result<(), StepError> {
        let desired = &request.desired;
        let identity = &desired.identity;
        match request.operation {
            Operation::Create => {
                validate_name(identity.name.as_deref())?;
                require("Scope", identity.scope.as_ref())?;
                reject_missing(&K::missing(&desired.spec))?;
                let mut read_only: Vec<&str> = [
                    supplied("Id", &identity.id, None),
                    supplied("Arn", &identity.arn, None),
                ]
                .into_iter()
                .flatten()
                .collect();
                read_only.extend(K::read_only(&desired.spec, None));
                reject_read_only(&read_only)
            }
            Operation::Update => {
                validate_name(identity.name.as_deref())?;
                require("Id", identity.id.as_ref())?;
                require("Scope", identity.scope.as_ref())?;
                reject_missing(&K::missing(&desired.spec))?;
                let Some(previous) = &request.previous else {
                    let mut read_only: Vec<&str> =
                        supplied("Arn", &identity.arn, None).into_iter().collect();
                    read_only.extend(K::read_only(&desired.spec, None));
                    return reject_read_only(&read_only);
                };
                let before = &previous.identity;
                let mut immutable: Vec<&str> = [
                    changed("Name", &identity.name, &before.name),
                    changed("Scope", &identity.scope, &before.scope),
                ]
                .into_iter()
                .flatten()
                .collect();
                immutable.extend(K::immutable(&desired.spec, &previous.spec));
                reject_immutable(&immutable)?;

                let mut read_only: Vec<&str> = [
                    supplied("Id", &identity.id, Some(&before.id)),
                    supplied("Arn", &identity.arn, Some(&before.arn)),
                ]
                .into_iter()
                .flatten()
                .collect();
                read_only.extend(K::read_only(&desired.spec, Some(&previous.spec)));
                reject_read_only(&read_only)
            }
            Operation::Read | Operation::Delete => {
                require("Name", identity.name.as_ref())?;
                require("Id", identity.id.as_ref())?;
                require("Scope", identity.scope.as_ref())?;
                Ok(())
            }
            Operation::List => Ok(()),
        }
    }

    /// Identifier of the resource this request is about
    ///
    /// On create the id the service assigned is the one recorded in the context.
    fn target(
        identity: &Identity,
        context: &CallbackContext,
    ) -> Result<ResourceRef, StepError> {
        let name = require("Name", identity.name.as_ref())?;
        let id = require(
            "Id",
            context.captured_id.as_ref().or(identity.id.as_ref()),
        )?;
        let scope = *require("Scope", identity.scope.as_ref())?;
        Ok(ResourceRef::new(name.as_str(), id.as_str(), scope))
    }

    fn wire(desired: &Resource<K::Spec>) -> Result<K::Wire, StepError> {
        let name = require("Name", desired.identity.name.as_ref())?;
        K::to_wire(
            name,
            desired.identity.description.as_deref(),
            &desired.spec,
        )
    }

    fn create(
        &self,
        request: &Request<Resource<K::Spec>>,
        context: &mut CallbackContext,
    ) -> StepResult<Resource<K::Spec>> {
        let desired = &request.desired;
        let scope = *require("Scope", desired.identity.scope.as_ref())?;
        let wire = Self::wire(desired)?;
        let tags = desired.identity.tags.as_deref().unwrap_or_default();

        let summary = K::create(self.backend, scope, &wire, tags)?;
        log::info!("created {} {}", K::TYPE_NAME, summary.arn);
        context.capture(Some(&summary.id), Some(&summary.arn));
        Ok(Transition::Next(Step::Finalize))
    }

    fn read(
        &self,
        identity: &Identity,
        context: &CallbackContext,
    ) -> Result<Resource<K::Spec>, StepError> {
        let target = Self::target(identity, context)?;
        let current = K::get(self.backend, &target)?.item;
        let tags = match current.arn() {
            Some(arn) => read_tags(self.backend, arn)?,
            None => Vec::new(),
        };

        Ok(Resource {
            identity: Identity {
                name: Some(current.name().to_string()),
                id: Some(current.id().unwrap_or(&target.id).to_string()),
                scope: Some(target.scope),
                arn: current.arn().map(str::to_string),
                description: current.description().map(str::to_string),
                tags: Some(tags),
            },
            spec: K::from_wire(&current)?,
        })
    }

    fn update(
        &self,
        request: &Request<Resource<K::Spec>>,
        context: &mut CallbackContext,
    ) -> StepResult<Resource<K::Spec>> {
        let target = Self::target(&request.desired.identity, context)?;
        let wire = Self::wire(&request.desired)?;
        let backend = self.backend;

        let mut arn = None;
        with_fresh_token(
            &target,
            |t| {
                let current = K::get(backend, t)?;
                arn = current.item.arn().map(str::to_string);
                Ok(current)
            },
            |token| K::update(backend, &target, &wire, token),
        )?;
        log::info!("updated {} {target}", K::TYPE_NAME);
        context.capture(None, arn.as_deref());
        Ok(Transition::Next(Step::SyncTags))
    }

    fn sync(
        &self,
        request: &Request<Resource<K::Spec>>,
        context: &mut CallbackContext,
    ) -> StepResult<Resource<K::Spec>> {
        let identity = &request.desired.identity;
        let arn = match context.captured_arn.clone() {
            Some(arn) => arn,
            None => {
                let target = Self::target(identity, context)?;
                let current = K::get(self.backend, &target)?.item;
                current.arn().map(str::to_string).ok_or_else(|| {
                    wafkit::Error::InvalidResponse(format!("{target} has no ARN"))
                })?
            }
        };

        let desired = identity.tags.as_deref().unwrap_or_default();
        sync_tags(self.backend, &arn, desired)?;
        Ok(Transition::Next(Step::Finalize))
    }

    fn delete(
        &self,
        request: &Request<Resource<K::Spec>>,
        context: &CallbackContext,
    ) -> StepResult<Resource<K::Spec>> {
        let target = Self::target(&request.desired.identity, context)?;
        let backend = self.backend;

        match with_fresh_token(
            &target,
            |t| K::get(backend, t),
            |token| K::delete(backend, &target, token),
        ) {
            Ok(()) => log::info!("deleted {} {target}", K::TYPE_NAME),
            Err(err) if err.is_not_found() => {
                log::info!("{} {target} is already gone", K::TYPE_NAME);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(Transition::Done(Resolved::Deleted))
    }

    fn list(&self, request: &Request<Resource<K::Spec>>) -> StepResult<Resource<K::Spec>> {
        let scope = request.desired.identity.scope.unwrap_or(Scope::Regional);
        let page = K::list(self.backend, scope, request.next_token.as_deref())?;

        let models = page
            .items
            .into_iter()
            .map(|summary| Resource {
                identity: Identity {
                    name: Some(summary.name),
                    id: Some(summary.id),
                    scope: Some(scope),
                    ..Identity::default()
                },
                spec: K::Spec::default(),
            })
            .collect();
        Ok(Transition::Done(Resolved::Page {
            models,
            next_token: page.next_marker,
        }))
    }
}

impl<K: LockableKind> ResourceHandler for LockableHandler<'_, K> {
    type Model = Resource<K::Spec>;

    fn type_name(&self) -> &'static str {
        K::TYPE_NAME
    }

    fn step(
        &self,
        request: &Request<Self::Model>,
        step: Step,
        context: &mut CallbackContext,
    ) -> StepResult<Self::Model> {
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
                Ok(Transition::Next(Step::Mutate))
            }
            (Operation::Create, Step::Mutate) => self.create(request, context),
            (Operation::Update, Step::Mutate) => self.update(request, context),
            (Operation::Update, Step::SyncTags) => self.sync(request, context),
            (Operation::Delete, Step::Mutate) => self.delete(request, context),
            (Operation::Create | Operation::Read | Operation::Update, Step::Finalize) => {
                let model = self.read(&request.desired.identity, context)?;
                Ok(Transition::Done(Resolved::Model(model)))
            }
            (operation, step) => Err(StepError::invalid(format!(
                "{} {operation} has no {step} step",
                K::TYPE_NAME
            ))),
        }
    }
}
