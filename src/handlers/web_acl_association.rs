//! Web ACL associations
//!
//! Binds a web ACL to a regional resource such as a load balancer. The
//! service offers no listing, and disassociation is eventually consistent,
//! so delete polls until the binding is gone.

use super::common::{changed, reject_immutable, reject_missing, require};
use reconcile::{
    CallbackContext, Operation, Request, Resolved, ResourceHandler, Step, StepError, StepResult,
    Transition,
};
use serde::{Deserialize, Serialize};
use wafkit::Backend;

pub const TYPE_NAME: &str = "AWS::WAFv2::WebACLAssociation";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct WebAclAssociationModel {
    /// Fixed at create time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_arn: Option<String>,
    #[serde(rename = "WebACLArn", skip_serializing_if = "Option::is_none")]
    pub web_acl_arn: Option<String>,
}

pub struct WebAclAssociationHandler<'a> {
    backend: &'a dyn Backend,
}

impl<'a> WebAclAssociationHandler<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    fn validate(request: &Request<WebAclAssociationModel>) -> Result<(), StepError> {
        let desired = &request.desired;
        match request.operation {
            Operation::Create | Operation::Update => {
                let missing: Vec<&str> = [
                    desired.resource_arn.is_none().then_some("ResourceArn"),
                    desired.web_acl_arn.is_none().then_some("WebACLArn"),
                ]
                .into_iter()
                .flatten()
                .collect();
                reject_missing(&missing)?;
                if let (Operation::Update, Some(previous)) = (request.operation, &request.previous)
                {
                    let immutable: Vec<&str> =
                        changed("ResourceArn", &desired.resource_arn, &previous.resource_arn)
                            .into_iter()
                            .collect();
                    reject_immutable(&immutable)?;
                }
                Ok(())
            }
            Operation::Read | Operation::Delete => {
                require("ResourceArn", desired.resource_arn.as_ref())?;
                Ok(())
            }
            Operation::List => Err(StepError::invalid(format!(
                "{TYPE_NAME} does not support listing"
            ))),
        }
    }

    /// ARN of the web ACL currently bound to `resource_arn`, if any
    ///
    /// A protected resource that no longer exists has no binding.
    fn bound_acl(&self, resource_arn: &str) -> Result<Option<String>, StepError> {
        match self.backend.get_web_acl_for_resource(resource_arn) {
            Ok(acl) => Ok(acl.and_then(|acl| acl.arn)),
            Err(err) if err.is_not_found() => {
                log::debug!("{resource_arn} no longer exists: {err}");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn associate(
        &self,
        request: &Request<WebAclAssociationModel>,
    ) -> StepResult<WebAclAssociationModel> {
        let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
        let web_acl_arn = require("WebACLArn", request.desired.web_acl_arn.as_ref())?;
        self.backend.associate_web_acl(web_acl_arn, resource_arn)?;
        log::info!("associated {web_acl_arn} with {resource_arn}");
        Ok(Transition::Next(Step::Finalize))
    }

    fn read(&self, request: &Request<WebAclAssociationModel>) -> StepResult<WebAclAssociationModel> {
        let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
        let Some(web_acl_arn) = self.bound_acl(resource_arn)? else {
            return Err(StepError::not_found(format!(
                "no web ACL is associated with {resource_arn}"
            )));
        };
        Ok(Transition::Done(Resolved::Model(WebAclAssociationModel {
            resource_arn: Some(resource_arn.clone()),
            web_acl_arn: Some(web_acl_arn),
        })))
    }

    /// Skip the disassociation when the binding is already gone or belongs
    /// to another web ACL
    fn check_existing(
        &self,
        request: &Request<WebAclAssociationModel>,
    ) -> StepResult<WebAclAssociationModel> {
        let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
        let bound = self.bound_acl(resource_arn)?;
        let ours = match (&bound, &request.desired.web_acl_arn) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(bound), Some(expected)) => bound == expected,
        };
        if ours {
            Ok(Transition::Next(Step::Mutate))
        } else {
            log::info!("{resource_arn} is not associated with the expected web ACL, nothing to do");
            Ok(Transition::Done(Resolved::Deleted))
        }
    }

    fn disassociate(
        &self,
        request: &Request<WebAclAssociationModel>,
        context: &mut CallbackContext,
    ) -> StepResult<WebAclAssociationModel> {
        let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
        let bound = self.bound_acl(resource_arn)?;
        match self.backend.disassociate_web_acl(resource_arn) {
            Ok(()) => log::info!("disassociated {resource_arn}"),
            Err(err) if err.is_not_found() => {
                log::info!("{resource_arn} is already gone");
                return Ok(Transition::Done(Resolved::Deleted));
            }
            Err(err) => return Err(err.into()),
        }
        context.capture(None, bound.as_deref());
        Ok(Transition::Next(Step::AwaitDeletion))
    }

    fn await_deletion(
        &self,
        request: &Request<WebAclAssociationModel>,
        context: &CallbackContext,
    ) -> StepResult<WebAclAssociationModel> {
        let resource_arn = require("ResourceArn", request.desired.resource_arn.as_ref())?;
        let expected = context
            .captured_arn
            .as_ref()
            .or(request.desired.web_acl_arn.as_ref());

        match self.bound_acl(resource_arn)? {
            Some(bound) if expected.is_none_or(|expected| *expected == bound) => Err(
                StepError::Pending(format!("{resource_arn} is still associated with {bound}")),
            ),
            _ => Ok(Transition::Done(Resolved::Deleted)),
        }
    }
}

impl ResourceHandler for WebAclAssociationHandler<'_> {
    type Model = WebAclAssociationModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn step(
        &self,
        request: &Request<WebAclAssociationModel>,
        step: Step,
        context: &mut CallbackContext,
    ) -> StepResult<WebAclAssociationModel> {
        match (request.operation, step) {
            (Operation::Read, Step::Start) => {
                Self::validate(request)?;
                Ok(Transition::Next(Step::Finalize))
            }
            (Operation::Delete, Step::Start) => {
                Self::validate(request)?;
                Ok(Transition::Next(Step::CheckExisting))
            }
            (_, Step::Start) => {
                Self::validate(request)?;
                Ok(Transition::Next(Step::Mutate))
            }
            (Operation::Create | Operation::Update, Step::Mutate) => self.associate(request),
            (Operation::Delete, Step::CheckExisting) => self.check_existing(request),
            (Operation::Delete, Step::Mutate) => self.disassociate(request, context),
            (Operation::Delete, Step::AwaitDeletion) => self.await_deletion(request, context),
            (Operation::Create | Operation::Read | Operation::Update, Step::Finalize) => {
                self.read(request)
            }
            (operation, step) => Err(StepError::invalid(format!(
                "{TYPE_NAME} {operation} has no {step} step"
            ))),
        }
    }
}
