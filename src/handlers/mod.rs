//! Resource handlers, one per firewall resource type
//!
//! [`dispatch`] routes a raw request to the handler named by its
//! `resourceType`.

pub mod common;
pub mod ip_set;
pub mod lockable;
pub mod logging_configuration;
pub mod regex_pattern_set;
pub mod rule_group;
pub mod web_acl;
pub mod web_acl_association;

use reconcile::{ErrorKind, HandlerRequest, HandlerResponse, StabilizationPolicy, invoke};
use wafkit::Backend;

/// Every resource type this binary can reconcile
pub const RESOURCE_TYPES: &[&str] = &[
    web_acl::TYPE_NAME,
    rule_group::TYPE_NAME,
    ip_set::TYPE_NAME,
    regex_pattern_set::TYPE_NAME,
    logging_configuration::TYPE_NAME,
    web_acl_association::TYPE_NAME,
];

/// Run one invocation against the handler for `request.resource_type`
pub fn dispatch(
    backend: &dyn Backend,
    request: HandlerRequest,
    policy: &StabilizationPolicy,
) -> HandlerResponse {
    log::debug!("{} {}", request.resource_type, request.operation);
    match request.resource_type.as_str() {
        web_acl::TYPE_NAME => invoke(&web_acl::WebAclHandler::new(backend), request, policy),
        rule_group::TYPE_NAME => {
            invoke(&rule_group::RuleGroupHandler::new(backend), request, policy)
        }
        ip_set::TYPE_NAME => invoke(&ip_set::IpSetHandler::new(backend), request, policy),
        regex_pattern_set::TYPE_NAME => invoke(
            &regex_pattern_set::RegexPatternSetHandler::new(backend),
            request,
            policy,
        ),
        logging_configuration::TYPE_NAME => invoke(
            &logging_configuration::LoggingConfigurationHandler::new(backend),
            request,
            policy,
        ),
        web_acl_association::TYPE_NAME => invoke(
            &web_acl_association::WebAclAssociationHandler::new(backend),
            request,
            policy,
        ),
        other => HandlerResponse::failed(
            ErrorKind::InvalidRequest,
            format!(
                "unsupported resource type {other}, expected one of: {}",
                RESOURCE_TYPES.join(", ")
            ),
        ),
    }
}
