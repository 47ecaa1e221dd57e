//! Backend trait and implementations for the provisioning API.
//!
//! [`http::HttpBackend`] talks to the real service. [`mock::MockBackend`]
//! keeps everything in memory and is what the handler tests run against:
//!
//! ```
//! use wafkit::backend::{Backend, MockBackend};
//! use wafkit::Scope;
//!
//! let mock = MockBackend::new();
//! let page = mock.list_ip_sets(Scope::Regional, None).unwrap();
//! assert!(page.items.is_empty());
//! assert_eq!(mock.call_count("ListIPSets"), 1);
//! ```

pub mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::{Call, MockBackend};

use crate::error::Result;
use crate::types::{
    IpSet, LoggingConfiguration, Page, RegexPatternSet, ResourceRef, RuleGroup, Scope, Summary,
    Tag, Versioned, WebAcl,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Operation names and payload keys for one lockable resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub create: &'static str,
    pub get: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
    pub list: &'static str,
    /// Key of the resource in get responses.
    pub item_key: &'static str,
    /// Key of the summaries in list responses.
    pub list_key: &'static str,
    /// Resource segment used in ARNs.
    pub arn_kind: &'static str,
    /// Members the update call does not accept.
    pub update_excludes: &'static [&'static str],
}

pub const WEB_ACL: Endpoints = Endpoints {
    create: "CreateWebACL",
    get: "GetWebACL",
    update: "UpdateWebACL",
    delete: "DeleteWebACL",
    list: "ListWebACLs",
    item_key: "WebACL",
    list_key: "WebACLs",
    arn_kind: "webacl",
    update_excludes: &[],
};

pub const RULE_GROUP: Endpoints = Endpoints {
    create: "CreateRuleGroup",
    get: "GetRuleGroup",
    update: "UpdateRuleGroup",
    delete: "DeleteRuleGroup",
    list: "ListRuleGroups",
    item_key: "RuleGroup",
    list_key: "RuleGroups",
    arn_kind: "rulegroup",
    update_excludes: &["Capacity"],
};

pub const IP_SET: Endpoints = Endpoints {
    create: "CreateIPSet",
    get: "GetIPSet",
    update: "UpdateIPSet",
    delete: "DeleteIPSet",
    list: "ListIPSets",
    item_key: "IPSet",
    list_key: "IPSets",
    arn_kind: "ipset",
    update_excludes: &["IPAddressVersion"],
};

pub const REGEX_PATTERN_SET: Endpoints = Endpoints {
    create: "CreateRegexPatternSet",
    get: "GetRegexPatternSet",
    update: "UpdateRegexPatternSet",
    delete: "DeleteRegexPatternSet",
    list: "ListRegexPatternSets",
    item_key: "RegexPatternSet",
    list_key: "RegexPatternSets",
    arn_kind: "regexpatternset",
    update_excludes: &[],
};

/// A resource type guarded by mutation tokens.
pub trait Lockable: Clone + Serialize + DeserializeOwned + Send + Sync {
    const ENDPOINTS: Endpoints;

    fn name(&self) -> &str;
    fn id(&self) -> Option<&str>;
    fn arn(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;

    /// Record the identity the service assigned.
    fn assign(&mut self, id: String, arn: String);

    /// Copy without server-assigned members, suitable as create input.
    fn without_computed(&self) -> Self;
}

macro_rules! lockable {
    ($ty:ty, $endpoints:expr, [$($computed:ident),*]) => {
        impl Lockable for $ty {
            const ENDPOINTS: Endpoints = $endpoints;

            fn name(&self) -> &str {
                &self.name
            }

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn arn(&self) -> Option<&str> {
                self.arn.as_deref()
            }

            fn description(&self) -> Option<&str> {
                self.description.as_deref()
            }

            fn assign(&mut self, id: String, arn: String) {
                self.id = Some(id);
                self.arn = Some(arn);
            }

            fn without_computed(&self) -> Self {
                Self {
                    id: None,
                    arn: None,
                    $($computed: None,)*
                    ..self.clone()
                }
            }
        }
    };
}

lockable!(WebAcl, WEB_ACL, [capacity, label_namespace]);
lockable!(RuleGroup, RULE_GROUP, [label_namespace]);
lockable!(IpSet, IP_SET, []);
lockable!(RegexPatternSet, REGEX_PATTERN_SET, []);

/// The provisioning API, one method per remote operation.
///
/// Absence is reported as a `NonexistentItem` fault everywhere except
/// [`Backend::get_web_acl_for_resource`], which answers `None`, and
/// [`Backend::list_tags_for_resource`], which may answer `None` for a
/// resource that was never tagged.
pub trait Backend: Send + Sync {
    fn create_web_acl(&self, scope: Scope, acl: &WebAcl, tags: &[Tag]) -> Result<Summary>;
    fn get_web_acl(&self, target: &ResourceRef) -> Result<Versioned<WebAcl>>;
    /// Returns the next mutation token.
    fn update_web_acl(&self, target: &ResourceRef, acl: &WebAcl, lock_token: &str)
    -> Result<String>;
    fn delete_web_acl(&self, target: &ResourceRef, lock_token: &str) -> Result<()>;
    fn list_web_acls(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>>;

    fn create_rule_group(&self, scope: Scope, group: &RuleGroup, tags: &[Tag]) -> Result<Summary>;
    fn get_rule_group(&self, target: &ResourceRef) -> Result<Versioned<RuleGroup>>;
    fn update_rule_group(
        &self,
        target: &ResourceRef,
        group: &RuleGroup,
        lock_token: &str,
    ) -> Result<String>;
    fn delete_rule_group(&self, target: &ResourceRef, lock_token: &str) -> Result<()>;
    fn list_rule_groups(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>>;

    fn create_ip_set(&self, scope: Scope, set: &IpSet, tags: &[Tag]) -> Result<Summary>;
    fn get_ip_set(&self, target: &ResourceRef) -> Result<Versioned<IpSet>>;
    fn update_ip_set(&self, target: &ResourceRef, set: &IpSet, lock_token: &str) -> Result<String>;
    fn delete_ip_set(&self, target: &ResourceRef, lock_token: &str) -> Result<()>;
    fn list_ip_sets(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>>;

    fn create_regex_pattern_set(
        &self,
        scope: Scope,
        set: &RegexPatternSet,
        tags: &[Tag],
    ) -> Result<Summary>;
    fn get_regex_pattern_set(&self, target: &ResourceRef) -> Result<Versioned<RegexPatternSet>>;
    fn update_regex_pattern_set(
        &self,
        target: &ResourceRef,
        set: &RegexPatternSet,
        lock_token: &str,
    ) -> Result<String>;
    fn delete_regex_pattern_set(&self, target: &ResourceRef, lock_token: &str) -> Result<()>;
    fn list_regex_pattern_sets(&self, scope: Scope, marker: Option<&str>)
    -> Result<Page<Summary>>;

    fn put_logging_configuration(
        &self,
        config: &LoggingConfiguration,
    ) -> Result<LoggingConfiguration>;
    fn get_logging_configuration(&self, resource_arn: &str) -> Result<LoggingConfiguration>;
    fn delete_logging_configuration(&self, resource_arn: &str) -> Result<()>;
    fn list_logging_configurations(
        &self,
        scope: Scope,
        marker: Option<&str>,
    ) -> Result<Page<LoggingConfiguration>>;

    fn associate_web_acl(&self, web_acl_arn: &str, resource_arn: &str) -> Result<()>;
    fn disassociate_web_acl(&self, resource_arn: &str) -> Result<()>;
    fn get_web_acl_for_resource(&self, resource_arn: &str) -> Result<Option<WebAcl>>;

    fn list_tags_for_resource(&self, arn: &str) -> Result<Option<Vec<Tag>>>;
    fn tag_resource(&self, arn: &str, tags: &[Tag]) -> Result<()>;
    fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<()>;
}
