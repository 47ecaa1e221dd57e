//! Backend that talks to the provisioning API over HTTPS.
//!
//! Every operation is a JSON 1.1 POST to the service endpoint with the
//! operation selected by the `X-Amz-Target` header. Faults come back as a
//! JSON body whose `__type` names the fault.
//!
//! Request signing is left to whatever sits in front of the endpoint (a
//! local signing proxy, for example).

use super::{Backend, Lockable};
use crate::error::{Error, FaultCategory, Result};
use crate::types::{
    IpSet, LoggingConfiguration, Page, RegexPatternSet, ResourceRef, RuleGroup, Scope, Summary,
    Tag, Versioned, WebAcl,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;

const TARGET_PREFIX: &str = "AWSWAF_20190729";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const PAGE_LIMIT: u32 = 100;

/// HTTPS backend for the provisioning API.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use wafkit::backend::{Backend, HttpBackend};
/// use wafkit::Scope;
///
/// let backend = HttpBackend::new("https://wafv2.us-east-1.amazonaws.com", Duration::from_secs(30));
/// let page = backend.list_web_acls(Scope::Regional, None).unwrap();
/// println!("{} web ACLs", page.items.len());
/// ```
pub struct HttpBackend {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpBackend {
    /// Create a backend for `endpoint` with a per-request timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke one operation and return the decoded response body.
    fn call(&self, operation: &str, input: &Value) -> Result<Value> {
        log::debug!("{operation} -> {}", self.endpoint);
        let body = serde_json::to_vec(input)?;

        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", &format!("{TARGET_PREFIX}.{operation}"))
            .header("User-Agent", concat!("wafkit/", env!("CARGO_PKG_VERSION")))
            .send(&body[..])?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::http(e.to_string(), Some(status)))?;

        if status >= 400 {
            let err = parse_fault(status, &text);
            log::debug!("{operation} failed: {err}");
            return Err(err);
        }
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn create<T: Lockable>(&self, scope: Scope, item: &T, tags: &[Tag]) -> Result<Summary> {
        let endpoints = T::ENDPOINTS;
        let mut input = payload(&item.without_computed())?;
        input.insert("Scope".to_string(), json!(scope));
        if !tags.is_empty() {
            input.insert("Tags".to_string(), serde_json::to_value(tags)?);
        }
        let mut output = self.call(endpoints.create, &Value::Object(input))?;
        take(&mut output, "Summary")
    }

    fn get<T: Lockable>(&self, target: &ResourceRef) -> Result<Versioned<T>> {
        let endpoints = T::ENDPOINTS;
        let mut output = self.call(endpoints.get, &identity(target))?;
        Ok(Versioned {
            item: take(&mut output, endpoints.item_key)?,
            lock_token: take(&mut output, "LockToken")?,
        })
    }

    fn update<T: Lockable>(&self, target: &ResourceRef, item: &T, lock_token: &str) -> Result<String> {
        let endpoints = T::ENDPOINTS;
        let mut input = payload(&item.without_computed())?;
        for key in endpoints.update_excludes {
            input.remove(*key);
        }
        input.insert("Name".to_string(), json!(target.name));
        input.insert("Scope".to_string(), json!(target.scope));
        input.insert("Id".to_string(), json!(target.id));
        input.insert("LockToken".to_string(), json!(lock_token));
        let mut output = self.call(endpoints.update, &Value::Object(input))?;
        take(&mut output, "NextLockToken")
    }

    fn delete<T: Lockable>(&self, target: &ResourceRef, lock_token: &str) -> Result<()> {
        let mut input = identity(target);
        input["LockToken"] = json!(lock_token);
        self.call(T::ENDPOINTS.delete, &input)?;
        Ok(())
    }

    fn list<T: Lockable>(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>> {
        let endpoints = T::ENDPOINTS;
        let mut output = self.call(endpoints.list, &listing(scope, marker))?;
        Ok(Page {
            items: take_or_default(&mut output, endpoints.list_key)?,
            next_marker: take_or_default(&mut output, "NextMarker")?,
        })
    }
}

/// Serialize a resource into a request object without identity members.
fn payload<T: Lockable>(item: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(item)? {
        Value::Object(mut map) => {
            map.remove("Id");
            map.remove("ARN");
            Ok(map)
        }
        other => Err(Error::InvalidResponse(format!(
            "expected an object payload, got {other}"
        ))),
    }
}

fn identity(target: &ResourceRef) -> Value {
    json!({ "Name": target.name, "Scope": target.scope, "Id": target.id })
}

fn listing(scope: Scope, marker: Option<&str>) -> Value {
    let mut input = json!({ "Scope": scope, "Limit": PAGE_LIMIT });
    if let Some(marker) = marker {
        input["NextMarker"] = json!(marker);
    }
    input
}

/// Move a required member out of a response object.
fn take<T: DeserializeOwned>(output: &mut Value, key: &str) -> Result<T> {
    let value = output
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| Error::InvalidResponse(format!("response is missing {key}")))?;
    Ok(serde_json::from_value(value)?)
}

/// Move an optional member out of a response object.
fn take_or_default<T: DeserializeOwned + Default>(output: &mut Value, key: &str) -> Result<T> {
    match output.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

/// Turn an error response into a typed error.
fn parse_fault(status: u16, body: &str) -> Error {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match parsed.get("__type").and_then(Value::as_str) {
        Some(type_name) => Error::fault(FaultCategory::from_type_name(type_name), message),
        None if status == 401 || status == 403 => Error::fault(FaultCategory::AccessDenied, message),
        None => {
            let message = if message.is_empty() {
                format!("HTTP {status}")
            } else {
                message
            };
            Error::http(message, Some(status))
        }
    }
}

impl Backend for HttpBackend {
    fn create_web_acl(&self, scope: Scope, acl: &WebAcl, tags: &[Tag]) -> Result<Summary> {
        self.create(scope, acl, tags)
    }

    fn get_web_acl(&self, target: &ResourceRef) -> Result<Versioned<WebAcl>> {
        self.get(target)
    }

    fn update_web_acl(
        &self,
        target: &ResourceRef,
        acl: &WebAcl,
        lock_token: &str,
    ) -> Result<String> {
        self.update(target, acl, lock_token)
    }

    fn delete_web_acl(&self, target: &ResourceRef, lock_token: &str) -> Result<()> {
        self.delete::<WebAcl>(target, lock_token)
    }

    fn list_web_acls(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>> {
        self.list::<WebAcl>(scope, marker)
    }

    fn create_rule_group(&self, scope: Scope, group: &RuleGroup, tags: &[Tag]) -> Result<Summary> {
        self.create(scope, group, tags)
    }

    fn get_rule_group(&self, target: &ResourceRef) -> Result<Versioned<RuleGroup>> {
        self.get(target)
    }

    fn update_rule_group(
        &self,
        target: &ResourceRef,
        group: &RuleGroup,
        lock_token: &str,
    ) -> Result<String> {
        self.update(target, group, lock_token)
    }

    fn delete_rule_group(&self, target: &ResourceRef, lock_token: &str) -> Result<()> {
        self.delete::<RuleGroup>(target, lock_token)
    }

    fn list_rule_groups(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>> {
        self.list::<RuleGroup>(scope, marker)
    }

    fn create_ip_set(&self, scope: Scope, set: &IpSet, tags: &[Tag]) -> Result<Summary> {
        self.create(scope, set, tags)
    }

    fn get_ip_set(&self, target: &ResourceRef) -> Result<Versioned<IpSet>> {
        self.get(target)
    }

    fn update_ip_set(&self, target: &ResourceRef, set: &IpSet, lock_token: &str) -> Result<String> {
        self.update(target, set, lock_token)
    }

    fn delete_ip_set(&self, target: &ResourceRef, lock_token: &str) -> Result<()> {
        self.delete::<IpSet>(target, lock_token)
    }

    fn list_ip_sets(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>> {
        self.list::<IpSet>(scope, marker)
    }

    fn create_regex_pattern_set(
        &self,
        scope: Scope,
        set: &RegexPatternSet,
        tags: &[Tag],
    ) -> Result<Summary> {
        self.create(scope, set, tags)
    }

    fn get_regex_pattern_set(&self, target: &ResourceRef) -> Result<Versioned<RegexPatternSet>> {
        self.get(target)
    }

    fn update_regex_pattern_set(
        &self,
        target: &ResourceRef,
        set: &RegexPatternSet,
        lock_token: &str,
    ) -> Result<String> {
        self.update(target, set, lock_token)
    }

    fn delete_regex_pattern_set(&self, target: &ResourceRef, lock_token: &str) -> Result<()> {
        self.delete::<RegexPatternSet>(target, lock_token)
    }

    fn list_regex_pattern_sets(
        &self,
        scope: Scope,
        marker: Option<&str>,
    ) -> Result<Page<Summary>> {
        self.list::<RegexPatternSet>(scope, marker)
    }

    fn put_logging_configuration(
        &self,
        config: &LoggingConfiguration,
    ) -> Result<LoggingConfiguration> {
        let input = json!({ "LoggingConfiguration": config });
        let mut output = self.call("PutLoggingConfiguration", &input)?;
        take(&mut output, "LoggingConfiguration")
    }

    fn get_logging_configuration(&self, resource_arn: &str) -> Result<LoggingConfiguration> {
        let input = json!({ "ResourceArn": resource_arn });
        let mut output = self.call("GetLoggingConfiguration", &input)?;
        take(&mut output, "LoggingConfiguration")
    }

    fn delete_logging_configuration(&self, resource_arn: &str) -> Result<()> {
        let input = json!({ "ResourceArn": resource_arn });
        self.call("DeleteLoggingConfiguration", &input)?;
        Ok(())
    }

    fn list_logging_configurations(
        &self,
        scope: Scope,
        marker: Option<&str>,
    ) -> Result<Page<LoggingConfiguration>> {
        let mut output = self.call("ListLoggingConfigurations", &listing(scope, marker))?;
        Ok(Page {
            items: take_or_default(&mut output, "LoggingConfigurations")?,
            next_marker: take_or_default(&mut output, "NextMarker")?,
        })
    }

    fn associate_web_acl(&self, web_acl_arn: &str, resource_arn: &str) -> Result<()> {
        let input = json!({ "WebACLArn": web_acl_arn, "ResourceArn": resource_arn });
        self.call("AssociateWebACL", &input)?;
        Ok(())
    }

    fn disassociate_web_acl(&self, resource_arn: &str) -> Result<()> {
        let input = json!({ "ResourceArn": resource_arn });
        self.call("DisassociateWebACL", &input)?;
        Ok(())
    }

    fn get_web_acl_for_resource(&self, resource_arn: &str) -> Result<Option<WebAcl>> {
        let input = json!({ "ResourceArn": resource_arn });
        let mut output = self.call("GetWebACLForResource", &input)?;
        take_or_default(&mut output, "WebACL")
    }

    fn list_tags_for_resource(&self, arn: &str) -> Result<Option<Vec<Tag>>> {
        let input = json!({ "ResourceARN": arn });
        let mut output = self.call("ListTagsForResource", &input)?;
        match output.get_mut("TagInfoForResource") {
            Some(info) => take_or_default(info, "TagList"),
            None => Ok(None),
        }
    }

    fn tag_resource(&self, arn: &str, tags: &[Tag]) -> Result<()> {
        let input = json!({ "ResourceARN": arn, "Tags": tags });
        self.call("TagResource", &input)?;
        Ok(())
    }

    fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<()> {
        let input = json!({ "ResourceARN": arn, "TagKeys": keys });
        self.call("UntagResource", &input)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IpAddressVersion;

    #[test]
    fn test_parse_fault_typed() {
        let body = r#"{"__type":"com.amazonaws.wafv2#WAFOptimisticLockException","message":"stale"}"#;
        let err = parse_fault(400, body);
        let fault = err.as_fault().unwrap();
        assert_eq!(fault.category, FaultCategory::OptimisticLock);
        assert_eq!(fault.message, "stale");
    }

    #[test]
    fn test_parse_fault_capitalized_message() {
        let body = r#"{"__type":"WAFNonexistentItemException","Message":"gone"}"#;
        let err = parse_fault(400, body);
        assert!(err.is_not_found());
        assert_eq!(err.as_fault().unwrap().message, "gone");
    }

    #[test]
    fn test_parse_fault_forbidden_without_type() {
        let err = parse_fault(403, "<html>denied</html>");
        assert_eq!(
            err.as_fault().unwrap().category,
            FaultCategory::AccessDenied
        );
    }

    #[test]
    fn test_parse_fault_plain_server_error() {
        let err = parse_fault(503, "");
        assert!(matches!(err, Error::Http { status: Some(503), .. }));
    }

    #[test]
    fn test_payload_strips_identity() {
        let set = IpSet {
            name: "office".to_string(),
            id: Some("abc".to_string()),
            arn: Some("arn:set".to_string()),
            description: None,
            ip_address_version: IpAddressVersion::Ipv4,
            addresses: vec!["10.0.0.0/8".to_string()],
        };
        let map = payload(&set).unwrap();
        assert!(!map.contains_key("Id"));
        assert!(!map.contains_key("ARN"));
        assert_eq!(map["IPAddressVersion"], json!("IPV4"));
    }

    #[test]
    fn test_take_or_default_handles_null() {
        let mut output = json!({ "NextMarker": null });
        let marker: Option<String> = take_or_default(&mut output, "NextMarker").unwrap();
        assert_eq!(marker, None);
        let missing: Vec<Summary> = take_or_default(&mut output, "IPSets").unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_listing_carries_marker() {
        let input = listing(Scope::CloudFront, Some("next"));
        assert_eq!(input["Scope"], json!("CLOUDFRONT"));
        assert_eq!(input["NextMarker"], json!("next"));
    }
}
