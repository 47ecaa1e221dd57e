//! Validation and tag helpers shared by the handlers

use reconcile::StepError;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use wafkit::{Backend, Scope, Tag};

/// Resource names: 1 to 128 letters, digits, underscores or hyphens.
static NAME_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("NAME_REGEX is a valid regex pattern")
});

/// Check a resource name before it reaches the service
pub fn validate_name(name: Option<&str>) -> Result<&str, StepError> {
    let name = name.ok_or_else(|| StepError::invalid("Name is required"))?;
    if !NAME_REGEX.is_match(name) {
        return Err(StepError::invalid(format!(
            "Name '{name}' must be 1-128 characters of letters, digits, '_' or '-'"
        )));
    }
    Ok(name)
}

/// Borrow a required member or fail validation
pub fn require<'a, T>(field: &str, value: Option<&'a T>) -> Result<&'a T, StepError>
where
    T: ?Sized,
{
    value.ok_or_else(|| StepError::invalid(format!("{field} is required")))
}

/// Fail validation when any required member is absent
pub fn reject_missing(missing: &[&str]) -> Result<(), StepError> {
    if missing.is_empty() {
        return Ok(());
    }
    Err(StepError::invalid(format!(
        "missing required properties: {}",
        missing.join(", ")
    )))
}

/// Fail validation when a member fixed at create time changed
pub fn reject_immutable(changed: &[&str]) -> Result<(), StepError> {
    if changed.is_empty() {
        return Ok(());
    }
    Err(StepError::invalid(format!(
        "cannot update create-only properties: {}",
        changed.join(", ")
    )))
}

/// Fail validation when the caller tried to set a server-computed member
pub fn reject_read_only(supplied: &[&str]) -> Result<(), StepError> {
    if supplied.is_empty() {
        return Ok(());
    }
    Err(StepError::invalid(format!(
        "cannot set read-only properties: {}",
        supplied.join(", ")
    )))
}

/// `Some(field)` when an immutable member differs from its previous value
pub fn changed<T: PartialEq>(
    field: &'static str,
    desired: &Option<T>,
    previous: &Option<T>,
) -> Option<&'static str> {
    (desired != previous).then_some(field)
}

/// `Some(field)` when a read-only member was supplied
///
/// With a previous state, echoing the previous value back is allowed.
pub fn supplied<T: PartialEq>(
    field: &'static str,
    desired: &Option<T>,
    previous: Option<&Option<T>>,
) -> Option<&'static str> {
    let offending = match previous {
        None => desired.is_some(),
        Some(previous) => desired.is_some() && desired != previous,
    };
    offending.then_some(field)
}

/// Scope of a resource, read from its ARN
pub fn scope_of_arn(arn: &str) -> Scope {
    if arn.contains(":global/") {
        Scope::CloudFront
    } else {
        Scope::Regional
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Tags of a resource; never tagged means no tags
pub fn read_tags(backend: &dyn Backend, arn: &str) -> wafkit::Result<Vec<Tag>> {
    Ok(backend.list_tags_for_resource(arn)?.unwrap_or_default())
}

/// What it takes to turn one tag set into another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Keys present before and absent now
    pub remove: Vec<String>,
    /// New keys and keys whose value changed
    pub upsert: Vec<Tag>,
}

impl TagDiff {
    pub fn between(current: &[Tag], desired: &[Tag]) -> Self {
        let current = as_map(current);
        let desired = as_map(desired);

        let remove = current
            .keys()
            .filter(|key| !desired.contains_key(*key))
            .map(|key| (*key).to_string())
            .collect();
        let upsert = desired
            .iter()
            .filter(|(key, value)| current.get(*key) != Some(*value))
            .map(|(key, value)| Tag::new(*key, *value))
            .collect();

        Self { remove, upsert }
    }

    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.upsert.is_empty()
    }
}

fn as_map(tags: &[Tag]) -> BTreeMap<&str, &str> {
    tags.iter()
        .map(|t| (t.key.as_str(), t.value.as_str()))
        .collect()
}

/// Bring the remote tags of `arn` in line with `desired`
///
/// Untags first, then tags; calls are skipped when there is nothing to do.
pub fn sync_tags(backend: &dyn Backend, arn: &str, desired: &[Tag]) -> wafkit::Result<TagDiff> {
    let current = read_tags(backend, arn)?;
    let diff = TagDiff::between(&current, desired);
    if diff.is_empty() {
        log::debug!("tags of {arn} already match");
        return Ok(diff);
    }

    if !diff.remove.is_empty() {
        log::debug!("untagging {arn}: {:?}", diff.remove);
        backend.untag_resource(arn, &diff.remove)?;
    }
    if !diff.upsert.is_empty() {
        log::debug!("tagging {arn}: {} tags", diff.upsert.len());
        backend.tag_resource(arn, &diff.upsert)?;
    }
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wafkit::MockBackend;
    use wafkit::types::{IpAddressVersion, IpSet};

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name(Some("edge-acl_1")).unwrap(), "edge-acl_1");
        assert!(validate_name(None).is_err());
        assert!(validate_name(Some("")).is_err());
        assert!(validate_name(Some("has space")).is_err());
        assert!(validate_name(Some(&"a".repeat(128))).is_ok());
        assert!(validate_name(Some(&"a".repeat(129))).is_err());
    }

    #[test]
    fn test_supplied_allows_echo_of_previous() {
        assert_eq!(supplied("Arn", &Some(1), None), Some("Arn"));
        assert_eq!(supplied("Arn", &Some(1), Some(&Some(1))), None);
        assert_eq!(supplied("Arn", &Some(2), Some(&Some(1))), Some("Arn"));
        assert_eq!(supplied::<i32>("Arn", &None, Some(&Some(1))), None);
    }

    #[test]
    fn test_changed() {
        assert_eq!(changed("Scope", &Some(Scope::Regional), &Some(Scope::Regional)), None);
        assert_eq!(
            changed("Scope", &Some(Scope::CloudFront), &Some(Scope::Regional)),
            Some("Scope")
        );
    }

    #[test]
    fn test_tag_diff() {
        let current = vec![Tag::new("team", "edge"), Tag::new("env", "dev")];
        let desired = vec![Tag::new("env", "prod"), Tag::new("owner", "sec")];

        let diff = TagDiff::between(&current, &desired);
        assert_eq!(diff.remove, vec!["team".to_string()]);
        assert_eq!(
            diff.upsert,
            vec![Tag::new("env", "prod"), Tag::new("owner", "sec")]
        );
    }

    #[test]
    fn test_tag_equality_ignores_order() {
        let a = vec![Tag::new("a", "1"), Tag::new("b", "2")];
        let b = vec![Tag::new("b", "2"), Tag::new("a", "1")];
        assert!(TagDiff::between(&a, &b).is_empty());
        assert!(!TagDiff::between(&a, &a[..1]).is_empty());
    }

    #[test]
    fn test_sync_skips_calls_when_equal() {
        let mock = MockBackend::new();
        let set = IpSet {
            name: "office".to_string(),
            id: None,
            arn: None,
            description: None,
            ip_address_version: IpAddressVersion::Ipv4,
            addresses: vec![],
        };
        let summary = mock
            .create_ip_set(Scope::Regional, &set, &[Tag::new("a", "1")])
            .unwrap();

        sync_tags(&mock, &summary.arn, &[Tag::new("a", "1")]).unwrap();
        assert_eq!(mock.call_count("TagResource"), 0);
        assert_eq!(mock.call_count("UntagResource"), 0);

        sync_tags(&mock, &summary.arn, &[]).unwrap();
        assert_eq!(mock.call_count("UntagResource"), 1);
        assert!(read_tags(&mock, &summary.arn).unwrap().is_empty());
    }

    #[test]
    fn test_scope_of_arn() {
        assert_eq!(
            scope_of_arn("arn:aws:wafv2:us-east-1:123456789012:global/webacl/a/1"),
            Scope::CloudFront
        );
        assert_eq!(
            scope_of_arn("arn:aws:wafv2:us-east-1:123456789012:regional/webacl/a/1"),
            Scope::Regional
        );
    }
}
