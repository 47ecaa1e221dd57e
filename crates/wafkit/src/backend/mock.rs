//! In-memory backend for testing without network access.
//!
//! Behaves like the service where it matters to callers: duplicate names are
//! rejected, every mutation rotates the resource's mutation token, stale tokens
//! fail with an optimistic-lock fault, and web ACLs still associated with a
//! resource cannot be deleted. Faults can be scripted per operation name and
//! every call is recorded.

use super::{Backend, Endpoints, IP_SET, Lockable, REGEX_PATTERN_SET, RULE_GROUP, WEB_ACL};
use crate::error::{Error, Fault, FaultCategory, Result};
use crate::types::{
    IpSet, LoggingConfiguration, Page, RegexPatternSet, ResourceRef, RuleGroup, Scope, Summary,
    Tag, Versioned, WebAcl,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const REGION: &str = "us-east-1";
const ACCOUNT: &str = "123456789012";
const DEFAULT_PAGE_SIZE: usize = 100;

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: String,
    /// Mutation token the caller presented, for token-guarded calls.
    pub lock_token: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    scope: Scope,
    item: T,
    lock_token: String,
}

type Table<T> = BTreeMap<String, Entry<T>>;

#[derive(Debug)]
struct MockState {
    web_acls: Table<WebAcl>,
    rule_groups: Table<RuleGroup>,
    ip_sets: Table<IpSet>,
    regex_pattern_sets: Table<RegexPatternSet>,
    logging: BTreeMap<String, LoggingConfiguration>,
    associations: BTreeMap<String, String>,
    /// Resources whose disassociation is still propagating: (web ACL ARN, reads left).
    lingering: BTreeMap<String, (String, u32)>,
    tags: BTreeMap<String, Vec<Tag>>,
    faults: HashMap<String, VecDeque<Fault>>,
    calls: Vec<Call>,
    sequence: u64,
    page_size: usize,
    disassociation_lag: u32,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            web_acls: BTreeMap::new(),
            rule_groups: BTreeMap::new(),
            ip_sets: BTreeMap::new(),
            regex_pattern_sets: BTreeMap::new(),
            logging: BTreeMap::new(),
            associations: BTreeMap::new(),
            lingering: BTreeMap::new(),
            tags: BTreeMap::new(),
            faults: HashMap::new(),
            calls: Vec::new(),
            sequence: 0,
            page_size: DEFAULT_PAGE_SIZE,
            disassociation_lag: 0,
        }
    }
}

impl MockState {
    /// Record a call and surface the next scripted fault for it, if any.
    fn enter(&mut self, operation: &str, lock_token: Option<&str>) -> Result<()> {
        self.calls.push(Call {
            operation: operation.to_string(),
            lock_token: lock_token.map(str::to_string),
        });
        match self.faults.get_mut(operation).and_then(VecDeque::pop_front) {
            Some(fault) => Err(Error::Fault(fault)),
            None => Ok(()),
        }
    }

    fn next(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}-{:08x}", self.sequence)
    }
}

/// Per-type storage access and service-computed members.
trait Stored: Lockable {
    fn table(state: &mut MockState) -> &mut Table<Self>;

    fn compute(&mut self) {}
}

impl Stored for WebAcl {
    fn table(state: &mut MockState) -> &mut Table<Self> {
        &mut state.web_acls
    }

    fn compute(&mut self) {
        let capacity: usize = self.rules.iter().map(|r| r.statement.node_count()).sum();
        self.capacity = Some(i64::try_from(capacity).unwrap_or(i64::MAX));
        self.label_namespace = Some(format!("awswaf:{ACCOUNT}:webacl:{}:", self.name));
    }
}

impl Stored for RuleGroup {
    fn table(state: &mut MockState) -> &mut Table<Self> {
        &mut state.rule_groups
    }

    fn compute(&mut self) {
        self.label_namespace = Some(format!("awswaf:{ACCOUNT}:rulegroup:{}:", self.name));
    }
}

impl Stored for IpSet {
    fn table(state: &mut MockState) -> &mut Table<Self> {
        &mut state.ip_sets
    }
}

impl Stored for RegexPatternSet {
    fn table(state: &mut MockState) -> &mut Table<Self> {
        &mut state.regex_pattern_sets
    }
}

fn nonexistent() -> Error {
    Error::fault(
        FaultCategory::NonexistentItem,
        "AWS WAF couldn't perform the operation because your resource doesn't exist.",
    )
}

fn paginate<T: Clone>(items: &[T], marker: Option<&str>, page_size: usize) -> Result<Page<T>> {
    let start = match marker {
        Some(m) => m.parse::<usize>().map_err(|_| {
            Error::fault(
                FaultCategory::InvalidParameter,
                format!("Error reason: invalid NextMarker {m}"),
            )
        })?,
        None => 0,
    };
    let end = (start + page_size).min(items.len());
    let slice = items.get(start..end).unwrap_or_default();
    Ok(Page {
        items: slice.to_vec(),
        next_marker: (end < items.len()).then(|| end.to_string()),
    })
}

fn scope_of_arn(arn: &str) -> Scope {
    if arn.contains(":global/") {
        Scope::CloudFront
    } else {
        Scope::Regional
    }
}

/// Mock backend storing resources in memory.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit list pages to `size` items.
    #[must_use]
    pub fn with_page_size(self, size: usize) -> Self {
        self.lock().page_size = size.max(1);
        self
    }

    /// Keep reporting a resource as associated for `reads` lookups after it is disassociated.
    pub fn set_disassociation_lag(&self, reads: u32) {
        self.lock().disassociation_lag = reads;
    }

    /// Fail the next call to `operation` with `fault`.
    pub fn fail_next(&self, operation: &str, fault: Fault) {
        self.fail_times(operation, fault, 1);
    }

    /// Fail the next `times` calls to `operation` with `fault`.
    pub fn fail_times(&self, operation: &str, fault: Fault, times: usize) {
        let mut state = self.lock();
        let queue = state.faults.entry(operation.to_string()).or_default();
        queue.extend(std::iter::repeat_n(fault, times));
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of calls made to `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Rotate the mutation token of a stored resource, as a concurrent writer would.
    pub fn touch(&self, id: &str) -> bool {
        let mut state = self.lock();
        let token = state.next("token");
        macro_rules! rotate {
            ($table:ident) => {
                if let Some(entry) = state.$table.get_mut(id) {
                    entry.lock_token = token;
                    return true;
                }
            };
        }
        rotate!(web_acls);
        rotate!(rule_groups);
        rotate!(ip_sets);
        rotate!(regex_pattern_sets);
        false
    }

    /// Current mutation token of a stored resource.
    pub fn lock_token_of(&self, id: &str) -> Option<String> {
        let state = self.lock();
        state
            .web_acls
            .get(id)
            .map(|e| e.lock_token.clone())
            .or_else(|| state.rule_groups.get(id).map(|e| e.lock_token.clone()))
            .or_else(|| state.ip_sets.get(id).map(|e| e.lock_token.clone()))
            .or_else(|| {
                state
                    .regex_pattern_sets
                    .get(id)
                    .map(|e| e.lock_token.clone())
            })
    }

    /// Web ACL ARN currently associated with a resource.
    pub fn association_of(&self, resource_arn: &str) -> Option<String> {
        self.lock().associations.get(resource_arn).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create<T: Stored>(&self, scope: Scope, item: &T, tags: &[Tag]) -> Result<Summary> {
        let endpoints: Endpoints = T::ENDPOINTS;
        let mut state = self.lock();
        state.enter(endpoints.create, None)?;

        let duplicate = T::table(&mut state)
            .values()
            .any(|e| e.scope == scope && e.item.name() == item.name());
        if duplicate {
            return Err(Error::fault(
                FaultCategory::DuplicateItem,
                format!(
                    "AWS WAF couldn't perform the operation because some resource in your request is a duplicate of an existing one. ({})",
                    item.name()
                ),
            ));
        }

        let id = state.next("id");
        let token = state.next("token");
        let arn = format!(
            "arn:aws:wafv2:{REGION}:{ACCOUNT}:{}/{}/{}/{}",
            scope.arn_segment(),
            endpoints.arn_kind,
            item.name(),
            id
        );

        let mut stored = item.without_computed();
        stored.assign(id.clone(), arn.clone());
        stored.compute();

        if !tags.is_empty() {
            state.tags.insert(arn.clone(), tags.to_vec());
        }
        let summary = Summary {
            name: item.name().to_string(),
            id: id.clone(),
            arn,
            description: item.description().map(str::to_string),
            lock_token: Some(token.clone()),
        };
        T::table(&mut state).insert(
            id,
            Entry {
                scope,
                item: stored,
                lock_token: token,
            },
        );
        Ok(summary)
    }

    fn get<T: Stored>(&self, target: &ResourceRef) -> Result<Versioned<T>> {
        let mut state = self.lock();
        state.enter(T::ENDPOINTS.get, None)?;
        let entry = T::table(&mut state)
            .get(&target.id)
            .filter(|e| e.scope == target.scope && e.item.name() == target.name)
            .ok_or_else(nonexistent)?;
        Ok(Versioned {
            item: entry.item.clone(),
            lock_token: entry.lock_token.clone(),
        })
    }

    fn update<T: Stored>(&self, target: &ResourceRef, item: &T, lock_token: &str) -> Result<String> {
        let mut state = self.lock();
        state.enter(T::ENDPOINTS.update, Some(lock_token))?;
        let next = state.next("token");
        let entry = T::table(&mut state)
            .get_mut(&target.id)
            .filter(|e| e.scope == target.scope && e.item.name() == target.name)
            .ok_or_else(nonexistent)?;
        if entry.lock_token != lock_token {
            return Err(Error::fault(
                FaultCategory::OptimisticLock,
                "AWS WAF couldn't save your changes because someone changed the resource after you started to edit it.",
            ));
        }

        let id = target.id.clone();
        let arn = entry.item.arn().unwrap_or_default().to_string();
        let mut stored = item.without_computed();
        stored.assign(id, arn);
        stored.compute();
        entry.item = stored;
        entry.lock_token.clone_from(&next);
        Ok(next)
    }

    fn delete<T: Stored>(&self, target: &ResourceRef, lock_token: &str) -> Result<()> {
        let mut state = self.lock();
        state.enter(T::ENDPOINTS.delete, Some(lock_token))?;
        let entry = T::table(&mut state)
            .get(&target.id)
            .filter(|e| e.scope == target.scope && e.item.name() == target.name)
            .ok_or_else(nonexistent)?;
        if entry.lock_token != lock_token {
            return Err(Error::fault(
                FaultCategory::OptimisticLock,
                "AWS WAF couldn't save your changes because someone changed the resource after you started to edit it.",
            ));
        }
        let arn = entry.item.arn().unwrap_or_default().to_string();
        if state.associations.values().any(|acl| *acl == arn) {
            return Err(Error::fault(
                FaultCategory::AssociatedItem,
                "AWS WAF couldn't perform the operation because your resource is being used by another resource or it's associated with another resource.",
            ));
        }
        T::table(&mut state).remove(&target.id);
        state.tags.remove(&arn);
        Ok(())
    }

    fn list<T: Stored>(&self, scope: Scope, marker: Option<&str>) -> Result<Page<Summary>> {
        let mut state = self.lock();
        state.enter(T::ENDPOINTS.list, None)?;
        let page_size = state.page_size;
        let summaries: Vec<Summary> = T::table(&mut state)
            .iter()
            .filter(|(_, e)| e.scope == scope)
            .map(|(id, e)| Summary {
                name: e.item.name().to_string(),
                id: id.clone(),
                arn: e.item.arn().unwrap_or_default().to_string(),
                description: e.item.description().map(str::to_string),
                lock_token: Some(e.lock_token.clone()),
            })
            .collect();
        paginate(&summaries, marker, page_size)
    }
}

impl Backend for MockBackend {
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
        let mut state = self.lock();
        state.enter("PutLoggingConfiguration", None)?;
        let stored = LoggingConfiguration {
            managed_by_firewall_manager: Some(false),
            ..config.clone()
        };
        state
            .logging
            .insert(config.resource_arn.clone(), stored.clone());
        Ok(stored)
    }

    fn get_logging_configuration(&self, resource_arn: &str) -> Result<LoggingConfiguration> {
        let mut state = self.lock();
        state.enter("GetLoggingConfiguration", None)?;
        state
            .logging
            .get(resource_arn)
            .cloned()
            .ok_or_else(nonexistent)
    }

    fn delete_logging_configuration(&self, resource_arn: &str) -> Result<()> {
        let mut state = self.lock();
        state.enter("DeleteLoggingConfiguration", None)?;
        state
            .logging
            .remove(resource_arn)
            .map(|_| ())
            .ok_or_else(nonexistent)
    }

    fn list_logging_configurations(
        &self,
        scope: Scope,
        marker: Option<&str>,
    ) -> Result<Page<LoggingConfiguration>> {
        let mut state = self.lock();
        state.enter("ListLoggingConfigurations", None)?;
        let configs: Vec<LoggingConfiguration> = state
            .logging
            .values()
            .filter(|c| scope_of_arn(&c.resource_arn) == scope)
            .cloned()
            .collect();
        paginate(&configs, marker, state.page_size)
    }

    fn associate_web_acl(&self, web_acl_arn: &str, resource_arn: &str) -> Result<()> {
        let mut state = self.lock();
        state.enter("AssociateWebACL", None)?;
        let known = state
            .web_acls
            .values()
            .any(|e| e.item.arn.as_deref() == Some(web_acl_arn));
        if !known {
            return Err(nonexistent());
        }
        state.lingering.remove(resource_arn);
        state
            .associations
            .insert(resource_arn.to_string(), web_acl_arn.to_string());
        Ok(())
    }

    fn disassociate_web_acl(&self, resource_arn: &str) -> Result<()> {
        let mut state = self.lock();
        state.enter("DisassociateWebACL", None)?;
        if let Some(acl) = state.associations.remove(resource_arn) {
            let lag = state.disassociation_lag;
            if lag > 0 {
                state.lingering.insert(resource_arn.to_string(), (acl, lag));
            }
        }
        Ok(())
    }

    fn get_web_acl_for_resource(&self, resource_arn: &str) -> Result<Option<WebAcl>> {
        let mut state = self.lock();
        state.enter("GetWebACLForResource", None)?;

        let current = state.associations.get(resource_arn).cloned();
        let acl_arn = match current {
            Some(arn) => Some(arn),
            None => match state.lingering.get_mut(resource_arn) {
                Some((arn, reads)) if *reads > 0 => {
                    *reads -= 1;
                    Some(arn.clone())
                }
                _ => None,
            },
        };

        Ok(acl_arn.and_then(|arn| {
            state
                .web_acls
                .values()
                .find(|e| e.item.arn.as_deref() == Some(arn.as_str()))
                .map(|e| e.item.clone())
        }))
    }

    fn list_tags_for_resource(&self, arn: &str) -> Result<Option<Vec<Tag>>> {
        let mut state = self.lock();
        state.enter("ListTagsForResource", None)?;
        Ok(state.tags.get(arn).cloned())
    }

    fn tag_resource(&self, arn: &str, tags: &[Tag]) -> Result<()> {
        let mut state = self.lock();
        state.enter("TagResource", None)?;
        let current = state.tags.entry(arn.to_string()).or_default();
        for tag in tags {
            match current.iter_mut().find(|t| t.key == tag.key) {
                Some(existing) => existing.value.clone_from(&tag.value),
                None => current.push(tag.clone()),
            }
        }
        Ok(())
    }

    fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<()> {
        let mut state = self.lock();
        state.enter("UntagResource", None)?;
        if let Some(current) = state.tags.get_mut(arn) {
            current.retain(|t| !keys.contains(&t.key));
        }
        Ok(())
    }
}
