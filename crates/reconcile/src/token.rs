//! Mutation tokens are read immediately before each mutating call
//!
//! Tokens obtained earlier in the same operation are never reused: a
//! concurrent writer may have rotated them in between.

use wafkit::{ResourceRef, Result, Versioned};

/// Read the current mutation token of a resource
pub fn fetch_token<T>(
    target: &ResourceRef,
    read: impl FnOnce(&ResourceRef) -> Result<Versioned<T>>,
) -> Result<String> {
    let current = read(target)?;
    log::debug!("fetched mutation token for {target}");
    Ok(current.lock_token)
}

/// Run a mutating call with a token read just before it
pub fn with_fresh_token<T, R>(
    target: &ResourceRef,
    read: impl FnOnce(&ResourceRef) -> Result<Versioned<T>>,
    mutate: impl FnOnce(&str) -> Result<R>,
) -> Result<R> {
    let token = fetch_token(target, read)?;
    mutate(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wafkit::types::{IpAddressVersion, IpSet};
    use wafkit::{Backend, MockBackend, Scope};

    fn office() -> IpSet {
        IpSet {
            name: "office".to_string(),
            id: None,
            arn: None,
            description: None,
            ip_address_version: IpAddressVersion::Ipv4,
            addresses: vec![],
        }
    }

    #[test]
    fn test_consecutive_mutations_use_fresh_tokens() {
        let mock = MockBackend::new();
        let summary = mock.create_ip_set(Scope::Regional, &office(), &[]).unwrap();
        let target = ResourceRef::new("office", &summary.id, Scope::Regional);

        let first = with_fresh_token(
            &target,
            |t| mock.get_ip_set(t),
            |token| mock.update_ip_set(&target, &office(), token),
        )
        .unwrap();

        // A concurrent writer rotates the token between the two calls
        mock.touch(&summary.id);

        with_fresh_token(
            &target,
            |t| mock.get_ip_set(t),
            |token| mock.update_ip_set(&target, &office(), token),
        )
        .unwrap();

        let updates: Vec<_> = mock
            .calls()
            .into_iter()
            .filter(|c| c.operation == "UpdateIPSet")
            .collect();
        assert_eq!(updates.len(), 2);
        assert_ne!(updates[1].lock_token.as_deref(), Some(first.as_str()));
        assert_eq!(mock.call_count("GetIPSet"), 2);
    }

    #[test]
    fn test_read_failure_skips_mutation() {
        let mock = MockBackend::new();
        let target = ResourceRef::new("missing", "nope", Scope::Regional);
        let mut mutated = false;

        let result = with_fresh_token(
            &target,
            |t| mock.get_ip_set(t),
            |_| {
                mutated = true;
                Ok(())
            },
        );
        assert!(result.unwrap_err().is_not_found());
        assert!(!mutated);
    }
}
