//! # wafkit
//!
//! Wire types and backends for the web application firewall provisioning API.
//!
//! This crate provides:
//! - Serde types mirroring the API's JSON shapes (web ACLs, rule groups,
//!   IP sets, regex pattern sets, logging configurations, statements)
//! - Typed faults with the service's fault names preserved
//! - A [`Backend`] trait with an HTTPS implementation and an in-memory mock
//!
//! ## Example
//!
//! ```
//! use wafkit::{Backend, MockBackend, Scope, Tag};
//! use wafkit::types::{IpAddressVersion, IpSet};
//!
//! let backend = MockBackend::new();
//! let set = IpSet {
//!     name: "office".to_string(),
//!     id: None,
//!     arn: None,
//!     description: None,
//!     ip_address_version: IpAddressVersion::Ipv4,
//!     addresses: vec!["192.0.2.0/24".to_string()],
//! };
//!
//! let summary = backend
//!     .create_ip_set(Scope::Regional, &set, &[Tag::new("team", "edge")])
//!     .unwrap();
//! assert!(summary.arn.contains("/ipset/office/"));
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod statement;
pub mod types;

pub use backend::{Backend, HttpBackend, Lockable, MockBackend};
pub use error::{Error, Fault, FaultCategory, MISSING_INFORMATION_PREFIX, Result};
pub use types::{Page, ResourceRef, Scope, Summary, Tag, Versioned};
