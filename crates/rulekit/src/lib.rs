//! # rulekit
//!
//! Declarative rule statements and their conversion to and from the wire.
//!
//! A [`Statement`] is a closed tree: leaf predicates (byte match, size
//! constraint, geo match, references to IP sets and pattern sets, ...) and
//! combinators (AND, OR, NOT, rate-based) that nest to any depth. The
//! [`convert`] module maps it onto the provisioning API's
//! one-member-populated wire shape and back.
//!
//! ## Example
//!
//! ```
//! use rulekit::{FieldToMatch, Statement, convert};
//! use rulekit::model::ByteMatch;
//! use wafkit::statement::{PositionalConstraint, TextTransformation, TextTransformationType};
//!
//! let admin = Statement::ByteMatch(ByteMatch {
//!     search_string: Some("/admin".to_string()),
//!     search_string_base64: None,
//!     field_to_match: FieldToMatch::uri_path(),
//!     text_transformations: vec![TextTransformation {
//!         priority: 0,
//!         kind: TextTransformationType::Lowercase,
//!     }],
//!     positional_constraint: PositionalConstraint::StartsWith,
//! });
//!
//! let wire = convert::to_wire(&Statement::not(admin)).unwrap();
//! assert!(wire.not_statement.is_some());
//! ```

#![warn(clippy::all)]

pub mod convert;
pub mod error;
pub mod model;

pub use convert::{MAX_DEPTH, from_wire, to_wire};
pub use error::{ConversionError, Result};
pub use model::{FieldToMatch, Rule, Statement};
