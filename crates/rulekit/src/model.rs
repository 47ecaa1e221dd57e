//! Declarative statement model.
//!
//! Unlike the wire shape, a [`Statement`] is an enum: exactly one variant is
//! populated by construction. JSON keeps the familiar nesting
//! (`{"NotStatement": {"Statement": {...}}}`) through external tagging.
//!
//! Leaves with no declarative quirks reuse the wire structs directly.

use serde::{Deserialize, Serialize};
use wafkit::statement::{
    BodyParsingFallbackBehavior, ComparisonOperator, Empty, ForwardedIpConfig, JsonMatchScope,
    PositionalConstraint, RateBasedKeyType, SensitivityLevel, SingleHeader, SingleQueryArgument,
    TextTransformation,
};
use wafkit::types::{Label, OverrideAction, RuleAction, VisibilityConfig};

pub use wafkit::statement::{
    ExcludedRule, GeoMatchStatement as GeoMatch, IpSetReferenceStatement as IpSetReference,
    LabelMatchStatement as LabelMatch, RuleGroupReferenceStatement as RuleGroupReference,
};

/// A node of the boolean match expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    #[serde(rename = "ByteMatchStatement")]
    ByteMatch(ByteMatch),
    #[serde(rename = "SqliMatchStatement")]
    SqliMatch(SqliMatch),
    #[serde(rename = "XssMatchStatement")]
    XssMatch(XssMatch),
    #[serde(rename = "SizeConstraintStatement")]
    SizeConstraint(SizeConstraint),
    #[serde(rename = "GeoMatchStatement")]
    GeoMatch(GeoMatch),
    #[serde(rename = "IPSetReferenceStatement")]
    IpSetReference(IpSetReference),
    #[serde(rename = "RegexPatternSetReferenceStatement")]
    RegexPatternSetReference(RegexPatternSetReference),
    #[serde(rename = "RuleGroupReferenceStatement")]
    RuleGroupReference(RuleGroupReference),
    #[serde(rename = "ManagedRuleGroupStatement")]
    ManagedRuleGroup(ManagedRuleGroup),
    #[serde(rename = "LabelMatchStatement")]
    LabelMatch(LabelMatch),
    #[serde(rename = "RateBasedStatement")]
    RateBased(RateBased),
    #[serde(rename = "AndStatement")]
    And(And),
    #[serde(rename = "OrStatement")]
    Or(Or),
    #[serde(rename = "NotStatement")]
    Not(Not),
}

impl Statement {
    /// Combine statements with AND.
    pub fn and(statements: Vec<Self>) -> Self {
        Self::And(And { statements })
    }

    /// Combine statements with OR.
    pub fn or(statements: Vec<Self>) -> Self {
        Self::Or(Or { statements })
    }

    /// Negate a statement.
    #[allow(clippy::should_implement_trait)]
    pub fn not(statement: Self) -> Self {
        Self::Not(Not {
            statement: Box::new(statement),
        })
    }
}

/// Which part of a request a predicate inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldToMatch {
    SingleHeader(SingleHeader),
    SingleQueryArgument(SingleQueryArgument),
    AllQueryArguments(Empty),
    UriPath(Empty),
    QueryString(Empty),
    Body(Empty),
    Method(Empty),
    JsonBody(JsonBody),
}

impl FieldToMatch {
    /// Inspect one named header.
    pub fn header(name: impl Into<String>) -> Self {
        Self::SingleHeader(SingleHeader { name: name.into() })
    }

    /// Inspect the URI path.
    pub fn uri_path() -> Self {
        Self::UriPath(Empty {})
    }
}

/// Structured-body inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonBody {
    pub match_pattern: JsonMatchPattern,
    pub match_scope: JsonMatchScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_fallback_behavior: Option<BodyParsingFallbackBehavior>,
}

/// Either every element of the body, or only the listed JSON pointers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonMatchPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_paths: Option<Vec<String>>,
}

/// Byte match with a search string given as text or as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ByteMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_string_base64: Option<String>,
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
    pub positional_constraint: PositionalConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqliMatch {
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_level: Option<SensitivityLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XssMatch {
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
}

/// Size comparison. The size is a number here and an integer on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SizeConstraint {
    pub field_to_match: FieldToMatch,
    pub comparison_operator: ComparisonOperator,
    pub size: f64,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegexPatternSetReference {
    #[serde(rename = "ARN")]
    pub arn: String,
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedRuleGroup {
    pub vendor_name: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_rules: Option<Vec<ExcludedRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_down_statement: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateBased {
    pub limit: i64,
    pub aggregate_key_type: RateBasedKeyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_down_statement: Option<Box<Statement>>,
    #[serde(
        rename = "ForwardedIPConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub forwarded_ip_config: Option<ForwardedIpConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct And {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Or {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Not {
    pub statement: Box<Statement>,
}

/// A rule as declared in a web ACL or rule group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rule {
    pub name: String,
    pub priority: i32,
    pub statement: Statement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_action: Option<OverrideAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_labels: Option<Vec<Label>>,
    pub visibility_config: VisibilityConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_statement_json_is_externally_tagged() {
        let statement = Statement::not(Statement::LabelMatch(LabelMatch {
            scope: wafkit::statement::LabelMatchScope::Label,
            key: "bot:verified".to_string(),
        }));

        let value = serde_json::to_value(&statement).unwrap();
        assert_eq!(
            value,
            json!({
                "NotStatement": {
                    "Statement": {
                        "LabelMatchStatement": { "Scope": "LABEL", "Key": "bot:verified" }
                    }
                }
            })
        );
    }

    #[test]
    fn test_statement_rejects_two_variants() {
        let value = json!({
            "GeoMatchStatement": { "CountryCodes": ["NZ"] },
            "LabelMatchStatement": { "Scope": "LABEL", "Key": "x" }
        });
        assert!(serde_json::from_value::<Statement>(value).is_err());
    }

    #[test]
    fn test_field_to_match_empty_members() {
        let value = serde_json::to_value(FieldToMatch::uri_path()).unwrap();
        assert_eq!(value, json!({ "UriPath": {} }));

        let parsed: FieldToMatch =
            serde_json::from_value(json!({ "SingleHeader": { "Name": "user-agent" } })).unwrap();
        assert_eq!(parsed, FieldToMatch::header("user-agent"));
    }

    #[test]
    fn test_byte_match_parses_base64_form() {
        let value = json!({
            "SearchStringBase64": "YWRtaW4=",
            "FieldToMatch": { "UriPath": {} },
            "TextTransformations": [{ "Priority": 0, "Type": "NONE" }],
            "PositionalConstraint": "CONTAINS"
        });
        let parsed: ByteMatch = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.search_string, None);
        assert_eq!(parsed.search_string_base64.as_deref(), Some("YWRtaW4="));
    }
}
