//! Wire representation of rule statements.
//!
//! The API models a statement as a struct in which exactly one of the
//! optional members is populated. Nothing here enforces that; the
//! converter in `rulekit` rejects nodes with zero or several members set.
//!
//! The small enums at the top are shared verbatim by the declarative model.

use serde::{Deserialize, Serialize};

/// Base64 encoding for blob members, as the JSON protocol carries them.
pub mod blob {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Shared enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionalConstraint {
    Exactly,
    StartsWith,
    EndsWith,
    Contains,
    ContainsWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextTransformationType {
    None,
    CompressWhiteSpace,
    HtmlEntityDecode,
    Lowercase,
    CmdLine,
    UrlDecode,
    Base64Decode,
    HexDecode,
    Md5,
    ReplaceComments,
    EscapeSeqDecode,
    SqlHexDecode,
    CssDecode,
    JsDecode,
    NormalizePath,
    NormalizePathWin,
    RemoveNulls,
    ReplaceNulls,
    Base64DecodeExt,
    UrlDecodeUni,
    Utf8ToUnicode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackBehavior {
    Match,
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForwardedIpPosition {
    First,
    Last,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensitivityLevel {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabelMatchScope {
    Label,
    Namespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateBasedKeyType {
    Ip,
    ForwardedIp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JsonMatchScope {
    All,
    Key,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyParsingFallbackBehavior {
    Match,
    NoMatch,
    EvaluateAsString,
}

// ============================================================================
// Leaf building blocks
// ============================================================================

/// Marker for members whose presence is the whole message (`{}` on the wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextTransformation {
    pub priority: i32,
    #[serde(rename = "Type")]
    pub kind: TextTransformationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SingleHeader {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SingleQueryArgument {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonMatchPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_paths: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonBody {
    pub match_pattern: JsonMatchPattern,
    pub match_scope: JsonMatchScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_fallback_behavior: Option<BodyParsingFallbackBehavior>,
}

/// Which part of a request a predicate inspects. One member is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldToMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_header: Option<SingleHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_query_argument: Option<SingleQueryArgument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_query_arguments: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_path: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Empty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_body: Option<JsonBody>,
}

impl FieldToMatch {
    /// Number of populated members.
    pub fn populated(&self) -> usize {
        [
            self.single_header.is_some(),
            self.single_query_argument.is_some(),
            self.all_query_arguments.is_some(),
            self.uri_path.is_some(),
            self.query_string.is_some(),
            self.body.is_some(),
            self.method.is_some(),
            self.json_body.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForwardedIpConfig {
    pub header_name: String,
    pub fallback_behavior: FallbackBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpSetForwardedIpConfig {
    pub header_name: String,
    pub fallback_behavior: FallbackBehavior,
    pub position: ForwardedIpPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExcludedRule {
    pub name: String,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ByteMatchStatement {
    #[serde(with = "blob")]
    pub search_string: Vec<u8>,
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
    pub positional_constraint: PositionalConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqliMatchStatement {
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_level: Option<SensitivityLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XssMatchStatement {
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SizeConstraintStatement {
    pub field_to_match: FieldToMatch,
    pub comparison_operator: ComparisonOperator,
    pub size: i64,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeoMatchStatement {
    pub country_codes: Vec<String>,
    #[serde(
        rename = "ForwardedIPConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub forwarded_ip_config: Option<ForwardedIpConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpSetReferenceStatement {
    #[serde(rename = "ARN")]
    pub arn: String,
    #[serde(
        rename = "IPSetForwardedIPConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_set_forwarded_ip_config: Option<IpSetForwardedIpConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegexPatternSetReferenceStatement {
    #[serde(rename = "ARN")]
    pub arn: String,
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleGroupReferenceStatement {
    #[serde(rename = "ARN")]
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_rules: Option<Vec<ExcludedRule>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedRuleGroupStatement {
    pub vendor_name: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_rules: Option<Vec<ExcludedRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_down_statement: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelMatchStatement {
    pub scope: LabelMatchScope,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateBasedStatement {
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AndStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotStatement {
    pub statement: Box<Statement>,
}

/// A statement node as the API sends and receives it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_match_statement: Option<ByteMatchStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqli_match_statement: Option<SqliMatchStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xss_match_statement: Option<XssMatchStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_constraint_statement: Option<SizeConstraintStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_match_statement: Option<GeoMatchStatement>,
    #[serde(
        rename = "IPSetReferenceStatement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_set_reference_statement: Option<IpSetReferenceStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_pattern_set_reference_statement: Option<RegexPatternSetReferenceStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group_reference_statement: Option<RuleGroupReferenceStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_rule_group_statement: Option<ManagedRuleGroupStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_match_statement: Option<LabelMatchStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_based_statement: Option<RateBasedStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and_statement: Option<AndStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or_statement: Option<OrStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_statement: Option<NotStatement>,
}

impl Statement {
    /// Number of populated members on this node (not counting children).
    pub fn populated(&self) -> usize {
        [
            self.byte_match_statement.is_some(),
            self.sqli_match_statement.is_some(),
            self.xss_match_statement.is_some(),
            self.size_constraint_statement.is_some(),
            self.geo_match_statement.is_some(),
            self.ip_set_reference_statement.is_some(),
            self.regex_pattern_set_reference_statement.is_some(),
            self.rule_group_reference_statement.is_some(),
            self.managed_rule_group_statement.is_some(),
            self.label_match_statement.is_some(),
            self.rate_based_statement.is_some(),
            self.and_statement.is_some(),
            self.or_statement.is_some(),
            self.not_statement.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Total number of statement nodes in this tree, this one included.
    pub fn node_count(&self) -> usize {
        let children: usize = self
            .and_statement
            .iter()
            .flat_map(|s| &s.statements)
            .chain(self.or_statement.iter().flat_map(|s| &s.statements))
            .map(Self::node_count)
            .sum();
        let single: usize = [
            self.not_statement.as_ref().map(|s| s.statement.as_ref()),
            self.rate_based_statement
                .as_ref()
                .and_then(|s| s.scope_down_statement.as_deref()),
            self.managed_rule_group_statement
                .as_ref()
                .and_then(|s| s.scope_down_statement.as_deref()),
        ]
        .into_iter()
        .flatten()
        .map(Self::node_count)
        .sum();
        1 + children + single
    }
}
