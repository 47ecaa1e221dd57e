//! Conversion between the declarative model and the wire shape.
//!
//! Both directions walk the tree recursively and refuse trees deeper than
//! [`MAX_DEPTH`]. Going to the wire, a byte match's text or base64 search
//! string is decoded into raw bytes. Coming back, both representations are
//! filled in, since the wire cannot say which one was supplied.

use crate::error::{ConversionError, Result};
use crate::model::{
    And, ByteMatch, FieldToMatch, JsonBody, JsonMatchPattern, ManagedRuleGroup, Not, Or, RateBased,
    RegexPatternSetReference, Rule, SizeConstraint, SqliMatch, Statement, XssMatch,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use wafkit::statement as wire;
use wafkit::types::Rule as WireRule;

/// Deepest statement nesting accepted in either direction.
pub const MAX_DEPTH: usize = 32;

/// Convert a declarative statement to its wire shape.
pub fn to_wire(statement: &Statement) -> Result<wire::Statement> {
    statement_to_wire(statement, 1)
}

/// Convert a wire statement to the declarative model.
pub fn from_wire(statement: &wire::Statement) -> Result<Statement> {
    statement_from_wire(statement, 1)
}

/// Convert a list of declarative rules.
pub fn rules_to_wire(rules: &[Rule]) -> Result<Vec<WireRule>> {
    rules.iter().map(rule_to_wire).collect()
}

/// Convert a list of wire rules.
pub fn rules_from_wire(rules: &[WireRule]) -> Result<Vec<Rule>> {
    rules.iter().map(rule_from_wire).collect()
}

/// Convert one declarative rule.
pub fn rule_to_wire(rule: &Rule) -> Result<WireRule> {
    let statement = to_wire(&rule.statement).inspect_err(|e| {
        log::debug!("rule {} rejected: {e}", rule.name);
    })?;
    Ok(WireRule {
        name: rule.name.clone(),
        priority: rule.priority,
        statement,
        action: rule.action.clone(),
        override_action: rule.override_action.clone(),
        rule_labels: rule.rule_labels.clone(),
        visibility_config: rule.visibility_config.clone(),
    })
}

/// Convert one wire rule.
pub fn rule_from_wire(rule: &WireRule) -> Result<Rule> {
    Ok(Rule {
        name: rule.name.clone(),
        priority: rule.priority,
        statement: from_wire(&rule.statement)?,
        action: rule.action.clone(),
        override_action: rule.override_action.clone(),
        rule_labels: rule.rule_labels.clone(),
        visibility_config: rule.visibility_config.clone(),
    })
}

/// Convert a field selector to its wire shape.
pub fn field_to_wire(field: &FieldToMatch) -> Result<wire::FieldToMatch> {
    let mut out = wire::FieldToMatch::default();
    match field {
        FieldToMatch::SingleHeader(header) => out.single_header = Some(header.clone()),
        FieldToMatch::SingleQueryArgument(arg) => out.single_query_argument = Some(arg.clone()),
        FieldToMatch::AllQueryArguments(empty) => out.all_query_arguments = Some(*empty),
        FieldToMatch::UriPath(empty) => out.uri_path = Some(*empty),
        FieldToMatch::QueryString(empty) => out.query_string = Some(*empty),
        FieldToMatch::Body(empty) => out.body = Some(*empty),
        FieldToMatch::Method(empty) => out.method = Some(*empty),
        FieldToMatch::JsonBody(body) => out.json_body = Some(json_body_to_wire(body)?),
    }
    Ok(out)
}

/// Convert a wire field selector to the declarative model.
pub fn field_from_wire(field: &wire::FieldToMatch) -> Result<FieldToMatch> {
    let populated = field.populated();
    if populated != 1 {
        return Err(ConversionError::MalformedFieldToMatch { populated });
    }

    let converted = if let Some(header) = &field.single_header {
        FieldToMatch::SingleHeader(header.clone())
    } else if let Some(arg) = &field.single_query_argument {
        FieldToMatch::SingleQueryArgument(arg.clone())
    } else if let Some(empty) = field.all_query_arguments {
        FieldToMatch::AllQueryArguments(empty)
    } else if let Some(empty) = field.uri_path {
        FieldToMatch::UriPath(empty)
    } else if let Some(empty) = field.query_string {
        FieldToMatch::QueryString(empty)
    } else if let Some(empty) = field.body {
        FieldToMatch::Body(empty)
    } else if let Some(empty) = field.method {
        FieldToMatch::Method(empty)
    } else if let Some(body) = &field.json_body {
        FieldToMatch::JsonBody(json_body_from_wire(body))
    } else {
        return Err(ConversionError::MalformedFieldToMatch { populated: 0 });
    };
    Ok(converted)
}

fn json_body_to_wire(body: &JsonBody) -> Result<wire::JsonBody> {
    let pattern = &body.match_pattern;
    let match_pattern = match (&pattern.all, &pattern.included_paths) {
        (Some(_), Some(_)) => return Err(ConversionError::ConflictingMatchPattern),
        (Some(all), None) => wire::JsonMatchPattern {
            all: Some(*all),
            included_paths: None,
        },
        (None, paths) => wire::JsonMatchPattern {
            all: None,
            included_paths: Some(paths.clone().unwrap_or_default()),
        },
    };
    Ok(wire::JsonBody {
        match_pattern,
        match_scope: body.match_scope,
        invalid_fallback_behavior: body.invalid_fallback_behavior,
    })
}

fn json_body_from_wire(body: &wire::JsonBody) -> JsonBody {
    // No "All" means "only these paths", even when the list is empty
    let match_pattern = match body.match_pattern.all {
        Some(all) => JsonMatchPattern {
            all: Some(all),
            included_paths: None,
        },
        None => JsonMatchPattern {
            all: None,
            included_paths: Some(
                body.match_pattern
                    .included_paths
                    .clone()
                    .unwrap_or_default(),
            ),
        },
    };
    JsonBody {
        match_pattern,
        match_scope: body.match_scope,
        invalid_fallback_behavior: body.invalid_fallback_behavior,
    }
}

fn search_bytes(byte_match: &ByteMatch) -> Result<Vec<u8>> {
    match (&byte_match.search_string, &byte_match.search_string_base64) {
        (Some(_), Some(_)) => Err(ConversionError::ConflictingSearchString),
        (None, None) => Err(ConversionError::MissingSearchString),
        (Some(text), None) => Ok(text.as_bytes().to_vec()),
        (None, Some(encoded)) => STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ConversionError::InvalidBase64(e.to_string())),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn size_to_wire(size: f64) -> Result<i64> {
    let in_range = size >= i64::MIN as f64 && size < i64::MAX as f64;
    if size.is_finite() && size.fract() == 0.0 && in_range {
        Ok(size as i64)
    } else {
        Err(ConversionError::FractionalSize(size))
    }
}

#[allow(clippy::cast_precision_loss)]
fn size_from_wire(size: i64) -> f64 {
    size as f64
}

fn scope_down_to_wire(
    statement: Option<&Statement>,
    depth: usize,
) -> Result<Option<Box<wire::Statement>>> {
    statement
        .map(|s| statement_to_wire(s, depth + 1).map(Box::new))
        .transpose()
}

fn scope_down_from_wire(
    statement: Option<&wire::Statement>,
    depth: usize,
) -> Result<Option<Box<Statement>>> {
    statement
        .map(|s| statement_from_wire(s, depth + 1).map(Box::new))
        .transpose()
}

fn statement_to_wire(statement: &Statement, depth: usize) -> Result<wire::Statement> {
    if depth > MAX_DEPTH {
        return Err(ConversionError::TooDeep { limit: MAX_DEPTH });
    }

    let mut out = wire::Statement::default();
    match statement {
        Statement::ByteMatch(m) => {
            out.byte_match_statement = Some(wire::ByteMatchStatement {
                search_string: search_bytes(m)?,
                field_to_match: field_to_wire(&m.field_to_match)?,
                text_transformations: m.text_transformations.clone(),
                positional_constraint: m.positional_constraint,
            });
        }
        Statement::SqliMatch(m) => {
            out.sqli_match_statement = Some(wire::SqliMatchStatement {
                field_to_match: field_to_wire(&m.field_to_match)?,
                text_transformations: m.text_transformations.clone(),
                sensitivity_level: m.sensitivity_level,
            });
        }
        Statement::XssMatch(m) => {
            out.xss_match_statement = Some(wire::XssMatchStatement {
                field_to_match: field_to_wire(&m.field_to_match)?,
                text_transformations: m.text_transformations.clone(),
            });
        }
        Statement::SizeConstraint(c) => {
            out.size_constraint_statement = Some(wire::SizeConstraintStatement {
                field_to_match: field_to_wire(&c.field_to_match)?,
                comparison_operator: c.comparison_operator,
                size: size_to_wire(c.size)?,
                text_transformations: c.text_transformations.clone(),
            });
        }
        Statement::GeoMatch(g) => out.geo_match_statement = Some(g.clone()),
        Statement::IpSetReference(r) => out.ip_set_reference_statement = Some(r.clone()),
        Statement::RegexPatternSetReference(r) => {
            out.regex_pattern_set_reference_statement =
                Some(wire::RegexPatternSetReferenceStatement {
                    arn: r.arn.clone(),
                    field_to_match: field_to_wire(&r.field_to_match)?,
                    text_transformations: r.text_transformations.clone(),
                });
        }
        Statement::RuleGroupReference(r) => out.rule_group_reference_statement = Some(r.clone()),
        Statement::ManagedRuleGroup(m) => {
            out.managed_rule_group_statement = Some(wire::ManagedRuleGroupStatement {
                vendor_name: m.vendor_name.clone(),
                name: m.name.clone(),
                version: m.version.clone(),
                excluded_rules: m.excluded_rules.clone(),
                scope_down_statement: scope_down_to_wire(m.scope_down_statement.as_deref(), depth)?,
            });
        }
        Statement::LabelMatch(l) => out.label_match_statement = Some(l.clone()),
        Statement::RateBased(r) => {
            out.rate_based_statement = Some(wire::RateBasedStatement {
                limit: r.limit,
                aggregate_key_type: r.aggregate_key_type,
                scope_down_statement: scope_down_to_wire(r.scope_down_statement.as_deref(), depth)?,
                forwarded_ip_config: r.forwarded_ip_config.clone(),
            });
        }
        Statement::And(and) => {
            out.and_statement = Some(wire::AndStatement {
                statements: children_to_wire(&and.statements, depth)?,
            });
        }
        Statement::Or(or) => {
            out.or_statement = Some(wire::OrStatement {
                statements: children_to_wire(&or.statements, depth)?,
            });
        }
        Statement::Not(not) => {
            out.not_statement = Some(wire::NotStatement {
                statement: Box::new(statement_to_wire(&not.statement, depth + 1)?),
            });
        }
    }
    Ok(out)
}

fn children_to_wire(children: &[Statement], depth: usize) -> Result<Vec<wire::Statement>> {
    children
        .iter()
        .map(|child| statement_to_wire(child, depth + 1))
        .collect()
}

fn children_from_wire(children: &[wire::Statement], depth: usize) -> Result<Vec<Statement>> {
    children
        .iter()
        .map(|child| statement_from_wire(child, depth + 1))
        .collect()
}

fn statement_from_wire(statement: &wire::Statement, depth: usize) -> Result<Statement> {
    if depth > MAX_DEPTH {
        return Err(ConversionError::TooDeep { limit: MAX_DEPTH });
    }
    let populated = statement.populated();
    if populated != 1 {
        return Err(ConversionError::MalformedStatement { populated });
    }

    if let Some(m) = &statement.byte_match_statement {
        return Ok(Statement::ByteMatch(ByteMatch {
            search_string: Some(String::from_utf8_lossy(&m.search_string).into_owned()),
            search_string_base64: Some(STANDARD.encode(&m.search_string)),
            field_to_match: field_from_wire(&m.field_to_match)?,
            text_transformations: m.text_transformations.clone(),
            positional_constraint: m.positional_constraint,
        }));
    }
    if let Some(m) = &statement.sqli_match_statement {
        return Ok(Statement::SqliMatch(SqliMatch {
            field_to_match: field_from_wire(&m.field_to_match)?,
            text_transformations: m.text_transformations.clone(),
            sensitivity_level: m.sensitivity_level,
        }));
    }
    if let Some(m) = &statement.xss_match_statement {
        return Ok(Statement::XssMatch(XssMatch {
            field_to_match: field_from_wire(&m.field_to_match)?,
            text_transformations: m.text_transformations.clone(),
        }));
    }
    if let Some(c) = &statement.size_constraint_statement {
        return Ok(Statement::SizeConstraint(SizeConstraint {
            field_to_match: field_from_wire(&c.field_to_match)?,
            comparison_operator: c.comparison_operator,
            size: size_from_wire(c.size),
            text_transformations: c.text_transformations.clone(),
        }));
    }
    if let Some(g) = &statement.geo_match_statement {
        return Ok(Statement::GeoMatch(g.clone()));
    }
    if let Some(r) = &statement.ip_set_reference_statement {
        return Ok(Statement::IpSetReference(r.clone()));
    }
    if let Some(r) = &statement.regex_pattern_set_reference_statement {
        return Ok(Statement::RegexPatternSetReference(
            RegexPatternSetReference {
                arn: r.arn.clone(),
                field_to_match: field_from_wire(&r.field_to_match)?,
                text_transformations: r.text_transformations.clone(),
            },
        ));
    }
    if let Some(r) = &statement.rule_group_reference_statement {
        return Ok(Statement::RuleGroupReference(r.clone()));
    }
    if let Some(m) = &statement.managed_rule_group_statement {
        return Ok(Statement::ManagedRuleGroup(ManagedRuleGroup {
            vendor_name: m.vendor_name.clone(),
            name: m.name.clone(),
            version: m.version.clone(),
            excluded_rules: m.excluded_rules.clone(),
            scope_down_statement: scope_down_from_wire(m.scope_down_statement.as_deref(), depth)?,
        }));
    }
    if let Some(l) = &statement.label_match_statement {
        return Ok(Statement::LabelMatch(l.clone()));
    }
    if let Some(r) = &statement.rate_based_statement {
        return Ok(Statement::RateBased(RateBased {
            limit: r.limit,
            aggregate_key_type: r.aggregate_key_type,
            scope_down_statement: scope_down_from_wire(r.scope_down_statement.as_deref(), depth)?,
            forwarded_ip_config: r.forwarded_ip_config.clone(),
        }));
    }
    if let Some(and) = &statement.and_statement {
        return Ok(Statement::And(And {
            statements: children_from_wire(&and.statements, depth)?,
        }));
    }
    if let Some(or) = &statement.or_statement {
        return Ok(Statement::Or(Or {
            statements: children_from_wire(&or.statements, depth)?,
        }));
    }
    if let Some(not) = &statement.not_statement {
        return Ok(Statement::Not(Not {
            statement: Box::new(statement_from_wire(&not.statement, depth + 1)?),
        }));
    }
    Err(ConversionError::MalformedStatement { populated: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoMatch, IpSetReference, LabelMatch, RuleGroupReference};
    use wafkit::statement::{
        ComparisonOperator, Empty, ExcludedRule, FallbackBehavior, ForwardedIpConfig,
        ForwardedIpPosition, IpSetForwardedIpConfig, JsonMatchScope, LabelMatchScope,
        PositionalConstraint, RateBasedKeyType, SensitivityLevel, TextTransformation,
        TextTransformationType,
    };
    use wafkit::types::{BlockAction, RuleAction, VisibilityConfig};

    fn lowercase() -> Vec<TextTransformation> {
        vec![TextTransformation {
            priority: 0,
            kind: TextTransformationType::Lowercase,
        }]
    }

    fn text_match(text: &str) -> Statement {
        Statement::ByteMatch(ByteMatch {
            search_string: Some(text.to_string()),
            search_string_base64: None,
            field_to_match: FieldToMatch::uri_path(),
            text_transformations: lowercase(),
            positional_constraint: PositionalConstraint::StartsWith,
        })
    }

    fn geo() -> Statement {
        Statement::GeoMatch(GeoMatch {
            country_codes: vec!["NZ".to_string(), "AU".to_string()],
            forwarded_ip_config: None,
        })
    }

    /// Every variant, nested six levels deep on the longest path.
    fn full_tree() -> Statement {
        let rate_based = Statement::RateBased(RateBased {
            limit: 2000,
            aggregate_key_type: RateBasedKeyType::ForwardedIp,
            scope_down_statement: Some(Box::new(Statement::ManagedRuleGroup(ManagedRuleGroup {
                vendor_name: "AWS".to_string(),
                name: "AWSManagedRulesCommonRuleSet".to_string(),
                version: None,
                excluded_rules: Some(vec![ExcludedRule {
                    name: "SizeRestrictions_BODY".to_string(),
                }]),
                scope_down_statement: Some(Box::new(text_match("/admin"))),
            }))),
            forwarded_ip_config: Some(ForwardedIpConfig {
                header_name: "X-Forwarded-For".to_string(),
                fallback_behavior: FallbackBehavior::NoMatch,
            }),
        });

        let inner = Statement::or(vec![
            Statement::not(rate_based),
            Statement::SqliMatch(SqliMatch {
                field_to_match: FieldToMatch::Body(Empty {}),
                text_transformations: lowercase(),
                sensitivity_level: Some(SensitivityLevel::High),
            }),
            Statement::XssMatch(XssMatch {
                field_to_match: FieldToMatch::JsonBody(JsonBody {
                    match_pattern: JsonMatchPattern {
                        all: None,
                        included_paths: Some(vec!["/user/name".to_string()]),
                    },
                    match_scope: JsonMatchScope::Value,
                    invalid_fallback_behavior: None,
                }),
                text_transformations: lowercase(),
            }),
        ]);

        Statement::and(vec![
            inner,
            Statement::SizeConstraint(SizeConstraint {
                field_to_match: FieldToMatch::QueryString(Empty {}),
                comparison_operator: ComparisonOperator::Gt,
                size: 8192.0,
                text_transformations: lowercase(),
            }),
            geo(),
            Statement::IpSetReference(IpSetReference {
                arn: "arn:aws:wafv2:us-east-1:123456789012:regional/ipset/office/1".to_string(),
                ip_set_forwarded_ip_config: Some(IpSetForwardedIpConfig {
                    header_name: "X-Forwarded-For".to_string(),
                    fallback_behavior: FallbackBehavior::Match,
                    position: ForwardedIpPosition::First,
                }),
            }),
            Statement::RegexPatternSetReference(RegexPatternSetReference {
                arn: "arn:aws:wafv2:us-east-1:123456789012:regional/regexpatternset/bots/2"
                    .to_string(),
                field_to_match: FieldToMatch::header("user-agent"),
                text_transformations: lowercase(),
            }),
            Statement::RuleGroupReference(RuleGroupReference {
                arn: "arn:aws:wafv2:us-east-1:123456789012:regional/rulegroup/base/3".to_string(),
                excluded_rules: None,
            }),
            Statement::LabelMatch(LabelMatch {
                scope: LabelMatchScope::Namespace,
                key: "awswaf:managed:".to_string(),
            }),
        ])
    }

    /// Drop the base64 twin that decoding adds to text-supplied byte matches.
    fn forget_base64(statement: &mut Statement) {
        match statement {
            Statement::ByteMatch(m) if m.search_string.is_some() => m.search_string_base64 = None,
            Statement::And(And { statements }) | Statement::Or(Or { statements }) => {
                statements.iter_mut().for_each(forget_base64);
            }
            Statement::Not(not) => forget_base64(&mut not.statement),
            Statement::RateBased(RateBased {
                scope_down_statement: Some(inner),
                ..
            })
            | Statement::ManagedRuleGroup(ManagedRuleGroup {
                scope_down_statement: Some(inner),
                ..
            }) => forget_base64(inner),
            _ => {}
        }
    }

    #[test]
    fn test_round_trip_full_tree() {
        let original = full_tree();
        let wire = to_wire(&original).unwrap();
        let mut back = from_wire(&wire).unwrap();
        forget_base64(&mut back);
        assert_eq!(back, original);
    }

    #[test]
    fn test_children_keep_their_order() {
        let original = Statement::or(vec![text_match("b"), text_match("a"), geo()]);
        let wire = to_wire(&original).unwrap();
        let children = &wire.or_statement.as_ref().unwrap().statements;
        assert_eq!(
            children[0].byte_match_statement.as_ref().unwrap().search_string,
            b"b"
        );
        assert!(children[2].geo_match_statement.is_some());
    }

    #[test]
    fn test_byte_match_with_both_forms_rejected() {
        let statement = Statement::ByteMatch(ByteMatch {
            search_string: Some("admin".to_string()),
            search_string_base64: Some("YWRtaW4=".to_string()),
            field_to_match: FieldToMatch::uri_path(),
            text_transformations: lowercase(),
            positional_constraint: PositionalConstraint::Contains,
        });
        assert_eq!(
            to_wire(&statement).unwrap_err(),
            ConversionError::ConflictingSearchString
        );
    }

    #[test]
    fn test_byte_match_with_neither_form_rejected() {
        let statement = Statement::and(vec![Statement::ByteMatch(ByteMatch {
            search_string: None,
            search_string_base64: None,
            field_to_match: FieldToMatch::uri_path(),
            text_transformations: lowercase(),
            positional_constraint: PositionalConstraint::Contains,
        })]);
        assert_eq!(
            to_wire(&statement).unwrap_err(),
            ConversionError::MissingSearchString
        );
    }

    #[test]
    fn test_byte_match_base64_decodes_to_raw_bytes() {
        let statement = Statement::ByteMatch(ByteMatch {
            search_string: None,
            search_string_base64: Some("AAEC/w==".to_string()),
            field_to_match: FieldToMatch::uri_path(),
            text_transformations: lowercase(),
            positional_constraint: PositionalConstraint::Exactly,
        });
        let wire = to_wire(&statement).unwrap();
        assert_eq!(
            wire.byte_match_statement.unwrap().search_string,
            vec![0x00, 0x01, 0x02, 0xff]
        );
    }

    #[test]
    fn test_byte_match_invalid_base64() {
        let statement = Statement::ByteMatch(ByteMatch {
            search_string: None,
            search_string_base64: Some("not base64!".to_string()),
            field_to_match: FieldToMatch::uri_path(),
            text_transformations: lowercase(),
            positional_constraint: PositionalConstraint::Exactly,
        });
        assert!(matches!(
            to_wire(&statement),
            Err(ConversionError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_from_wire_fills_both_search_forms() {
        let wire = to_wire(&text_match("admin")).unwrap();
        let Statement::ByteMatch(m) = from_wire(&wire).unwrap() else {
            panic!("expected a byte match");
        };
        assert_eq!(m.search_string.as_deref(), Some("admin"));
        assert_eq!(m.search_string_base64.as_deref(), Some("YWRtaW4="));
    }

    #[test]
    fn test_fractional_size_rejected() {
        let statement = Statement::SizeConstraint(SizeConstraint {
            field_to_match: FieldToMatch::Body(Empty {}),
            comparison_operator: ComparisonOperator::Le,
            size: 10.5,
            text_transformations: lowercase(),
        });
        assert_eq!(
            to_wire(&statement).unwrap_err(),
            ConversionError::FractionalSize(10.5)
        );
    }

    #[test]
    fn test_integral_size_is_exact() {
        let statement = Statement::SizeConstraint(SizeConstraint {
            field_to_match: FieldToMatch::Body(Empty {}),
            comparison_operator: ComparisonOperator::Le,
            size: 65_536.0,
            text_transformations: lowercase(),
        });
        let wire = to_wire(&statement).unwrap();
        assert_eq!(wire.size_constraint_statement.unwrap().size, 65_536);
    }

    #[test]
    fn test_json_pattern_conflict_rejected() {
        let field = FieldToMatch::JsonBody(JsonBody {
            match_pattern: JsonMatchPattern {
                all: Some(Empty {}),
                included_paths: Some(vec![]),
            },
            match_scope: JsonMatchScope::All,
            invalid_fallback_behavior: None,
        });
        assert_eq!(
            field_to_wire(&field).unwrap_err(),
            ConversionError::ConflictingMatchPattern
        );
    }

    #[test]
    fn test_json_pattern_without_all_means_paths() {
        let wire_field = wire::FieldToMatch {
            json_body: Some(wire::JsonBody {
                match_pattern: wire::JsonMatchPattern::default(),
                match_scope: JsonMatchScope::Key,
                invalid_fallback_behavior: None,
            }),
            ..Default::default()
        };
        let FieldToMatch::JsonBody(body) = field_from_wire(&wire_field).unwrap() else {
            panic!("expected a JSON body selector");
        };
        assert_eq!(body.match_pattern.all, None);
        assert_eq!(body.match_pattern.included_paths, Some(vec![]));
    }

    #[test]
    fn test_reference_config_stays_absent() {
        let statement = Statement::IpSetReference(IpSetReference {
            arn: "arn:ipset".to_string(),
            ip_set_forwarded_ip_config: None,
        });
        let wire = to_wire(&statement).unwrap();
        assert_eq!(
            wire.ip_set_reference_statement
                .as_ref()
                .unwrap()
                .ip_set_forwarded_ip_config,
            None
        );
        assert_eq!(from_wire(&wire).unwrap(), statement);
    }

    #[test]
    fn test_wire_node_with_two_members_rejected() {
        let mut wire = to_wire(&geo()).unwrap();
        wire.label_match_statement = Some(wire::LabelMatchStatement {
            scope: LabelMatchScope::Label,
            key: "x".to_string(),
        });
        assert_eq!(
            from_wire(&wire).unwrap_err(),
            ConversionError::MalformedStatement { populated: 2 }
        );
        assert_eq!(
            from_wire(&wire::Statement::default()).unwrap_err(),
            ConversionError::MalformedStatement { populated: 0 }
        );
    }

    #[test]
    fn test_depth_guard() {
        let mut statement = geo();
        for _ in 0..MAX_DEPTH {
            statement = Statement::not(statement);
        }
        assert_eq!(
            to_wire(&statement).unwrap_err(),
            ConversionError::TooDeep { limit: MAX_DEPTH }
        );

        let mut wire = to_wire(&geo()).unwrap();
        for _ in 0..MAX_DEPTH {
            wire = wire::Statement {
                not_statement: Some(wire::NotStatement {
                    statement: Box::new(wire),
                }),
                ..Default::default()
            };
        }
        assert_eq!(
            from_wire(&wire).unwrap_err(),
            ConversionError::TooDeep { limit: MAX_DEPTH }
        );
    }

    #[test]
    fn test_rule_carries_action_and_visibility() {
        let rule = Rule {
            name: "block-admin".to_string(),
            priority: 1,
            statement: text_match("/admin"),
            action: Some(RuleAction {
                block: Some(BlockAction::default()),
                ..Default::default()
            }),
            override_action: None,
            rule_labels: None,
            visibility_config: VisibilityConfig {
                sampled_requests_enabled: true,
                cloud_watch_metrics_enabled: true,
                metric_name: "block-admin".to_string(),
            },
        };
        let wire = rule_to_wire(&rule).unwrap();
        assert_eq!(wire.action, rule.action);
        assert_eq!(wire.visibility_config.metric_name, "block-admin");

        let back = rules_from_wire(&[wire]).unwrap();
        assert_eq!(back[0].name, "block-admin");
    }
}
