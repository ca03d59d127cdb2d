//! Filter tree validation
//!
//! Walks the same tree the compiler walks, checking field/operator legality
//! against the capability matrix and operator-specific value shape. Every
//! violation is collected into one [`ValidationReport`]; nothing
//! short-circuits, so the caller can report all problems at once.

use serde_json::Value;

use crate::entities::Entity;
use crate::error::ValidationReport;
use crate::filters::dates::{RelativeDateToken, parse_date_value};
use crate::filters::types::{FilterCondition, FilterGroup, FilterOperator, GroupOperator};

/// Maximum nesting depth for filter groups
///
/// Bounds stack usage when recursing over untrusted input; deeper trees are
/// a validation error, not a crash.
pub const MAX_GROUP_DEPTH: usize = 10;

/// Validate a filter tree against the capability matrix for `entity`
pub fn validate(entity: Entity, group: &FilterGroup) -> ValidationReport {
    let mut report = ValidationReport::default();
    walk_group(entity, group, 1, &mut report);
    report
}

fn walk_group(entity: Entity, group: &FilterGroup, depth: usize, report: &mut ValidationReport) {
    if depth > MAX_GROUP_DEPTH {
        report.push(
            "GROUP_TOO_DEEP",
            format!("filter groups nest deeper than {MAX_GROUP_DEPTH} levels"),
        );
        return;
    }

    // An empty AND matches everything, which is harmless; an empty OR would
    // either match nothing or have to be silently promoted to always-true,
    // so it is rejected outright.
    if group.operator == GroupOperator::Or && group.is_empty() {
        report.push(
            "EMPTY_OR_GROUP",
            "an OR group must contain at least one condition or subgroup",
        );
    }

    for condition in &group.conditions {
        check_condition(entity, condition, report);
    }
    for subgroup in &group.groups {
        walk_group(entity, subgroup, depth + 1, report);
    }
}

fn check_condition(entity: Entity, condition: &FilterCondition, report: &mut ValidationReport) {
    match entity.operators_for(&condition.field) {
        None => {
            report.push(
                "UNKNOWN_FIELD",
                format!(
                    "unknown filter field `{}` for entity `{}`",
                    condition.field,
                    entity.as_str()
                ),
            );
        }
        Some(allowed) => {
            if !allowed.contains(&condition.operator) {
                report.push(
                    "OPERATOR_NOT_ALLOWED",
                    format!(
                        "operator `{}` is not allowed for field `{}` on entity `{}`",
                        condition.operator.as_str(),
                        condition.field,
                        entity.as_str()
                    ),
                );
            }
        }
    }
    check_value_shape(condition, report);
}

fn check_value_shape(condition: &FilterCondition, report: &mut ValidationReport) {
    let operator = condition.operator;

    if operator.is_range() {
        match &condition.value {
            Some(Value::Array(items)) if items.len() == 2 => {
                if operator.is_date() {
                    for item in items {
                        if parse_date_value(item).is_err() {
                            report.push(
                                "INVALID_DATE",
                                format!(
                                    "`{}` on field `{}` requires date values, got {item}",
                                    operator.as_str(),
                                    condition.field
                                ),
                            );
                        }
                    }
                }
            }
            Some(Value::Array(items)) => {
                report.push(
                    "INVALID_RANGE",
                    format!(
                        "`{}` on field `{}` requires exactly 2 values, got {}",
                        operator.as_str(),
                        condition.field,
                        items.len()
                    ),
                );
            }
            _ => {
                report.push(
                    "INVALID_RANGE",
                    format!(
                        "`{}` on field `{}` requires a 2-element array value",
                        operator.as_str(),
                        condition.field
                    ),
                );
            }
        }
        return;
    }

    if operator.is_list() {
        let has_list = condition.values.is_some()
            || matches!(condition.value, Some(Value::Array(_)));
        if !has_list {
            report.push(
                "INVALID_LIST",
                format!(
                    "`{}` on field `{}` requires a `values` array or an array `value`",
                    operator.as_str(),
                    condition.field
                ),
            );
        }
        return;
    }

    if operator.is_nullary() {
        return;
    }

    if operator == FilterOperator::DateRelative {
        match condition.value.as_ref().and_then(Value::as_str) {
            Some(token) if token.parse::<RelativeDateToken>().is_ok() => {}
            Some(token) => {
                report.push(
                    "UNKNOWN_DATE_TOKEN",
                    format!(
                        "unknown relative date token `{token}` on field `{}`",
                        condition.field
                    ),
                );
            }
            None => {
                report.push(
                    "UNKNOWN_DATE_TOKEN",
                    format!(
                        "`date_relative` on field `{}` requires a token string value",
                        condition.field
                    ),
                );
            }
        }
        return;
    }

    let Some(value) = &condition.value else {
        report.push(
            "VALUE_REQUIRED",
            format!(
                "operator `{}` on field `{}` requires a value",
                operator.as_str(),
                condition.field
            ),
        );
        return;
    };

    if operator.is_date() && parse_date_value(value).is_err() {
        report.push(
            "INVALID_DATE",
            format!(
                "`{}` on field `{}` requires a date value, got {value}",
                operator.as_str(),
                condition.field
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(conditions: Vec<FilterCondition>, groups: Vec<FilterGroup>) -> FilterGroup {
        FilterGroup {
            operator: GroupOperator::And,
            conditions,
            groups,
        }
    }

    fn condition(field: &str, operator: FilterOperator, value: Option<Value>) -> FilterCondition {
        FilterCondition {
            field: field.to_string(),
            operator,
            value,
            values: None,
        }
    }

    /// A minimal well-formed value for the operator, ignoring field semantics
    fn well_formed_value(operator: FilterOperator) -> (Option<Value>, Option<Vec<Value>>) {
        use FilterOperator::*;
        match operator {
            IsEmpty | IsNotEmpty => (None, None),
            Between => (Some(json!([1, 10])), None),
            DateBetween => (Some(json!(["2024-01-01", "2024-01-31"])), None),
            In | NotIn => (None, Some(vec![json!("A"), json!("B")])),
            DateEquals | DateBefore | DateAfter => (Some(json!("2024-01-15")), None),
            DateRelative => (Some(json!("last_30_days")), None),
            Gt | Gte | Lt | Lte => (Some(json!(5)), None),
            _ => (Some(json!("x")), None),
        }
    }

    #[test]
    fn every_matrix_pair_validates_with_a_minimal_condition() {
        for entity in Entity::ALL {
            for (field, operators) in entity.fields() {
                for operator in *operators {
                    let (value, values) = well_formed_value(*operator);
                    let tree = group(
                        vec![FilterCondition {
                            field: (*field).to_string(),
                            operator: *operator,
                            value,
                            values,
                        }],
                        vec![],
                    );
                    let report = validate(*entity, &tree);
                    assert!(
                        report.is_valid(),
                        "{}.{} {} rejected: {report}",
                        entity.as_str(),
                        field,
                        operator.as_str()
                    );
                }
            }
        }
    }

    #[test]
    fn every_off_matrix_pair_is_rejected_naming_the_pair() {
        for entity in Entity::ALL {
            for (field, operators) in entity.fields() {
                for operator in FilterOperator::ALL {
                    if operators.contains(operator) {
                        continue;
                    }
                    let (value, values) = well_formed_value(*operator);
                    let tree = group(
                        vec![FilterCondition {
                            field: (*field).to_string(),
                            operator: *operator,
                            value,
                            values,
                        }],
                        vec![],
                    );
                    let report = validate(*entity, &tree);
                    let issue = report
                        .errors
                        .iter()
                        .find(|issue| issue.code == "OPERATOR_NOT_ALLOWED")
                        .unwrap_or_else(|| {
                            panic!(
                                "{}.{} {} was not rejected",
                                entity.as_str(),
                                field,
                                operator.as_str()
                            )
                        });
                    assert!(issue.message.contains(*field));
                    assert!(issue.message.contains(operator.as_str()));
                }
            }
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        let tree = group(
            vec![condition("password", FilterOperator::Equals, Some(json!("x")))],
            vec![],
        );
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "UNKNOWN_FIELD");
        assert!(report.errors[0].message.contains("password"));
    }

    #[test]
    fn between_arity_must_be_exactly_two() {
        for (value, valid) in [
            (json!([10]), false),
            (json!([10, 20]), true),
            (json!([10, 20, 30]), false),
            (json!(10), false),
        ] {
            let tree = group(
                vec![condition("size", FilterOperator::Between, Some(value))],
                vec![],
            );
            let report = validate(Entity::Companies, &tree);
            assert_eq!(report.is_valid(), valid);
            if !valid {
                assert_eq!(report.errors[0].code, "INVALID_RANGE");
            }
        }
    }

    #[test]
    fn date_between_requires_two_parseable_dates() {
        let tree = group(
            vec![condition(
                "created_at",
                FilterOperator::DateBetween,
                Some(json!(["2024-01-01"])),
            )],
            vec![],
        );
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "INVALID_RANGE");

        let tree = group(
            vec![condition(
                "created_at",
                FilterOperator::DateBetween,
                Some(json!(["2024-01-01", "whenever"])),
            )],
            vec![],
        );
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "INVALID_DATE");
    }

    #[test]
    fn in_requires_a_list() {
        let tree = group(
            vec![condition("status", FilterOperator::In, Some(json!("ACTIVE")))],
            vec![],
        );
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "INVALID_LIST");

        let tree = group(
            vec![condition(
                "status",
                FilterOperator::In,
                Some(json!(["ACTIVE", "PENDING"])),
            )],
            vec![],
        );
        assert!(validate(Entity::Contacts, &tree).is_valid());
    }

    #[test]
    fn unknown_relative_token_is_a_validation_error() {
        let tree = group(
            vec![condition(
                "created_at",
                FilterOperator::DateRelative,
                Some(json!("next_week")),
            )],
            vec![],
        );
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "UNKNOWN_DATE_TOKEN");
        assert!(report.errors[0].message.contains("next_week"));
    }

    #[test]
    fn missing_value_is_a_validation_error() {
        let tree = group(
            vec![condition("email", FilterOperator::Contains, None)],
            vec![],
        );
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "VALUE_REQUIRED");
    }

    #[test]
    fn empty_or_group_is_rejected() {
        let tree = FilterGroup {
            operator: GroupOperator::Or,
            conditions: vec![],
            groups: vec![],
        };
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "EMPTY_OR_GROUP");
    }

    #[test]
    fn empty_and_group_is_valid() {
        let tree = group(vec![], vec![]);
        assert!(validate(Entity::Contacts, &tree).is_valid());
    }

    #[test]
    fn nested_empty_or_group_is_rejected() {
        let tree = group(
            vec![],
            vec![FilterGroup {
                operator: GroupOperator::Or,
                conditions: vec![],
                groups: vec![],
            }],
        );
        let report = validate(Entity::Contacts, &tree);
        assert_eq!(report.errors[0].code, "EMPTY_OR_GROUP");
    }

    fn nested_tree(depth: usize) -> FilterGroup {
        let mut tree = group(
            vec![condition("email", FilterOperator::IsNotEmpty, None)],
            vec![],
        );
        for _ in 1..depth {
            tree = group(vec![], vec![tree]);
        }
        tree
    }

    #[test]
    fn depth_limit_is_enforced() {
        assert!(validate(Entity::Contacts, &nested_tree(MAX_GROUP_DEPTH)).is_valid());
        let report = validate(Entity::Contacts, &nested_tree(MAX_GROUP_DEPTH + 1));
        assert_eq!(report.errors[0].code, "GROUP_TOO_DEEP");
    }

    #[test]
    fn all_violations_are_collected() {
        let tree = group(
            vec![
                condition("password", FilterOperator::Equals, Some(json!("x"))),
                condition("size", FilterOperator::Between, Some(json!([1]))),
                condition("email", FilterOperator::Gt, Some(json!(5))),
            ],
            vec![],
        );
        let report = validate(Entity::Companies, &tree);
        assert!(!report.is_valid());
        let codes: Vec<_> = report.errors.iter().map(|issue| issue.code).collect();
        assert!(codes.contains(&"UNKNOWN_FIELD"));
        assert!(codes.contains(&"INVALID_RANGE"));
        // `email` is not a companies field
        assert_eq!(codes.iter().filter(|c| **c == "UNKNOWN_FIELD").count(), 2);
    }
}
