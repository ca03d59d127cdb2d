//! Filter tree compilation
//!
//! Turns a validated filter tree into a backend-agnostic predicate fragment.
//! Compilation is pure and synchronous; the reference instant for relative
//! date tokens is injected so results are deterministic.
//!
//! Compilation is also defensive: a condition that slipped past validation
//! (wrong range arity, unknown token, missing value) produces an error and a
//! warning log rather than a silently wrong predicate.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::QueryError;
use crate::filters::dates::{self, RelativeDateToken};
use crate::filters::types::{FilterCondition, FilterGroup, FilterOperator};
use crate::predicate;

/// Compile one leaf condition into a predicate fragment
///
/// Dotted field paths become nested relation predicates:
/// `company.industry equals "Tech"` compiles to
/// `{"company": {"industry": {"equals": "Tech"}}}`.
pub fn compile_condition(
    condition: &FilterCondition,
    now: DateTime<Utc>,
) -> Result<Value, QueryError> {
    let leaf = leaf_predicate(condition, now).inspect_err(|error| {
        warn!(
            field = %condition.field,
            operator = condition.operator.as_str(),
            %error,
            "condition slipped past validation"
        );
    })?;
    Ok(predicate::nest_path(&condition.field, leaf))
}

/// Recursively compile a group into a single predicate fragment
///
/// Fragments are collected in input order (conditions first, then nested
/// groups) and combined under the group's operator. An empty group compiles
/// to the identity predicate so a contract breach cannot exclude every row;
/// in the intended flow the validator has already rejected empty OR groups.
pub fn compile_group(group: &FilterGroup, now: DateTime<Utc>) -> Result<Value, QueryError> {
    let mut fragments = Vec::with_capacity(group.conditions.len() + group.groups.len());
    for condition in &group.conditions {
        fragments.push(compile_condition(condition, now)?);
    }
    for subgroup in &group.groups {
        fragments.push(compile_group(subgroup, now)?);
    }
    Ok(predicate::combine(group.operator, fragments))
}

fn leaf_predicate(condition: &FilterCondition, now: DateTime<Utc>) -> Result<Value, QueryError> {
    use FilterOperator::*;
    match condition.operator {
        Equals => Ok(json!({ "equals": required_value(condition)? })),
        NotEquals => Ok(json!({ "not": required_value(condition)? })),
        Contains => Ok(json!({ "contains": required_value(condition)?, "caseSensitive": false })),
        NotContains => Ok(json!({
            "not": { "contains": required_value(condition)?, "caseSensitive": false }
        })),
        StartsWith => {
            Ok(json!({ "startsWith": required_value(condition)?, "caseSensitive": false }))
        }
        EndsWith => Ok(json!({ "endsWith": required_value(condition)?, "caseSensitive": false })),
        Gt => Ok(json!({ "gt": required_value(condition)? })),
        Gte => Ok(json!({ "gte": required_value(condition)? })),
        Lt => Ok(json!({ "lt": required_value(condition)? })),
        Lte => Ok(json!({ "lte": required_value(condition)? })),
        Between => {
            let (low, high) = range_values(condition)?;
            Ok(json!({ "gte": low, "lte": high }))
        }
        In => Ok(json!({ "in": condition.list_values() })),
        NotIn => Ok(json!({ "notIn": condition.list_values() })),
        // only null counts as empty; blank strings are not detected
        IsEmpty => Ok(json!({ "equals": Value::Null })),
        IsNotEmpty => Ok(json!({ "not": Value::Null })),
        DateEquals => {
            let day = dates::start_of_day(dates::parse_date_value(required_value(condition)?)?);
            Ok(date_interval(day, day + Duration::days(1)))
        }
        DateBefore => {
            let day = dates::start_of_day(dates::parse_date_value(required_value(condition)?)?);
            Ok(json!({ "lt": dates::format_instant(day) }))
        }
        DateAfter => {
            let day = dates::start_of_day(dates::parse_date_value(required_value(condition)?)?);
            Ok(json!({ "gte": dates::format_instant(day + Duration::days(1)) }))
        }
        DateBetween => {
            let (low, high) = range_values(condition)?;
            let start = dates::start_of_day(dates::parse_date_value(&low)?);
            let end = dates::start_of_day(dates::parse_date_value(&high)?) + Duration::days(1);
            Ok(date_interval(start, end))
        }
        DateRelative => {
            let token = relative_token(condition)?;
            let range = dates::resolve(token, now);
            Ok(date_interval(range.start, range.end))
        }
    }
}

fn required_value(condition: &FilterCondition) -> Result<&Value, QueryError> {
    condition
        .value
        .as_ref()
        .ok_or(QueryError::MissingValue(condition.operator.as_str()))
}

fn range_values(condition: &FilterCondition) -> Result<(Value, Value), QueryError> {
    match &condition.value {
        Some(Value::Array(items)) if items.len() == 2 => {
            Ok((items[0].clone(), items[1].clone()))
        }
        Some(Value::Array(items)) => Err(QueryError::MalformedRange(items.len())),
        _ => Err(QueryError::MalformedRange(0)),
    }
}

fn relative_token(condition: &FilterCondition) -> Result<RelativeDateToken, QueryError> {
    match condition.value.as_ref().and_then(Value::as_str) {
        Some(token) => token.parse(),
        None => Err(QueryError::UnsupportedToken(
            condition
                .value
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_else(|| "<missing>".to_string()),
        )),
    }
}

fn date_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
    json!({
        "gte": dates::format_instant(start),
        "lt": dates::format_instant(end)
    })
}
