//! Predicate tree construction
//!
//! The compiled output is a backend-agnostic predicate: nested JSON maps of
//! field → operator map, combined under `AND` / `OR` lists. The empty map
//! `{}` is the identity predicate and matches every row.

use serde_json::{Map, Value, json};

use crate::filters::types::GroupOperator;

/// Predicate that matches every row
pub fn identity() -> Value {
    Value::Object(Map::new())
}

pub fn is_identity(predicate: &Value) -> bool {
    matches!(predicate, Value::Object(map) if map.is_empty())
}

/// Wrap `leaf` under a dotted field path, nesting innermost-out:
/// `company.industry` + `{"equals": "Tech"}` becomes
/// `{"company": {"industry": {"equals": "Tech"}}}`.
pub fn nest_path(field: &str, leaf: Value) -> Value {
    field
        .rsplit('.')
        .fold(leaf, |inner, segment| json!({ segment: inner }))
}

/// Combine fragments under a group operator, preserving input order.
///
/// The result is kept minimal: zero fragments collapse to the identity, a
/// single fragment is returned bare, and identity fragments are simplified
/// away (a no-op under AND, an annihilator under OR — an OR containing an
/// always-true branch is itself always-true).
pub fn combine(operator: GroupOperator, fragments: Vec<Value>) -> Value {
    let mut fragments = match operator {
        GroupOperator::And => fragments
            .into_iter()
            .filter(|fragment| !is_identity(fragment))
            .collect::<Vec<_>>(),
        GroupOperator::Or => {
            if fragments.iter().any(is_identity) {
                return identity();
            }
            fragments
        }
    };

    match fragments.len() {
        0 => identity(),
        1 => fragments.remove(0),
        _ => {
            let key = match operator {
                GroupOperator::And => "AND",
                GroupOperator::Or => "OR",
            };
            json!({ key: fragments })
        }
    }
}
