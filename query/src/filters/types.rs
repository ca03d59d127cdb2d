//! Filter tree wire types
//!
//! The shapes deserialized from a query request body: a recursive
//! [`FilterGroup`] of AND/OR nodes over [`FilterCondition`] leaves. Both are
//! immutable once deserialized; validation and compilation only read them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

/// Logical combinator for a filter group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// Closed set of condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    NotIn,
    IsEmpty,
    IsNotEmpty,
    DateEquals,
    DateBefore,
    DateAfter,
    DateBetween,
    DateRelative,
}

impl FilterOperator {
    pub const ALL: &'static [FilterOperator] = &[
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Between,
        Self::In,
        Self::NotIn,
        Self::IsEmpty,
        Self::IsNotEmpty,
        Self::DateEquals,
        Self::DateBefore,
        Self::DateAfter,
        Self::DateBetween,
        Self::DateRelative,
    ];

    /// Wire name of the operator (matches the serde rename)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::DateEquals => "date_equals",
            Self::DateBefore => "date_before",
            Self::DateAfter => "date_after",
            Self::DateBetween => "date_between",
            Self::DateRelative => "date_relative",
        }
    }

    /// Operators that take no value (`is_empty`, `is_not_empty`)
    pub fn is_nullary(&self) -> bool {
        matches!(self, Self::IsEmpty | Self::IsNotEmpty)
    }

    /// Range operators requiring exactly two values
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Between | Self::DateBetween)
    }

    /// Set-membership operators taking a value list
    pub fn is_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Operators whose value must parse as a date
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            Self::DateEquals | Self::DateBefore | Self::DateAfter | Self::DateBetween
        )
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| QueryError::UnsupportedOperator(s.to_string()))
    }
}

/// One leaf condition: field, operator, and operator-dependent value(s)
///
/// `field` may be a dotted path traversing a to-one relation
/// (e.g. `company.industry`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Explicit value list for `in` / `not_in`; `value` is the fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

impl FilterCondition {
    /// List payload for `in` / `not_in`: `values` wins when present, else
    /// `value` (an array is taken as-is, a scalar becomes a singleton).
    pub fn list_values(&self) -> Vec<Value> {
        if let Some(values) = &self.values {
            return values.clone();
        }
        match &self.value {
            Some(Value::Array(items)) => items.clone(),
            Some(single) => vec![single.clone()],
            None => Vec::new(),
        }
    }
}

/// Recursive AND/OR group of conditions and nested groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterGroup {
    pub operator: GroupOperator,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
}

impl FilterGroup {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Total leaf condition count across all nested groups
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(FilterGroup::condition_count)
                .sum::<usize>()
    }
}
