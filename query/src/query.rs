//! Query orchestration
//!
//! The top-level entry point: validates the filter tree, compiles it, merges
//! in the free-text search predicate and the soft-delete guard, and attaches
//! sort/pagination. Pure and synchronous — executing the resulting plan
//! (rows plus total count) belongs to the storage layer.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::debug;

use crate::entities::Entity;
use crate::error::QueryError;
use crate::filters::compile::compile_group;
use crate::filters::types::GroupOperator;
use crate::filters::validate::validate;
use crate::predicate;
use crate::types::{MAX_PAGE_LIMIT, MAX_SEARCH_LENGTH, OrderBy, QueryPlan, QueryRequest, SortSpec};

/// Predicate excluding soft-deleted rows; ANDed into every plan
fn not_deleted() -> Value {
    json!({ "is_deleted": { "equals": false } })
}

/// Free-text search: OR of case-insensitive substring matches over the
/// entity's searchable fields
fn search_predicate(entity: Entity, term: &str) -> Value {
    let fragments = entity
        .searchable_fields()
        .iter()
        .map(|field| {
            predicate::nest_path(field, json!({ "contains": term, "caseSensitive": false }))
        })
        .collect();
    predicate::combine(GroupOperator::Or, fragments)
}

fn resolve_sort(entity: Entity, sort: &SortSpec) -> Result<OrderBy, QueryError> {
    if !entity.sortable_fields().contains(&sort.field.as_str()) {
        return Err(QueryError::bad_request(
            "INVALID_SORT_FIELD",
            format!("Cannot sort `{}` by `{}`", entity.as_str(), sort.field),
        ));
    }
    Ok(OrderBy {
        field: sort.field.clone(),
        direction: sort.direction,
    })
}

/// Build a query plan using the current instant for relative date tokens
pub fn build_query(request: &QueryRequest) -> Result<QueryPlan, QueryError> {
    build_query_at(request, Utc::now())
}

/// [`build_query`] with an injected reference instant, for deterministic
/// resolution of relative date tokens
pub fn build_query_at(
    request: &QueryRequest,
    now: DateTime<Utc>,
) -> Result<QueryPlan, QueryError> {
    let entity = request.entity;

    let filter_predicate = match &request.filters {
        Some(group) => {
            let report = validate(entity, group);
            if !report.is_valid() {
                return Err(QueryError::Validation(report));
            }
            compile_group(group, now)?
        }
        None => predicate::identity(),
    };

    let mut fragments = vec![filter_predicate];
    if let Some(term) = request
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
    {
        let term: String = term.chars().take(MAX_SEARCH_LENGTH).collect();
        fragments.push(search_predicate(entity, &term));
    }
    fragments.push(not_deleted());
    let filter = predicate::combine(GroupOperator::And, fragments);

    let order_by = match &request.sort {
        Some(sort) => Some(resolve_sort(entity, sort)?),
        None => None,
    };

    let pagination = request.pagination.clone().unwrap_or_default();
    let take = pagination.limit.clamp(1, MAX_PAGE_LIMIT);
    let plan = QueryPlan {
        entity,
        filter,
        order_by,
        skip: u64::from(pagination.page.saturating_sub(1)) * u64::from(take),
        take,
    };
    debug!(
        entity = entity.as_str(),
        skip = plan.skip,
        take = plan.take,
        "built query plan"
    );
    Ok(plan)
}
