//! Query request and plan types
//!
//! The request body shape consumed from the portal API, pagination and sort
//! bounds, and the compiled [`QueryPlan`] handed to the storage layer.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::entities::Entity;
use crate::filters::types::FilterGroup;

/// Default page number
pub const DEFAULT_PAGE: u32 = 1;
/// Default items per page
pub const DEFAULT_LIMIT: u32 = 50;
/// Maximum page number to prevent expensive deep-offset queries
pub const MAX_PAGE: u32 = 1000;
/// Maximum items per page
pub const MAX_PAGE_LIMIT: u32 = 200;
/// Free-text search terms longer than this are truncated
pub const MAX_SEARCH_LENGTH: usize = 256;

pub fn default_page() -> u32 {
    DEFAULT_PAGE
}

pub fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Validator function for page parameter
pub fn validate_page(page: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::new("page_min").with_message("Page must be >= 1".into()));
    }
    if page > MAX_PAGE {
        return Err(ValidationError::new("page_max")
            .with_message(format!("Page must be <= {MAX_PAGE}").into()));
    }
    Ok(())
}

/// Validator function for limit parameter
pub fn validate_limit(limit: u32) -> Result<(), ValidationError> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ValidationError::new("limit_range")
            .with_message(format!("Limit must be between 1 and {MAX_PAGE_LIMIT}").into()));
    }
    Ok(())
}

/// Page/limit pair from the request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PageParams {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Requested sort, unvalidated
#[derive(Debug, Clone, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Sort validated against the entity's sortable whitelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Full query request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QueryRequest {
    pub entity: Entity,
    #[serde(default)]
    pub filters: Option<FilterGroup>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    #[validate(nested)]
    pub pagination: Option<PageParams>,
}

/// Finished query description handed to the storage layer
///
/// `filter` is the backend-agnostic predicate tree; executing it (and
/// producing rows plus a total count) belongs to the storage collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    pub entity: Entity,
    pub filter: serde_json::Value,
    pub order_by: Option<OrderBy>,
    pub skip: u64,
    pub take: u32,
}
