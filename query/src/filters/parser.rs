//! Request parsing
//!
//! Parses a JSON request body into a [`QueryRequest`], applying size and
//! complexity limits before anything else looks at the tree. Structural
//! problems (malformed JSON, unknown entities or operators, out-of-bounds
//! pagination) are rejected here; semantic problems are the validator's job.

use validator::Validate;

use crate::error::QueryError;
use crate::types::QueryRequest;

/// Maximum size of a query request body in bytes (64 KiB)
const MAX_REQUEST_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of leaf conditions across the whole filter tree
const MAX_CONDITIONS: usize = 100;

/// Parse and structurally check a query request body
pub fn parse_request(json_str: &str) -> Result<QueryRequest, QueryError> {
    if json_str.len() > MAX_REQUEST_JSON_SIZE {
        return Err(QueryError::bad_request(
            "REQUEST_TOO_LARGE",
            format!("Request body exceeds maximum size of {MAX_REQUEST_JSON_SIZE} bytes"),
        ));
    }

    let request: QueryRequest = serde_json::from_str(json_str)
        .map_err(|e| QueryError::bad_request("INVALID_FILTER_JSON", e.to_string()))?;

    if let Some(filters) = &request.filters {
        let count = filters.condition_count();
        if count > MAX_CONDITIONS {
            return Err(QueryError::bad_request(
                "TOO_MANY_FILTERS",
                format!("Maximum {MAX_CONDITIONS} filter conditions allowed, got {count}"),
            ));
        }
    }

    request
        .validate()
        .map_err(|e| QueryError::bad_request("INVALID_PAGINATION", e.to_string()))?;

    Ok(request)
}
