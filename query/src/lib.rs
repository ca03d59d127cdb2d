//! CareBridge query engine
//!
//! Turns untrusted filter expressions from the provider portal into
//! backend-agnostic predicate trees. A request names an entity, a recursive
//! AND/OR tree of field-operator-value conditions, an optional free-text
//! search term, and sort/pagination parameters; the engine validates the
//! tree against a per-entity capability matrix, compiles it, merges in the
//! search predicate and the mandatory not-soft-deleted guard, and hands the
//! finished [`QueryPlan`] to the storage layer.
//!
//! ## Usage
//!
//! ```
//! use carebridge_query::{build_query, parse_request};
//!
//! let request = parse_request(
//!     r#"{
//!         "entity": "contacts",
//!         "filters": {
//!             "operator": "AND",
//!             "conditions": [
//!                 { "field": "status", "operator": "equals", "value": "ACTIVE" }
//!             ]
//!         }
//!     }"#,
//! )
//! .unwrap();
//! let plan = build_query(&request).unwrap();
//! assert_eq!(plan.take, 50);
//! ```
//!
//! - `entities` - entity catalog and capability matrix
//! - `error` - error types and validation reports
//! - `filters` - filter tree parsing, validation, and compilation
//! - `predicate` - predicate tree construction helpers
//! - `query` - the top-level orchestrator
//! - `types` - request/plan types and pagination bounds
//!
//! The engine is pure and synchronous: no I/O, no shared mutable state, and
//! deterministic output for a fixed reference instant.

pub mod entities;
pub mod error;
pub mod filters;
pub mod predicate;
pub mod query;
pub mod types;

pub use entities::{Entity, is_allowed, is_allowed_str};
pub use error::{QueryError, ValidationIssue, ValidationReport};
pub use filters::{
    FilterCondition, FilterGroup, FilterOperator, GroupOperator, RelativeDateToken, parse_request,
};
pub use query::{build_query, build_query_at};
pub use types::{OrderBy, PageParams, QueryPlan, QueryRequest, SortDirection, SortSpec};
