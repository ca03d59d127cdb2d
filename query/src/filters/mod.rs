//! Filter expression engine
//!
//! Compiles user-supplied boolean filter trees into backend-agnostic
//! predicates:
//!
//! - `types` - wire shapes for the recursive AND/OR filter tree
//! - `parser` - JSON request parsing with size and complexity limits
//! - `dates` - relative date token resolution
//! - `validate` - capability-matrix and value-shape validation
//! - `compile` - condition and group compilation

pub mod compile;
pub mod dates;
pub mod parser;
pub mod types;
pub mod validate;

pub use compile::{compile_condition, compile_group};
pub use dates::{DateRange, RelativeDateToken, resolve};
pub use parser::parse_request;
pub use types::{FilterCondition, FilterGroup, FilterOperator, GroupOperator};
pub use validate::{MAX_GROUP_DEPTH, validate};
