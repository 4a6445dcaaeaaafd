//! Query composition and building
//!
//! Turns editor state into InfluxQL text:
//!
//! - **Model**: [`QueryConfig`] and its select, WHERE and group-by parts
//! - **Composer**: pure edits of select and group-by chains
//! - **Builder**: renders a configuration into query text
//! - **Meta**: `SHOW ...` statements and distinct-value parsing
//!
//! # Example
//!
//! ```rust
//! use gemini_query::operators::OperatorRegistry;
//! use gemini_query::query::{build_query, Composer, QueryConfig, WhereOperator, WhereStatement};
//!
//! let registry = OperatorRegistry::builtin();
//! let query = QueryConfig::new("monitor", "autogen")
//!     .measurement("h2o_pH")
//!     .filter(WhereStatement::new("location::tag", WhereOperator::Eq, "coyote_creek"));
//!
//! let query = Composer::new(&registry).add_select(&query, 0, "derivative").unwrap();
//! let text = build_query(&query, &registry).unwrap();
//! assert!(text.starts_with("SELECT derivative(mean(\"value\"), 10s) FROM"));
//! ```

mod builder;
mod compose;
mod error;
mod meta;
mod model;

pub use builder::{build_from, build_query, build_where_condition, DATABASE_VARIABLE, TIME_FILTER};
pub use compose::{insert_condition, Composer};
pub use error::{QueryError, QueryResult};
pub use meta::{build_meta_query, parse_distinct_values, MetaQueryOptions, MetadataQueryType};
pub use model::{
    Condition, Connector, OrderByTime, QueryConfig, ResultFormat, SelectChain, WhereOperator,
    WhereStatement,
};
