//! # gemini-query
//!
//! Query building and result mapping for openGemini (InfluxQL) datasources.
//!
//! ## Features
//!
//! - **Operator registry**: fields, aggregations, selectors, transformations,
//!   predictors, math, aliasing and group-by operators
//! - **Chain composition**: editor edits applied as pure transforms that keep
//!   select chains well ordered
//! - **Query text**: `SELECT ... FROM ... WHERE ... GROUP BY ...` rendering
//!   with `$timeFilter` and template placeholders
//! - **Frames**: time series, table and logs shapes with alias patterns
//! - **Client**: `/query` and `/ping` over HTTP
//!
//! ## Modules
//!
//! - [`operators`]: Operator catalog and renderers
//! - [`query`]: Query model, composer, builder and metadata queries
//! - [`response`]: Response wire types and frame mapping
//! - [`client`]: openGemini HTTP client
//! - [`datasource`]: Multi-target execution, template variables, health check
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gemini_query::config::DatasourceConfig;
//! use gemini_query::datasource::{DataQueryRequest, DataSource, TimeRangeRaw};
//! use gemini_query::query::QueryConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let datasource = DataSource::connect(DatasourceConfig {
//!         database: "NOAA_water_database".to_string(),
//!         ..Default::default()
//!     })?;
//!
//!     let request = DataQueryRequest {
//!         targets: vec![QueryConfig::new("NOAA_water_database", "autogen").measurement("h2o_pH")],
//!         range: TimeRangeRaw::new("now-6h", "now"),
//!         ..Default::default()
//!     };
//!
//!     for frame in datasource.query(&request).await? {
//!         println!("{} fields, {} rows", frame.fields.len(), frame.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod datasource;
pub mod operators;
pub mod query;
pub mod response;

// Re-export top-level types for convenience
pub use operators::{Category, Operator, OperatorError, OperatorRegistry, ParamValue};

pub use query::{
    build_meta_query, build_query, parse_distinct_values, Composer, Condition, MetaQueryOptions,
    MetadataQueryType, QueryConfig, QueryError, QueryResult, ResultFormat, WhereOperator,
    WhereStatement,
};

pub use response::{map_response, Field, FieldType, Frame, QueryResponse, Series};

pub use client::{ClientError, GeminiClient, HttpMethod, HttpTransport, Transport};

pub use datasource::{
    DataQueryRequest, DataSource, DataSourceError, HealthState, HealthStatus, TemplateResolver,
    TemplateVariables, TimeRangeRaw,
};

pub use config::{Config, ConfigError, DatasourceConfig, LoggingConfig};
