//! Response handling
//!
//! Wire types for openGemini `/query` responses, the frame model returned to
//! callers, and the mapping between the two.
//!
//! # Example
//!
//! ```rust
//! use gemini_query::query::{QueryConfig, ResultFormat};
//! use gemini_query::response::{map_response, FieldType, QueryResponse};
//!
//! let response: QueryResponse = serde_json::from_str(r#"{
//!     "results": [{"statement_id": 0, "series": [{
//!         "name": "h2o_pH",
//!         "tags": {"location": "coyote_creek"},
//!         "columns": ["time", "pH"],
//!         "values": [[1566000000000, 7], [1566000360000, 6]]
//!     }]}]
//! }"#).unwrap();
//!
//! let query = QueryConfig::default().format(ResultFormat::Table);
//! let frames = map_response(&response, &query);
//! assert_eq!(frames[0].fields[1].name, "location");
//! assert_eq!(frames[0].fields[1].field_type, FieldType::String);
//! ```

mod alias;
mod mapper;
mod types;

pub use alias::resolve_alias;
pub use mapper::{map_response, resolve_fields};
pub use types::{
    cell_text, Field, FieldType, Frame, FrameMeta, QueryResponse, Series, StatementResult,
};
