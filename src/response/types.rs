//! Response and frame types
//!
//! [`QueryResponse`] mirrors the openGemini `/query` JSON body. [`Frame`] is
//! the columnar table handed back to callers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a `/query` response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    /// Request-level failure reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Series of the first statement; `None` when it produced no rows
    pub fn first_series(&self) -> Option<&[Series]> {
        self.results.first()?.series.as_deref()
    }
}

/// Result of one statement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatementResult {
    #[serde(default)]
    pub statement_id: u32,
    /// Absent when the statement matched nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<Series>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One result series
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
    /// Group-by tag values, in server order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<IndexMap<String, String>>,
}

impl Series {
    /// Tags, when present and non-empty
    pub fn tag_set(&self) -> Option<&IndexMap<String, String>> {
        self.tags.as_ref().filter(|tags| !tags.is_empty())
    }
}

/// Render a cell as plain text (strings without JSON quotes); `None` for null
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Type of a frame field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    Number,
    String,
    Boolean,
}

impl FieldType {
    /// Infer from a JSON value; `None` for null
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(Self::String),
            Value::Number(_) => Some(Self::Number),
            Value::Bool(_) => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// One named, typed column of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub values: Vec<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            values: Vec::new(),
        }
    }
}

/// Frame metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_visualisation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_words: Vec<String>,
}

/// Columnar result table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FrameMeta>,
}

impl Frame {
    /// A frame with no fields
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_fields(fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    /// Append one row; cells beyond the field count are dropped, missing cells become null
    pub fn append_row(&mut self, row: &[Value]) {
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.values.push(row.get(i).cloned().unwrap_or(Value::Null));
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.fields.first().map(|f| f.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
