//! Metadata queries
//!
//! `SHOW ...` statements used to populate editor dropdowns, and the parser
//! that turns their responses into distinct values.

use crate::datasource::TemplateResolver;
use crate::query::builder::DATABASE_VARIABLE;
use crate::response::{cell_text, QueryResponse};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of metadata to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetadataQueryType {
    RetentionPolicies,
    FieldKeys,
    TagKeys,
    Measurements,
    Databases,
}

impl MetadataQueryType {
    /// Parse a kind name such as `tag_keys`, `TAG_KEYS` or `tag-keys`
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "retention_policies" | "rp" => Some(Self::RetentionPolicies),
            "field_keys" => Some(Self::FieldKeys),
            "tag_keys" => Some(Self::TagKeys),
            "measurements" => Some(Self::Measurements),
            "databases" => Some(Self::Databases),
            _ => None,
        }
    }
}

/// Options for [`build_meta_query`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaQueryOptions {
    #[serde(rename = "type")]
    pub query_type: MetadataQueryType,
    #[serde(default)]
    pub from_measurement: Option<String>,
    #[serde(default)]
    pub rp: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl MetaQueryOptions {
    pub fn new(query_type: MetadataQueryType) -> Self {
        Self {
            query_type,
            from_measurement: None,
            rp: None,
            database: None,
        }
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn measurement(mut self, measurement: impl Into<String>) -> Self {
        self.from_measurement = Some(measurement.into());
        self
    }

    /// Set the retention policy qualifying the measurement
    pub fn rp(mut self, rp: impl Into<String>) -> Self {
        self.rp = Some(rp.into());
        self
    }
}

/// Build a metadata query
///
/// A `$database` placeholder is resolved through `resolver` when one is given.
pub fn build_meta_query(options: &MetaQueryOptions, resolver: Option<&dyn TemplateResolver>) -> String {
    let mut database = options.database.clone().unwrap_or_default();
    if database == DATABASE_VARIABLE {
        if let Some(resolver) = resolver {
            database = resolver.replace(&database);
        }
    }

    let mut query = match options.query_type {
        MetadataQueryType::RetentionPolicies => {
            return format!("SHOW RETENTION POLICIES on \"{}\"", database)
        }
        MetadataQueryType::Databases => return "SHOW DATABASES".to_string(),
        MetadataQueryType::FieldKeys => format!("SHOW FIELD KEYS on {}", database),
        MetadataQueryType::TagKeys => format!("SHOW TAG KEYS on {}", database),
        MetadataQueryType::Measurements => format!("SHOW MEASUREMENTS on {}", database),
    };

    if let Some(measurement) = options.from_measurement.as_deref().filter(|m| !m.is_empty()) {
        let mut from = if is_regex_literal(measurement) || is_merge_call(measurement) {
            measurement.to_string()
        } else {
            format!("\"{}\"", measurement)
        };
        if let Some(rp) = options.rp.as_deref().filter(|rp| !rp.is_empty() && *rp != "default") {
            from = format!("\"{}\".{}", rp, from);
        }
        query.push_str(" FROM ");
        query.push_str(&from);
    }
    query
}

fn is_regex_literal(measurement: &str) -> bool {
    measurement.starts_with('/') && measurement[1..].contains('/')
}

fn is_merge_call(measurement: &str) -> bool {
    measurement.starts_with("merge(") && measurement[6..].contains(')')
}

/// Extract distinct values from a metadata response
///
/// Rows of `SHOW FIELD KEYS` and `SHOW RETENTION POLICIES` contribute their
/// first cell; other queries contribute the second cell when there is one.
/// The default retention policy is promoted to the front.
pub fn parse_distinct_values(query: &str, response: &QueryResponse) -> Vec<String> {
    let Some(series) = response.first_series() else {
        return Vec::new();
    };

    let normalized = query.to_lowercase();
    let retention_policies = normalized.contains("show retention policies");
    let first_cell = retention_policies || normalized.contains("show field keys");

    let mut values: IndexSet<String> = IndexSet::new();
    for row in series.iter().flat_map(|s| s.values.iter()) {
        let cell = if first_cell {
            row.first()
        } else {
            row.get(1).or_else(|| row.first())
        };
        let Some(value) = cell.and_then(cell_text) else {
            continue;
        };

        if retention_policies && row.last() == Some(&Value::Bool(true)) {
            values.shift_remove(&value);
            values.shift_insert(0, value);
        } else {
            values.insert(value);
        }
    }
    values.into_iter().collect()
}
