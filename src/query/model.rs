//! Query configuration model
//!
//! The editor state a query is built from: select chains, WHERE statements,
//! the GROUP BY chain and the trailing clauses. Serializes in the editor's
//! JSON shape.

use crate::operators::{Category, ParamValue};
use serde::{Deserialize, Serialize};

/// One applied operator within a select chain or the group-by chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Operator type
    #[serde(rename = "type")]
    pub op_type: String,
    /// Operator category (group-by conditions default to [`Category::GroupBy`])
    #[serde(default = "default_category")]
    pub category: Category,
    /// Current parameters
    #[serde(default)]
    pub params: Vec<ParamValue>,
}

fn default_category() -> Category {
    Category::GroupBy
}

impl Condition {
    /// Create a condition
    pub fn new(op_type: impl Into<String>, category: Category, params: Vec<ParamValue>) -> Self {
        Self {
            op_type: op_type.into(),
            category,
            params,
        }
    }

    /// Create a field condition (select chain head)
    pub fn field(name: impl Into<String>) -> Self {
        Self::new("field", Category::Fields, vec![ParamValue::Text(name.into())])
    }

    /// Create a group-by condition
    pub fn group_by(op_type: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::new(op_type, Category::GroupBy, vec![value.into()])
    }
}

/// One output column's operator pipeline; the first condition is always a field
pub type SelectChain = Vec<Condition>;

/// WHERE comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhereOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "<>")]
    NotEqual,
    #[serde(rename = "=~")]
    Match,
    #[serde(rename = "!~")]
    NotMatch,
}

impl WhereOperator {
    /// Every operator, in editor order
    pub const ALL: [WhereOperator; 9] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::NotEqual,
        Self::Match,
        Self::NotMatch,
    ];

    /// Operator text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::NotEqual => "<>",
            Self::Match => "=~",
            Self::NotMatch => "!~",
        }
    }

    /// Parse operator text
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == s)
    }

    /// Regex and strict numeric comparisons take the value unquoted
    pub fn passes_raw_value(&self) -> bool {
        matches!(self, Self::Match | Self::NotMatch | Self::Gt | Self::Lt)
    }
}

impl std::fmt::Display for WhereOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connector joining a WHERE statement to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connector {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl std::fmt::Display for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// A WHERE statement: `(key, operator, value, connector)`
///
/// Serialized as a four-element array; the operator and connector may be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WhereTuple", into = "WhereTuple")]
pub struct WhereStatement {
    /// Column key, optionally suffixed `::tag` or `::field`
    pub key: String,
    /// Comparison operator; inferred from the value when absent
    pub operator: Option<WhereOperator>,
    /// Compared value
    pub value: ParamValue,
    /// Connector to the previous statement (ignored on the first)
    pub connector: Option<Connector>,
}

type WhereTuple = (String, Option<WhereOperator>, ParamValue, Option<Connector>);

impl From<WhereTuple> for WhereStatement {
    fn from((key, operator, value, connector): WhereTuple) -> Self {
        Self {
            key,
            operator,
            value,
            connector,
        }
    }
}

impl From<WhereStatement> for WhereTuple {
    fn from(s: WhereStatement) -> Self {
        (s.key, s.operator, s.value, s.connector)
    }
}

impl WhereStatement {
    /// Create a statement joined with AND
    pub fn new(
        key: impl Into<String>,
        operator: WhereOperator,
        value: impl Into<ParamValue>,
    ) -> Self {
        Self {
            key: key.into(),
            operator: Some(operator),
            value: value.into(),
            connector: Some(Connector::And),
        }
    }

    /// Set the connector
    pub fn connector(mut self, connector: Connector) -> Self {
        self.connector = Some(connector);
        self
    }
}

/// Requested output shape of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    #[default]
    TimeSeries,
    Table,
    Logs,
}

/// Time ordering of the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderByTime {
    #[default]
    Asc,
    Desc,
}

/// Complete editor state for one query target
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    /// Host-assigned target identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub database: String,
    /// Retention policy
    #[serde(default)]
    pub rp: String,
    #[serde(default)]
    pub from_measurement: Option<String>,
    #[serde(default)]
    pub where_conditions: Vec<WhereStatement>,
    #[serde(default)]
    pub select_conditions: Vec<SelectChain>,
    #[serde(default)]
    pub groupby_conditions: Vec<Condition>,
    #[serde(default)]
    pub order_by_time: OrderByTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default)]
    pub result_format: ResultFormat,
    /// Alias pattern for time series naming
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Free-text search terms (logs format only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Use `query_text` verbatim instead of building from the conditions
    #[serde(default)]
    pub raw_query: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
}

impl QueryConfig {
    /// A query selecting `mean("value")` grouped by `time($__interval) fill(null)`,
    /// the state a fresh editor starts from
    pub fn new(database: impl Into<String>, rp: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            rp: rp.into(),
            select_conditions: vec![vec![
                Condition::field("value"),
                Condition::new("mean", Category::Aggregations, Vec::new()),
            ]],
            groupby_conditions: vec![
                Condition::group_by("time", "$__interval"),
                Condition::group_by("fill", "null"),
            ],
            ..Default::default()
        }
    }

    /// Set the measurement
    pub fn measurement(mut self, measurement: impl Into<String>) -> Self {
        self.from_measurement = Some(measurement.into());
        self
    }

    /// Add a WHERE statement
    pub fn filter(mut self, statement: WhereStatement) -> Self {
        self.where_conditions.push(statement);
        self
    }

    /// Set the result format
    pub fn format(mut self, format: ResultFormat) -> Self {
        self.result_format = format;
        self
    }

    /// Switch to raw mode with the given text
    pub fn raw(mut self, text: impl Into<String>) -> Self {
        self.raw_query = true;
        self.query_text = Some(text.into());
        self
    }
}
