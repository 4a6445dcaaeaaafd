//! Query text builder
//!
//! Renders a [`QueryConfig`] into InfluxQL text:
//!
//! ```text
//! SELECT <chains> FROM <db>.<rp>.<measurement> WHERE (<statements>) AND $timeFilter
//!     [GROUP BY <chain>] [ORDER BY time DESC] [LIMIT n] [OFFSET n] [tz('zone')]
//! ```

use crate::operators::{quote_column, OperatorRegistry, ParamValue};
use crate::query::error::QueryResult;
use crate::query::model::{Condition, Connector, OrderByTime, QueryConfig, WhereOperator, WhereStatement};
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder replaced with the active time range at execution time
pub const TIME_FILTER: &str = "$timeFilter";

/// Database placeholder left unquoted in FROM clauses
pub const DATABASE_VARIABLE: &str = "$database";

static REGEX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/.*/$").expect("regex literal pattern is valid"));

/// Build the query text for `query`
///
/// Raw-mode queries return their stored text unchanged.
pub fn build_query(query: &QueryConfig, registry: &OperatorRegistry) -> QueryResult<String> {
    if query.raw_query {
        return Ok(query.query_text.clone().unwrap_or_default());
    }

    let mut text = String::from("SELECT ");
    text.push_str(&build_select(&query.select_conditions, registry)?);
    text.push_str(&build_from(query));

    text.push_str(" WHERE ");
    if !query.where_conditions.is_empty() {
        let statements: Vec<String> = query
            .where_conditions
            .iter()
            .enumerate()
            .map(|(i, statement)| build_where_condition(statement, i))
            .collect();
        text.push_str(&format!("({}) AND ", statements.join(" ")));
    }
    text.push_str(TIME_FILTER);

    if !query.groupby_conditions.is_empty() {
        text.push_str(" GROUP BY ");
        text.push_str(&build_group_by(&query.groupby_conditions, registry)?);
    }

    if query.order_by_time == OrderByTime::Desc {
        text.push_str(" ORDER BY time DESC");
    }

    if let Some(limit) = clause_value(&query.limit) {
        text.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = clause_value(&query.offset) {
        text.push_str(&format!(" OFFSET {}", offset));
    }
    if let Some(tz) = query.tz.as_deref().filter(|tz| !tz.is_empty()) {
        text.push_str(&format!(" tz('{}')", tz));
    }

    tracing::debug!(query = %text, "Built query");
    Ok(text)
}

/// LIMIT/OFFSET value, if set; empty text and numeric zero count as unset
fn clause_value(value: &Option<ParamValue>) -> Option<&ParamValue> {
    value.as_ref().filter(|v| match v {
        ParamValue::Int(n) => *n != 0,
        ParamValue::Float(f) => *f != 0.0,
        ParamValue::Text(s) => !s.is_empty(),
    })
}

fn render_chain(chain: &[Condition], registry: &OperatorRegistry) -> QueryResult<String> {
    chain.iter().try_fold(String::new(), |inner, condition| {
        let operator = registry.lookup(&condition.op_type)?;
        Ok(operator.render(&condition.params, &inner))
    })
}

fn build_select(chains: &[Vec<Condition>], registry: &OperatorRegistry) -> QueryResult<String> {
    let terms = chains
        .iter()
        .map(|chain| render_chain(chain, registry))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(terms.join(", "))
}

fn build_group_by(chain: &[Condition], registry: &OperatorRegistry) -> QueryResult<String> {
    let mut text = String::new();
    for (i, condition) in chain.iter().enumerate() {
        let operator = registry.lookup(&condition.op_type)?;
        if i > 0 {
            text.push_str(if condition.op_type == "fill" { " " } else { ", " });
        }
        text.push_str(&operator.render(&condition.params, ""));
    }
    Ok(text)
}

/// Render the FROM clause, including its leading space
pub fn build_from(query: &QueryConfig) -> String {
    let measurement = match query.from_measurement.as_deref() {
        None | Some("") => "\"measurement\"".to_string(),
        Some(m) if REGEX_LITERAL.is_match(m) => m.to_string(),
        Some(m) => format!("\"{}\"", m),
    };

    let database = if query.database == DATABASE_VARIABLE {
        query.database.clone()
    } else {
        format!("\"{}\"", query.database)
    };

    format!(" FROM {}.\"{}\".{}", database, query.rp, measurement)
}

/// Render one WHERE statement; statements after the first carry their connector
pub fn build_where_condition(statement: &WhereStatement, index: usize) -> String {
    let value = statement.value.to_string();
    let operator = statement.operator.unwrap_or_else(|| {
        if REGEX_LITERAL.is_match(&value) {
            WhereOperator::Match
        } else {
            WhereOperator::Eq
        }
    });

    let value = if operator.passes_raw_value() {
        value
    } else {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    };

    let mut text = String::new();
    if index > 0 {
        let connector = statement.connector.unwrap_or(Connector::And);
        text.push_str(&format!("{} ", connector));
    }
    text.push_str(&format!("{} {} {}", quote_column(&statement.key), operator, value));
    text
}
