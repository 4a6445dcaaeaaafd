//! Response mapper
//!
//! Reshapes a decoded `/query` response into frames according to the
//! query's [`ResultFormat`]:
//!
//! - **time_series**: one frame per series, only time and numeric fields
//! - **table**: all series merged into one frame, tags flattened into columns
//! - **logs**: like table, with tag-annotated field names and logs metadata

use super::alias::resolve_alias;
use super::types::{Field, FieldType, Frame, FrameMeta, QueryResponse, Series};
use crate::query::{QueryConfig, ResultFormat};
use serde_json::Value;

/// Map `response` into frames for `query`
///
/// A response without series maps to a single empty frame.
pub fn map_response(response: &QueryResponse, query: &QueryConfig) -> Vec<Frame> {
    let Some(series) = response.first_series().filter(|s| !s.is_empty()) else {
        return vec![Frame::empty()];
    };

    let alias = query.alias.as_deref().filter(|a| !a.is_empty());
    let mut frames = match query.result_format {
        ResultFormat::TimeSeries => time_series_frames(series, alias),
        ResultFormat::Table => vec![merged_frame(series, ResultFormat::Table, alias)],
        ResultFormat::Logs => {
            let mut frame = merged_frame(series, ResultFormat::Logs, alias);
            if !frame.fields.is_empty() {
                frame.meta = Some(FrameMeta {
                    preferred_visualisation_type: Some("logs".to_string()),
                    search_words: query
                        .keywords
                        .iter()
                        .filter(|k| !k.is_empty())
                        .cloned()
                        .collect(),
                });
            }
            vec![frame]
        }
    };

    for frame in frames.iter_mut().filter(|f| !f.fields.is_empty()) {
        frame.ref_id = query.ref_id.clone();
    }

    tracing::debug!(
        series = series.len(),
        frames = frames.len(),
        format = ?query.result_format,
        "Mapped response"
    );
    frames
}

fn time_series_frames(series: &[Series], alias: Option<&str>) -> Vec<Frame> {
    series
        .iter()
        .map(|s| {
            if s.values.is_empty() {
                return Frame::empty();
            }
            let fields = resolve_fields(s, ResultFormat::TimeSeries, alias)
                .into_iter()
                .filter(|f| matches!(f.field_type, FieldType::Time | FieldType::Number))
                .collect();
            Frame::with_fields(fields)
        })
        .collect()
}

fn merged_frame(series: &[Series], format: ResultFormat, alias: Option<&str>) -> Frame {
    let flattened: Vec<Series> = series.iter().map(flatten_tags).collect();
    let Some((first, rest)) = flattened.split_first() else {
        return Frame::empty();
    };

    let mut frame = Frame::with_fields(resolve_fields(first, format, alias));
    for s in rest {
        for row in &s.values {
            frame.append_row(row);
        }
    }
    frame
}

/// Splice tag names and values in right after the leading time column
fn flatten_tags(series: &Series) -> Series {
    let mut flat = series.clone();
    let Some(tags) = series.tag_set() else {
        return flat;
    };

    let at = flat.columns.len().min(1);
    flat.columns.splice(at..at, tags.keys().cloned());
    for row in flat.values.iter_mut() {
        let at = row.len().min(1);
        row.splice(at..at, tags.values().map(|v| Value::String(v.clone())));
    }
    flat
}

/// Build one field per column of `series`
pub fn resolve_fields(series: &Series, format: ResultFormat, alias: Option<&str>) -> Vec<Field> {
    let tag_text = series.tag_set().map(|tags| {
        tags.iter()
            .map(|(k, v)| format!("{}:{}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    });

    series
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let values: Vec<Value> = series
                .values
                .iter()
                .map(|row| row.get(i).cloned().unwrap_or(Value::Null))
                .collect();

            if column == "time" {
                return Field {
                    name: "Time".to_string(),
                    field_type: FieldType::Time,
                    values,
                };
            }

            let field_type = values
                .iter()
                .find(|v| !v.is_null())
                .and_then(FieldType::of)
                .unwrap_or(FieldType::Number);

            let name = match (&tag_text, format, alias) {
                (Some(_), ResultFormat::TimeSeries, Some(alias)) => resolve_alias(series, alias, i),
                (Some(tags), ResultFormat::TimeSeries, None) => {
                    format!("{}.{} {{{}}}", series.name, column, tags)
                }
                (Some(tags), ResultFormat::Logs, _) => format!("{}{{{}}}", column, tags),
                (None, ResultFormat::TimeSeries, _) => format!("{}.{}", series.name, column),
                _ => column.clone(),
            };

            Field {
                name,
                field_type,
                values,
            }
        })
        .collect()
}
