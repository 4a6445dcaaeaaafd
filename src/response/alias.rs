//! Alias pattern expansion
//!
//! Tokens are `$name` or `[[name]]`:
//!
//! | Token                  | Expands to                               |
//! |------------------------|------------------------------------------|
//! | `m`, `measurement`     | series name                              |
//! | `col`                  | current column name                      |
//! | `<n>`                  | n-th dot-separated segment of the name   |
//! | `tag_<key>`            | value of tag `<key>`                     |
//!
//! Anything that cannot be resolved is kept as written.

use super::types::Series;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ALIAS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\w+)|\[\[([\s\S]+?)\]\]").expect("alias token pattern is valid"));

/// Expand `alias` for column `column` of `series`
pub fn resolve_alias(series: &Series, alias: &str, column: usize) -> String {
    let segments: Vec<&str> = series.name.split('.').collect();

    ALIAS_TOKEN
        .replace_all(alias, |caps: &Captures| {
            let matched = &caps[0];
            let Some(group) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
                return matched.to_string();
            };

            if group == "m" || group == "measurement" {
                return series.name.clone();
            }
            if group == "col" {
                return series
                    .columns
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| matched.to_string());
            }
            if let Ok(index) = group.parse::<usize>() {
                return segments
                    .get(index)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| matched.to_string());
            }

            group
                .strip_prefix("tag_")
                .and_then(|key| series.tags.as_ref()?.get(key).cloned())
                .unwrap_or_else(|| matched.to_string())
        })
        .into_owned()
}
