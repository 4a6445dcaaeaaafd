//! Template variable substitution

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static VARIABLE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(\w+)\}|\[\[(\w+)\]\]|\$(\w+)").expect("variable token pattern is valid")
});

/// Replaces template variables in query text
pub trait TemplateResolver: Send + Sync {
    fn replace(&self, text: &str) -> String;
}

/// Map-backed resolver for `$name`, `${name}` and `[[name]]`
///
/// Only whole tokens are substituted: with `time` set, `$timeFilter` is left
/// alone. Unknown names stay as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVariables {
    values: HashMap<String, String>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable (name without the leading `$`)
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`TemplateVariables::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy every variable of `other` over this set
    pub fn merge(&mut self, other: &TemplateVariables) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }
}

impl TemplateResolver for TemplateVariables {
    fn replace(&self, text: &str) -> String {
        if self.values.is_empty() {
            return text.to_string();
        }

        VARIABLE_TOKEN
            .replace_all(text, |caps: &Captures| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                self.values
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateVariables
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
