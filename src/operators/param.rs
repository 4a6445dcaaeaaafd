//! Operator parameters
//!
//! Parameter values carried by applied conditions, the declared shape of each
//! operator parameter, and the option sources offered to the editor.

use serde::{Deserialize, Serialize};

/// A single parameter value (the editor stores either strings or numbers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer value, e.g. a moving-average window
    Int(i64),
    /// Non-integral number
    Float(f64),
    /// Text value, e.g. a field name or interval
    Text(String),
}

impl ParamValue {
    /// Borrow the text content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for empty text
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Kind of value a parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Free text
    String,
    /// Integer
    Int,
    /// Duration literal such as `10s` or `$__interval`
    Interval,
    /// Column name; valid values come from the measurement's schema
    DynamicLookup,
}

/// Declared shape of one operator parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name shown by the editor
    pub name: &'static str,
    /// Value kind
    pub kind: ParamKind,
    /// Suggested values, empty when the parameter is free-form
    pub options: Vec<ParamValue>,
}

impl ParamSpec {
    /// Create a parameter without suggested values
    pub fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            options: Vec::new(),
        }
    }

    /// Attach suggested values
    pub fn with_options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// True when valid values are supplied by an external column-name provider
    pub fn is_dynamic(&self) -> bool {
        self.kind == ParamKind::DynamicLookup
    }
}

/// Where the editor should get choices for a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// Ask the column-name provider (field keys or tag keys)
    Dynamic,
    /// Fixed suggestions from the registry
    Fixed(Vec<String>),
    /// Free-form input
    None,
}

/// A parameter of an applied condition, ready for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct PartParam {
    /// Current value rendered as text
    pub value: String,
    /// Choices for this parameter
    pub options: OptionSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_display() {
        assert_eq!(ParamValue::from("10s").to_string(), "10s");
        assert_eq!(ParamValue::from(95_i64).to_string(), "95");
        assert_eq!(ParamValue::from(2.5_f64).to_string(), "2.5");
        assert_eq!(ParamValue::Float(100.0).to_string(), "100");
    }

    #[test]
    fn test_param_deserialize_untagged() {
        let values: Vec<ParamValue> = serde_json::from_str(r#"["value", 10, 0.5]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParamValue::Text("value".to_string()),
                ParamValue::Int(10),
                ParamValue::Float(0.5),
            ]
        );
    }

    #[test]
    fn test_param_spec_options() {
        let spec = ParamSpec::new("window", ParamKind::Int).with_options([5_i64, 10, 20]);
        assert_eq!(spec.options.len(), 3);
        assert!(!spec.is_dynamic());
        assert!(ParamSpec::new("field", ParamKind::DynamicLookup).is_dynamic());
    }
}
