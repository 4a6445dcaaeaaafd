//! Operator renderers
//!
//! Each operator renders to a query text fragment from its parameters and
//! the text already rendered by the conditions before it in the chain.

use super::param::ParamValue;

/// Rendering rule attached to an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// Quoted column name: `"level"::tag`, or a bare `*`
    Field,
    /// Function call wrapping the inner text: `mean("value")`
    Function,
    /// Raw expression appended after the inner text: `mean("value") / 100`
    Suffix,
    /// Column alias: `mean("value") AS "avg"`
    Alias,
}

impl Renderer {
    /// Render a fragment for `op_type` with `params`, given the inner text so far
    pub fn render(&self, op_type: &str, params: &[ParamValue], inner: &str) -> String {
        match self {
            Self::Field => render_field(params),
            Self::Function => render_function(op_type, params, inner),
            Self::Suffix => format!("{} {}", inner, first_param(params)),
            Self::Alias => format!("{} AS \"{}\"", inner, first_param(params)),
        }
    }
}

fn first_param(params: &[ParamValue]) -> String {
    params.first().map(ToString::to_string).unwrap_or_default()
}

fn render_field(params: &[ParamValue]) -> String {
    let name = first_param(params);
    if name == "*" {
        return name;
    }
    quote_column(&name)
}

fn render_function(op_type: &str, params: &[ParamValue], inner: &str) -> String {
    let mut args: Vec<String> = Vec::with_capacity(params.len() + 1);
    if !inner.is_empty() {
        args.push(inner.to_string());
    }
    args.extend(params.iter().map(ToString::to_string));
    format!("{}({})", op_type, args.join(", "))
}

/// Quote a column name, keeping a `::tag` / `::field` namespace suffix outside the quotes
pub fn quote_column(name: &str) -> String {
    if let Some(base) = name.strip_suffix("::tag") {
        format!("\"{}\"::tag", base)
    } else if let Some(base) = name.strip_suffix("::field") {
        format!("\"{}\"::field", base)
    } else {
        format!("\"{}\"", name)
    }
}
