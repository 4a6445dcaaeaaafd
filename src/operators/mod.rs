//! Operator Registry
//!
//! Static catalog of the operators the editor can apply to a select chain or
//! the GROUP BY clause:
//!
//! - **Category**: where an operator sits in a chain
//! - **Renderer**: how it turns into query text
//! - **InsertStrategy**: how it is composed into an existing select chain
//!
//! The catalog is built once with [`OperatorRegistry::builtin`] and passed by
//! reference to the query builder and composer.
//!
//! # Example
//!
//! ```rust
//! use gemini_query::operators::{Category, OperatorRegistry};
//!
//! let registry = OperatorRegistry::builtin();
//! let mean = registry.lookup("mean").unwrap();
//! assert_eq!(mean.category, Category::Aggregations);
//! ```

mod catalog;
mod error;
mod param;
mod render;

pub use error::{OperatorError, OperatorResult};
pub use param::{OptionSource, ParamKind, ParamSpec, ParamValue, PartParam};
pub use render::{quote_column, Renderer};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operator category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Column reference; always the head of a select chain
    Fields,
    /// Aggregate functions (`mean`, `count`, ...)
    Aggregations,
    /// Selector functions (`max`, `top`, ...)
    Selectors,
    /// Transformations (`derivative`, `difference`, ...)
    Transformations,
    /// Predictors (`holt_winters`)
    Predictors,
    /// Raw trailing math expression
    Math,
    /// Column alias
    Aliasing,
    /// Group-by-only operators (`time`, `fill`, `tag`)
    #[serde(rename = "GroupbyCategory")]
    GroupBy,
}

impl Category {
    /// Select categories in menu order
    pub const MENU_ORDER: [Category; 7] = [
        Category::Aggregations,
        Category::Selectors,
        Category::Transformations,
        Category::Predictors,
        Category::Math,
        Category::Aliasing,
        Category::Fields,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fields => "Fields",
            Self::Aggregations => "Aggregations",
            Self::Selectors => "Selectors",
            Self::Transformations => "Transformations",
            Self::Predictors => "Predictors",
            Self::Math => "Math",
            Self::Aliasing => "Aliasing",
            Self::GroupBy => "GroupbyCategory",
        }
    }

    /// True for categories that may appear in a select chain
    pub fn is_select(&self) -> bool {
        !matches!(self, Self::GroupBy)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a select operator is composed into an existing chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStrategy {
    /// Start a new select chain
    Field,
    /// Single aggregation/selector slot after the field (count/distinct may pair)
    Aggregation,
    /// Before the first math or alias item
    Transformation,
    /// As late as possible, before a trailing alias
    Math,
    /// Replace or append the trailing alias
    Alias,
}

/// A registered operator
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    /// Unique operator name
    pub op_type: &'static str,
    /// Category
    pub category: Category,
    /// Declared parameters, in order
    pub params: Vec<ParamSpec>,
    /// Parameters a freshly added condition starts with
    pub default_params: Vec<ParamValue>,
    /// Composition rule; `None` for group-by-only operators
    pub insert: Option<InsertStrategy>,
    /// Rendering rule
    pub renderer: Renderer,
}

impl Operator {
    /// Create an operator without parameters
    pub fn new(
        op_type: &'static str,
        category: Category,
        renderer: Renderer,
        insert: Option<InsertStrategy>,
    ) -> Self {
        Self {
            op_type,
            category,
            params: Vec::new(),
            default_params: Vec::new(),
            insert,
            renderer,
        }
    }

    /// Declare the next parameter
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Set default parameters
    pub fn defaults<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.default_params = values.into_iter().map(Into::into).collect();
        self
    }

    /// Render this operator's fragment around `inner`
    pub fn render(&self, params: &[ParamValue], inner: &str) -> String {
        self.renderer.render(self.op_type, params, inner)
    }
}

/// One category of the add-operator menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuGroup {
    pub category: Category,
    pub operators: Vec<&'static str>,
}

/// Immutable operator catalog
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: HashMap<&'static str, Operator>,
    by_category: HashMap<Category, Vec<&'static str>>,
    group_by: Vec<&'static str>,
}

impl OperatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in operator
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for op in catalog::builtin_operators() {
            // Built-in names are unique
            if let Err(e) = registry.register(op) {
                tracing::error!("Skipping built-in operator: {}", e);
            }
        }
        registry
    }

    /// Register an operator
    ///
    /// Select operators are indexed under their category for menu listing;
    /// group-by operators are tracked separately and never offered in select menus.
    pub fn register(&mut self, operator: Operator) -> OperatorResult<()> {
        let op_type = operator.op_type;
        if self.operators.contains_key(op_type) {
            return Err(OperatorError::Duplicate(op_type.to_string()));
        }

        if operator.category.is_select() {
            self.by_category
                .entry(operator.category)
                .or_default()
                .push(op_type);
        } else {
            self.group_by.push(op_type);
        }
        self.operators.insert(op_type, operator);
        Ok(())
    }

    /// Look up an operator by type
    pub fn lookup(&self, op_type: &str) -> OperatorResult<&Operator> {
        self.operators
            .get(op_type)
            .ok_or_else(|| OperatorError::NotFound(op_type.to_string()))
    }

    /// True if `op_type` is registered
    pub fn contains(&self, op_type: &str) -> bool {
        self.operators.contains_key(op_type)
    }

    /// Number of registered operators
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Select categories in menu order, each with its operators in registration order
    pub fn menu_options(&self) -> Vec<MenuGroup> {
        Category::MENU_ORDER
            .iter()
            .map(|category| MenuGroup {
                category: *category,
                operators: self.by_category.get(category).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Menu options offered when adding to an existing chain (no Fields group)
    pub fn add_menu_options(&self) -> Vec<MenuGroup> {
        self.menu_options()
            .into_iter()
            .filter(|group| group.category != Category::Fields)
            .collect()
    }

    /// Names of the group-by-only operators
    pub fn group_by_operators(&self) -> &[&'static str] {
        &self.group_by
    }

    /// Describe the parameters of an applied condition together with their option sources
    pub fn part_params(
        &self,
        op_type: &str,
        params: &[ParamValue],
    ) -> OperatorResult<Vec<PartParam>> {
        let operator = self.lookup(op_type)?;
        Ok(params
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let options = match operator.params.get(i) {
                    Some(spec) if spec.is_dynamic() => OptionSource::Dynamic,
                    Some(spec) if !spec.options.is_empty() => {
                        OptionSource::Fixed(spec.options.iter().map(ToString::to_string).collect())
                    }
                    _ => OptionSource::None,
                };
                PartParam {
                    value: value.to_string(),
                    options,
                }
            })
            .collect())
    }
}
