//! Select and group-by chain composition
//!
//! Pure edits of a [`QueryConfig`]: every operation returns a new
//! configuration and leaves its input untouched.
//!
//! Select chains keep their conditions in category order:
//!
//! ```text
//! Fields → Aggregation|Selector → Transformation|Predictor → Math → Aliasing
//! ```
//!
//! with at most one aggregation/selector, except that `distinct` may be
//! directly followed by `count`.

use crate::operators::{Category, InsertStrategy, OperatorRegistry, ParamValue};
use crate::query::error::{QueryError, QueryResult};
use crate::query::model::{Condition, QueryConfig};
use once_cell::sync::Lazy;
use regex::Regex;

static GROUP_BY_SELECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\((.*)\)$").expect("group by selection pattern is valid"));

/// Applies editor actions to select and group-by chains
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    registry: &'a OperatorRegistry,
}

impl<'a> Composer<'a> {
    /// Create a composer backed by `registry`
    pub fn new(registry: &'a OperatorRegistry) -> Self {
        Self { registry }
    }

    /// Add operator `op_type` to select chain `chain`
    ///
    /// Adding a field starts a new select chain instead of touching `chain`.
    pub fn add_select(
        &self,
        query: &QueryConfig,
        chain: usize,
        op_type: &str,
    ) -> QueryResult<QueryConfig> {
        let operator = self.registry.lookup(op_type)?;
        let strategy = operator
            .insert
            .ok_or_else(|| QueryError::NotSelectOperator(op_type.to_string()))?;
        let item = Condition::new(op_type, operator.category, operator.default_params.clone());

        let mut next = query.clone();
        if strategy == InsertStrategy::Field {
            next.select_conditions.push(vec![item]);
        } else {
            let len = next.select_conditions.len();
            let target = next
                .select_conditions
                .get(chain)
                .ok_or(QueryError::ChainIndexOutOfRange { index: chain, len })?;
            let updated = insert_condition(target, item, strategy);
            next.select_conditions[chain] = updated;
        }

        tracing::debug!(op_type, chain, "Added select condition");
        Ok(next)
    }

    /// Remove condition `part` from select chain `chain`
    ///
    /// Removing the field head drops the whole chain, unless it is the last one.
    pub fn remove_select(
        &self,
        query: &QueryConfig,
        chain: usize,
        part: usize,
    ) -> QueryResult<QueryConfig> {
        let condition = select_part(query, chain, part)?;

        let mut next = query.clone();
        if condition.category == Category::Fields {
            if next.select_conditions.len() > 1 {
                next.select_conditions.remove(chain);
            }
        } else {
            next.select_conditions[chain].remove(part);
        }
        Ok(next)
    }

    /// Replace the parameters of condition `part` in select chain `chain`
    pub fn change_select(
        &self,
        query: &QueryConfig,
        chain: usize,
        part: usize,
        params: Vec<ParamValue>,
    ) -> QueryResult<QueryConfig> {
        select_part(query, chain, part)?;

        let mut next = query.clone();
        next.select_conditions[chain][part].params = params;
        Ok(next)
    }

    /// Add a group-by selection of the form `type(value)`, e.g. `tag(host)`
    ///
    /// Unparseable selections leave the query unchanged.
    pub fn add_group_by(&self, query: &QueryConfig, selection: &str) -> QueryConfig {
        let mut next = query.clone();
        let Some(caps) = GROUP_BY_SELECTION.captures(selection) else {
            tracing::warn!(selection, "Ignoring malformed group by selection");
            return next;
        };
        let item = Condition::group_by(&caps[1], &caps[2]);

        let chain = &mut next.groupby_conditions;
        match &caps[1] {
            "time" => chain.insert(0, item),
            "tag" if chain.last().map(|c| c.op_type == "fill").unwrap_or(false) => {
                let at = chain.len() - 1;
                chain.insert(at, item);
            }
            _ => chain.push(item),
        }
        next
    }

    /// Remove group-by condition `index`
    pub fn remove_group_by(&self, query: &QueryConfig, index: usize) -> QueryResult<QueryConfig> {
        group_by_part(query, index)?;

        let mut next = query.clone();
        next.groupby_conditions.remove(index);
        Ok(next)
    }

    /// Replace the parameters of group-by condition `index`
    pub fn change_group_by(
        &self,
        query: &QueryConfig,
        index: usize,
        params: Vec<ParamValue>,
    ) -> QueryResult<QueryConfig> {
        group_by_part(query, index)?;

        let mut next = query.clone();
        next.groupby_conditions[index].params = params;
        Ok(next)
    }

    /// Group-by selections the editor can offer, given the measurement's tag keys
    pub fn group_by_options(&self, query: &QueryConfig, tag_keys: &[String]) -> Vec<String> {
        let has = |op: &str| query.groupby_conditions.iter().any(|c| c.op_type == op);

        let mut options = Vec::with_capacity(tag_keys.len() + 2);
        if !has("fill") {
            options.push("fill(null)".to_string());
        }
        if !has("time") {
            options.push("time($__interval)".to_string());
        }
        options.extend(tag_keys.iter().map(|key| format!("tag({})", key)));
        options
    }
}

fn select_part(query: &QueryConfig, chain: usize, part: usize) -> QueryResult<&Condition> {
    let conditions = query
        .select_conditions
        .get(chain)
        .ok_or(QueryError::ChainIndexOutOfRange {
            index: chain,
            len: query.select_conditions.len(),
        })?;
    conditions.get(part).ok_or(QueryError::PartIndexOutOfRange {
        index: part,
        len: conditions.len(),
    })
}

fn group_by_part(query: &QueryConfig, index: usize) -> QueryResult<&Condition> {
    query
        .groupby_conditions
        .get(index)
        .ok_or(QueryError::GroupByIndexOutOfRange {
            index,
            len: query.groupby_conditions.len(),
        })
}

/// Insert `item` into a copy of `chain` following `strategy`
pub fn insert_condition(
    chain: &[Condition],
    item: Condition,
    strategy: InsertStrategy,
) -> Vec<Condition> {
    let mut chain = chain.to_vec();
    match strategy {
        InsertStrategy::Field => return vec![item],
        InsertStrategy::Aggregation => insert_aggregation(&mut chain, item),
        InsertStrategy::Transformation => {
            let at = chain
                .iter()
                .position(|c| matches!(c.category, Category::Math | Category::Aliasing))
                .unwrap_or(chain.len());
            chain.insert(at, item);
        }
        InsertStrategy::Math => insert_math(&mut chain, item),
        InsertStrategy::Alias => match chain.last_mut() {
            Some(last) if last.category == Category::Aliasing => *last = item,
            _ => chain.push(item),
        },
    }
    chain
}

fn insert_aggregation(chain: &mut Vec<Condition>, item: Condition) {
    for i in 0..chain.len() {
        match chain[i].category {
            Category::Aggregations => {
                let existing = chain[i].op_type.clone();
                if existing == item.op_type {
                    return;
                }
                if existing == "count" && item.op_type == "distinct" {
                    break;
                }
                if existing == "distinct" {
                    let next = chain.get(i + 1);
                    if item.op_type == "count" {
                        if next.map(|c| c.op_type != "count").unwrap_or(true) {
                            chain.insert(i + 1, item);
                        }
                        return;
                    }
                    // stale successor of distinct
                    if next.map(|c| c.category == Category::Aggregations).unwrap_or(false) {
                        chain.remove(i + 1);
                    }
                }
                chain[i] = item;
                return;
            }
            Category::Selectors => {
                chain[i] = item;
                return;
            }
            _ => {}
        }
    }

    let at = chain.len().min(1);
    chain.insert(at, item);
}

fn insert_math(chain: &mut Vec<Condition>, item: Condition) {
    let n = chain.len();
    let last = chain.last().map(|c| c.category);
    let before_last = n.checked_sub(2).map(|i| chain[i].category);

    if last == Some(Category::Math) {
        chain.push(item);
    } else if before_last == Some(Category::Math) || last == Some(Category::Aliasing) {
        chain.insert(n - 1, item);
    } else {
        chain.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cond(op_type: &str, category: Category) -> Condition {
        Condition::new(op_type, category, Vec::new())
    }

    fn types(chain: &[Condition]) -> Vec<&str> {
        chain.iter().map(|c| c.op_type.as_str()).collect()
    }

    fn query_with(chain: Vec<Condition>) -> QueryConfig {
        QueryConfig {
            select_conditions: vec![chain],
            ..Default::default()
        }
    }

    const SELECT_ORDER: [Category; 7] = [
        Category::Fields,
        Category::Aggregations,
        Category::Selectors,
        Category::Transformations,
        Category::Predictors,
        Category::Math,
        Category::Aliasing,
    ];

    fn is_valid_select(chain: &[Condition]) -> bool {
        if chain.first().map(|c| c.category) != Some(Category::Fields) {
            return false;
        }

        let rank = |c: Category| SELECT_ORDER.iter().position(|o| *o == c).unwrap_or(usize::MAX);
        let mut current = 1;
        let mut picks = 0;
        for c in &chain[1..] {
            let r = rank(c.category);
            if r < current {
                // transformations and predictors may interleave
                let interleaved = c.category == Category::Transformations
                    && SELECT_ORDER[current] == Category::Predictors;
                if !interleaved {
                    return false;
                }
            }
            current = r;
            if matches!(c.category, Category::Aggregations | Category::Selectors) {
                picks += 1;
            }
        }

        match picks {
            0 | 1 => true,
            2 => chain[1].op_type == "distinct" && chain[2].op_type == "count",
            _ => false,
        }
    }

    #[test]
    fn test_add_same_aggregation_is_noop() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value"), cond("count", Category::Aggregations)]);

        let next = composer.add_select(&query, 0, "count").unwrap();
        assert_eq!(next, query);
    }

    #[test]
    fn test_distinct_and_count_coexist() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value")]);

        let next = composer.add_select(&query, 0, "count").unwrap();
        let next = composer.add_select(&next, 0, "distinct").unwrap();
        assert_eq!(types(&next.select_conditions[0]), vec!["field", "distinct", "count"]);

        let again = composer.add_select(&next, 0, "count").unwrap();
        assert_eq!(again, next);
    }

    #[test]
    fn test_count_after_distinct() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value")]);

        let next = composer.add_select(&query, 0, "distinct").unwrap();
        let next = composer.add_select(&next, 0, "count").unwrap();
        assert_eq!(types(&next.select_conditions[0]), vec!["field", "distinct", "count"]);
    }

    #[test]
    fn test_aggregation_replaces_distinct_pair() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![
            Condition::field("value"),
            cond("distinct", Category::Aggregations),
            cond("count", Category::Aggregations),
            cond("spread", Category::Transformations),
        ]);

        let next = composer.add_select(&query, 0, "mean").unwrap();
        assert_eq!(types(&next.select_conditions[0]), vec!["field", "mean", "spread"]);

        let next = composer.add_select(&query, 0, "max").unwrap();
        assert_eq!(types(&next.select_conditions[0]), vec!["field", "max", "spread"]);
    }

    #[test]
    fn test_selector_replaces_aggregation() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value"), cond("mean", Category::Aggregations)]);

        let next = composer.add_select(&query, 0, "top").unwrap();
        let chain = &next.select_conditions[0];
        assert_eq!(types(chain), vec!["field", "top"]);
        assert_eq!(chain[1].category, Category::Selectors);
        assert_eq!(chain[1].params, vec![ParamValue::Int(3)]);

        let next = composer.add_select(&next, 0, "sum").unwrap();
        assert_eq!(types(&next.select_conditions[0]), vec!["field", "sum"]);
    }

    #[test]
    fn test_aggregation_goes_after_field() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![
            Condition::field("value"),
            cond("derivative", Category::Transformations),
        ]);

        let next = composer.add_select(&query, 0, "median").unwrap();
        assert_eq!(types(&next.select_conditions[0]), vec!["field", "median", "derivative"]);
    }

    #[test]
    fn test_transformations_and_predictors() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value"), cond("count", Category::Aggregations)]);

        let next = composer.add_select(&query, 0, "derivative").unwrap();
        let next = composer.add_select(&next, 0, "holt_winters").unwrap();
        let chain = &next.select_conditions[0];
        assert_eq!(types(chain), vec!["field", "count", "derivative", "holt_winters"]);
        assert_eq!(chain[2].params, vec![ParamValue::from("10s")]);
        assert_eq!(chain[3].params, vec![ParamValue::Int(10), ParamValue::Int(2)]);
    }

    #[test]
    fn test_transformation_before_math_and_alias() {
        let chain = vec![
            Condition::field("value"),
            cond("math", Category::Math),
            cond("alias", Category::Aliasing),
        ];
        let next = insert_condition(
            &chain,
            cond("difference", Category::Transformations),
            InsertStrategy::Transformation,
        );
        assert_eq!(types(&next), vec!["field", "difference", "math", "alias"]);
    }

    #[test]
    fn test_math_placement() {
        let base = vec![Condition::field("value"), cond("alias", Category::Aliasing)];

        let one = insert_condition(&base, cond("math", Category::Math), InsertStrategy::Math);
        assert_eq!(types(&one), vec!["field", "math", "alias"]);

        let two = insert_condition(&one, cond("math", Category::Math), InsertStrategy::Math);
        assert_eq!(types(&two), vec!["field", "math", "math", "alias"]);

        let stacked = insert_condition(
            &[Condition::field("value"), cond("math", Category::Math)],
            cond("math", Category::Math),
            InsertStrategy::Math,
        );
        assert_eq!(types(&stacked), vec!["field", "math", "math"]);

        let plain = insert_condition(
            &[Condition::field("value")],
            cond("math", Category::Math),
            InsertStrategy::Math,
        );
        assert_eq!(types(&plain), vec!["field", "math"]);
    }

    #[test]
    fn test_alias_replaces_trailing_alias() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value")]);

        let next = composer.add_select(&query, 0, "alias").unwrap();
        let next = composer
            .change_select(&next, 0, 1, vec![ParamValue::from("first")])
            .unwrap();
        let next = composer.add_select(&next, 0, "alias").unwrap();

        let chain = &next.select_conditions[0];
        assert_eq!(types(chain), vec!["field", "alias"]);
        assert_eq!(chain[1].params, vec![ParamValue::from("alias")]);
    }

    #[test]
    fn test_add_field_starts_new_chain() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value"), cond("mean", Category::Aggregations)]);

        let next = composer.add_select(&query, 0, "field").unwrap();
        assert_eq!(next.select_conditions.len(), 2);
        assert_eq!(next.select_conditions[0], query.select_conditions[0]);
        assert_eq!(next.select_conditions[1], vec![Condition::field("value")]);
    }

    #[test]
    fn test_add_group_by_operator_to_select_fails() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value")]);

        assert_eq!(
            composer.add_select(&query, 0, "fill"),
            Err(QueryError::NotSelectOperator("fill".to_string()))
        );
        assert!(matches!(
            composer.add_select(&query, 0, "bogus"),
            Err(QueryError::UnknownOperator(_))
        ));
        assert_eq!(
            composer.add_select(&query, 4, "mean"),
            Err(QueryError::ChainIndexOutOfRange { index: 4, len: 1 })
        );
    }

    #[test]
    fn test_remove_select() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = QueryConfig {
            select_conditions: vec![
                vec![Condition::field("value"), cond("count", Category::Aggregations)],
                vec![Condition::field("value2"), cond("count", Category::Aggregations)],
            ],
            ..Default::default()
        };

        let next = composer.remove_select(&query, 0, 1).unwrap();
        assert_eq!(next.select_conditions[0], vec![Condition::field("value")]);

        let next = composer.remove_select(&query, 1, 0).unwrap();
        assert_eq!(next.select_conditions, vec![query.select_conditions[0].clone()]);

        // the last chain survives removal of its field
        let last = composer.remove_select(&next, 0, 0).unwrap();
        assert_eq!(last, next);
    }

    #[test]
    fn test_change_select_keeps_type() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = query_with(vec![Condition::field("value"), cond("count", Category::Aggregations)]);

        let next = composer
            .change_select(&query, 0, 0, vec![ParamValue::from("value2")])
            .unwrap();
        assert_eq!(next.select_conditions[0][0], Condition::field("value2"));
        assert_eq!(
            composer.change_select(&query, 0, 5, Vec::new()),
            Err(QueryError::PartIndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_random_additions_keep_order() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let candidates: Vec<&str> = registry
            .add_menu_options()
            .into_iter()
            .flat_map(|g| g.operators)
            .collect();

        let mut query = query_with(vec![Condition::field("value"), cond("count", Category::Aggregations)]);
        // deterministic pseudo-random walk over the menu
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..200 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let op = candidates[(seed % candidates.len() as u64) as usize];
            query = composer.add_select(&query, 0, op).unwrap();
            assert!(
                is_valid_select(&query.select_conditions[0]),
                "invalid chain after adding {}: {:?}",
                op,
                types(&query.select_conditions[0])
            );
        }
    }

    #[test]
    fn test_validity_checker() {
        assert!(is_valid_select(&[
            Condition::field("value"),
            cond("count", Category::Aggregations),
            cond("derivative", Category::Transformations),
            cond("holt_winters", Category::Predictors),
            cond("math", Category::Math),
            cond("alias", Category::Aliasing),
        ]));
        assert!(!is_valid_select(&[
            Condition::field("value"),
            cond("math", Category::Math),
            cond("holt_winters", Category::Predictors),
        ]));
        assert!(!is_valid_select(&[
            cond("math", Category::Math),
            Condition::field("value"),
        ]));
        assert!(!is_valid_select(&[
            Condition::field("value"),
            cond("alias", Category::Aliasing),
            cond("math", Category::Math),
        ]));
    }

    #[test]
    fn test_group_by_insertion() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = QueryConfig::default();

        let next = composer.add_group_by(&query, "fill(null)");
        assert_eq!(next.groupby_conditions, vec![Condition::group_by("fill", "null")]);

        let next = composer.add_group_by(&next, "tag(location::tag)");
        assert_eq!(
            next.groupby_conditions,
            vec![
                Condition::group_by("tag", "location::tag"),
                Condition::group_by("fill", "null"),
            ]
        );

        let next = composer.add_group_by(&next, "time($__interval)");
        assert_eq!(
            next.groupby_conditions,
            vec![
                Condition::group_by("time", "$__interval"),
                Condition::group_by("tag", "location::tag"),
                Condition::group_by("fill", "null"),
            ]
        );
    }

    #[test]
    fn test_group_by_tag_without_fill_appends() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = QueryConfig {
            groupby_conditions: vec![Condition::group_by("time", "1m")],
            ..Default::default()
        };

        let next = composer.add_group_by(&query, "tag(host)");
        assert_eq!(
            next.groupby_conditions,
            vec![Condition::group_by("time", "1m"), Condition::group_by("tag", "host")]
        );
    }

    #[test]
    fn test_malformed_group_by_is_noop() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = QueryConfig::new("db", "autogen");

        assert_eq!(composer.add_group_by(&query, "time"), query);
        assert_eq!(composer.add_group_by(&query, "tag(host"), query);
    }

    #[test]
    fn test_group_by_remove_and_change() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = QueryConfig {
            groupby_conditions: vec![Condition::group_by("time", "$__interval")],
            ..Default::default()
        };

        let removed = composer.remove_group_by(&query, 0).unwrap();
        assert!(removed.groupby_conditions.is_empty());

        let changed = composer
            .change_group_by(&query, 0, vec![ParamValue::from("1s")])
            .unwrap();
        assert_eq!(changed.groupby_conditions, vec![Condition::group_by("time", "1s")]);

        assert_eq!(
            composer.remove_group_by(&query, 1),
            Err(QueryError::GroupByIndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn test_group_by_options() {
        let registry = OperatorRegistry::builtin();
        let composer = Composer::new(&registry);
        let query = QueryConfig {
            groupby_conditions: vec![Condition::group_by("time", "$__interval")],
            ..Default::default()
        };
        let keys = vec!["location::tag".to_string(), "water_level::field".to_string()];

        assert_eq!(
            composer.group_by_options(&query, &keys),
            vec!["fill(null)", "tag(location::tag)", "tag(water_level::field)"]
        );
    }
}
