//! Built-in operator catalog
//!
//! Fields, aggregations, selectors, transformations, predictors, math and
//! aliasing for select chains, plus the group-by-only `time`, `fill` and `tag`.

use super::param::{ParamKind, ParamSpec};
use super::render::Renderer;
use super::{Category, InsertStrategy, Operator};

const INTERVALS: [&str; 7] = ["1s", "10s", "1m", "5m", "10m", "15m", "1h"];

/// Every built-in operator, in registration order
pub(super) fn builtin_operators() -> Vec<Operator> {
    let mut ops = vec![Operator::new(
        "field",
        Category::Fields,
        Renderer::Field,
        Some(InsertStrategy::Field),
    )
    .param(ParamSpec::new("field", ParamKind::DynamicLookup))
    .defaults(["value"])];

    for name in ["count", "distinct", "integral", "mean", "median", "mode", "sum"] {
        ops.push(function(name, Category::Aggregations, InsertStrategy::Aggregation));
    }

    ops.push(
        function("derivative", Category::Transformations, InsertStrategy::Transformation)
            .param(ParamSpec::new("duration", ParamKind::Interval).with_options(INTERVALS))
            .defaults(["10s"]),
    );
    ops.push(function("spread", Category::Transformations, InsertStrategy::Transformation));
    ops.push(
        function(
            "non_negative_derivative",
            Category::Transformations,
            InsertStrategy::Transformation,
        )
        .param(ParamSpec::new("duration", ParamKind::Interval).with_options(INTERVALS))
        .defaults(["10s"]),
    );
    for name in ["difference", "non_negative_difference"] {
        ops.push(function(name, Category::Transformations, InsertStrategy::Transformation));
    }
    ops.push(
        function("moving_average", Category::Transformations, InsertStrategy::Transformation)
            .param(ParamSpec::new("window", ParamKind::Int).with_options([5_i64, 10, 20, 30, 40]))
            .defaults([10_i64]),
    );
    for name in ["cumulative_sum", "stddev"] {
        ops.push(function(name, Category::Transformations, InsertStrategy::Transformation));
    }
    ops.push(
        function("elapsed", Category::Transformations, InsertStrategy::Transformation)
            .param(ParamSpec::new("duration", ParamKind::Interval).with_options(INTERVALS))
            .defaults(["10s"]),
    );

    for name in ["holt_winters", "holt_winters_with_fit"] {
        ops.push(
            function(name, Category::Predictors, InsertStrategy::Transformation)
                .param(ParamSpec::new("number", ParamKind::Int).with_options([5_i64, 10, 20, 30, 40]))
                .param(ParamSpec::new("season", ParamKind::Int).with_options([0_i64, 1, 2, 5, 10]))
                .defaults([10_i64, 2]),
        );
    }

    ops.push(
        function("bottom", Category::Selectors, InsertStrategy::Aggregation)
            .param(ParamSpec::new("count", ParamKind::Int))
            .defaults([3_i64]),
    );
    for name in ["first", "last", "max", "min"] {
        ops.push(function(name, Category::Selectors, InsertStrategy::Aggregation));
    }
    ops.push(
        function("percentile", Category::Selectors, InsertStrategy::Aggregation)
            .param(ParamSpec::new("nth", ParamKind::Int))
            .defaults([95_i64]),
    );
    ops.push(
        function("top", Category::Selectors, InsertStrategy::Aggregation)
            .param(ParamSpec::new("count", ParamKind::Int))
            .defaults([3_i64]),
    );

    ops.push(
        Operator::new("time", Category::GroupBy, Renderer::Function, None)
            .param(
                ParamSpec::new("interval", ParamKind::Interval).with_options(
                    std::iter::once("$__interval").chain(INTERVALS.iter().copied()),
                ),
            )
            .defaults(["$__interval"]),
    );
    ops.push(
        Operator::new("fill", Category::GroupBy, Renderer::Function, None)
            .param(
                ParamSpec::new("fill", ParamKind::String)
                    .with_options(["none", "null", "0", "previous", "linear"]),
            )
            .defaults(["null"]),
    );
    ops.push(
        Operator::new("tag", Category::GroupBy, Renderer::Field, None)
            .param(ParamSpec::new("tag", ParamKind::DynamicLookup))
            .defaults(["tag"]),
    );

    ops.push(
        Operator::new("math", Category::Math, Renderer::Suffix, Some(InsertStrategy::Math))
            .param(ParamSpec::new("expr", ParamKind::String))
            .defaults(["/ 100"]),
    );
    ops.push(
        Operator::new(
            "alias",
            Category::Aliasing,
            Renderer::Alias,
            Some(InsertStrategy::Alias),
        )
        .param(ParamSpec::new("name", ParamKind::String))
        .defaults(["alias"]),
    );

    ops
}

fn function(name: &'static str, category: Category, strategy: InsertStrategy) -> Operator {
    Operator::new(name, category, Renderer::Function, Some(strategy))
}
