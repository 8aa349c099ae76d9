use std::sync::Arc;

use shardplan_ir::{
    AggregateFunction, BinaryOp, Expr, Order, Select, SelectExpr, SelectStatement, TableExpr,
};
use shardplan_semantics::{RealTable, SemTable, TableSet, Vindex};

use crate::{Derived, PlannerSettings, PlanningContext, Table, Union};

/// `select t.a as b, t.x from t`
pub(crate) fn simple_query() -> Arc<SelectStatement> {
    Select::new(vec![
        SelectExpr::aliased(Expr::qualified_column("t", "a"), "b"),
        SelectExpr::expr(Expr::qualified_column("t", "x")),
    ])
    .from_table(TableExpr::table("t"))
    .into_statement()
}

/// `select t.a, count(t.x) as cnt, max(t.x) as mx from t group by t.a order by t.a asc`
pub(crate) fn aggregate_query() -> Arc<SelectStatement> {
    Select::new(vec![
        SelectExpr::expr(Expr::qualified_column("t", "a")),
        SelectExpr::aliased(
            Expr::aggregate(AggregateFunction::Count, Expr::qualified_column("t", "x")),
            "cnt",
        ),
        SelectExpr::aliased(
            Expr::aggregate(AggregateFunction::Max, Expr::qualified_column("t", "x")),
            "mx",
        ),
    ])
    .from_table(TableExpr::table("t"))
    .with_group_by(vec![Expr::qualified_column("t", "a")])
    .with_order_by(vec![Order::asc(Expr::qualified_column("t", "a"))])
    .into_statement()
}

/// `select *, sum(t.x) as total from t`
pub(crate) fn star_query() -> Arc<SelectStatement> {
    Select::new(vec![
        SelectExpr::star(),
        SelectExpr::aliased(
            Expr::aggregate(AggregateFunction::Sum, Expr::qualified_column("t", "x")),
            "total",
        ),
    ])
    .from_table(TableExpr::table("t"))
    .into_statement()
}

/// `select t.a + 1 from t`
pub(crate) fn complex_query() -> Arc<SelectStatement> {
    Select::new(vec![SelectExpr::expr(Expr::binary(
        Expr::qualified_column("t", "a"),
        BinaryOp::Plus,
        Expr::int(1),
    ))])
    .from_table(TableExpr::table("t"))
    .into_statement()
}

/// `select * from (select t.a as b, t.x from t) as dt`
pub(crate) fn nested_query() -> Arc<SelectStatement> {
    Select::new(vec![SelectExpr::star()])
        .from_table(TableExpr::derived(simple_query(), "dt"))
        .into_statement()
}

pub(crate) fn union_branches() -> (Select, Select) {
    (
        Select::new(vec![SelectExpr::aliased(
            Expr::qualified_column("u", "id"),
            "uid",
        )])
        .from_table(TableExpr::aliased_table("user", "u")),
        Select::new(vec![SelectExpr::expr(Expr::qualified_column(
            "music", "user_id",
        ))])
        .from_table(TableExpr::table("music")),
    )
}

/// `select u.id as uid from user as u union all select music.user_id from music`
pub(crate) fn union_query() -> Arc<SelectStatement> {
    let (first, second) = union_branches();
    Arc::new(SelectStatement::union(
        SelectStatement::Select(first),
        SelectStatement::Select(second),
        false,
    ))
}

/// Semantic context with three sharded tables and one derived table per
/// query fixture above:
///
/// | alias        | kind    | columns                 | vindexes                         |
/// |--------------|---------|-------------------------|----------------------------------|
/// | `u`          | user    | id, name                | unique `id`                      |
/// | `music`      | music   | id, user_id, title      | unique `id`, non-unique `user_id`|
/// | `t`          | t       | a, x, y, z              | unique `a`                       |
/// | `dt`         | derived | [`simple_query`]        |                                  |
/// | `agg`        | derived | [`aggregate_query`]     |                                  |
/// | `star_dt`    | derived | [`star_query`]          |                                  |
/// | `complex_dt` | derived | [`complex_query`]       |                                  |
/// | `union_dt`   | derived | [`union_query`]         |                                  |
/// | `outer_dt`   | derived | [`nested_query`]        |                                  |
pub(crate) fn sem_table() -> SemTable {
    let mut builder = SemTable::builder();
    builder
        .add_real_table(
            RealTable::new("user")
                .with_alias("u")
                .with_columns(["id", "name"])
                .with_vindex(Vindex::unique("user_index", "id")),
        )
        .unwrap();
    builder
        .add_real_table(
            RealTable::new("music")
                .with_columns(["id", "user_id", "title"])
                .with_vindex(Vindex::unique("music_index", "id"))
                .with_vindex(Vindex::non_unique("user_lookup", "user_id")),
        )
        .unwrap();
    builder
        .add_real_table(
            RealTable::new("t")
                .with_columns(["a", "x", "y", "z"])
                .with_vindex(Vindex::unique("t_index", "a")),
        )
        .unwrap();
    builder
        .add_derived_table("dt", &[], &simple_query())
        .unwrap();
    builder
        .add_derived_table("agg", &[], &aggregate_query())
        .unwrap();
    builder
        .add_derived_table("star_dt", &[], &star_query())
        .unwrap();
    builder
        .add_derived_table("complex_dt", &[], &complex_query())
        .unwrap();
    builder
        .add_derived_table("union_dt", &[], &union_query())
        .unwrap();
    builder
        .add_derived_table("outer_dt", &[], &nested_query())
        .unwrap();
    builder.build()
}

pub(crate) fn user_music_context() -> PlanningContext {
    user_music_context_with(PlannerSettings::default())
}

pub(crate) fn user_music_context_with(settings: PlannerSettings) -> PlanningContext {
    PlanningContext::with_settings(Arc::new(sem_table()), settings)
}

pub(crate) fn table_set(ctx: &PlanningContext, alias: &str) -> TableSet {
    ctx.sem_table
        .table_set_for_alias(&alias.into())
        .unwrap_or_else(|| panic!("no table {} in fixture", alias))
}

pub(crate) fn user_table(ctx: &PlanningContext) -> Table {
    Table::new(table_set(ctx, "u"), "user").with_alias("u")
}

pub(crate) fn music_table(ctx: &PlanningContext) -> Table {
    Table::new(table_set(ctx, "music"), "music")
}

pub(crate) fn t_table(ctx: &PlanningContext) -> Table {
    Table::new(table_set(ctx, "t"), "t")
}

fn derived_over_t(ctx: &PlanningContext, alias: &str, query: Arc<SelectStatement>) -> Derived {
    Derived::new(t_table(ctx).into(), table_set(ctx, alias), query, alias)
}

pub(crate) fn simple_derived(ctx: &PlanningContext) -> Derived {
    derived_over_t(ctx, "dt", simple_query())
}

pub(crate) fn aggregate_derived(ctx: &PlanningContext) -> Derived {
    derived_over_t(ctx, "agg", aggregate_query())
}

pub(crate) fn star_derived(ctx: &PlanningContext) -> Derived {
    derived_over_t(ctx, "star_dt", star_query())
}

pub(crate) fn complex_derived(ctx: &PlanningContext) -> Derived {
    derived_over_t(ctx, "complex_dt", complex_query())
}

pub(crate) fn union_derived(ctx: &PlanningContext) -> Derived {
    let (first, second) = union_branches();
    let union = Union::new(
        vec![user_table(ctx).into(), music_table(ctx).into()],
        vec![first, second],
        false,
    );
    Derived::new(
        union.into(),
        table_set(ctx, "union_dt"),
        union_query(),
        "union_dt",
    )
}

/// Compares the indented text rendering of a plan with `expected`, ignoring
/// surrounding blank lines.
macro_rules! assert_plan {
    ($op:expr, $expected:expr) => {{
        let actual = $crate::PlanDescription::from_operator(&$op).to_string();
        assert_eq!(
            actual.trim(),
            $expected.trim(),
            "plan mismatch\nactual:\n{}",
            actual
        );
    }};
}

pub(crate) use assert_plan;
