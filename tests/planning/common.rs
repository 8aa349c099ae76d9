use std::sync::Arc;

use shardplan::{
    AggregateFunction, Expr, Operator, PlanDescription, PlannerSettings, PlanningContext, RealTable,
    Result, Select, SelectExpr, SelectStatement, SemTable, TableExpr, Vindex, plan_query,
};

/// `select u.id as uid, u.name from user as u`
pub fn users_query() -> Arc<SelectStatement> {
    Select::new(vec![
        SelectExpr::aliased(Expr::qualified_column("u", "id"), "uid"),
        SelectExpr::expr(Expr::qualified_column("u", "name")),
    ])
    .from_table(TableExpr::aliased_table("user", "u"))
    .into_statement()
}

/// `select music.user_id, count(music.id) as cnt from music group by music.user_id`
pub fn per_user_query() -> Arc<SelectStatement> {
    Select::new(vec![
        SelectExpr::expr(Expr::qualified_column("music", "user_id")),
        SelectExpr::aliased(
            Expr::aggregate(AggregateFunction::Count, Expr::qualified_column("music", "id")),
            "cnt",
        ),
    ])
    .from_table(TableExpr::table("music"))
    .with_group_by(vec![Expr::qualified_column("music", "user_id")])
    .into_statement()
}

/// `select u.id, count(u.name) as names from user as u group by u.id`
pub fn by_id_query() -> Arc<SelectStatement> {
    Select::new(vec![
        SelectExpr::expr(Expr::qualified_column("u", "id")),
        SelectExpr::aliased(
            Expr::aggregate(AggregateFunction::Count, Expr::qualified_column("u", "name")),
            "names",
        ),
    ])
    .from_table(TableExpr::aliased_table("user", "u"))
    .with_group_by(vec![Expr::qualified_column("u", "id")])
    .into_statement()
}

/// `select music.id, music.title from music limit 10`
pub fn limited_query() -> Arc<SelectStatement> {
    Select::new(vec![
        SelectExpr::expr(Expr::qualified_column("music", "id")),
        SelectExpr::expr(Expr::qualified_column("music", "title")),
    ])
    .from_table(TableExpr::table("music"))
    .with_limit(10)
    .into_statement()
}

/// `select u.id as uid from user as u union all select music.user_id from music`
pub fn union_query() -> Arc<SelectStatement> {
    let first = Select::new(vec![SelectExpr::aliased(Expr::qualified_column("u", "id"), "uid")])
        .from_table(TableExpr::aliased_table("user", "u"));
    let second = Select::new(vec![SelectExpr::expr(Expr::qualified_column(
        "music", "user_id",
    ))])
    .from_table(TableExpr::table("music"));
    Arc::new(SelectStatement::union(
        SelectStatement::Select(first),
        SelectStatement::Select(second),
        false,
    ))
}

pub fn sem_table() -> Arc<SemTable> {
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
        .add_derived_table("users_dt", &[], &users_query())
        .unwrap();
    builder
        .add_derived_table("renamed", &["k".into(), "n".into()], &users_query())
        .unwrap();
    builder
        .add_derived_table("per_user", &[], &per_user_query())
        .unwrap();
    builder
        .add_derived_table("by_id", &[], &by_id_query())
        .unwrap();
    builder
        .add_derived_table("limited", &[], &limited_query())
        .unwrap();
    builder
        .add_derived_table("union_dt", &[], &union_query())
        .unwrap();
    Arc::new(builder.build())
}

pub fn context() -> PlanningContext {
    PlanningContext::new(sem_table())
}

pub fn plan(stmt: Select) -> Result<Operator> {
    plan_with(stmt, PlannerSettings::default())
}

pub fn plan_with(stmt: Select, settings: PlannerSettings) -> Result<Operator> {
    plan_query(&SelectStatement::Select(stmt), sem_table(), settings)
}

pub fn select_star_from(table: TableExpr) -> Select {
    Select::new(vec![SelectExpr::star()]).from_table(table)
}

pub fn render(op: &Operator) -> String {
    PlanDescription::from_operator(op).to_string()
}

#[macro_export]
macro_rules! assert_plan {
    ($op:expr, $expected:expr) => {{
        let actual = $crate::common::render(&$op);
        assert_eq!(
            actual.trim(),
            $expected.trim(),
            "plan mismatch\nactual:\n{}",
            actual
        );
    }};
}
