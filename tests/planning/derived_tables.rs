use shardplan::{
    AggregateFunction, AliasedExpr, Error, ErrorKind, Expr, PlannerSettings, TableExpr,
};

use crate::assert_plan;
use crate::common::{
    by_id_query, context, limited_query, per_user_query, plan, plan_with, select_star_from,
    users_query,
};

#[test]
fn test_where_on_derived_column_reaches_the_table() {
    let stmt = select_star_from(TableExpr::derived(users_query(), "users_dt"))
        .with_where(Expr::eq(Expr::qualified_column("users_dt", "uid"), Expr::int(5)));
    let op = plan(stmt).unwrap();

    assert_plan!(
        op,
        "
Derived users_dt
  Table user as u
"
    );
    let table = op.as_derived().unwrap().source().as_table().unwrap();
    assert_eq!(
        table.predicates,
        vec![Expr::eq(Expr::qualified_column("u", "id"), Expr::int(5))]
    );
}

#[test]
fn test_column_aliases_rename_the_output() {
    let stmt = select_star_from(TableExpr::Derived {
        subquery: users_query(),
        alias: "renamed".into(),
        column_aliases: vec!["k".into(), "n".into()],
    })
    .with_where(Expr::eq(Expr::qualified_column("renamed", "n"), Expr::string("x")));
    let op = plan(stmt).unwrap();

    let table = op.as_derived().unwrap().source().as_table().unwrap();
    assert_eq!(
        table.predicates,
        vec![Expr::eq(Expr::qualified_column("u", "name"), Expr::string("x"))]
    );
}

#[test]
fn test_aggregate_predicate_stays_above_the_subquery() {
    let predicate = Expr::gt(Expr::qualified_column("per_user", "cnt"), Expr::int(1));
    let stmt = select_star_from(TableExpr::derived(per_user_query(), "per_user"))
        .with_where(predicate.clone());
    let op = plan(stmt).unwrap();

    assert_plan!(
        op,
        "
Filter per_user.cnt > 1
  Derived per_user
    Table music
"
    );
    assert_eq!(op.as_filter().unwrap().predicates, vec![predicate]);
}

#[test]
fn test_grouping_column_predicate_is_pushed() {
    let stmt = select_star_from(TableExpr::derived(per_user_query(), "per_user"))
        .with_where(Expr::eq(Expr::qualified_column("per_user", "user_id"), Expr::int(3)));
    let op = plan(stmt).unwrap();

    let table = op.as_derived().unwrap().source().as_table().unwrap();
    assert_eq!(
        table.predicates,
        vec![Expr::eq(Expr::qualified_column("music", "user_id"), Expr::int(3))]
    );
}

#[test]
fn test_disabled_pushdown_keeps_filter_on_top() {
    let stmt = select_star_from(TableExpr::derived(users_query(), "users_dt"))
        .with_where(Expr::eq(Expr::qualified_column("users_dt", "uid"), Expr::int(5)));
    let op = plan_with(stmt, PlannerSettings::all_disabled()).unwrap();

    assert_plan!(
        op,
        "
Filter users_dt.uid = 5
  Derived users_dt
    Table user as u
"
    );
}

#[test]
fn test_query_projection_is_populated() {
    let op = plan(select_star_from(TableExpr::derived(per_user_query(), "per_user"))).unwrap();
    let qp = op.as_derived().unwrap().qp().unwrap();

    assert!(qp.has_aggr);
    assert!(!qp.has_star);
    assert_eq!(qp.grouping.len(), 1);
    assert!(!qp.can_push_down_sorting());
    assert!(qp.select_exprs[1].aggr);
}

#[test]
fn test_column_requests_are_reused() {
    let ctx = context();
    let op = plan(select_star_from(TableExpr::derived(users_query(), "users_dt"))).unwrap();

    let request = |name: &str| AliasedExpr::new(Expr::qualified_column("users_dt", name));
    let (op, uid) = op.add_column(&ctx, request("uid"), true, false).unwrap();
    let (op, name) = op.add_column(&ctx, request("name"), true, false).unwrap();
    let (op, again) = op.add_column(&ctx, request("uid"), true, false).unwrap();

    assert_eq!((uid, name, again), (0, 1, 0));
    let dt = op.as_derived().unwrap();
    assert_eq!(dt.columns().len(), 2);
    assert_eq!(dt.source().as_table().unwrap().columns.len(), 2);
}

#[test]
fn test_unknown_column_is_reported() {
    let ctx = context();
    let op = plan(select_star_from(TableExpr::derived(users_query(), "users_dt"))).unwrap();

    let err = op
        .add_column(
            &ctx,
            AliasedExpr::new(Expr::qualified_column("users_dt", "nope")),
            true,
            false,
        )
        .unwrap_err();
    assert_eq!(err, Error::unknown_column("nope", "field list"));
    assert_eq!(err.kind(), ErrorKind::InvalidQuery);
}

#[test]
fn test_non_column_request_is_an_internal_error() {
    let ctx = context();
    let op = plan(select_star_from(TableExpr::derived(users_query(), "users_dt"))).unwrap();

    let err = op
        .add_column(
            &ctx,
            AliasedExpr::new(Expr::aggregate(
                AggregateFunction::Count,
                Expr::qualified_column("users_dt", "uid"),
            )),
            true,
            false,
        )
        .unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn test_mergeability() {
    let ctx = context();
    let mergeable = |query, alias: &str| {
        let op = plan(select_star_from(TableExpr::derived(query, alias))).unwrap();
        op.as_derived().unwrap().is_mergeable(&ctx)
    };

    assert!(mergeable(users_query(), "users_dt"));
    assert!(mergeable(by_id_query(), "by_id"));
    assert!(!mergeable(per_user_query(), "per_user"));
    assert!(!mergeable(limited_query(), "limited"));
}
