use shardplan::{Expr, JoinKind, PlannerSettings, Select, SelectExpr, TableExpr};

use crate::assert_plan;
use crate::common::{plan, plan_with, users_query};

fn users_and_music() -> Select {
    Select::new(vec![SelectExpr::star()])
        .from_table(TableExpr::derived(users_query(), "users_dt"))
        .from_table(TableExpr::table("music"))
}

#[test]
fn test_conjuncts_are_routed_to_their_side() {
    let stmt = users_and_music().with_where(Expr::and(
        Expr::and(
            Expr::eq(
                Expr::qualified_column("users_dt", "uid"),
                Expr::qualified_column("music", "user_id"),
            ),
            Expr::eq(Expr::qualified_column("music", "title"), Expr::string("x")),
        ),
        Expr::eq(Expr::qualified_column("users_dt", "name"), Expr::string("bob")),
    ));
    let op = plan(stmt).unwrap();

    assert_plan!(
        op,
        "
Join users_dt.uid = music.user_id
  Derived users_dt
    Table user as u
  Table music
"
    );
    let join = op.as_join().unwrap();
    let user = join.lhs.as_derived().unwrap().source().as_table().unwrap();
    assert_eq!(
        user.predicates,
        vec![Expr::eq(Expr::qualified_column("u", "name"), Expr::string("bob"))]
    );
    assert_eq!(
        join.rhs.as_table().unwrap().predicates,
        vec![Expr::eq(Expr::qualified_column("music", "title"), Expr::string("x"))]
    );
}

#[test]
fn test_left_join_inner_side_is_filtered_above() {
    let on = Expr::eq(
        Expr::qualified_column("users_dt", "uid"),
        Expr::qualified_column("music", "user_id"),
    );
    let predicate = Expr::eq(Expr::qualified_column("music", "title"), Expr::string("x"));
    let stmt = Select::new(vec![SelectExpr::star()])
        .from_table(TableExpr::Join {
            left: Box::new(TableExpr::derived(users_query(), "users_dt")),
            right: Box::new(TableExpr::table("music")),
            kind: JoinKind::Left,
            on: Some(on.clone()),
        })
        .with_where(predicate.clone());
    let op = plan(stmt).unwrap();

    let filter = op.as_filter().unwrap();
    assert_eq!(filter.predicates, vec![predicate]);
    let join = filter.source.as_join().unwrap();
    assert!(join.left_join);
    assert_eq!(join.predicate, Some(on));
    assert!(join.rhs.as_table().unwrap().predicates.is_empty());
}

#[test]
fn test_disabled_join_pushdown_filters_everything() {
    let stmt = users_and_music().with_where(Expr::eq(
        Expr::qualified_column("music", "title"),
        Expr::string("x"),
    ));
    let op = plan_with(stmt, PlannerSettings::all_disabled()).unwrap();

    let join = op.as_filter().unwrap().source.as_join().unwrap();
    assert!(join.predicate.is_none());
    assert!(join.rhs.as_table().unwrap().predicates.is_empty());
}
