use shardplan::{Expr, ErrorKind, TableExpr};

use crate::assert_plan;
use crate::common::{plan, select_star_from, union_query};

#[test]
fn test_predicate_is_rewritten_for_every_branch() {
    let stmt = select_star_from(TableExpr::derived(union_query(), "union_dt"))
        .with_where(Expr::eq(Expr::qualified_column("union_dt", "uid"), Expr::int(7)));
    let op = plan(stmt).unwrap();

    assert_plan!(
        op,
        "
Derived union_dt
  Union
    Table user as u
    Table music
"
    );
    let dt = op.as_derived().unwrap();
    assert!(dt.qp().is_none());
    let union = dt.source().as_union().unwrap();
    assert_eq!(
        union.sources[0].as_table().unwrap().predicates,
        vec![Expr::eq(Expr::qualified_column("u", "id"), Expr::int(7))]
    );
    assert_eq!(
        union.sources[1].as_table().unwrap().predicates,
        vec![Expr::eq(Expr::qualified_column("music", "user_id"), Expr::int(7))]
    );
}

#[test]
fn test_union_subquery_has_no_projection() {
    let op = plan(select_star_from(TableExpr::derived(union_query(), "union_dt"))).unwrap();
    let mut dt = op.as_derived().unwrap().clone();

    let err = dt.get_qp().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert!(!dt.is_mergeable(&crate::common::context()));
}
