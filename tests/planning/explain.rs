use shardplan::{Expr, PlanDescription, TableExpr};

use crate::common::{plan, select_star_from, users_query};

#[test]
fn test_plan_serializes_to_json() {
    let stmt = select_star_from(TableExpr::derived(users_query(), "users_dt"))
        .from_table(TableExpr::table("music"))
        .with_where(Expr::eq(
            Expr::qualified_column("users_dt", "uid"),
            Expr::qualified_column("music", "user_id"),
        ));
    let op = plan(stmt).unwrap();
    let json = PlanDescription::from_operator(&op).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["operator_type"], "Join");
    assert_eq!(value["label"], "users_dt.uid = music.user_id");
    assert_eq!(value["inputs"][0]["operator_type"], "Derived");
    assert_eq!(value["inputs"][0]["label"], "users_dt");
    assert_eq!(value["inputs"][0]["inputs"][0]["label"], "user as u");
    assert_eq!(value["inputs"][1]["label"], "music");
}
