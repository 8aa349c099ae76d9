use std::io::Write;

use shardplan::config::{apply_overrides, load_settings, settings_from_file, settings_from_toml};
use shardplan::{Expr, PlannerSettings, TableExpr};

use crate::common::{plan_with, select_star_from, users_query};

#[test]
fn test_settings_file_controls_pushdown() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "derived_predicate_pushdown = false").unwrap();
    let settings = apply_overrides(settings_from_file(file.path()).unwrap(), |_| None).unwrap();

    let stmt = select_star_from(TableExpr::derived(users_query(), "users_dt"))
        .with_where(Expr::eq(Expr::qualified_column("users_dt", "uid"), Expr::int(5)));
    let op = plan_with(stmt, settings).unwrap();
    assert!(op.as_filter().is_some());
}

#[test]
fn test_missing_file_is_a_config_error() {
    let err = load_settings(Some(std::path::Path::new("/nonexistent/shardplan.toml")))
        .unwrap_err();
    assert_eq!(err.kind(), shardplan::ErrorKind::Config);
}

#[test]
fn test_defaults_enable_everything() {
    assert_eq!(settings_from_toml("").unwrap(), PlannerSettings::all_enabled());
}
