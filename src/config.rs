//! Loading [`PlannerSettings`] from TOML with environment overrides.
//!
//! ```toml
//! derived_predicate_pushdown = true
//! join_predicate_pushdown = false
//! ```
//!
//! Missing keys keep their defaults. `SHARDPLAN_DERIVED_PREDICATE_PUSHDOWN`
//! and `SHARDPLAN_JOIN_PREDICATE_PUSHDOWN` take precedence over the file.

use std::path::Path;

use shardplan_common::{Error, Result};
use shardplan_planner::PlannerSettings;
use tracing::debug;

pub const DERIVED_PREDICATE_PUSHDOWN_ENV: &str = "SHARDPLAN_DERIVED_PREDICATE_PUSHDOWN";
pub const JOIN_PREDICATE_PUSHDOWN_ENV: &str = "SHARDPLAN_JOIN_PREDICATE_PUSHDOWN";

pub fn settings_from_toml(text: &str) -> Result<PlannerSettings> {
    toml::from_str(text).map_err(|e| Error::config(format!("invalid planner settings: {}", e)))
}

pub fn settings_from_file(path: impl AsRef<Path>) -> Result<PlannerSettings> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("read {}: {}", path.display(), e)))?;
    settings_from_toml(&text)
}

/// Applies overrides from the process environment.
pub fn apply_env_overrides(settings: PlannerSettings) -> Result<PlannerSettings> {
    apply_overrides(settings, |key| std::env::var(key).ok())
}

/// Applies overrides read through `lookup`, which returns the raw value of a
/// variable if it is set.
pub fn apply_overrides<F>(mut settings: PlannerSettings, lookup: F) -> Result<PlannerSettings>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(DERIVED_PREDICATE_PUSHDOWN_ENV) {
        settings.derived_predicate_pushdown = parse_flag(DERIVED_PREDICATE_PUSHDOWN_ENV, &raw)?;
    }
    if let Some(raw) = lookup(JOIN_PREDICATE_PUSHDOWN_ENV) {
        settings.join_predicate_pushdown = parse_flag(JOIN_PREDICATE_PUSHDOWN_ENV, &raw)?;
    }
    debug!(
        derived_predicate_pushdown = settings.derived_predicate_pushdown,
        join_predicate_pushdown = settings.join_predicate_pushdown,
        "planner settings resolved"
    );
    Ok(settings)
}

/// Reads `path` if given, otherwise starts from the defaults, then applies
/// environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<PlannerSettings> {
    let settings = match path {
        Some(path) => settings_from_file(path)?,
        None => PlannerSettings::default(),
    };
    apply_env_overrides(settings)
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Ok(false)
    } else {
        Err(Error::config(format!(
            "{} must be true, false, 1 or 0, got '{}'",
            key, raw
        )))
    }
}
