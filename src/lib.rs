//! shardplan - logical operator tree for a sharded SQL query planner.
//!
//! The planning pipeline is:
//! ```text
//! SelectStatement + SemTable → build_operator → add_predicate / add_column pushdown → Operator
//! ```
//!
//! Derived tables (`FROM (subquery) AS alias`) are planned as [`Derived`]
//! operators that translate outer predicates and column requests into the
//! subquery's own terms before pushing them further down.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shardplan::{PlanDescription, PlannerSettings, plan_query};
//!
//! let op = plan_query(&stmt, Arc::new(sem_table), PlannerSettings::default())?;
//! println!("{}", PlanDescription::from_operator(&op));
//! ```

pub mod config;

use std::sync::Arc;

pub use shardplan_common::{Error, ErrorKind, Result};
pub use shardplan_ir::{
    AggregateFunction, AliasedExpr, BinaryOp, ColName, Expr, Ident, JoinKind, Limit, Literal,
    Order, OrderDirection, Select, SelectExpr, SelectStatement, TableExpr, UnaryOp,
};
pub use shardplan_planner::{
    Derived, Filter, Join, JoinColumn, Op, OpDescription, Operator, OrderExpr, OutputColumn,
    PlanDescription, PlannerSettings, PlanningContext, QueryProjection, Table, Union,
    build_operator, clone_tree, is_mergeable, populate_query_projections,
};
pub use shardplan_semantics::{RealTable, SemTable, SemTableBuilder, TableSet, Vindex};
use tracing::{debug, instrument};

/// Plans `stmt` against `sem_table` and fills in the query projection of every
/// derived table in the result.
#[instrument(skip(stmt, sem_table), fields(tables = sem_table.tables().len()))]
pub fn plan_query(
    stmt: &SelectStatement,
    sem_table: Arc<SemTable>,
    settings: PlannerSettings,
) -> Result<Operator> {
    let ctx = PlanningContext::with_settings(sem_table, settings);
    let mut op = build_operator(&ctx, stmt)?;
    populate_query_projections(&mut op)?;
    debug!(root = %op.description().operator_type, "query planned");
    Ok(op)
}
