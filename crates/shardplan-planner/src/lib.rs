//! Logical operator tree for a sharded SQL planner.
//!
//! Outer operators push work into inner ones through [`Operator::add_predicate`]
//! and [`Operator::add_column`]. Each node either absorbs the request, forwards
//! it to its children, or refuses it by wrapping itself in a [`Filter`]. Both
//! calls return the (possibly new) root of the subtree they were called on.

mod builder;
mod context;
mod explain;
mod operators;
#[cfg(test)]
mod test_utils;

pub use builder::{build_operator, populate_query_projections};
pub use context::PlanningContext;
pub use explain::PlanDescription;
pub use operators::{
    Derived, Filter, GroupBy, Join, JoinColumn, Op, OpDescription, Operator, OrderExpr,
    OutputColumn, ProjectedExpr, QueryProjection, Table, Union, bottom_up, can_reuse_column,
    clone_tree, is_mergeable, rewrite_inputs, table_id, visit, visit_mut,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Push predicates through derived table boundaries into the subquery.
    pub derived_predicate_pushdown: bool,
    /// Push predicates into the side of a join that solves them.
    pub join_predicate_pushdown: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl PlannerSettings {
    pub fn all_enabled() -> Self {
        Self {
            derived_predicate_pushdown: true,
            join_predicate_pushdown: true,
        }
    }

    pub fn all_disabled() -> Self {
        Self {
            derived_predicate_pushdown: false,
            join_predicate_pushdown: false,
        }
    }
}
