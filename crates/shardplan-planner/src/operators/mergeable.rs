use shardplan_ir::{Expr, SelectExpr, SelectStatement};
use shardplan_semantics::Vindex;
use tracing::debug;

use super::Operator;
use super::rewrite::introduced_tables;
use crate::PlanningContext;

/// Whether `query`, planned as `op`, produces the same rows when run on every
/// shard separately as when run once over all data.
///
/// A LIMIT or a UNION always needs a global view. Grouping is safe when one of
/// the grouping columns is a unique single-column vindex, since each group
/// then lives on exactly one shard. Without grouping any aggregation needs
/// all rows in one place.
pub fn is_mergeable(ctx: &PlanningContext, query: &SelectStatement, op: &Operator) -> bool {
    if query.limit().is_some() {
        return false;
    }
    let Some(sel) = query.as_select() else {
        return false;
    };

    if !sel.group_by.is_empty() {
        let mergeable = sel.group_by.iter().any(|gb| {
            find_column_vindex(ctx, op, gb).is_some_and(|vindex| vindex.unique)
        });
        debug!(mergeable, "grouped subquery mergeability");
        return mergeable;
    }

    let aggregates = sel.select_exprs.iter().any(|item| match item {
        SelectExpr::Aliased(ae) => ae.expr.contains_aggregation(),
        SelectExpr::Star(_) => false,
    });
    if aggregates {
        return false;
    }
    !sel.having.as_ref().is_some_and(Expr::contains_aggregation)
}

/// The single-column vindex on the column `expr` ultimately refers to, if
/// that column belongs to a table introduced in `op`.
fn find_column_vindex<'a>(ctx: &'a PlanningContext, op: &Operator, expr: &Expr) -> Option<&'a Vindex> {
    expr.as_column()?;
    let unwrapped = ctx.sem_table.unwrap_derived_tables(expr);
    let col = unwrapped.as_column()?;
    let deps = ctx.sem_table.recursive_deps(&unwrapped);
    if deps.is_empty() {
        return None;
    }

    introduced_tables(op)
        .into_iter()
        .filter(|id| deps.is_solved_by(*id))
        .filter_map(|id| ctx.sem_table.table_info_for(id).ok())
        .flat_map(|info| info.vindexes())
        .find(|vindex| vindex.is_single_column() && vindex.columns[0] == col.name)
}
