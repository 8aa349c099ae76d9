use std::sync::Arc;

use shardplan_common::{Error, Result};
use shardplan_ir::{Ident, JoinKind, Select, SelectStatement, TableExpr};
use shardplan_semantics::TableSet;
use tracing::trace;

use crate::operators::visit_mut;
use crate::{Derived, Join, Operator, PlanningContext, Table, Union};

/// Builds the operator tree for the FROM and WHERE parts of `stmt`.
///
/// Tables and subqueries become leaves and derived tables, comma separated
/// FROM items are cross joined, and each WHERE conjunct is pushed through the
/// root with `add_predicate`.
pub fn build_operator(ctx: &PlanningContext, stmt: &SelectStatement) -> Result<Operator> {
    match stmt {
        SelectStatement::Select(sel) => build_select(ctx, sel),
        SelectStatement::Union(union) => {
            let selects = stmt.selects();
            let sources = selects
                .iter()
                .map(|sel| build_select(ctx, sel))
                .collect::<Result<Vec<_>>>()?;
            let selects = selects.into_iter().cloned().collect();
            Ok(Union::new(sources, selects, union.distinct).into())
        }
    }
}

fn build_select(ctx: &PlanningContext, sel: &Select) -> Result<Operator> {
    let mut from = sel.from.iter();
    let first = from
        .next()
        .ok_or_else(|| Error::unsupported("SELECT without a FROM clause"))?;

    let mut op = build_table_expr(ctx, first)?;
    for table_expr in from {
        let rhs = build_table_expr(ctx, table_expr)?;
        op = Join::new(op, rhs, false).into();
    }

    if let Some(predicate) = &sel.where_clause {
        for conjunct in predicate.split_and() {
            op = op.add_predicate(ctx, conjunct)?;
        }
    }
    Ok(op)
}

fn table_set_for(ctx: &PlanningContext, alias: &Ident) -> Result<TableSet> {
    ctx.sem_table
        .table_set_for_alias(alias)
        .ok_or_else(|| Error::table_not_found(alias.to_string()))
}

fn build_table_expr(ctx: &PlanningContext, table_expr: &TableExpr) -> Result<Operator> {
    match table_expr {
        TableExpr::Table { name, alias } => {
            let visible = alias.as_ref().unwrap_or(name);
            let mut table = Table::new(table_set_for(ctx, visible)?, name.clone());
            table.alias = alias.clone();
            trace!(table = %name, "built table");
            Ok(table.into())
        }
        TableExpr::Derived {
            subquery,
            alias,
            column_aliases,
        } => {
            let table_id = table_set_for(ctx, alias)?;
            let source = build_operator(ctx, subquery)?;
            trace!(alias = %alias, "built derived table");
            Ok(
                Derived::new(source, table_id, Arc::clone(subquery), alias.clone())
                    .with_column_aliases(column_aliases.clone())
                    .into(),
            )
        }
        TableExpr::Join {
            left,
            right,
            kind,
            on,
        } => {
            let lhs = build_table_expr(ctx, left)?;
            let rhs = build_table_expr(ctx, right)?;
            match kind {
                JoinKind::Inner => {
                    let mut op: Operator = Join::new(lhs, rhs, false).into();
                    if let Some(on) = on {
                        for conjunct in on.split_and() {
                            op = op.add_predicate(ctx, conjunct)?;
                        }
                    }
                    Ok(op)
                }
                JoinKind::Left => {
                    let mut join = Join::new(lhs, rhs, true);
                    if let Some(on) = on {
                        join.add_join_predicate(on.clone());
                    }
                    Ok(join.into())
                }
            }
        }
    }
}

/// Computes the query projection of every derived table in the tree. Derived
/// tables over a UNION have none and are skipped.
pub fn populate_query_projections(op: &mut Operator) -> Result<()> {
    visit_mut(op, &mut |node| {
        if let Some(derived) = node.as_derived_mut() {
            if !derived.query.is_union() {
                derived.get_qp()?;
            }
        }
        Ok(())
    })
}
