use std::borrow::Cow;

use shardplan_ir::{AliasedExpr, ColName, Expr};

use crate::PlanningContext;

/// Position of the first entry of `columns` that is semantically the same
/// expression as `col`. Works for any column list as long as `f` can view an
/// entry as an expression.
pub fn can_reuse_column<T, F>(
    ctx: &PlanningContext,
    columns: &[T],
    col: &Expr,
    f: F,
) -> Option<usize>
where
    F: Fn(&T) -> Cow<'_, Expr>,
{
    columns
        .iter()
        .position(|column| ctx.sem_table.equals_expr_with_deps(col, &f(column)))
}

/// A bare, unqualified reference to `col`'s name, as handed down to a
/// subquery that exposes it only through `*`.
pub(crate) fn ae_wrap(col: &ColName) -> AliasedExpr {
    AliasedExpr::new(Expr::Column(ColName::new(col.name.clone())))
}
