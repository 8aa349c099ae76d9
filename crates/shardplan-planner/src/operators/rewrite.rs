use shardplan_common::Result;
use shardplan_semantics::TableSet;

use super::Operator;

/// Pre-order walk over the tree. Stops at the first error.
pub fn visit<F>(op: &Operator, f: &mut F) -> Result<()>
where
    F: FnMut(&Operator) -> Result<()>,
{
    f(op)?;
    for input in op.inputs() {
        visit(input, f)?;
    }
    Ok(())
}

pub fn visit_mut<F>(op: &mut Operator, f: &mut F) -> Result<()>
where
    F: FnMut(&mut Operator) -> Result<()>,
{
    f(op)?;
    for input in op.inputs_mut() {
        visit_mut(input, f)?;
    }
    Ok(())
}

/// Rebuilds the tree from the leaves up, handing every rebuilt node to `f`.
/// The original tree is left untouched.
pub fn bottom_up<F>(op: &Operator, f: &mut F) -> Result<Operator>
where
    F: FnMut(Operator) -> Result<Operator>,
{
    let inputs = op
        .inputs()
        .into_iter()
        .map(|input| bottom_up(input, f))
        .collect::<Result<Vec<_>>>()?;
    f(op.clone_with_inputs(inputs)?)
}

/// Deep copy through [`Operator::clone_with_inputs`].
pub fn clone_tree(op: &Operator) -> Result<Operator> {
    bottom_up(op, &mut Ok)
}

/// Replaces each direct child of `op` with `f` applied to a copy of it.
pub fn rewrite_inputs<F>(op: &mut Operator, mut f: F) -> Result<()>
where
    F: FnMut(Operator) -> Result<Operator>,
{
    let inputs = op
        .inputs()
        .into_iter()
        .map(|input| f(input.clone()))
        .collect::<Result<Vec<_>>>()?;
    op.set_inputs(inputs)
}

/// Tables brought into scope anywhere in the subtree, in pre-order.
pub(crate) fn introduced_tables(op: &Operator) -> Vec<TableSet> {
    let mut tables = Vec::new();
    collect_introduced(op, &mut tables);
    tables
}

fn collect_introduced(op: &Operator, out: &mut Vec<TableSet>) {
    out.extend(op.introduces());
    for input in op.inputs() {
        collect_introduced(input, out);
    }
}

/// All tables the subtree can solve expressions for.
pub fn table_id(op: &Operator) -> TableSet {
    introduced_tables(op)
        .into_iter()
        .fold(TableSet::EMPTY, TableSet::merge)
}
