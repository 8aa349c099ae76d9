use rustc_hash::FxHashMap;
use shardplan_common::{Error, Result};
use shardplan_ir::{AliasedExpr, Expr, Ident, Select, SelectExpr};
use tracing::debug;

use super::{Op, OpDescription, Operator, OrderExpr};
use crate::PlanningContext;

/// UNION of several SELECT branches. `selects[i]` is the select list that
/// sits on top of `sources[i]`.
#[derive(Debug, Clone)]
pub struct Union {
    pub sources: Vec<Operator>,
    pub selects: Vec<Select>,
    pub distinct: bool,
}

impl Union {
    pub fn new(sources: Vec<Operator>, selects: Vec<Select>, distinct: bool) -> Self {
        Self {
            sources,
            selects,
            distinct,
        }
    }

    pub fn select_for(&self, branch: usize) -> Result<&Select> {
        self.selects
            .get(branch)
            .ok_or_else(|| Error::internal(format!("UNION has no branch {}", branch)))
    }

    /// Output names of the union, taken from the first branch, mapped to their
    /// position in every branch's select list.
    fn column_offsets(&self) -> Result<FxHashMap<Ident, usize>> {
        let first = self.select_for(0)?;
        let mut offsets = FxHashMap::default();
        for (i, item) in first.select_exprs.iter().enumerate() {
            let SelectExpr::Aliased(ae) = item else {
                return Err(Error::unsupported(
                    "pushing predicates on UNION where the first SELECT contains *",
                ));
            };
            if let Some(name) = ae.column_name() {
                offsets.entry(name.clone()).or_insert(i);
            }
        }
        Ok(offsets)
    }

    fn rewrite_for_branch(
        &self,
        expr: &Expr,
        offsets: &FxHashMap<Ident, usize>,
        branch: usize,
    ) -> Result<Expr> {
        let select = self.select_for(branch)?;
        expr.try_rewrite_columns::<_, Error>(&mut |col| {
            let idx = offsets
                .get(&col.name)
                .ok_or_else(|| Error::internal(format!("cannot find the column {}", col.name)))?;
            match select.select_exprs.get(*idx) {
                Some(SelectExpr::Aliased(ae)) => Ok(Some(ae.expr.clone())),
                _ => Err(Error::unsupported(
                    "pushing non-aliased expression predicates on UNION",
                )),
            }
        })
    }
}

impl Op for Union {
    fn inputs(&self) -> Vec<&Operator> {
        self.sources.iter().collect()
    }

    fn inputs_mut(&mut self) -> Vec<&mut Operator> {
        self.sources.iter_mut().collect()
    }

    fn set_inputs(&mut self, inputs: Vec<Operator>) -> Result<()> {
        if inputs.len() != self.selects.len() {
            return Err(Error::internal(format!(
                "Union expects {} inputs, got {}",
                self.selects.len(),
                inputs.len()
            )));
        }
        self.sources = inputs;
        Ok(())
    }

    fn clone_with_inputs(&self, inputs: Vec<Operator>) -> Result<Operator> {
        let mut copy = Union::new(Vec::new(), self.selects.clone(), self.distinct);
        copy.set_inputs(inputs)?;
        Ok(copy.into())
    }

    fn add_predicate(self: Box<Self>, ctx: &PlanningContext, expr: Expr) -> Result<Operator> {
        let mut this = *self;
        let offsets = this.column_offsets()?;
        let sources = std::mem::take(&mut this.sources);
        let mut pushed = Vec::with_capacity(sources.len());
        for (branch, source) in sources.into_iter().enumerate() {
            let predicate = this.rewrite_for_branch(&expr, &offsets, branch)?;
            debug!(branch, predicate = %predicate, "pushing predicate into union branch");
            pushed.push(source.add_predicate(ctx, predicate)?);
        }
        this.sources = pushed;
        Ok(this.into())
    }

    fn add_column(
        self: Box<Self>,
        _ctx: &PlanningContext,
        expr: AliasedExpr,
        _reuse: bool,
        _add_to_group_by: bool,
    ) -> Result<(Operator, usize)> {
        let Some(col) = expr.expr.as_column() else {
            return Err(Error::internal(format!(
                "cannot push non-column expression '{}' to a UNION",
                expr.expr
            )));
        };
        let offsets = self.column_offsets()?;
        match offsets.get(&col.name) {
            Some(offset) => {
                let offset = *offset;
                Ok((Operator::Union(self), offset))
            }
            None => Err(Error::unknown_column(col.name.to_string(), "field list")),
        }
    }

    fn get_ordering(&self) -> Result<Vec<OrderExpr>> {
        Ok(Vec::new())
    }

    fn description(&self) -> OpDescription {
        if self.distinct {
            OpDescription::new("Union").with_variant("Distinct")
        } else {
            OpDescription::new("Union")
        }
    }

    fn short_description(&self) -> String {
        String::new()
    }
}
