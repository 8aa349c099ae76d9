use itertools::Itertools;
use shardplan_common::Result;
use shardplan_ir::{AliasedExpr, Expr};

use super::{Op, OpDescription, Operator, OrderExpr, single_input};
use crate::PlanningContext;

/// Evaluates predicates on the rows produced by its source, above whatever
/// the source managed to push down.
#[derive(Debug, Clone)]
pub struct Filter {
    pub source: Operator,
    pub predicates: Vec<Expr>,
}

impl Filter {
    pub fn new(source: Operator, predicates: Vec<Expr>) -> Self {
        Self { source, predicates }
    }

    /// The refusal path of `add_predicate`: keep the node as it is and
    /// evaluate `expr` on top of it.
    pub fn wrap(source: Operator, expr: Expr) -> Operator {
        Filter::new(source, vec![expr]).into()
    }
}

impl Op for Filter {
    fn inputs(&self) -> Vec<&Operator> {
        vec![&self.source]
    }

    fn inputs_mut(&mut self) -> Vec<&mut Operator> {
        vec![&mut self.source]
    }

    fn set_inputs(&mut self, inputs: Vec<Operator>) -> Result<()> {
        self.source = single_input("Filter", inputs)?;
        Ok(())
    }

    fn clone_with_inputs(&self, inputs: Vec<Operator>) -> Result<Operator> {
        Ok(Filter {
            source: single_input("Filter", inputs)?,
            predicates: self.predicates.clone(),
        }
        .into())
    }

    fn add_predicate(self: Box<Self>, ctx: &PlanningContext, expr: Expr) -> Result<Operator> {
        let mut this = *self;
        this.source = this.source.add_predicate(ctx, expr)?;
        Ok(this.into())
    }

    fn add_column(
        self: Box<Self>,
        ctx: &PlanningContext,
        expr: AliasedExpr,
        reuse: bool,
        add_to_group_by: bool,
    ) -> Result<(Operator, usize)> {
        let mut this = *self;
        let (source, offset) = this.source.add_column(ctx, expr, reuse, add_to_group_by)?;
        this.source = source;
        Ok((this.into(), offset))
    }

    fn get_ordering(&self) -> Result<Vec<OrderExpr>> {
        self.source.get_ordering()
    }

    fn description(&self) -> OpDescription {
        OpDescription::new("Filter")
    }

    fn short_description(&self) -> String {
        self.predicates.iter().join(" and ")
    }
}
