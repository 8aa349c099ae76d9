use std::borrow::Cow;

use shardplan_common::{Error, Result};
use shardplan_ir::{AliasedExpr, Expr};
use tracing::debug;

use super::{
    Filter, Op, OpDescription, Operator, OrderExpr, can_reuse_column, table_id, two_inputs,
};
use crate::PlanningContext;

/// One output column of a join: where it comes from and at which offset of
/// that side it is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinColumn {
    pub expr: Expr,
    pub from_lhs: bool,
    pub offset: usize,
}

/// Nested-loop join evaluated above the shards.
#[derive(Debug, Clone)]
pub struct Join {
    pub lhs: Operator,
    pub rhs: Operator,
    pub predicate: Option<Expr>,
    pub left_join: bool,
    pub columns: Vec<JoinColumn>,
}

impl Join {
    pub fn new(lhs: Operator, rhs: Operator, left_join: bool) -> Self {
        Self {
            lhs,
            rhs,
            predicate: None,
            left_join,
            columns: Vec::new(),
        }
    }

    pub fn add_join_predicate(&mut self, expr: Expr) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => Expr::and(existing, expr),
            None => expr,
        });
    }
}

impl Op for Join {
    fn inputs(&self) -> Vec<&Operator> {
        vec![&self.lhs, &self.rhs]
    }

    fn inputs_mut(&mut self) -> Vec<&mut Operator> {
        vec![&mut self.lhs, &mut self.rhs]
    }

    fn set_inputs(&mut self, inputs: Vec<Operator>) -> Result<()> {
        let (lhs, rhs) = two_inputs("Join", inputs)?;
        self.lhs = lhs;
        self.rhs = rhs;
        Ok(())
    }

    fn clone_with_inputs(&self, inputs: Vec<Operator>) -> Result<Operator> {
        let (lhs, rhs) = two_inputs("Join", inputs)?;
        Ok(Join {
            lhs,
            rhs,
            predicate: self.predicate.clone(),
            left_join: self.left_join,
            columns: self.columns.clone(),
        }
        .into())
    }

    fn add_predicate(self: Box<Self>, ctx: &PlanningContext, expr: Expr) -> Result<Operator> {
        if !ctx.settings.join_predicate_pushdown {
            return Ok(Filter::wrap(Operator::Join(self), expr));
        }

        let mut this = *self;
        let deps = ctx.sem_table.recursive_deps(&expr);
        let lhs_id = table_id(&this.lhs);
        let rhs_id = table_id(&this.rhs);

        if deps.is_solved_by(lhs_id) {
            debug!(predicate = %expr, "pushing predicate to join lhs");
            this.lhs = this.lhs.add_predicate(ctx, expr)?;
            return Ok(this.into());
        }

        if this.left_join && deps.is_solved_by(lhs_id.merge(rhs_id)) {
            // rows from the outer side must survive a failing rhs predicate,
            // so it can only be applied once the join is done
            return Ok(Filter::wrap(this.into(), expr));
        }

        if deps.is_solved_by(rhs_id) {
            debug!(predicate = %expr, "pushing predicate to join rhs");
            this.rhs = this.rhs.add_predicate(ctx, expr)?;
            return Ok(this.into());
        }

        if deps.is_solved_by(lhs_id.merge(rhs_id)) {
            debug!(predicate = %expr, "adding join predicate");
            this.add_join_predicate(expr);
            return Ok(this.into());
        }

        Ok(Filter::wrap(this.into(), expr))
    }

    fn add_column(
        self: Box<Self>,
        ctx: &PlanningContext,
        expr: AliasedExpr,
        reuse: bool,
        add_to_group_by: bool,
    ) -> Result<(Operator, usize)> {
        let mut this = *self;
        if reuse {
            let found = can_reuse_column(ctx, &this.columns, &expr.expr, |c| {
                Cow::Borrowed(&c.expr)
            });
            if let Some(offset) = found {
                return Ok((this.into(), offset));
            }
        }

        let deps = ctx.sem_table.recursive_deps(&expr.expr);
        let column_expr = expr.expr.clone();
        let (from_lhs, offset) = if deps.is_solved_by(table_id(&this.lhs)) {
            let (lhs, offset) = this.lhs.add_column(ctx, expr, reuse, add_to_group_by)?;
            this.lhs = lhs;
            (true, offset)
        } else if deps.is_solved_by(table_id(&this.rhs)) {
            let (rhs, offset) = this.rhs.add_column(ctx, expr, reuse, add_to_group_by)?;
            this.rhs = rhs;
            (false, offset)
        } else {
            return Err(Error::unsupported(format!(
                "expression '{}' spans both sides of a join",
                expr.expr
            )));
        };

        this.columns.push(JoinColumn {
            expr: column_expr,
            from_lhs,
            offset,
        });
        let offset = this.columns.len() - 1;
        Ok((this.into(), offset))
    }

    fn get_ordering(&self) -> Result<Vec<OrderExpr>> {
        self.lhs.get_ordering()
    }

    fn description(&self) -> OpDescription {
        if self.left_join {
            OpDescription::new("Join").with_variant("LeftJoin")
        } else {
            OpDescription::new("Join")
        }
    }

    fn short_description(&self) -> String {
        self.predicate
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default()
    }
}
