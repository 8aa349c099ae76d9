use std::borrow::Cow;

use shardplan_common::{Error, Result};
use shardplan_ir::{AliasedExpr, Expr, Ident};
use shardplan_semantics::TableSet;
use tracing::trace;

use super::{Op, OpDescription, Operator, OrderExpr, can_reuse_column};
use crate::PlanningContext;

/// Leaf scanning one sharded table. Predicates and columns pushed down to it
/// become part of the query routed to the shards.
#[derive(Debug, Clone)]
pub struct Table {
    pub table_id: TableSet,
    pub name: Ident,
    pub alias: Option<Ident>,
    pub columns: Vec<AliasedExpr>,
    pub predicates: Vec<Expr>,
}

impl Table {
    pub fn new(table_id: TableSet, name: impl Into<Ident>) -> Self {
        Self {
            table_id,
            name: name.into(),
            alias: None,
            columns: Vec::new(),
            predicates: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<Ident>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name the table goes by in its query scope.
    pub fn visible_name(&self) -> &Ident {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

impl Op for Table {
    fn inputs(&self) -> Vec<&Operator> {
        Vec::new()
    }

    fn inputs_mut(&mut self) -> Vec<&mut Operator> {
        Vec::new()
    }

    fn set_inputs(&mut self, inputs: Vec<Operator>) -> Result<()> {
        if inputs.is_empty() {
            Ok(())
        } else {
            Err(Error::internal(format!(
                "Table expects no inputs, got {}",
                inputs.len()
            )))
        }
    }

    fn clone_with_inputs(&self, inputs: Vec<Operator>) -> Result<Operator> {
        let mut copy = self.clone();
        copy.set_inputs(inputs)?;
        Ok(copy.into())
    }

    fn add_predicate(mut self: Box<Self>, _ctx: &PlanningContext, expr: Expr) -> Result<Operator> {
        trace!(table = %self.visible_name(), predicate = %expr, "predicate absorbed by table");
        self.predicates.push(expr);
        Ok(Operator::Table(self))
    }

    fn add_column(
        mut self: Box<Self>,
        ctx: &PlanningContext,
        expr: AliasedExpr,
        reuse: bool,
        _add_to_group_by: bool,
    ) -> Result<(Operator, usize)> {
        if reuse {
            let found = can_reuse_column(ctx, &self.columns, &expr.expr, |ae| {
                Cow::Borrowed(&ae.expr)
            });
            if let Some(offset) = found {
                return Ok((Operator::Table(self), offset));
            }
        }
        self.columns.push(expr);
        let offset = self.columns.len() - 1;
        Ok((Operator::Table(self), offset))
    }

    fn get_ordering(&self) -> Result<Vec<OrderExpr>> {
        Ok(Vec::new())
    }

    fn description(&self) -> OpDescription {
        OpDescription::new("Table")
    }

    fn short_description(&self) -> String {
        match &self.alias {
            Some(alias) if alias != &self.name => format!("{} as {}", self.name, alias),
            _ => self.name.to_string(),
        }
    }

    fn introduces(&self) -> Option<TableSet> {
        Some(self.table_id)
    }
}
