use std::borrow::Cow;
use std::sync::Arc;

use shardplan_common::{Error, Result};
use shardplan_ir::{AliasedExpr, ColName, Expr, Ident, SelectExpr, SelectStatement};
use shardplan_semantics::TableSet;
use tracing::{debug, trace};

use super::{
    Filter, Op, OpDescription, Operator, OrderExpr, QueryProjection, ae_wrap, can_reuse_column,
    is_mergeable, single_input,
};
use crate::PlanningContext;

/// Where a column requested from a derived table comes from in the
/// subquery's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputColumn {
    /// Position in the subquery's select list.
    Index(usize),
    /// Not named in the select list, produced by its `*`.
    Wildcard,
}

/// `(subquery) AS alias` in a FROM clause.
#[derive(Debug, Clone)]
pub struct Derived {
    pub source: Operator,
    pub table_id: TableSet,
    pub query: Arc<SelectStatement>,
    pub alias: Ident,
    pub column_aliases: Vec<Ident>,

    // columns[i] is produced at columns_offset[column_slots[i]]
    columns: Vec<ColName>,
    column_slots: Vec<usize>,
    columns_offset: Vec<OutputColumn>,

    qp: Option<Arc<QueryProjection>>,
}

impl Derived {
    pub fn new(
        source: Operator,
        table_id: TableSet,
        query: Arc<SelectStatement>,
        alias: impl Into<Ident>,
    ) -> Self {
        Self {
            source,
            table_id,
            query,
            alias: alias.into(),
            column_aliases: Vec::new(),
            columns: Vec::new(),
            column_slots: Vec::new(),
            columns_offset: Vec::new(),
            qp: None,
        }
    }

    pub fn with_column_aliases(mut self, column_aliases: Vec<Ident>) -> Self {
        self.column_aliases = column_aliases;
        self
    }

    /// Columns requested by the operators above, in request order.
    pub fn columns(&self) -> &[ColName] {
        &self.columns
    }

    /// Resolved output positions, one per distinct projection.
    pub fn columns_offset(&self) -> &[OutputColumn] {
        &self.columns_offset
    }

    pub fn source(&self) -> &Operator {
        &self.source
    }

    pub fn select_statement(&self) -> &Arc<SelectStatement> {
        &self.query
    }

    pub fn qp(&self) -> Option<&Arc<QueryProjection>> {
        self.qp.as_ref()
    }

    /// Finds which item of the subquery's select list produces `name`.
    ///
    /// Fails on an un-aliased expression that is not a plain column, since
    /// such an item has no name to match against. A name that is not found
    /// is deferred to the wildcard when the select list has one.
    pub fn find_output_column(&self, name: &ColName) -> Result<OutputColumn> {
        if !self.column_aliases.is_empty() {
            return self
                .column_aliases
                .iter()
                .position(|alias| alias == &name.name)
                .map(OutputColumn::Index)
                .ok_or_else(|| Error::unknown_column(name.name.to_string(), "field list"));
        }

        let mut has_star = false;
        for (i, item) in self.query.first_select().select_exprs.iter().enumerate() {
            match item {
                SelectExpr::Aliased(ae) => match (&ae.alias, &ae.expr) {
                    (Some(alias), _) if alias == &name.name => return Ok(OutputColumn::Index(i)),
                    (Some(_), _) => {}
                    (None, Expr::Column(col)) if col.name == name.name => {
                        return Ok(OutputColumn::Index(i));
                    }
                    (None, Expr::Column(_)) => {}
                    (None, _) => {
                        return Err(Error::unsupported(format!(
                            "complex expression needs column alias: {}",
                            ae
                        )));
                    }
                },
                SelectExpr::Star(_) => has_star = true,
            }
        }

        if has_star {
            Ok(OutputColumn::Wildcard)
        } else {
            Err(Error::unknown_column(name.name.to_string(), "field list"))
        }
    }

    /// Slot for `output` in `columns_offset`. Resolved positions are shared;
    /// every wildcard column gets a slot of its own. Unlike resolved
    /// positions, wildcard entries are deliberately never collapsed into one
    /// slot, since distinct `*` columns would become indistinguishable.
    fn record_offset(&mut self, output: OutputColumn) -> usize {
        if let OutputColumn::Index(_) = output {
            if let Some(slot) = self.columns_offset.iter().position(|o| *o == output) {
                return slot;
            }
        }
        self.columns_offset.push(output);
        self.columns_offset.len() - 1
    }

    /// The subquery's select list as aliased expressions. A `*` that has not
    /// been expanded yet cannot be listed.
    pub fn get_columns(&self) -> Result<Vec<AliasedExpr>> {
        self.query
            .first_select()
            .select_exprs
            .iter()
            .map(|item| match item {
                SelectExpr::Aliased(ae) => Ok(ae.clone()),
                SelectExpr::Star(_) => Err(Error::internal(format!(
                    "query horizon of derived table '{}' is not planned",
                    self.alias
                ))),
            })
            .collect()
    }

    /// Whether the subquery can run on a single shard together with its
    /// parent, or on the inner side of a nested-loop join.
    pub fn is_mergeable(&self, ctx: &PlanningContext) -> bool {
        is_mergeable(ctx, &self.query, &self.source)
    }

    pub fn get_qp(&mut self) -> Result<Arc<QueryProjection>> {
        if let Some(qp) = &self.qp {
            return Ok(Arc::clone(qp));
        }
        let qp = Arc::new(QueryProjection::from_statement(&self.query)?);
        trace!(alias = %self.alias, "query projection populated");
        self.qp = Some(Arc::clone(&qp));
        Ok(qp)
    }

    /// Installs `qp` unless a projection is already cached.
    pub fn set_qp(&mut self, qp: Arc<QueryProjection>) {
        if self.qp.is_none() {
            self.qp = Some(qp);
        }
    }
}

/// Aggregates other than MIN and MAX change meaning when evaluated below the
/// subquery's grouping.
// TODO: MIN/MAX are let through here even though they aggregate too; revisit
// once predicates on grouped subqueries are moved into HAVING.
fn can_be_pushed_down_into_derived(expr: &Expr) -> bool {
    !expr.any(|e| matches!(e, Expr::Aggregate { func, .. } if !func.is_min_max()))
}

impl Op for Derived {
    fn inputs(&self) -> Vec<&Operator> {
        vec![&self.source]
    }

    fn inputs_mut(&mut self) -> Vec<&mut Operator> {
        vec![&mut self.source]
    }

    fn set_inputs(&mut self, inputs: Vec<Operator>) -> Result<()> {
        self.source = single_input("Derived", inputs)?;
        Ok(())
    }

    fn clone_with_inputs(&self, inputs: Vec<Operator>) -> Result<Operator> {
        Ok(Derived {
            source: single_input("Derived", inputs)?,
            table_id: self.table_id,
            query: Arc::clone(&self.query),
            alias: self.alias.clone(),
            column_aliases: self.column_aliases.clone(),
            columns: self.columns.clone(),
            column_slots: self.column_slots.clone(),
            columns_offset: self.columns_offset.clone(),
            qp: self.qp.clone(),
        }
        .into())
    }

    fn add_predicate(self: Box<Self>, ctx: &PlanningContext, expr: Expr) -> Result<Operator> {
        if !ctx.settings.derived_predicate_pushdown {
            return Ok(Filter::wrap(Operator::Derived(self), expr));
        }

        let mut this = *self;
        if this.source.is_union() {
            this.source = this.source.add_predicate(ctx, expr)?;
            return Ok(this.into());
        }

        let deps = ctx.sem_table.direct_deps(&expr);
        let info = match ctx.sem_table.table_info_for(deps) {
            Ok(info) => info,
            Err(err) if err.is_not_single_table() => {
                debug!(alias = %this.alias, predicate = %expr, "predicate spans tables, filtering above derived table");
                return Ok(Filter::wrap(this.into(), expr));
            }
            Err(err) => return Err(err),
        };
        // compared by table set, the alias may be reused in another scope
        if deps != this.table_id || info.as_derived().is_none() {
            debug!(alias = %this.alias, predicate = %expr, "predicate belongs to another table, filtering above derived table");
            return Ok(Filter::wrap(this.into(), expr));
        }

        let rewritten = ctx.sem_table.rewrite_derived_table_expression(&expr, info);
        if !can_be_pushed_down_into_derived(&rewritten) {
            debug!(alias = %this.alias, predicate = %expr, "aggregation in predicate, filtering above derived table");
            return Ok(Filter::wrap(this.into(), expr));
        }

        debug!(alias = %this.alias, predicate = %rewritten, "pushing predicate into derived table");
        this.source = this.source.add_predicate(ctx, rewritten)?;
        Ok(this.into())
    }

    fn add_column(
        self: Box<Self>,
        ctx: &PlanningContext,
        expr: AliasedExpr,
        _reuse: bool,
        add_to_group_by: bool,
    ) -> Result<(Operator, usize)> {
        let Expr::Column(col) = &expr.expr else {
            return Err(Error::internal(format!(
                "cannot push non-column expression '{}' to a derived table",
                expr.expr
            )));
        };

        let mut this = *self;
        let reused = can_reuse_column(ctx, &this.columns, &expr.expr, |c| {
            Cow::Owned(Expr::Column(c.clone()))
        });
        if let Some(idx) = reused {
            let slot = this.column_slots.get(idx).copied().ok_or_else(|| {
                Error::internal(format!("derived table column {} has no offset", idx))
            })?;
            trace!(alias = %this.alias, column = %col, slot, "reusing derived table column");
            return Ok((this.into(), slot));
        }

        let output = this.find_output_column(col)?;
        let slot = this.record_offset(output);
        this.columns.push(col.clone());
        this.column_slots.push(slot);
        trace!(alias = %this.alias, column = %col, slot, ?output, "added derived table column");

        if output == OutputColumn::Wildcard {
            debug!(alias = %this.alias, column = %col.name, "column comes from '*', adding it to the subquery source");
            let (source, _) = this
                .source
                .add_column(ctx, ae_wrap(col), true, add_to_group_by)?;
            this.source = source;
        }
        Ok((this.into(), slot))
    }

    fn get_ordering(&self) -> Result<Vec<OrderExpr>> {
        match &self.qp {
            Some(qp) => Ok(qp.order_exprs.clone()),
            None => Err(Error::internal(format!(
                "query projection of derived table '{}' should already be populated",
                self.alias
            ))),
        }
    }

    fn description(&self) -> OpDescription {
        OpDescription::new("Derived")
    }

    fn short_description(&self) -> String {
        self.alias.to_string()
    }

    fn introduces(&self) -> Option<TableSet> {
        Some(self.table_id)
    }
}
