use shardplan_common::{Error, Result};
use shardplan_ir::{AliasedExpr, Expr, Literal, Order, Select, SelectExpr, SelectStatement};

/// One item of the select list, with whether it aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedExpr {
    pub original: SelectExpr,
    pub aggr: bool,
}

impl ProjectedExpr {
    pub fn aliased(&self) -> Option<&AliasedExpr> {
        match &self.original {
            SelectExpr::Aliased(ae) => Some(ae),
            SelectExpr::Star(_) => None,
        }
    }
}

/// A grouping expression as written, and with select aliases resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub inner: Expr,
    pub simplified: Expr,
}

/// An ordering term as written, and with positions and aliases resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpr {
    pub inner: Order,
    pub simplified: Expr,
}

/// Decomposition of a SELECT into its projection, grouping and ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryProjection {
    pub select_exprs: Vec<ProjectedExpr>,
    pub has_star: bool,
    pub has_aggr: bool,
    pub distinct: bool,
    pub grouping: Vec<GroupBy>,
    pub order_exprs: Vec<OrderExpr>,
}

impl QueryProjection {
    pub fn from_statement(stmt: &SelectStatement) -> Result<Self> {
        match stmt {
            SelectStatement::Select(sel) => Self::from_select(sel),
            SelectStatement::Union(_) => Err(Error::unsupported(
                "query projection for a UNION in a derived table",
            )),
        }
    }

    pub fn from_select(sel: &Select) -> Result<Self> {
        let mut qp = QueryProjection {
            distinct: sel.distinct,
            ..Default::default()
        };

        for item in &sel.select_exprs {
            let aggr = match item {
                SelectExpr::Aliased(ae) => ae.expr.contains_aggregation(),
                SelectExpr::Star(_) => {
                    qp.has_star = true;
                    false
                }
            };
            qp.has_aggr |= aggr;
            qp.select_exprs.push(ProjectedExpr {
                original: item.clone(),
                aggr,
            });
        }

        for expr in &sel.group_by {
            if expr.contains_aggregation() {
                return Err(Error::invalid_query(format!("cannot group on '{}'", expr)));
            }
            qp.grouping.push(GroupBy {
                inner: expr.clone(),
                simplified: qp.resolve_alias(expr),
            });
        }

        for order in &sel.order_by {
            let simplified = match &order.expr {
                Expr::Literal(Literal::Int(pos)) => qp.resolve_position(*pos)?,
                other => qp.resolve_alias(other),
            };
            qp.order_exprs.push(OrderExpr {
                inner: order.clone(),
                simplified,
            });
        }

        Ok(qp)
    }

    /// Sorting can be pushed below this projection only when no rows are
    /// merged by it.
    pub fn can_push_down_sorting(&self) -> bool {
        !self.has_aggr && self.grouping.is_empty()
    }

    fn resolve_alias(&self, expr: &Expr) -> Expr {
        let Expr::Column(col) = expr else {
            return expr.clone();
        };
        if col.qualifier.is_some() {
            return expr.clone();
        }
        self.select_exprs
            .iter()
            .filter_map(ProjectedExpr::aliased)
            .find(|ae| ae.alias.as_ref() == Some(&col.name))
            .map(|ae| ae.expr.clone())
            .unwrap_or_else(|| expr.clone())
    }

    fn resolve_position(&self, pos: i64) -> Result<Expr> {
        let item = usize::try_from(pos)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|idx| self.select_exprs.get(idx))
            .ok_or_else(|| Error::unknown_column(pos.to_string(), "order clause"))?;
        match item.aliased() {
            Some(ae) => Ok(ae.expr.clone()),
            None => Err(Error::unsupported(format!(
                "ORDER BY {} refers to a '*' in the select list",
                pos
            ))),
        }
    }
}
