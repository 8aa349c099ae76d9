use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Expr, Ident};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasedExpr {
    pub expr: Expr,
    pub alias: Option<Ident>,
}

impl AliasedExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(expr: Expr, alias: impl Into<Ident>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// The name this item is visible under from the outside: its alias, or
    /// the column name when the item is a bare column.
    pub fn column_name(&self) -> Option<&Ident> {
        match &self.alias {
            Some(alias) => Some(alias),
            None => self.expr.as_column().map(|c| &c.name),
        }
    }
}

impl fmt::Display for AliasedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.expr, alias),
            None => write!(f, "{}", self.expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectExpr {
    Aliased(AliasedExpr),
    /// `*` or `tbl.*`
    Star(Option<Ident>),
}

impl SelectExpr {
    pub fn expr(expr: Expr) -> Self {
        SelectExpr::Aliased(AliasedExpr::new(expr))
    }

    pub fn aliased(expr: Expr, alias: impl Into<Ident>) -> Self {
        SelectExpr::Aliased(AliasedExpr::with_alias(expr, alias))
    }

    pub fn star() -> Self {
        SelectExpr::Star(None)
    }
}

impl fmt::Display for SelectExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectExpr::Aliased(ae) => write!(f, "{}", ae),
            SelectExpr::Star(Some(table)) => write!(f, "{}.*", table),
            SelectExpr::Star(None) => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableExpr {
    Table {
        name: Ident,
        alias: Option<Ident>,
    },
    Derived {
        subquery: Arc<SelectStatement>,
        alias: Ident,
        column_aliases: Vec<Ident>,
    },
    Join {
        left: Box<TableExpr>,
        right: Box<TableExpr>,
        kind: JoinKind,
        on: Option<Expr>,
    },
}

impl TableExpr {
    pub fn table(name: impl Into<Ident>) -> Self {
        TableExpr::Table {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased_table(name: impl Into<Ident>, alias: impl Into<Ident>) -> Self {
        TableExpr::Table {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn derived(subquery: Arc<SelectStatement>, alias: impl Into<Ident>) -> Self {
        TableExpr::Derived {
            subquery,
            alias: alias.into(),
            column_aliases: Vec::new(),
        }
    }
}

impl fmt::Display for TableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableExpr::Table { name, alias: None } => write!(f, "{}", name),
            TableExpr::Table {
                name,
                alias: Some(alias),
            } => write!(f, "{} as {}", name, alias),
            TableExpr::Derived {
                subquery,
                alias,
                column_aliases,
            } => {
                write!(f, "({}) as {}", subquery, alias)?;
                if !column_aliases.is_empty() {
                    let names: Vec<&str> = column_aliases.iter().map(Ident::as_str).collect();
                    write!(f, "({})", names.join(", "))?;
                }
                Ok(())
            }
            TableExpr::Join {
                left,
                right,
                kind,
                on,
            } => {
                let join = match kind {
                    JoinKind::Inner => "join",
                    JoinKind::Left => "left join",
                };
                write!(f, "{} {} {}", left, join, right)?;
                if let Some(on) = on {
                    write!(f, " on {}", on)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub expr: Expr,
    pub direction: OrderDirection,
}

impl Order {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            OrderDirection::Asc => write!(f, "{} asc", self.expr),
            OrderDirection::Desc => write!(f, "{} desc", self.expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub rowcount: Option<Expr>,
    pub offset: Option<Expr>,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.offset, &self.rowcount) {
            (Some(offset), Some(count)) => write!(f, "limit {}, {}", offset, count),
            (None, Some(count)) => write!(f, "limit {}", count),
            (Some(offset), None) => write!(f, "offset {}", offset),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub distinct: bool,
    pub select_exprs: Vec<SelectExpr>,
    pub from: Vec<TableExpr>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<Order>,
    pub limit: Option<Limit>,
}

impl Select {
    pub fn new(select_exprs: Vec<SelectExpr>) -> Self {
        Self {
            select_exprs,
            ..Default::default()
        }
    }

    pub fn from_table(mut self, table: TableExpr) -> Self {
        self.from.push(table);
        self
    }

    pub fn with_where(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<Expr>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_having(mut self, having: Expr) -> Self {
        self.having = Some(having);
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<Order>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_limit(mut self, rowcount: i64) -> Self {
        self.limit = Some(Limit {
            rowcount: Some(Expr::int(rowcount)),
            offset: None,
        });
        self
    }

    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn has_star(&self) -> bool {
        self.select_exprs
            .iter()
            .any(|e| matches!(e, SelectExpr::Star(_)))
    }

    pub fn into_statement(self) -> Arc<SelectStatement> {
        Arc::new(SelectStatement::Select(self))
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("select ")?;
        if self.distinct {
            f.write_str("distinct ")?;
        }
        let items: Vec<String> = self.select_exprs.iter().map(|e| e.to_string()).collect();
        f.write_str(&items.join(", "))?;
        if !self.from.is_empty() {
            let tables: Vec<String> = self.from.iter().map(|t| t.to_string()).collect();
            write!(f, " from {}", tables.join(", "))?;
        }
        if let Some(predicate) = &self.where_clause {
            write!(f, " where {}", predicate)?;
        }
        if !self.group_by.is_empty() {
            let groups: Vec<String> = self.group_by.iter().map(|g| g.to_string()).collect();
            write!(f, " group by {}", groups.join(", "))?;
        }
        if let Some(having) = &self.having {
            write!(f, " having {}", having)?;
        }
        if !self.order_by.is_empty() {
            let orders: Vec<String> = self.order_by.iter().map(|o| o.to_string()).collect();
            write!(f, " order by {}", orders.join(", "))?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " {}", limit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub left: Box<SelectStatement>,
    pub right: Box<SelectStatement>,
    pub distinct: bool,
    pub order_by: Vec<Order>,
    pub limit: Option<Limit>,
}

impl fmt::Display for Union {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.distinct { "union" } else { "union all" };
        write!(f, "{} {} {}", self.left, op, self.right)?;
        if !self.order_by.is_empty() {
            let orders: Vec<String> = self.order_by.iter().map(|o| o.to_string()).collect();
            write!(f, " order by {}", orders.join(", "))?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " {}", limit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectStatement {
    Select(Select),
    Union(Union),
}

impl SelectStatement {
    pub fn union(left: SelectStatement, right: SelectStatement, distinct: bool) -> Self {
        SelectStatement::Union(Union {
            left: Box::new(left),
            right: Box::new(right),
            distinct,
            order_by: Vec::new(),
            limit: None,
        })
    }

    /// The leftmost SELECT of a possibly compound statement. Its select list
    /// names the statement's output columns.
    pub fn first_select(&self) -> &Select {
        match self {
            SelectStatement::Select(select) => select,
            SelectStatement::Union(union) => union.left.first_select(),
        }
    }

    /// All SELECT branches, left to right.
    pub fn selects(&self) -> Vec<&Select> {
        match self {
            SelectStatement::Select(select) => vec![select],
            SelectStatement::Union(union) => {
                let mut selects = union.left.selects();
                selects.extend(union.right.selects());
                selects
            }
        }
    }

    pub fn limit(&self) -> Option<&Limit> {
        match self {
            SelectStatement::Select(select) => select.limit.as_ref(),
            SelectStatement::Union(union) => union.limit.as_ref(),
        }
    }

    pub fn order_by(&self) -> &[Order] {
        match self {
            SelectStatement::Select(select) => &select.order_by,
            SelectStatement::Union(union) => &union.order_by,
        }
    }

    pub fn as_select(&self) -> Option<&Select> {
        match self {
            SelectStatement::Select(select) => Some(select),
            SelectStatement::Union(_) => None,
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, SelectStatement::Union(_))
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectStatement::Select(select) => write!(f, "{}", select),
            SelectStatement::Union(union) => write!(f, "{}", union),
        }
    }
}
