use shardplan_common::{Error, Result};
use shardplan_ir::{Expr, Ident, SelectExpr, SelectStatement};

/// A sharding function over one or more columns of a table. A unique
/// single-column vindex pins every value of its column to a single shard.
#[derive(Debug, Clone, PartialEq)]
pub struct Vindex {
    pub name: String,
    pub columns: Vec<Ident>,
    pub unique: bool,
}

impl Vindex {
    pub fn unique(name: impl Into<String>, column: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            columns: vec![column.into()],
            unique: true,
        }
    }

    pub fn non_unique(name: impl Into<String>, column: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            columns: vec![column.into()],
            unique: false,
        }
    }

    pub fn is_single_column(&self) -> bool {
        self.columns.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealTable {
    pub alias: Ident,
    pub table_name: Ident,
    pub columns: Vec<Ident>,
    pub vindexes: Vec<Vindex>,
}

impl RealTable {
    pub fn new(table_name: impl Into<Ident>) -> Self {
        let table_name = table_name.into();
        Self {
            alias: table_name.clone(),
            table_name,
            columns: Vec::new(),
            vindexes: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<Ident>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Ident>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_vindex(mut self, vindex: Vindex) -> Self {
        self.vindexes.push(vindex);
        self
    }
}

/// The outer-scope view of a subquery in FROM: one name per select item and
/// the inner expression that produces it.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    pub alias: Ident,
    pub column_names: Vec<Ident>,
    pub cols: Vec<Expr>,
    pub has_star: bool,
}

impl DerivedTable {
    pub fn from_statement(
        alias: impl Into<Ident>,
        column_aliases: &[Ident],
        stmt: &SelectStatement,
    ) -> Result<Self> {
        let mut column_names = Vec::new();
        let mut cols = Vec::new();
        let mut has_star = false;

        for select_expr in &stmt.first_select().select_exprs {
            match select_expr {
                SelectExpr::Aliased(ae) => {
                    let name = ae
                        .column_name()
                        .cloned()
                        .unwrap_or_else(|| Ident::new(ae.expr.to_string()));
                    column_names.push(name);
                    cols.push(ae.expr.clone());
                }
                SelectExpr::Star(_) => has_star = true,
            }
        }

        if !column_aliases.is_empty() {
            if has_star || column_aliases.len() != cols.len() {
                return Err(Error::invalid_query(
                    "in definition of derived table, SELECT list and column names list have different column counts",
                ));
            }
            column_names = column_aliases.to_vec();
        }

        Ok(Self {
            alias: alias.into(),
            column_names,
            cols,
            has_star,
        })
    }

    pub fn column_index(&self, name: &Ident) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    pub fn expr_for(&self, name: &Ident) -> Option<&Expr> {
        self.column_index(name).map(|i| &self.cols[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableInfo {
    Real(RealTable),
    Derived(DerivedTable),
}

impl TableInfo {
    pub fn alias(&self) -> &Ident {
        match self {
            TableInfo::Real(t) => &t.alias,
            TableInfo::Derived(t) => &t.alias,
        }
    }

    pub fn has_column(&self, name: &Ident) -> bool {
        match self {
            TableInfo::Real(t) => t.columns.contains(name),
            TableInfo::Derived(t) => t.column_index(name).is_some(),
        }
    }

    pub fn vindexes(&self) -> &[Vindex] {
        match self {
            TableInfo::Real(t) => &t.vindexes,
            TableInfo::Derived(_) => &[],
        }
    }

    pub fn as_derived(&self) -> Option<&DerivedTable> {
        match self {
            TableInfo::Derived(t) => Some(t),
            TableInfo::Real(_) => None,
        }
    }
}
