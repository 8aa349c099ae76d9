use rustc_hash::FxHashMap;
use shardplan_common::{Error, Result};
use shardplan_ir::{ColName, Expr, Ident, SelectStatement};

use crate::{DerivedTable, RealTable, TableInfo, TableSet};

/// Table-set resolution and expression equivalence for one query
/// compilation.
///
/// Column references are resolved in this order: an explicit binding
/// recorded by the analyzer, then the qualifier, then the single table that
/// exposes a column with that name.
#[derive(Debug, Clone, Default)]
pub struct SemTable {
    tables: Vec<TableInfo>,
    bindings: FxHashMap<ColName, TableSet>,
}

impl SemTable {
    pub fn builder() -> SemTableBuilder {
        SemTableBuilder::default()
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    /// Looks the alias up across every registered table, first registration
    /// wins. Aliases are not scoped: two nested derived tables sharing an alias
    /// resolve to the same table set, so the analyzer has to register distinct
    /// aliases for them.
    pub fn table_set_for_alias(&self, alias: &Ident) -> Option<TableSet> {
        self.tables
            .iter()
            .position(|t| t.alias() == alias)
            .map(TableSet::single)
    }

    /// Fails with [`Error::NotSingleTable`] unless `ts` names exactly one
    /// table.
    pub fn table_info_for(&self, ts: TableSet) -> Result<&TableInfo> {
        let offset = ts.table_offset().ok_or(Error::NotSingleTable)?;
        self.tables
            .get(offset)
            .ok_or_else(|| Error::internal(format!("no table info for {}", ts)))
    }

    pub fn table_info_for_expr(&self, expr: &Expr) -> Result<&TableInfo> {
        self.table_info_for(self.direct_deps(expr))
    }

    pub fn column_deps(&self, col: &ColName) -> TableSet {
        if let Some(ts) = self.bindings.get(col) {
            return *ts;
        }
        if let Some(qualifier) = &col.qualifier {
            return self.table_set_for_alias(qualifier).unwrap_or_default();
        }
        self.tables
            .iter()
            .enumerate()
            .filter(|(_, t)| t.has_column(&col.name))
            .fold(TableSet::EMPTY, |acc, (i, _)| acc.merge(TableSet::single(i)))
    }

    /// Tables referenced by the expression in its own scope.
    pub fn direct_deps(&self, expr: &Expr) -> TableSet {
        expr.columns()
            .into_iter()
            .fold(TableSet::EMPTY, |acc, col| acc.merge(self.column_deps(col)))
    }

    /// Like [`SemTable::direct_deps`], but columns of derived tables are
    /// replaced by the tables their inner expression depends on.
    pub fn recursive_deps(&self, expr: &Expr) -> TableSet {
        expr.columns().into_iter().fold(TableSet::EMPTY, |acc, col| {
            acc.merge(self.recursive_column_deps(col))
        })
    }

    fn recursive_column_deps(&self, col: &ColName) -> TableSet {
        let deps = self.column_deps(col);
        match self.table_info_for(deps) {
            Ok(TableInfo::Derived(dt)) => match dt.expr_for(&col.name) {
                Some(inner) => self.recursive_deps(inner),
                None => deps,
            },
            _ => deps,
        }
    }

    /// Structural equality where column references are compared by name and
    /// by the tables they resolve to, not by how they are spelled.
    pub fn equals_expr_with_deps(&self, a: &Expr, b: &Expr) -> bool {
        match (a, b) {
            (Expr::Column(x), Expr::Column(y)) => {
                x.name == y.name && self.column_deps(x) == self.column_deps(y)
            }
            _ => {
                shallow_eq(a, b)
                    && a
                        .children()
                        .into_iter()
                        .zip(b.children())
                        .all(|(x, y)| self.equals_expr_with_deps(x, y))
            }
        }
    }

    /// Translates an expression written against a derived table's outer
    /// names into the subquery's own scope. Columns without a matching output
    /// lose their qualifier.
    pub fn rewrite_derived_table_expression(&self, expr: &Expr, info: &TableInfo) -> Expr {
        let TableInfo::Derived(dt) = info else {
            return expr.clone();
        };
        expr.rewrite_columns(&mut |col| match dt.expr_for(&col.name) {
            Some(inner) => Some(inner.clone()),
            None => Some(Expr::Column(ColName::new(col.name.clone()))),
        })
    }

    /// Follows a column through derived tables down to the expression that
    /// produces it.
    pub fn unwrap_derived_tables(&self, expr: &Expr) -> Expr {
        let mut current = expr.clone();
        while let Expr::Column(col) = &current {
            let next = match self.table_info_for(self.column_deps(col)) {
                Ok(TableInfo::Derived(dt)) => dt.expr_for(&col.name).cloned(),
                _ => None,
            };
            match next {
                Some(inner) if inner != current => current = inner,
                _ => break,
            }
        }
        current
    }
}

fn shallow_eq(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (Expr::Literal(x), Expr::Literal(y)) => x == y,
        (Expr::BinaryOp { op: x, .. }, Expr::BinaryOp { op: y, .. }) => x == y,
        (Expr::UnaryOp { op: x, .. }, Expr::UnaryOp { op: y, .. }) => x == y,
        (Expr::IsNull { negated: x, .. }, Expr::IsNull { negated: y, .. }) => x == y,
        (
            Expr::InList {
                list: l1,
                negated: n1,
                ..
            },
            Expr::InList {
                list: l2,
                negated: n2,
                ..
            },
        ) => n1 == n2 && l1.len() == l2.len(),
        (Expr::Between { negated: x, .. }, Expr::Between { negated: y, .. }) => x == y,
        (Expr::Function { name: n1, args: a1 }, Expr::Function { name: n2, args: a2 }) => {
            n1 == n2 && a1.len() == a2.len()
        }
        (
            Expr::Aggregate {
                func: f1,
                args: a1,
                distinct: d1,
            },
            Expr::Aggregate {
                func: f2,
                args: a2,
                distinct: d2,
            },
        ) => f1 == f2 && d1 == d2 && a1.len() == a2.len(),
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct SemTableBuilder {
    tables: Vec<TableInfo>,
    bindings: FxHashMap<ColName, TableSet>,
}

impl SemTableBuilder {
    fn push(&mut self, info: TableInfo) -> Result<TableSet> {
        let offset = self.tables.len();
        if offset >= TableSet::MAX_TABLES {
            return Err(Error::unsupported(format!(
                "more than {} tables in a single query",
                TableSet::MAX_TABLES
            )));
        }
        self.tables.push(info);
        Ok(TableSet::single(offset))
    }

    pub fn add_real_table(&mut self, table: RealTable) -> Result<TableSet> {
        self.push(TableInfo::Real(table))
    }

    pub fn add_derived_table(
        &mut self,
        alias: impl Into<Ident>,
        column_aliases: &[Ident],
        stmt: &SelectStatement,
    ) -> Result<TableSet> {
        let derived = DerivedTable::from_statement(alias, column_aliases, stmt)?;
        self.push(TableInfo::Derived(derived))
    }

    /// Records the analyzer's resolution for a column reference, overriding
    /// qualifier and name based lookup.
    pub fn bind(&mut self, col: ColName, ts: TableSet) -> &mut Self {
        self.bindings.insert(col, ts);
        self
    }

    pub fn build(self) -> SemTable {
        SemTable {
            tables: self.tables,
            bindings: self.bindings,
        }
    }
}
