use std::convert::Infallible;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::Ident;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColName {
    pub qualifier: Option<Ident>,
    pub name: Ident,
}

impl ColName {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<Ident>, name: impl Into<Ident>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", q, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq => 3,
            BinaryOp::Plus | BinaryOp::Minus => 4,
            BinaryOp::Multiply | BinaryOp::Divide => 5,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    CountStar,
    Sum,
    Avg,
    Min,
    Max,
    GroupConcat,
    AnyValue,
}

impl AggregateFunction {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::CountStar => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::GroupConcat => "group_concat",
            AggregateFunction::AnyValue => "any_value",
        }
    }

    pub fn is_min_max(self) -> bool {
        matches!(self, AggregateFunction::Min | AggregateFunction::Max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Column(ColName),
    Literal(Literal),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    Function {
        name: Ident,
        args: Vec<Expr>,
    },
    Aggregate {
        func: AggregateFunction,
        args: Vec<Expr>,
        distinct: bool,
    },
}

/// Controls how [`Expr::walk`] continues after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
    Stop,
}

impl Expr {
    pub fn column(name: impl Into<Ident>) -> Self {
        Expr::Column(ColName::new(name))
    }

    pub fn qualified_column(qualifier: impl Into<Ident>, name: impl Into<Ident>) -> Self {
        Expr::Column(ColName::qualified(qualifier, name))
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::And, right)
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Gt, right)
    }

    pub fn aggregate(func: AggregateFunction, arg: Expr) -> Self {
        Expr::Aggregate {
            func,
            args: vec![arg],
            distinct: false,
        }
    }

    pub fn count_star() -> Self {
        Expr::Aggregate {
            func: AggregateFunction::CountStar,
            args: Vec::new(),
            distinct: false,
        }
    }

    pub fn as_column(&self) -> Option<&ColName> {
        match self {
            Expr::Column(col) => Some(col),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Column(_) | Expr::Literal(_) => Vec::new(),
            Expr::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::UnaryOp { expr, .. } | Expr::IsNull { expr, .. } => vec![expr.as_ref()],
            Expr::InList { expr, list, .. } => {
                let mut children = vec![expr.as_ref()];
                children.extend(list.iter());
                children
            }
            Expr::Between {
                expr, low, high, ..
            } => vec![expr.as_ref(), low.as_ref(), high.as_ref()],
            Expr::Function { args, .. } | Expr::Aggregate { args, .. } => args.iter().collect(),
        }
    }

    /// Pre-order traversal. Returns `false` if the visitor stopped the walk.
    pub fn walk<F>(&self, visit: &mut F) -> bool
    where
        F: FnMut(&Expr) -> Walk,
    {
        match visit(self) {
            Walk::Stop => false,
            Walk::SkipChildren => true,
            Walk::Continue => self.children().into_iter().all(|child| child.walk(visit)),
        }
    }

    pub fn any<F>(&self, mut pred: F) -> bool
    where
        F: FnMut(&Expr) -> bool,
    {
        let mut found = false;
        self.walk(&mut |e| {
            if pred(e) {
                found = true;
                Walk::Stop
            } else {
                Walk::Continue
            }
        });
        found
    }

    pub fn contains_aggregation(&self) -> bool {
        self.any(|e| matches!(e, Expr::Aggregate { .. }))
    }

    pub fn columns(&self) -> Vec<&ColName> {
        let mut cols = Vec::new();
        self.collect_columns(&mut cols);
        cols
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColName>) {
        match self {
            Expr::Column(col) => out.push(col),
            other => {
                for child in other.children() {
                    child.collect_columns(out);
                }
            }
        }
    }

    /// Copy-on-rewrite of column references. Columns for which `f` returns
    /// `None` are kept as they are.
    pub fn rewrite_columns<F>(&self, f: &mut F) -> Expr
    where
        F: FnMut(&ColName) -> Option<Expr>,
    {
        let result: Result<Expr, Infallible> = self.try_rewrite_columns(&mut |col| Ok(f(col)));
        match result {
            Ok(expr) => expr,
            Err(never) => match never {},
        }
    }

    pub fn try_rewrite_columns<F, E>(&self, f: &mut F) -> Result<Expr, E>
    where
        F: FnMut(&ColName) -> Result<Option<Expr>, E>,
    {
        let rewrite_box = |e: &Expr, f: &mut F| -> Result<Box<Expr>, E> {
            Ok(Box::new(e.try_rewrite_columns(f)?))
        };
        Ok(match self {
            Expr::Column(col) => match f(col)? {
                Some(replacement) => replacement,
                None => Expr::Column(col.clone()),
            },
            Expr::Literal(lit) => Expr::Literal(lit.clone()),
            Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
                left: rewrite_box(left, f)?,
                op: *op,
                right: rewrite_box(right, f)?,
            },
            Expr::UnaryOp { op, expr } => Expr::UnaryOp {
                op: *op,
                expr: rewrite_box(expr, f)?,
            },
            Expr::IsNull { expr, negated } => Expr::IsNull {
                expr: rewrite_box(expr, f)?,
                negated: *negated,
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Expr::InList {
                expr: rewrite_box(expr, f)?,
                list: list
                    .iter()
                    .map(|item| item.try_rewrite_columns(f))
                    .collect::<Result<_, E>>()?,
                negated: *negated,
            },
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => Expr::Between {
                expr: rewrite_box(expr, f)?,
                low: rewrite_box(low, f)?,
                high: rewrite_box(high, f)?,
                negated: *negated,
            },
            Expr::Function { name, args } => Expr::Function {
                name: name.clone(),
                args: args
                    .iter()
                    .map(|a| a.try_rewrite_columns(f))
                    .collect::<Result<_, E>>()?,
            },
            Expr::Aggregate {
                func,
                args,
                distinct,
            } => Expr::Aggregate {
                func: *func,
                args: args
                    .iter()
                    .map(|a| a.try_rewrite_columns(f))
                    .collect::<Result<_, E>>()?,
                distinct: *distinct,
            },
        })
    }

    pub fn split_and(&self) -> Vec<Expr> {
        match self {
            Expr::BinaryOp {
                left,
                op: BinaryOp::And,
                right,
            } => {
                let mut result = left.split_and();
                result.extend(right.split_and());
                result
            }
            other => vec![other.clone()],
        }
    }

    pub fn combine_and(predicates: Vec<Expr>) -> Option<Expr> {
        predicates.into_iter().reduce(Expr::and)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr, parent: BinaryOp) -> fmt::Result {
    match operand {
        Expr::BinaryOp { op, .. } if op.precedence() < parent.precedence() => {
            write!(f, "({})", operand)
        }
        _ => write!(f, "{}", operand),
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(col) => write!(f, "{}", col),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::BinaryOp { left, op, right } => {
                write_operand(f, left, *op)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, *op)
            }
            Expr::UnaryOp {
                op: UnaryOp::Not,
                expr,
            } => write!(f, "not ({})", expr),
            Expr::UnaryOp {
                op: UnaryOp::Minus,
                expr,
            } => write!(f, "-{}", expr),
            Expr::IsNull { expr, negated } => {
                let not = if *negated { " not" } else { "" };
                write!(f, "{} is{} null", expr, not)
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let not = if *negated { " not" } else { "" };
                write!(f, "{}{} in (", expr, not)?;
                write_list(f, list)?;
                f.write_str(")")
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let not = if *negated { " not" } else { "" };
                write!(f, "{}{} between {} and {}", expr, not, low, high)
            }
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Aggregate {
                func: AggregateFunction::CountStar,
                ..
            } => f.write_str("count(*)"),
            Expr::Aggregate {
                func,
                args,
                distinct,
            } => {
                write!(f, "{}(", func.name())?;
                if *distinct {
                    f.write_str("distinct ")?;
                }
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}
