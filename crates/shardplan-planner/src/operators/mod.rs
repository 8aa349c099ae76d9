mod column_utils;
mod derived;
mod filter;
mod join;
mod mergeable;
mod query_projection;
mod rewrite;
mod table;
mod union;

pub use column_utils::can_reuse_column;
pub(crate) use column_utils::ae_wrap;
pub use derived::{Derived, OutputColumn};
pub use filter::Filter;
pub use join::{Join, JoinColumn};
pub use mergeable::is_mergeable;
pub use query_projection::{GroupBy, OrderExpr, ProjectedExpr, QueryProjection};
pub use rewrite::{bottom_up, clone_tree, rewrite_inputs, table_id, visit, visit_mut};
use serde::Serialize;
use shardplan_common::Result;
use shardplan_ir::{AliasedExpr, Expr};
use shardplan_semantics::TableSet;
pub use table::Table;
pub use union::Union;

use crate::PlanningContext;

/// Stable, human readable identity of a node for plan descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpDescription {
    pub operator_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl OpDescription {
    pub fn new(operator_type: impl Into<String>) -> Self {
        Self {
            operator_type: operator_type.into(),
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

/// The contract every node of the operator tree satisfies.
///
/// `add_predicate` and `add_column` consume the node and hand back the root
/// that replaces it, which may be the node itself or a new wrapper around it.
pub trait Op {
    fn inputs(&self) -> Vec<&Operator>;

    fn inputs_mut(&mut self) -> Vec<&mut Operator>;

    /// Replaces the children. Fails if the number of children does not match
    /// the node's arity.
    fn set_inputs(&mut self, inputs: Vec<Operator>) -> Result<()>;

    /// Copies this node onto new children. Node-local state is copied, the
    /// children are taken as given.
    fn clone_with_inputs(&self, inputs: Vec<Operator>) -> Result<Operator>;

    fn add_predicate(self: Box<Self>, ctx: &PlanningContext, expr: Expr) -> Result<Operator>;

    fn add_column(
        self: Box<Self>,
        ctx: &PlanningContext,
        expr: AliasedExpr,
        reuse: bool,
        add_to_group_by: bool,
    ) -> Result<(Operator, usize)>;

    fn get_ordering(&self) -> Result<Vec<OrderExpr>>;

    fn description(&self) -> OpDescription;

    fn short_description(&self) -> String;

    /// The table this node brings into scope, if it is a table introducer.
    fn introduces(&self) -> Option<TableSet> {
        None
    }
}

#[derive(Debug, Clone)]
pub enum Operator {
    Table(Box<Table>),
    Filter(Box<Filter>),
    Join(Box<Join>),
    Union(Box<Union>),
    Derived(Box<Derived>),
}

macro_rules! dispatch {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            Operator::Table($op) => $body,
            Operator::Filter($op) => $body,
            Operator::Join($op) => $body,
            Operator::Union($op) => $body,
            Operator::Derived($op) => $body,
        }
    };
}

impl Operator {
    pub fn inputs(&self) -> Vec<&Operator> {
        dispatch!(self, op => op.inputs())
    }

    pub fn inputs_mut(&mut self) -> Vec<&mut Operator> {
        dispatch!(self, op => op.inputs_mut())
    }

    pub fn set_inputs(&mut self, inputs: Vec<Operator>) -> Result<()> {
        dispatch!(self, op => op.set_inputs(inputs))
    }

    pub fn clone_with_inputs(&self, inputs: Vec<Operator>) -> Result<Operator> {
        dispatch!(self, op => op.clone_with_inputs(inputs))
    }

    pub fn add_predicate(self, ctx: &PlanningContext, expr: Expr) -> Result<Operator> {
        dispatch!(self, op => op.add_predicate(ctx, expr))
    }

    pub fn add_column(
        self,
        ctx: &PlanningContext,
        expr: AliasedExpr,
        reuse: bool,
        add_to_group_by: bool,
    ) -> Result<(Operator, usize)> {
        dispatch!(self, op => op.add_column(ctx, expr, reuse, add_to_group_by))
    }

    pub fn get_ordering(&self) -> Result<Vec<OrderExpr>> {
        dispatch!(self, op => op.get_ordering())
    }

    pub fn description(&self) -> OpDescription {
        dispatch!(self, op => op.description())
    }

    pub fn short_description(&self) -> String {
        dispatch!(self, op => op.short_description())
    }

    pub fn introduces(&self) -> Option<TableSet> {
        dispatch!(self, op => op.introduces())
    }

    pub fn as_derived(&self) -> Option<&Derived> {
        match self {
            Operator::Derived(d) => Some(d.as_ref()),
            _ => None,
        }
    }

    pub fn as_derived_mut(&mut self) -> Option<&mut Derived> {
        match self {
            Operator::Derived(d) => Some(d.as_mut()),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Operator::Table(t) => Some(t.as_ref()),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> Option<&Filter> {
        match self {
            Operator::Filter(f) => Some(f.as_ref()),
            _ => None,
        }
    }

    pub fn as_join(&self) -> Option<&Join> {
        match self {
            Operator::Join(j) => Some(j.as_ref()),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&Union> {
        match self {
            Operator::Union(u) => Some(u.as_ref()),
            _ => None,
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Operator::Union(_))
    }
}

impl From<Table> for Operator {
    fn from(op: Table) -> Self {
        Operator::Table(Box::new(op))
    }
}

impl From<Filter> for Operator {
    fn from(op: Filter) -> Self {
        Operator::Filter(Box::new(op))
    }
}

impl From<Join> for Operator {
    fn from(op: Join) -> Self {
        Operator::Join(Box::new(op))
    }
}

impl From<Union> for Operator {
    fn from(op: Union) -> Self {
        Operator::Union(Box::new(op))
    }
}

impl From<Derived> for Operator {
    fn from(op: Derived) -> Self {
        Operator::Derived(Box::new(op))
    }
}

/// Takes exactly one child out of `inputs`.
pub(crate) fn single_input(kind: &str, inputs: Vec<Operator>) -> Result<Operator> {
    let count = inputs.len();
    let mut iter = inputs.into_iter();
    match (iter.next(), iter.next()) {
        (Some(input), None) => Ok(input),
        _ => Err(shardplan_common::Error::internal(format!(
            "{} expects 1 input, got {}",
            kind, count
        ))),
    }
}

/// Takes exactly two children out of `inputs`.
pub(crate) fn two_inputs(kind: &str, inputs: Vec<Operator>) -> Result<(Operator, Operator)> {
    let count = inputs.len();
    let mut iter = inputs.into_iter();
    match (iter.next(), iter.next(), iter.next()) {
        (Some(lhs), Some(rhs), None) => Ok((lhs, rhs)),
        _ => Err(shardplan_common::Error::internal(format!(
            "{} expects 2 inputs, got {}",
            kind, count
        ))),
    }
}
