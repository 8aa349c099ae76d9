//! Statement and expression representation for the shardplan planner.
//!
//! Values in this crate are produced by the SQL front end and are treated as
//! immutable by the planner. A subquery that has to change is replaced by a
//! new statement value; nothing here is mutated in place during planning.

mod expr;
mod ident;
mod statement;

pub use expr::{AggregateFunction, BinaryOp, ColName, Expr, Literal, UnaryOp, Walk};
pub use ident::Ident;
pub use statement::{
    AliasedExpr, JoinKind, Limit, Order, OrderDirection, Select, SelectExpr, SelectStatement,
    TableExpr, Union,
};
