//! The semantic context handed to every planner operation.
//!
//! A [`SemTable`] is built once per query compilation by the analyzer and is
//! read-only afterwards, so it can be shared behind an `Arc` by any number of
//! candidate plans.

mod sem_table;
mod table_info;
mod table_set;

pub use sem_table::{SemTable, SemTableBuilder};
pub use table_info::{DerivedTable, RealTable, TableInfo, Vindex};
pub use table_set::TableSet;
