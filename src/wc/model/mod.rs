//! Row types for the WCDB tables, one module per table, each
//! exposing a `from_row` parser — grounded on the `internal::model::*`
//! `Model::from_row` pattern.

pub mod actual_node;
pub mod base_node;
pub mod config_row;
pub mod pristine;
pub mod repository;
pub mod tree_conflict;
pub mod wc_lock;
pub mod work_item_row;
pub mod working_node;

pub use actual_node::ActualNode;
pub use base_node::BaseNode;
pub use config_row::ConfigRow;
pub use pristine::PristineRow;
pub use repository::Repository;
pub use tree_conflict::TreeConflict;
pub use wc_lock::WcLock;
pub use work_item_row::WorkItemRow;
pub use working_node::WorkingNode;

use crate::error::{ErrorKind, WcError};

/// A row's enum column held a value no variant parses — a WCDB corruption
///, not a query-layer error.
pub(crate) fn corrupt(msg: impl Into<String>) -> WcError {
    WcError::new(ErrorKind::WcCorrupt, msg)
}
