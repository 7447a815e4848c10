//! Expression types for building SQL conditions.
//!
//! This module contains the building blocks of projections and filters.

pub mod column;
pub mod ops;

pub use column::{
    embedded, Column, ColumnDef, ColumnExpr, ColumnList, Direction, MultiColumnList, OrderingList,
    OrderingTerm,
};
pub use ops::RawExpr;

/// Wraps verbatim SQL as an expression.
pub fn raw(sql: impl Into<String>) -> RawExpr {
    RawExpr::new(sql)
}
