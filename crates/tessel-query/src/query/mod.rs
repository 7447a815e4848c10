//! The SELECT statement builder.
//!
//! # Overview
//!
//! - [`Select`] starts a statement and picks the selection shape.
//! - [`SelectFrom`] and the nodes after it add one clause each, in SQL order.
//! - [`CompiledSelect`] is the result of compiling any node from
//!   [`SelectFrom`] onwards: SQL text, bind arguments, observed tables and the
//!   column position index.
//! - [`RawSelect`] wraps hand-written SQL.
//!
//! # Submodules
//!
//! - [`clause`]: clause nodes and the projection compiler.
//! - [`context`]: the per-statement node arena.
//! - [`join`]: join operators and constraints.
//! - [`select`]: the type-state builder.
//! - [`compile`]: rendering, renaming and the compiled output.
//! - [`raw`]: hand-written statements.
//! - [`state`]: selection shape markers.

pub(crate) mod clause;
pub mod compile;
pub(crate) mod context;
pub mod join;
pub mod raw;
pub mod select;
pub mod state;

pub use compile::CompiledSelect;
pub use join::{JoinClause, JoinOperator};
pub use raw::RawSelect;
pub use select::{
    Columns, Select, SelectFrom, SelectGroupBy, SelectHaving, SelectLimit, SelectOffset,
    SelectOrderBy, SelectWhere, SingleColumn,
};
pub use state::{Select1, SelectN};
