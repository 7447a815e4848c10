//! A type-state SELECT statement builder.
//!
//! Statements are assembled from typed [`Table`] and [`Column`] constants,
//! usually generated with [`define_entity!`], and compiled into SQL text, bind
//! arguments, the set of observed tables and a column position index.

pub mod error;
pub mod expr;
pub mod functions;
pub mod macros;
pub mod query;
pub mod rename;
pub mod table;
pub mod traits;
pub mod value;

pub use error::{QueryError, Result};
pub use expr::{Column, ColumnDef, ColumnList, OrderingTerm};
pub use query::*;
pub use rename::RenameMap;
pub use table::Table;
pub use traits::Expression;
pub use value::{from_sql, FromSql, SqlArg, SqlType, ToSql, Value, ValueParser, ValueRef};
