//! Hand-written statements.

use std::collections::BTreeSet;

use tracing::debug;

use super::{compile::CompiledSelect, state::SelectN};
use crate::{table::Table, value::SqlArg};

/// A SELECT statement given as SQL text.
///
/// The text is neither parsed nor validated. The caller declares which tables
/// it reads so change notifications still work.
pub struct RawSelect {
    sql: String,
    observed_tables: BTreeSet<String>,
    args: Vec<String>,
}

impl RawSelect {
    pub(crate) fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            observed_tables: BTreeSet::new(),
            args: Vec::new(),
        }
    }

    /// Declares the tables the statement reads from.
    pub fn from(mut self, tables: &[Table]) -> Self {
        self.observed_tables
            .extend(tables.iter().map(|table| table.name().to_string()));
        self
    }

    pub fn with_args<V, I>(mut self, args: I) -> Self
    where
        V: SqlArg,
        I: IntoIterator<Item = V>,
    {
        self.args.extend(args.into_iter().map(|arg| arg.to_arg()));
        self
    }

    pub fn compile(&self) -> CompiledSelect<SelectN> {
        debug!(sql = %self.sql, args = self.args.len(), "compiled raw select statement");
        CompiledSelect::new(
            self.sql.clone(),
            self.args.clone(),
            self.observed_tables.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Select;

    #[test]
    fn test_raw_passes_through() {
        let statement = Select::raw("SELECT name FROM person WHERE age > ? -- kept")
            .from(&[Table::new("person")])
            .with_args([21])
            .compile();

        assert_eq!(statement.sql(), "SELECT name FROM person WHERE age > ? -- kept");
        assert_eq!(statement.args(), ["21"]);
        assert!(statement.observed_tables().contains("person"));
        assert!(statement.column_positions().is_empty());
        assert!(statement.selected_tables().is_none());
    }
}
