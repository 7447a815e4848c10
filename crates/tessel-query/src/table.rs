//! Table metadata.
//!
//! A [`Table`] is a plain `const`-constructible description of a table: its
//! name, an optional explicit alias and the names of the tables it is
//! structurally related to. Joins are only rendered for related tables, see
//! [`crate::query::SelectFrom`].

use crate::{
    expr::column::ColumnList,
    query::join::{JoinClause, JoinConstraint},
    rename::{OccurrenceKind, RenameMap},
    traits::Expression,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table {
    name: &'static str,
    alias: Option<&'static str>,
    relations: &'static [&'static str],
}

impl Table {
    /// Owner of literal values and multi-operand function columns.
    pub const ANONYMOUS: Table = Table::new("");

    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            alias: None,
            relations: &[],
        }
    }

    /// Declares the tables this table may be joined with.
    pub const fn with_relations(mut self, relations: &'static [&'static str]) -> Self {
        self.relations = relations;
        self
    }

    pub const fn aliased(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    pub const fn without_alias(mut self) -> Self {
        self.alias = None;
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn alias(&self) -> Option<&'static str> {
        self.alias
    }

    pub const fn relations(&self) -> &'static [&'static str] {
        self.relations
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    /// The name columns of this table are qualified with.
    pub fn sql_ref(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }

    pub fn has_relation(&self, other: &Table) -> bool {
        self.relations.contains(&other.name)
    }

    /// Only tables without an explicit alias take part in renaming.
    pub(crate) fn is_renameable(&self) -> bool {
        !self.is_anonymous() && self.alias.is_none()
    }

    /// Joins this table with an `ON` constraint.
    pub fn on<E: Expression + 'static>(self, expr: E) -> JoinClause {
        JoinClause::new(self, Some(JoinConstraint::On(Box::new(expr))))
    }

    /// Joins this table with a `USING` column list.
    pub fn using<L: ColumnList>(self, columns: L) -> JoinClause {
        JoinClause::new(self, Some(JoinConstraint::Using(columns.into_defs())))
    }

    /// Renders the table as a FROM/JOIN source.
    pub(crate) fn append_sql(&self, sql: &mut String) {
        sql.push_str(self.name);
        if let Some(alias) = self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
    }

    pub(crate) fn append_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        if !self.is_renameable() {
            return self.append_sql(sql);
        }

        match renames.next_alias(self.name, OccurrenceKind::Declaration) {
            Some(alias) => {
                sql.push_str(self.name);
                sql.push_str(" AS ");
                sql.push_str(&alias);
            }
            None => self.append_sql(sql),
        }
    }

    /// Renders the qualifier for a column of this table.
    pub(crate) fn append_reference_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        let alias = if self.is_renameable() {
            renames.next_alias(self.name, OccurrenceKind::Reference)
        } else {
            None
        };

        match alias {
            Some(alias) => sql.push_str(&alias),
            None => sql.push_str(self.sql_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: Table = Table::new("person").with_relations(&["company", "person"]);
    const COMPANY: Table = Table::new("company");

    #[test]
    fn test_source_rendering() {
        let mut sql = String::new();
        PERSON.append_sql(&mut sql);
        assert_eq!(sql, "person");

        let mut sql = String::new();
        PERSON.aliased("p").append_sql(&mut sql);
        assert_eq!(sql, "person AS p");
    }

    #[test]
    fn test_relations() {
        assert!(PERSON.has_relation(&COMPANY));
        assert!(PERSON.has_relation(&PERSON.aliased("manager")));
        assert!(!COMPANY.has_relation(&PERSON));
    }

    #[test]
    fn test_renamed_declaration() {
        let mut renames = RenameMap::new().with_aliases("person", ["p1"]);

        let mut sql = String::new();
        PERSON.append_sql_renamed(&mut sql, &mut renames);
        assert_eq!(sql, "person AS p1");

        let mut sql = String::new();
        PERSON.append_sql_renamed(&mut sql, &mut renames);
        assert_eq!(sql, "person");
    }

    #[test]
    fn test_explicit_alias_is_not_renamed() {
        let mut renames = RenameMap::new().with_aliases("person", ["p1"]);

        let mut sql = String::new();
        PERSON.aliased("boss").append_sql_renamed(&mut sql, &mut renames);
        assert_eq!(sql, "person AS boss");
        assert_eq!(renames.remaining("person"), 1);
    }

    #[test]
    fn test_anonymous() {
        assert!(Table::ANONYMOUS.is_anonymous());
        assert_eq!(PERSON.aliased("p").without_alias().sql_ref(), "person");
    }
}
