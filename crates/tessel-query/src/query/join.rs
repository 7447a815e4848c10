//! Join clauses.
//!
//! A [`JoinClause`] is built from a [`Table`], either bare or constrained via
//! [`Table::on`] / [`Table::using`], and receives its operator when it is
//! attached to a FROM node.

use std::collections::BTreeSet;

use crate::{
    expr::column::ColumnDef,
    rename::RenameMap,
    table::Table,
    traits::Expression,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOperator {
    /// Implicit cross join, `FROM a, b`.
    Comma,
    Left,
    LeftOuter,
    Inner,
    Cross,
    Natural,
    NaturalLeft,
    NaturalLeftOuter,
    NaturalInner,
    NaturalCross,
}

impl JoinOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinOperator::Comma => ",",
            JoinOperator::Left => "LEFT JOIN",
            JoinOperator::LeftOuter => "LEFT OUTER JOIN",
            JoinOperator::Inner => "INNER JOIN",
            JoinOperator::Cross => "CROSS JOIN",
            JoinOperator::Natural => "NATURAL JOIN",
            JoinOperator::NaturalLeft => "NATURAL LEFT JOIN",
            JoinOperator::NaturalLeftOuter => "NATURAL LEFT OUTER JOIN",
            JoinOperator::NaturalInner => "NATURAL INNER JOIN",
            JoinOperator::NaturalCross => "NATURAL CROSS JOIN",
        }
    }
}

pub enum JoinConstraint {
    On(Box<dyn Expression>),
    Using(Vec<ColumnDef>),
}

/// One joined table.
pub struct JoinClause {
    table: Table,
    operator: Option<JoinOperator>,
    constraint: Option<JoinConstraint>,
}

impl JoinClause {
    pub(crate) fn new(table: Table, constraint: Option<JoinConstraint>) -> Self {
        Self {
            table,
            operator: None,
            constraint,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The operator, once the clause is attached to a statement.
    pub fn operator(&self) -> Option<JoinOperator> {
        self.operator
    }

    pub(crate) fn attach(mut self, operator: JoinOperator) -> Self {
        debug_assert!(self.operator.is_none(), "join operator assigned twice");
        self.operator = Some(operator);
        self
    }

    pub(crate) fn add_args(&self, args: &mut Vec<String>) {
        if let Some(JoinConstraint::On(expr)) = &self.constraint {
            expr.add_args(args);
        }
    }

    pub(crate) fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        tables.insert(self.table.name().to_string());
        if let Some(JoinConstraint::On(expr)) = &self.constraint {
            expr.add_observed_tables(tables);
        }
    }

    fn append_operator(&self, sql: &mut String) {
        match self.operator.unwrap_or(JoinOperator::Comma) {
            JoinOperator::Comma => sql.push_str(", "),
            operator => {
                sql.push(' ');
                sql.push_str(operator.as_sql());
                sql.push(' ');
            }
        }
    }

    fn append_using(columns: &[ColumnDef], sql: &mut String) {
        sql.push_str(" USING (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            sql.push_str(&column.bare_name());
        }
        sql.push(')');
    }

    pub(crate) fn append_sql(&self, sql: &mut String) {
        self.append_operator(sql);
        self.table.append_sql(sql);
        match &self.constraint {
            Some(JoinConstraint::On(expr)) => {
                sql.push_str(" ON ");
                expr.append_to_sql(sql);
            }
            Some(JoinConstraint::Using(columns)) => Self::append_using(columns, sql),
            None => {}
        }
    }

    pub(crate) fn append_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        self.append_operator(sql);
        self.table.append_sql_renamed(sql, renames);
        match &self.constraint {
            Some(JoinConstraint::On(expr)) => {
                sql.push_str(" ON ");
                expr.append_to_sql_renamed(sql, renames);
            }
            Some(JoinConstraint::Using(columns)) => Self::append_using(columns, sql),
            None => {}
        }
    }
}

impl From<Table> for JoinClause {
    fn from(table: Table) -> Self {
        JoinClause::new(table, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::column::Column;

    const PERSON: Table = Table::new("person");
    const COMPANY: Table = Table::new("company");
    const COMPANY_ID: Column<i64> = Column::of(PERSON, "company_id");
    const ID: Column<i64> = Column::of(COMPANY, "id");

    fn render(join: &JoinClause) -> String {
        let mut sql = String::new();
        join.append_sql(&mut sql);
        sql
    }

    #[test]
    fn test_operators() {
        let join = JoinClause::from(COMPANY).attach(JoinOperator::LeftOuter);
        assert_eq!(render(&join), " LEFT OUTER JOIN company");

        let join = JoinClause::from(COMPANY).attach(JoinOperator::Comma);
        assert_eq!(render(&join), ", company");
    }

    #[test]
    fn test_on_constraint() {
        let join = COMPANY
            .on(ID.eq_expr(COMPANY_ID).and(ID.gt(3)))
            .attach(JoinOperator::Inner);

        assert_eq!(
            render(&join),
            " INNER JOIN company ON (company.id = person.company_id AND company.id > ?)"
        );

        let mut args = Vec::new();
        join.add_args(&mut args);
        assert_eq!(args, ["3"]);

        let mut tables = BTreeSet::new();
        join.add_observed_tables(&mut tables);
        assert_eq!(tables.into_iter().collect::<Vec<_>>(), ["company", "person"]);
    }

    #[test]
    fn test_using_constraint() {
        let join = COMPANY.using(&ID).attach(JoinOperator::Left);
        assert_eq!(render(&join), " LEFT JOIN company USING (id)");
    }

    #[test]
    fn test_renamed_join_consumes_declaration_then_constraint() {
        let join = PERSON
            .aliased("boss")
            .on(COMPANY_ID.eq_expr(ID))
            .attach(JoinOperator::Inner);
        let mut renames = RenameMap::new().with_aliases("company", ["c1"]);

        let mut sql = String::new();
        join.append_sql_renamed(&mut sql, &mut renames);
        assert_eq!(sql, " INNER JOIN person AS boss ON person.company_id = c1.id");
    }
}
