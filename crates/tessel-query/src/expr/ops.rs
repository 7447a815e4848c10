//! SQL expression operators.
//!
//! These structs represent compound expressions like `col = ?`, `col LIKE ?`, etc.
//! Each implements [`Expression`] and recursively builds SQL fragments.

use std::collections::BTreeSet;

use crate::{rename::RenameMap, traits::Expression, value::SqlArg};

/// Right-hand side of a binary comparison.
pub enum Operand {
    /// A bound argument, rendered as `?`.
    Arg(String),
    Expr(Box<dyn Expression>),
}

impl Operand {
    pub fn arg<V: SqlArg>(value: V) -> Self {
        Operand::Arg(value.to_arg())
    }

    fn append_to_sql(&self, sql: &mut String) {
        match self {
            Operand::Arg(_) => sql.push('?'),
            Operand::Expr(expr) => expr.append_to_sql(sql),
        }
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        match self {
            Operand::Arg(_) => sql.push('?'),
            Operand::Expr(expr) => expr.append_to_sql_renamed(sql, renames),
        }
    }

    fn add_args(&self, args: &mut Vec<String>) {
        match self {
            Operand::Arg(arg) => args.push(arg.clone()),
            Operand::Expr(expr) => expr.add_args(args),
        }
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        if let Operand::Expr(expr) = self {
            expr.add_observed_tables(tables);
        }
    }
}

/// Represents a binary comparison (e.g., `=`, `>`, `<=`).
pub struct BinaryOp<L> {
    left: L,
    op: &'static str,
    right: Operand,
}

impl<L> BinaryOp<L> {
    pub fn new(left: L, op: &'static str, right: Operand) -> Self {
        Self {
            left,
            op,
            right,
        }
    }

    fn append_op(&self, sql: &mut String) {
        sql.push(' ');
        sql.push_str(self.op);
        sql.push(' ');
    }
}

impl<L: Expression> Expression for BinaryOp<L> {
    fn append_to_sql(&self, sql: &mut String) {
        self.left.append_to_sql(sql);
        self.append_op(sql);
        self.right.append_to_sql(sql);
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        self.left.append_to_sql_renamed(sql, renames);
        self.append_op(sql);
        self.right.append_to_sql_renamed(sql, renames);
    }

    fn add_args(&self, args: &mut Vec<String>) {
        self.left.add_args(args);
        self.right.add_args(args);
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        self.left.add_observed_tables(tables);
        self.right.add_observed_tables(tables);
    }
}

/// Represents a `LIKE` or case-insensitive `LIKE` pattern match.
pub struct LikeOp<L> {
    left: L,
    pattern: String,
    case_insensitive: bool,
}

impl<L> LikeOp<L> {
    pub const fn new(left: L, pattern: String, case_insensitive: bool) -> Self {
        Self {
            left,
            pattern,
            case_insensitive,
        }
    }
}

impl<L: Expression> Expression for LikeOp<L> {
    fn append_to_sql(&self, sql: &mut String) {
        if self.case_insensitive {
            sql.push_str("LOWER(");
            self.left.append_to_sql(sql);
            sql.push_str(") LIKE LOWER(?)");
        } else {
            self.left.append_to_sql(sql);
            sql.push_str(" LIKE ?");
        }
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        if self.case_insensitive {
            sql.push_str("LOWER(");
            self.left.append_to_sql_renamed(sql, renames);
            sql.push_str(") LIKE LOWER(?)");
        } else {
            self.left.append_to_sql_renamed(sql, renames);
            sql.push_str(" LIKE ?");
        }
    }

    fn add_args(&self, args: &mut Vec<String>) {
        self.left.add_args(args);
        args.push(self.pattern.clone());
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        self.left.add_observed_tables(tables);
    }
}

/// Represents an `IN` or `NOT IN` clause.
pub struct InOp<L> {
    left: L,
    values: Vec<String>,
    negated: bool,
}

impl<L> InOp<L> {
    pub fn new(left: L, values: Vec<String>, negated: bool) -> Self {
        Self {
            left,
            values,
            negated,
        }
    }

    fn append_list(&self, sql: &mut String) {
        let op = if self.negated { " NOT IN (" } else { " IN (" };
        sql.push_str(op);
        sql.push_str(&vec!["?"; self.values.len()].join(", "));
        sql.push(')');
    }
}

impl<L: Expression> Expression for InOp<L> {
    fn append_to_sql(&self, sql: &mut String) {
        self.left.append_to_sql(sql);
        self.append_list(sql);
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        self.left.append_to_sql_renamed(sql, renames);
        self.append_list(sql);
    }

    fn add_args(&self, args: &mut Vec<String>) {
        self.left.add_args(args);
        args.extend(self.values.iter().cloned());
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        self.left.add_observed_tables(tables);
    }
}

/// Represents an `IS NULL` or `IS NOT NULL` check.
pub struct NullOp<L> {
    left: L,
    is_null: bool,
}

impl<L> NullOp<L> {
    pub fn new(left: L, is_null: bool) -> Self {
        Self {
            left,
            is_null,
        }
    }

    fn op(&self) -> &'static str {
        if self.is_null {
            " IS NULL"
        } else {
            " IS NOT NULL"
        }
    }
}

impl<L: Expression> Expression for NullOp<L> {
    fn append_to_sql(&self, sql: &mut String) {
        self.left.append_to_sql(sql);
        sql.push_str(self.op());
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        self.left.append_to_sql_renamed(sql, renames);
        sql.push_str(self.op());
    }

    fn add_args(&self, args: &mut Vec<String>) {
        self.left.add_args(args);
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        self.left.add_observed_tables(tables);
    }
}

/// Combines two expressions with `AND` or `OR`.
pub struct LogicalOp<L, R> {
    left: L,
    right: R,
    op: &'static str,
}

impl<L, R> LogicalOp<L, R> {
    pub fn new(left: L, right: R, op: &'static str) -> Self {
        Self {
            left,
            right,
            op,
        }
    }
}

impl<L: Expression, R: Expression> Expression for LogicalOp<L, R> {
    fn append_to_sql(&self, sql: &mut String) {
        sql.push('(');
        self.left.append_to_sql(sql);
        sql.push(' ');
        sql.push_str(self.op);
        sql.push(' ');
        self.right.append_to_sql(sql);
        sql.push(')');
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        sql.push('(');
        self.left.append_to_sql_renamed(sql, renames);
        sql.push(' ');
        sql.push_str(self.op);
        sql.push(' ');
        self.right.append_to_sql_renamed(sql, renames);
        sql.push(')');
    }

    fn add_args(&self, args: &mut Vec<String>) {
        self.left.add_args(args);
        self.right.add_args(args);
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        self.left.add_observed_tables(tables);
        self.right.add_observed_tables(tables);
    }
}

/// Negates an expression with `NOT`.
pub struct NotOp<E> {
    inner: E,
}

impl<E> NotOp<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
        }
    }
}

impl<E: Expression> Expression for NotOp<E> {
    fn append_to_sql(&self, sql: &mut String) {
        sql.push_str("NOT (");
        self.inner.append_to_sql(sql);
        sql.push(')');
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        sql.push_str("NOT (");
        self.inner.append_to_sql_renamed(sql, renames);
        sql.push(')');
    }

    fn add_args(&self, args: &mut Vec<String>) {
        self.inner.add_args(args);
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        self.inner.add_observed_tables(tables);
    }
}

/// A verbatim SQL fragment with its own bind arguments.
///
/// The text is not inspected; it never takes part in table renaming.
pub struct RawExpr {
    sql: String,
    args: Vec<String>,
    tables: Vec<String>,
}

impl RawExpr {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn with_args<V, I>(mut self, args: I) -> Self
    where
        V: SqlArg,
        I: IntoIterator<Item = V>,
    {
        self.args.extend(args.into_iter().map(|v| v.to_arg()));
        self
    }

    /// Tables the fragment reads from, for invalidation.
    pub fn observing<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.extend(tables.into_iter().map(Into::into));
        self
    }
}

impl Expression for RawExpr {
    fn append_to_sql(&self, sql: &mut String) {
        sql.push_str(&self.sql);
    }

    fn append_to_sql_renamed(&self, sql: &mut String, _renames: &mut RenameMap) {
        sql.push_str(&self.sql);
    }

    fn add_args(&self, args: &mut Vec<String>) {
        args.extend(self.args.iter().cloned());
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        tables.extend(self.tables.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::column::Column, table::Table};

    const PERSON: Table = Table::new("person");
    const COMPANY: Table = Table::new("company");
    const NAME: Column<String> = Column::of(PERSON, "name");
    const AGE: Column<i64> = Column::of(PERSON, "age");
    const COMPANY_ID: Column<i64> = Column::of(PERSON, "company_id");
    const ID: Column<i64> = Column::of(COMPANY, "id");

    fn render(expr: &dyn Expression) -> (String, Vec<String>) {
        let mut sql = String::new();
        let mut args = Vec::new();
        expr.append_to_sql(&mut sql);
        expr.add_args(&mut args);
        (sql, args)
    }

    #[test]
    fn test_binary_op() {
        let (sql, args) = render(&AGE.gte(18));
        assert_eq!(sql, "person.age >= ?");
        assert_eq!(args, ["18"]);
    }

    #[test]
    fn test_column_comparison() {
        let expr = COMPANY_ID.eq_expr(ID);
        let (sql, args) = render(&expr);
        assert_eq!(sql, "person.company_id = company.id");
        assert!(args.is_empty());

        let mut tables = BTreeSet::new();
        expr.add_observed_tables(&mut tables);
        assert_eq!(tables.into_iter().collect::<Vec<_>>(), ["company", "person"]);
    }

    #[test]
    fn test_like_ops() {
        assert_eq!(render(&NAME.like("J%")).0, "person.name LIKE ?");
        assert_eq!(
            render(&NAME.ilike("j%")),
            ("LOWER(person.name) LIKE LOWER(?)".to_string(), vec!["j%".to_string()])
        );
    }

    #[test]
    fn test_in_ops() {
        let (sql, args) = render(&AGE.in_([1, 2, 3]));
        assert_eq!(sql, "person.age IN (?, ?, ?)");
        assert_eq!(args, ["1", "2", "3"]);

        assert_eq!(render(&AGE.not_in([4])).0, "person.age NOT IN (?)");
    }

    #[test]
    fn test_logical_args_follow_placeholders() {
        let expr = NAME.eq("Ann").and(AGE.gt(30).or(AGE.is_null())).not();
        let (sql, args) = render(&expr);
        assert_eq!(
            sql,
            "NOT ((person.name = ? AND (person.age > ? OR person.age IS NULL)))"
        );
        assert_eq!(args, ["Ann", "30"]);
    }

    #[test]
    fn test_renamed_rendering() {
        let mut renames = RenameMap::new().with_aliases("person", ["p1", "p2"]);
        let expr = NAME.eq("x").and(AGE.is_not_null());

        let mut sql = String::new();
        expr.append_to_sql_renamed(&mut sql, &mut renames);
        assert_eq!(sql, "(p1.name = ? AND p2.age IS NOT NULL)");
    }

    #[test]
    fn test_raw_expr() {
        let expr = RawExpr::new("length(name) > ?")
            .with_args([3])
            .observing(["person"]);
        let (sql, args) = render(&expr);
        assert_eq!(sql, "length(name) > ?");
        assert_eq!(args, ["3"]);

        let mut tables = BTreeSet::new();
        expr.add_observed_tables(&mut tables);
        assert!(tables.contains("person"));
    }
}
