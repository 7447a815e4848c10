//! Core traits that power the query builder.
//!
//! [`Expression`] is the contract shared by everything that can appear in a
//! WHERE, HAVING or JOIN ... ON position: columns, comparisons and their
//! logical combinations.

use std::collections::BTreeSet;

use crate::{
    expr::ops::{BinaryOp, InOp, LikeOp, LogicalOp, NotOp, NullOp, Operand},
    rename::RenameMap,
    value::SqlArg,
};

/// A SQL expression fragment.
///
/// Rendering and argument collection are separate steps: the builder collects
/// arguments once, when the expression is attached to a clause, and renders
/// the text every time the statement is compiled. Implementors must push their
/// arguments in the same order their `?` placeholders appear in the text.
///
/// # Example
///
/// ```rust
/// use tessel_query::{Column, Expression as _, Table};
///
/// const USERS: Table = Table::new("users");
/// const NAME: Column<String> = Column::of(USERS, "name");
///
/// let expr = NAME.eq("User");
/// let mut sql = String::new();
/// let mut args = vec![];
/// expr.append_to_sql(&mut sql);
/// expr.add_args(&mut args);
/// assert_eq!(sql, "users.name = ?");
/// assert_eq!(args, ["User"]);
/// ```
pub trait Expression {
    /// Appends the SQL text of this expression.
    fn append_to_sql(&self, sql: &mut String);

    /// Appends the SQL text, consuming one alias from `renames` for every
    /// table reference it renders.
    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap);

    /// Appends the bind arguments of this expression in placeholder order.
    fn add_args(&self, args: &mut Vec<String>);

    /// Adds the names of the tables this expression reads from.
    fn add_observed_tables(&self, tables: &mut BTreeSet<String>);

    /// Creates a SQL `=` condition.
    fn eq<V: SqlArg>(self, value: V) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, "=", Operand::arg(value))
    }

    /// Creates a SQL `!=` condition.
    fn ne<V: SqlArg>(self, value: V) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, "!=", Operand::arg(value))
    }

    /// Creates a SQL `>` condition.
    fn gt<V: SqlArg>(self, value: V) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, ">", Operand::arg(value))
    }

    /// Creates a SQL `<` condition.
    fn lt<V: SqlArg>(self, value: V) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, "<", Operand::arg(value))
    }

    /// Creates a SQL `>=` condition.
    fn gte<V: SqlArg>(self, value: V) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, ">=", Operand::arg(value))
    }

    /// Creates a SQL `<=` condition.
    fn lte<V: SqlArg>(self, value: V) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, "<=", Operand::arg(value))
    }

    /// Creates a SQL `=` condition against another expression, usually a
    /// column of a joined table.
    fn eq_expr<E: Expression + 'static>(self, other: E) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, "=", Operand::Expr(Box::new(other)))
    }

    /// Creates a SQL `!=` condition against another expression.
    fn ne_expr<E: Expression + 'static>(self, other: E) -> BinaryOp<Self>
    where
        Self: Sized,
    {
        BinaryOp::new(self, "!=", Operand::Expr(Box::new(other)))
    }

    /// Creates a SQL `LIKE` condition. The pattern is bound as is.
    fn like(self, pattern: impl Into<String>) -> LikeOp<Self>
    where
        Self: Sized,
    {
        LikeOp::new(self, pattern.into(), false)
    }

    /// Creates a case-insensitive `LIKE` condition.
    fn ilike(self, pattern: impl Into<String>) -> LikeOp<Self>
    where
        Self: Sized,
    {
        LikeOp::new(self, pattern.into(), true)
    }

    /// Creates a SQL `IN` condition.
    fn in_<V, I>(self, values: I) -> InOp<Self>
    where
        Self: Sized,
        V: SqlArg,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(|v| v.to_arg()).collect();
        InOp::new(self, values, false)
    }

    /// Creates a SQL `NOT IN` condition.
    fn not_in<V, I>(self, values: I) -> InOp<Self>
    where
        Self: Sized,
        V: SqlArg,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(|v| v.to_arg()).collect();
        InOp::new(self, values, true)
    }

    /// Creates a SQL `IS NULL` condition.
    fn is_null(self) -> NullOp<Self>
    where
        Self: Sized,
    {
        NullOp::new(self, true)
    }

    /// Creates a SQL `IS NOT NULL` condition.
    fn is_not_null(self) -> NullOp<Self>
    where
        Self: Sized,
    {
        NullOp::new(self, false)
    }

    /// Combines two expressions with `AND`.
    fn and<E: Expression>(self, other: E) -> LogicalOp<Self, E>
    where
        Self: Sized,
    {
        LogicalOp::new(self, other, "AND")
    }

    /// Combines two expressions with `OR`.
    fn or<E: Expression>(self, other: E) -> LogicalOp<Self, E>
    where
        Self: Sized,
    {
        LogicalOp::new(self, other, "OR")
    }

    /// Negates this expression.
    fn not(self) -> NotOp<Self>
    where
        Self: Sized,
    {
        NotOp::new(self)
    }
}

impl<E: Expression + ?Sized> Expression for Box<E> {
    fn append_to_sql(&self, sql: &mut String) {
        (**self).append_to_sql(sql)
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        (**self).append_to_sql_renamed(sql, renames)
    }

    fn add_args(&self, args: &mut Vec<String>) {
        (**self).add_args(args)
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        (**self).add_observed_tables(tables)
    }
}
