//! Aggregate and scalar SQL functions as columns.
//!
//! Every function here is a thin wrapper over [`apply`]. The produced column
//! renders `name(operands)`, keeps the bind arguments and tables of its
//! operands and can be selected, grouped, ordered or compared like any other
//! column.
//!
//! ```rust
//! use tessel_query::{functions::{avg, count_all}, Column, Select, Table};
//!
//! const USERS: Table = Table::new("users");
//! const AGE: Column<i64> = Column::of(USERS, "age");
//!
//! let statement = Select::columns((count_all(), avg(&AGE))).from(USERS).compile();
//! assert_eq!(statement.sql(), "SELECT count(*),avg(users.age) FROM users");
//! ```

use std::borrow::Cow;

use crate::{
    expr::column::{Column, ColumnDef, ColumnExpr, MultiColumnList},
    table::Table,
    value::{Numeric, SqlArg, SqlType, Textual, ValueParser},
};

/// The parser a function result is decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserSelector {
    Long,
    Double,
    Text,
    /// Same as the first operand.
    Operand,
}

/// Describes how a function renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    name: &'static str,
    distinct: bool,
    separator: &'static str,
    suffix: Option<Cow<'static, str>>,
    parser: ParserSelector,
}

impl FunctionSpec {
    pub const fn new(name: &'static str, parser: ParserSelector) -> Self {
        Self {
            name,
            distinct: false,
            separator: ",",
            suffix: None,
            parser,
        }
    }

    /// Renders `name(DISTINCT operand)`.
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub const fn separator(mut self, separator: &'static str) -> Self {
        self.separator = separator;
        self
    }

    /// Replaces the closing `)`.
    pub fn suffix(mut self, suffix: impl Into<Cow<'static, str>>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    fn prefix(&self) -> Cow<'static, str> {
        match (self.name, self.distinct) {
            ("", _) => Cow::Borrowed(""),
            (name, false) => Cow::Owned(format!("{}(", name)),
            (name, true) => Cow::Owned(format!("{}(DISTINCT ", name)),
        }
    }
}

/// Builds a function column over `operands`.
///
/// A single-operand function belongs to the operand's table with its alias
/// cleared; anything else belongs to [`Table::ANONYMOUS`]. `nullable` tells
/// whether the result may be NULL even for non-NULL input, as aggregates over
/// empty groups are.
pub fn apply<T>(function: FunctionSpec, operands: Vec<ColumnDef>, nullable: bool) -> Column<T> {
    let parser = match function.parser {
        ParserSelector::Long => ValueParser::Long,
        ParserSelector::Double => ValueParser::Double,
        ParserSelector::Text => ValueParser::Text,
        ParserSelector::Operand => operands
            .first()
            .map_or(ValueParser::Text, ColumnDef::parser),
    };
    let table = match operands.as_slice() {
        [operand] => operand.table().without_alias(),
        _ => Table::ANONYMOUS,
    };
    let prefix = function.prefix();
    let suffix = match function.suffix {
        Some(suffix) => suffix,
        None if function.name.is_empty() => Cow::Borrowed(""),
        None => Cow::Borrowed(")"),
    };

    Column::from_def(ColumnDef::new(
        table,
        ColumnExpr::Function {
            prefix,
            operands,
            separator: function.separator,
            suffix,
        },
        parser,
        nullable,
    ))
}

fn unary<T, U>(function: FunctionSpec, column: &Column<U>, nullable: bool) -> Column<T> {
    apply(function, vec![column.def().clone()], nullable)
}

const AVG: FunctionSpec = FunctionSpec::new("avg", ParserSelector::Double);
const COUNT: FunctionSpec = FunctionSpec::new("count", ParserSelector::Long);
const GROUP_CONCAT: FunctionSpec = FunctionSpec::new("group_concat", ParserSelector::Text);
const MAX: FunctionSpec = FunctionSpec::new("max", ParserSelector::Operand);
const MIN: FunctionSpec = FunctionSpec::new("min", ParserSelector::Operand);
const TOTAL: FunctionSpec = FunctionSpec::new("total", ParserSelector::Double);
const ABS: FunctionSpec = FunctionSpec::new("abs", ParserSelector::Operand);
const LENGTH: FunctionSpec = FunctionSpec::new("length", ParserSelector::Long);
const LOWER: FunctionSpec = FunctionSpec::new("lower", ParserSelector::Text);
const UPPER: FunctionSpec = FunctionSpec::new("upper", ParserSelector::Text);

/// `avg(X)`
pub fn avg<T: Numeric>(column: &Column<T>) -> Column<f64> {
    unary(AVG, column, true)
}

/// `avg(DISTINCT X)`
pub fn avg_distinct<T: Numeric>(column: &Column<T>) -> Column<f64> {
    unary(AVG.distinct(), column, true)
}

/// `count(X)`, the number of non-NULL values of X.
pub fn count<T>(column: &Column<T>) -> Column<i64> {
    unary(COUNT, column, false)
}

/// `count(*)`, the number of rows.
pub fn count_all() -> Column<i64> {
    let star = ColumnDef::new(
        Table::ANONYMOUS,
        ColumnExpr::Literal(Cow::Borrowed("*")),
        ValueParser::Long,
        false,
    );
    apply(COUNT, vec![star], false)
}

/// `count(DISTINCT X)`
pub fn count_distinct<T>(column: &Column<T>) -> Column<i64> {
    unary(COUNT.distinct(), column, false)
}

/// `group_concat(X)`, joined with `,`.
pub fn group_concat<T>(column: &Column<T>) -> Column<String> {
    unary(GROUP_CONCAT, column, false)
}

/// `group_concat(X,'separator')`
pub fn group_concat_with<T>(column: &Column<T>, separator: &str) -> Column<String> {
    let suffix = format!(",'{}')", separator.replace('\'', "''"));
    unary(GROUP_CONCAT.suffix(suffix), column, false)
}

/// `group_concat(DISTINCT X)`
pub fn group_concat_distinct<T>(column: &Column<T>) -> Column<String> {
    unary(GROUP_CONCAT.distinct(), column, false)
}

/// `max(X)`, keeping the type of X.
pub fn max<T>(column: &Column<T>) -> Column<T> {
    unary(MAX, column, true)
}

pub fn max_distinct<T>(column: &Column<T>) -> Column<T> {
    unary(MAX.distinct(), column, true)
}

/// `min(X)`, keeping the type of X.
pub fn min<T>(column: &Column<T>) -> Column<T> {
    unary(MIN, column, true)
}

pub fn min_distinct<T>(column: &Column<T>) -> Column<T> {
    unary(MIN.distinct(), column, true)
}

/// Sum of X as a float, rendered with `total(X)` so an empty group yields
/// `0.0` instead of NULL.
pub fn sum<T: Numeric>(column: &Column<T>) -> Column<f64> {
    unary(TOTAL, column, false)
}

pub fn sum_distinct<T: Numeric>(column: &Column<T>) -> Column<f64> {
    unary(TOTAL.distinct(), column, false)
}

/// `X || Y || ...` over a tuple of at least two columns.
///
/// ```compile_fail
/// use tessel_query::{functions::concat, Column, Table};
///
/// const NAME: Column<String> = Column::of(Table::new("person"), "name");
/// concat(&NAME);
/// ```
pub fn concat<L: MultiColumnList>(columns: L) -> Column<String> {
    let function = FunctionSpec::new("", ParserSelector::Text).separator(" || ");
    apply(function, columns.into_defs(), true)
}

/// `abs(X)`, keeping the type of X.
pub fn abs<T: Numeric>(column: &Column<T>) -> Column<T> {
    unary(ABS, column, true)
}

/// `length(X)`
pub fn length<T>(column: &Column<T>) -> Column<i64> {
    unary(LENGTH, column, true)
}

/// `lower(X)`
pub fn lower<T: Textual>(column: &Column<T>) -> Column<String> {
    unary(LOWER, column, true)
}

/// `upper(X)`
pub fn upper<T: Textual>(column: &Column<T>) -> Column<String> {
    unary(UPPER, column, true)
}

/// Values that can be inlined into SQL as a literal column.
pub trait IntoValueColumn {
    type Output;

    fn into_value_column(self) -> Column<Self::Output>;
}

macro_rules! impl_numeric_value {
    ($($ty:ty),+) => {
        $(
            impl IntoValueColumn for $ty {
                type Output = $ty;

                fn into_value_column(self) -> Column<$ty> {
                    literal(self.to_string(), <$ty as SqlType>::PARSER)
                }
            }
        )+
    };
}

impl_numeric_value!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

impl IntoValueColumn for &str {
    type Output = String;

    fn into_value_column(self) -> Column<String> {
        literal(format!("'{}'", self.replace('\'', "''")), ValueParser::Text)
    }
}

impl IntoValueColumn for String {
    type Output = String;

    fn into_value_column(self) -> Column<String> {
        self.as_str().into_value_column()
    }
}

fn literal<T>(sql: String, parser: ValueParser) -> Column<T> {
    Column::from_def(ColumnDef::new(
        Table::ANONYMOUS,
        ColumnExpr::Literal(Cow::Owned(sql)),
        parser,
        false,
    ))
}

/// A value inlined into the SQL text: numbers as is, text quoted.
pub fn val<V: IntoValueColumn>(value: V) -> Column<V::Output> {
    value.into_value_column()
}

/// A value passed as a bind argument and rendered as `?`.
pub fn val_bound<V: SqlArg + SqlType>(value: V) -> Column<V> {
    Column::from_def(ColumnDef::new(
        Table::ANONYMOUS,
        ColumnExpr::Bound(value.to_arg()),
        V::PARSER,
        V::NULLABLE,
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::traits::Expression;

    const PERSON: Table = Table::new("person");
    const NAME: Column<String> = Column::of(PERSON, "name");
    const AGE: Column<i64> = Column::of(PERSON, "age");
    const SCORE: Column<f64> = Column::of(PERSON, "score");

    fn sql<T>(column: &Column<T>) -> String {
        let mut sql = String::new();
        column.append_to_sql(&mut sql);
        sql
    }

    #[test]
    fn test_count_all() {
        let column = count_all();
        assert_eq!(sql(&column), "count(*)");
        assert_eq!(column.def().parser(), ValueParser::Long);
        assert!(!column.is_nullable());
        assert!(column.table().is_anonymous());
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(sql(&avg(&AGE)), "avg(person.age)");
        assert_eq!(sql(&avg_distinct(&AGE)), "avg(DISTINCT person.age)");
        assert_eq!(sql(&count(&NAME)), "count(person.name)");
        assert_eq!(sql(&count_distinct(&NAME)), "count(DISTINCT person.name)");
        assert_eq!(sql(&sum(&SCORE)), "total(person.score)");
        assert_eq!(sql(&sum_distinct(&AGE)), "total(DISTINCT person.age)");
        assert_eq!(sql(&min_distinct(&AGE)), "min(DISTINCT person.age)");
        assert_eq!(avg(&AGE).def().parser(), ValueParser::Double);
    }

    #[test]
    fn test_group_concat() {
        assert_eq!(sql(&group_concat(&NAME)), "group_concat(person.name)");
        assert_eq!(
            sql(&group_concat_with(&NAME, "; ")),
            "group_concat(person.name,'; ')"
        );
        assert_eq!(
            sql(&group_concat_with(&NAME, "'")),
            "group_concat(person.name,'''')"
        );
        assert_eq!(
            sql(&group_concat_distinct(&NAME)),
            "group_concat(DISTINCT person.name)"
        );
    }

    #[test]
    fn test_type_preserving_functions() {
        let column: Column<f64> = max(&SCORE);
        assert_eq!(sql(&column), "max(person.score)");
        assert_eq!(column.def().parser(), ValueParser::Double);
        assert!(column.is_nullable());

        assert_eq!(abs(&AGE).def().parser(), ValueParser::Long);
        assert_eq!(min(&NAME).def().parser(), ValueParser::Text);
    }

    #[test]
    fn test_function_table_drops_alias() {
        let aliased: Column<i64> = Column::of(PERSON.aliased("p"), "age");
        let column = max(&aliased);

        assert_eq!(sql(&column), "max(p.age)");
        assert_eq!(column.table().alias(), None);
        assert_eq!(column.table().name(), "person");
    }

    #[test]
    fn test_scalar_functions() {
        assert_eq!(sql(&length(&NAME)), "length(person.name)");
        assert_eq!(sql(&lower(&NAME)), "lower(person.name)");
        assert_eq!(sql(&upper(&lower(&NAME))), "upper(lower(person.name))");
        assert_eq!(length(&NAME).def().parser(), ValueParser::Long);
    }

    #[test]
    fn test_concat() {
        let column = concat((&NAME, val(" is "), &AGE));
        assert_eq!(sql(&column), "person.name || ' is ' || person.age");
        assert!(column.table().is_anonymous());

        let mut tables = BTreeSet::new();
        column.add_observed_tables(&mut tables);
        assert_eq!(tables, BTreeSet::from(["person".to_string()]));

        assert_eq!(
            sql(&concat((&NAME, (&NAME, &AGE)))),
            "person.name || person.name || person.age"
        );
    }

    #[test]
    fn test_values() {
        assert_eq!(sql(&val(42)), "42");
        assert_eq!(val(2.5).def().parser(), ValueParser::Double);
        assert_eq!(sql(&val("it's")), "'it''s'");

        let bound = val_bound(7i64);
        assert_eq!(sql(&bound), "?");
        let mut args = Vec::new();
        bound.add_args(&mut args);
        assert_eq!(args, ["7"]);
    }

    #[test]
    fn test_operand_args_are_kept() {
        let column = max(&val_bound(3i64));
        let mut args = Vec::new();
        column.add_args(&mut args);
        assert_eq!(args, ["3"]);
    }
}
