//! The SELECT statement builder.
//!
//! Every builder call consumes the current node and returns the node for the
//! next legal clause, so clause order and selection shape are checked by the
//! compiler:
//!
//! ```text
//! Select ─┬─ Columns ───────────┐
//!         └─ SingleColumn<T> ───┴─ from ─ join* ─ where_ ─ group_by ─ having ─ order ─ limit ─ offset
//! ```
//!
//! Later clauses may be skipped, earlier ones can never follow later ones.

use std::marker::PhantomData;

use tessel_config::Config;
use tracing::debug;

use super::{
    clause::{Clause, FromClause, Projection},
    compile::{self, CompiledSelect},
    context::BuildContext,
    join::{JoinClause, JoinOperator},
    raw::RawSelect,
    state::{Select1, SelectN},
};
use crate::{
    expr::column::{Column, ColumnDef, ColumnList, OrderingList},
    rename::RenameMap,
    table::Table,
    traits::Expression,
};

/// Entry point of the builder.
///
/// # Example
///
/// ```rust
/// use tessel_query::{Column, Expression as _, Select, Table};
///
/// const USERS: Table = Table::new("users");
/// const NAME: Column<String> = Column::of(USERS, "name");
/// const AGE: Column<i64> = Column::of(USERS, "age");
///
/// let statement = Select::columns((&NAME, &AGE))
///     .from(USERS)
///     .where_(AGE.gte(18))
///     .order(NAME.asc())
///     .limit(10)
///     .compile();
///
/// assert_eq!(
///     statement.sql(),
///     "SELECT users.name,users.age FROM users WHERE users.age >= ? ORDER BY users.name ASC LIMIT 10"
/// );
/// assert_eq!(statement.args(), ["18"]);
/// ```
pub struct Select;

impl Select {
    /// `SELECT *`
    pub fn all() -> Columns {
        Columns::new(Vec::new(), false)
    }

    pub fn column<T>(column: &Column<T>) -> SingleColumn<T> {
        SingleColumn::new(column.def().clone(), false)
    }

    pub fn columns<L: ColumnList>(columns: L) -> Columns {
        Columns::new(columns.into_defs(), false)
    }

    /// `SELECT DISTINCT *`
    pub fn distinct() -> Columns {
        Columns::new(Vec::new(), true)
    }

    pub fn distinct_column<T>(column: &Column<T>) -> SingleColumn<T> {
        SingleColumn::new(column.def().clone(), true)
    }

    pub fn distinct_columns<L: ColumnList>(columns: L) -> Columns {
        Columns::new(columns.into_defs(), true)
    }

    /// `SELECT * FROM table`
    pub fn from(table: Table) -> SelectFrom<SelectN> {
        Select::all().from(table)
    }

    /// A hand-written statement, passed through verbatim.
    pub fn raw(sql: impl Into<String>) -> RawSelect {
        RawSelect::new(sql)
    }
}

/// A projection of any number of columns.
pub struct Columns {
    ctx: BuildContext,
}

impl Columns {
    fn new(columns: Vec<ColumnDef>, distinct: bool) -> Self {
        let mut ctx = BuildContext::new();
        ctx.push(Clause::Select { distinct });
        for column in &columns {
            ctx.add_column(column);
        }
        ctx.push(Clause::Projection(Projection::new(columns, false)));
        Self { ctx }
    }

    pub fn from(self, table: Table) -> SelectFrom<SelectN> {
        SelectFrom::new(self.ctx, table)
    }
}

/// A projection of exactly one column decoding into `T`.
///
/// Selecting a single column turns on deep resolution: joins may reach any
/// table related to an already joined table, not only to the FROM table.
pub struct SingleColumn<T> {
    ctx: BuildContext,
    _type: PhantomData<fn() -> T>,
}

impl<T> SingleColumn<T> {
    fn new(column: ColumnDef, distinct: bool) -> Self {
        let mut ctx = BuildContext::new();
        ctx.set_deep();
        ctx.push(Clause::Select { distinct });
        ctx.add_column(&column);
        ctx.push(Clause::Projection(Projection::new(vec![column], true)));
        Self {
            ctx,
            _type: PhantomData,
        }
    }

    pub fn from(self, table: Table) -> SelectFrom<Select1<T>> {
        SelectFrom::new(self.ctx, table)
    }
}

macro_rules! define_nodes {
    ($($(#[$meta:meta])* $node:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            pub struct $node<S> {
                ctx: BuildContext,
                _shape: PhantomData<S>,
            }

            impl<S> $node<S> {
                fn from_ctx(ctx: BuildContext) -> Self {
                    Self {
                        ctx,
                        _shape: PhantomData,
                    }
                }

                /// Compiles with the global configuration.
                pub fn compile(&self) -> CompiledSelect<S> {
                    self.compile_with(&tessel_config::get_config())
                }

                pub fn compile_with(&self, config: &Config) -> CompiledSelect<S> {
                    compile::compile(&self.ctx, config)
                }

                /// Compiles consuming `renames` in render order, without
                /// automatic disambiguation.
                pub fn compile_with_renames(&self, renames: RenameMap) -> CompiledSelect<S> {
                    compile::compile_with_renames(&self.ctx, renames)
                }

                pub fn to_sql(&self) -> String {
                    self.compile().sql().to_string()
                }
            }
        )+
    };
}

define_nodes!(
    /// `... FROM table [JOIN ...]*`
    SelectFrom,
    SelectWhere,
    SelectGroupBy,
    SelectHaving,
    SelectOrderBy,
    SelectLimit,
    SelectOffset,
);

macro_rules! impl_group_by {
    ($($node:ident),+) => {
        $(
            impl<S> $node<S> {
                pub fn group_by<L: ColumnList>(mut self, columns: L) -> SelectGroupBy<S> {
                    let columns = columns.into_defs();
                    self.ctx.push(Clause::GroupBy(columns));
                    SelectGroupBy::from_ctx(self.ctx)
                }
            }
        )+
    };
}

macro_rules! impl_order {
    ($($node:ident),+) => {
        $(
            impl<S> $node<S> {
                /// `ORDER BY` one term or a tuple of terms.
                pub fn order<O: OrderingList>(mut self, terms: O) -> SelectOrderBy<S> {
                    self.ctx.push(Clause::OrderBy(terms.into_terms()));
                    SelectOrderBy::from_ctx(self.ctx)
                }
            }
        )+
    };
}

macro_rules! impl_limit {
    ($($node:ident),+) => {
        $(
            impl<S> $node<S> {
                pub fn limit(mut self, limit: u32) -> SelectLimit<S> {
                    self.ctx.push(Clause::Limit(limit));
                    SelectLimit::from_ctx(self.ctx)
                }
            }
        )+
    };
}

impl_group_by!(SelectFrom, SelectWhere);
impl_order!(SelectFrom, SelectWhere, SelectGroupBy, SelectHaving);
impl_limit!(SelectFrom, SelectWhere, SelectGroupBy, SelectHaving, SelectOrderBy);

impl<S> SelectFrom<S> {
    fn new(mut ctx: BuildContext, table: Table) -> Self {
        ctx.observed_tables_mut().insert(table.name().to_string());
        ctx.push(Clause::From(FromClause::new(table)));
        Self::from_ctx(ctx)
    }

    /// Implicit cross join, `FROM a, b`.
    pub fn join(self, join: impl Into<JoinClause>) -> Self {
        self.attach(join.into(), JoinOperator::Comma)
    }

    pub fn left_join(self, join: impl Into<JoinClause>) -> Self {
        self.attach(join.into(), JoinOperator::Left)
    }

    pub fn left_outer_join(self, join: impl Into<JoinClause>) -> Self {
        self.attach(join.into(), JoinOperator::LeftOuter)
    }

    pub fn inner_join(self, join: impl Into<JoinClause>) -> Self {
        self.attach(join.into(), JoinOperator::Inner)
    }

    pub fn cross_join(self, join: impl Into<JoinClause>) -> Self {
        self.attach(join.into(), JoinOperator::Cross)
    }

    pub fn natural_join(self, table: Table) -> Self {
        self.attach(table.into(), JoinOperator::Natural)
    }

    pub fn natural_left_join(self, table: Table) -> Self {
        self.attach(table.into(), JoinOperator::NaturalLeft)
    }

    pub fn natural_left_outer_join(self, table: Table) -> Self {
        self.attach(table.into(), JoinOperator::NaturalLeftOuter)
    }

    pub fn natural_inner_join(self, table: Table) -> Self {
        self.attach(table.into(), JoinOperator::NaturalInner)
    }

    pub fn natural_cross_join(self, table: Table) -> Self {
        self.attach(table.into(), JoinOperator::NaturalCross)
    }

    /// Attaches a join if its table is related to the statement's tables.
    ///
    /// An unrelated table is dropped without a trace in the compiled
    /// statement: no SQL, no arguments and no observed tables.
    fn attach(mut self, join: JoinClause, operator: JoinOperator) -> Self {
        let deep = self.ctx.is_deep();
        let reachable = self
            .ctx
            .from_clause()
            .is_some_and(|from| from.reaches(join.table(), deep));

        if !reachable {
            debug!(
                table = join.table().name(),
                operator = operator.as_sql(),
                deep,
                "ignoring join with unrelated table"
            );
            return self;
        }

        let join = join.attach(operator);
        join.add_args(self.ctx.args_mut());
        join.add_observed_tables(self.ctx.observed_tables_mut());
        if let Some(from) = self.ctx.from_clause_mut() {
            from.push(join);
        }
        self
    }

    pub fn where_<E: Expression + 'static>(mut self, expr: E) -> SelectWhere<S> {
        self.ctx.add_expression(&expr);
        self.ctx.push(Clause::Where(Box::new(expr)));
        SelectWhere::from_ctx(self.ctx)
    }
}

impl<S> SelectGroupBy<S> {
    pub fn having<E: Expression + 'static>(mut self, expr: E) -> SelectHaving<S> {
        self.ctx.add_expression(&expr);
        self.ctx.push(Clause::Having(Box::new(expr)));
        SelectHaving::from_ctx(self.ctx)
    }
}

impl<S> SelectLimit<S> {
    pub fn offset(mut self, offset: u32) -> SelectOffset<S> {
        self.ctx.push(Clause::Offset(offset));
        SelectOffset::from_ctx(self.ctx)
    }
}
