//! Internal representation of query clauses.
//!
//! These types are stored in the [`super::context::BuildContext`] arena and
//! are not part of the public API. Every clause renders plainly and with
//! table renaming.

use std::collections::{BTreeSet, HashMap};

use once_cell::unsync::OnceCell;
use tracing::trace;

use super::join::JoinClause;
use crate::{
    expr::column::{ColumnDef, OrderingTerm},
    rename::RenameMap,
    table::Table,
    traits::Expression,
};

pub(crate) enum Clause {
    Select { distinct: bool },
    Projection(Projection),
    From(FromClause),
    Where(Box<dyn Expression>),
    GroupBy(Vec<ColumnDef>),
    Having(Box<dyn Expression>),
    OrderBy(Vec<OrderingTerm>),
    Limit(u32),
    Offset(u32),
}

/// Text of the FROM clause and the projection, rendered ahead of the other
/// clauses so every table declaration is visited before any reference.
#[derive(Default)]
pub(crate) struct RenderedSources {
    pub(crate) from: String,
    pub(crate) projection: String,
}

impl Clause {
    /// Appends the clause text, splicing in the pre-rendered sources.
    pub(crate) fn append_sql(&self, sql: &mut String, sources: &RenderedSources) {
        match self {
            Clause::Select { distinct } => append_select(*distinct, sql),
            Clause::Projection(_) => sql.push_str(&sources.projection),
            Clause::From(_) => sql.push_str(&sources.from),
            Clause::Where(expr) => {
                sql.push_str(" WHERE ");
                expr.append_to_sql(sql);
            }
            Clause::GroupBy(columns) => {
                sql.push_str(" GROUP BY ");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    column.append_sql(sql);
                }
            }
            Clause::Having(expr) => {
                sql.push_str(" HAVING ");
                expr.append_to_sql(sql);
            }
            Clause::OrderBy(terms) => {
                sql.push_str(" ORDER BY ");
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    term.column().append_sql(sql);
                    term.append_direction(sql);
                }
            }
            Clause::Limit(_) | Clause::Offset(_) => append_paging(self, sql),
        }
    }

    pub(crate) fn append_sql_renamed(
        &self,
        sql: &mut String,
        sources: &RenderedSources,
        renames: &mut RenameMap,
    ) {
        match self {
            Clause::Select { distinct } => append_select(*distinct, sql),
            Clause::Projection(_) => sql.push_str(&sources.projection),
            Clause::From(_) => sql.push_str(&sources.from),
            Clause::Where(expr) => {
                sql.push_str(" WHERE ");
                expr.append_to_sql_renamed(sql, renames);
            }
            Clause::GroupBy(columns) => {
                sql.push_str(" GROUP BY ");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    column.append_sql_renamed(sql, renames);
                }
            }
            Clause::Having(expr) => {
                sql.push_str(" HAVING ");
                expr.append_to_sql_renamed(sql, renames);
            }
            Clause::OrderBy(terms) => {
                sql.push_str(" ORDER BY ");
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    term.column().append_sql_renamed(sql, renames);
                    term.append_direction(sql);
                }
            }
            Clause::Limit(_) | Clause::Offset(_) => append_paging(self, sql),
        }
    }
}

fn append_select(distinct: bool, sql: &mut String) {
    sql.push_str(if distinct { "SELECT DISTINCT " } else { "SELECT " });
}

fn append_paging(clause: &Clause, sql: &mut String) {
    match clause {
        Clause::Limit(limit) => sql.push_str(&format!(" LIMIT {}", limit)),
        Clause::Offset(offset) => sql.push_str(&format!(" OFFSET {}", offset)),
        _ => {}
    }
}

/// The FROM table and the joins accepted so far.
pub(crate) struct FromClause {
    table: Table,
    joins: Vec<JoinClause>,
}

impl FromClause {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            joins: Vec::new(),
        }
    }

    /// Whether `table` is a structural relation of the tables known so far.
    ///
    /// Only relations of the FROM table count, unless `deep` is set, in which
    /// case relations of every accepted join count as well.
    pub(crate) fn reaches(&self, table: &Table, deep: bool) -> bool {
        self.table.has_relation(table)
            || (deep && self.joins.iter().any(|join| join.table().has_relation(table)))
    }

    pub(crate) fn push(&mut self, join: JoinClause) {
        self.joins.push(join);
    }

    pub(crate) fn append_sql(&self, sql: &mut String) {
        sql.push_str(" FROM ");
        self.table.append_sql(sql);
        for join in &self.joins {
            join.append_sql(sql);
        }
    }

    pub(crate) fn append_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        sql.push_str(" FROM ");
        self.table.append_sql_renamed(sql, renames);
        for join in &self.joins {
            join.append_sql_renamed(sql, renames);
        }
    }
}

struct CompiledProjection {
    renames_before: Option<RenameMap>,
    renames_after: Option<RenameMap>,
    text: String,
    positions: HashMap<String, usize>,
}

/// The selected columns. An empty list selects `*`.
pub(crate) struct Projection {
    columns: Vec<ColumnDef>,
    single: bool,
    compiled: OnceCell<CompiledProjection>,
}

impl Projection {
    pub(crate) fn new(columns: Vec<ColumnDef>, single: bool) -> Self {
        Self {
            columns,
            single,
            compiled: OnceCell::new(),
        }
    }

    pub(crate) fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub(crate) fn is_single(&self) -> bool {
        self.single
    }

    /// Tables the projection touches.
    ///
    /// `None` means no restriction: every observed table is selected from.
    pub(crate) fn pre_compile(&self) -> Option<BTreeSet<String>> {
        if self.columns.is_empty() && !self.single {
            return None;
        }

        let mut tables = BTreeSet::new();
        for column in &self.columns {
            column.add_selected_tables(&mut tables);
        }
        Some(tables)
    }

    /// Renders the projection text and its column position index.
    ///
    /// The first compilation is memoized together with the rename map state
    /// before and after it. A later call starting from the same map state
    /// reuses the text and leaves the map as a fresh compilation would.
    pub(crate) fn compile(
        &self,
        mut renames: Option<&mut RenameMap>,
    ) -> (String, HashMap<String, usize>) {
        if renames.as_deref().is_some_and(RenameMap::is_recording) {
            return self.render(renames);
        }

        let before = renames.as_deref().cloned();
        if let Some(memo) = self.compiled.get() {
            if memo.renames_before != before {
                return self.render(renames);
            }

            trace!(columns = self.columns.len(), "reusing compiled projection");
            if let (Some(map), Some(after)) = (renames, &memo.renames_after) {
                *map = after.clone();
            }
            return (memo.text.clone(), memo.positions.clone());
        }

        let (text, positions) = self.render(renames.as_deref_mut());
        let _ = self.compiled.set(CompiledProjection {
            renames_before: before,
            renames_after: renames.as_deref().cloned(),
            text: text.clone(),
            positions: positions.clone(),
        });
        (text, positions)
    }

    fn render(&self, mut renames: Option<&mut RenameMap>) -> (String, HashMap<String, usize>) {
        let mut positions = HashMap::new();
        if self.columns.is_empty() {
            return ("*".to_string(), positions);
        }

        let mut sql = String::new();
        let mut offset = 0;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            offset = match renames.as_deref_mut() {
                Some(map) => column.compile_renamed(&mut positions, &mut sql, map, offset),
                None => column.compile(&mut positions, &mut sql, offset),
            };
        }
        (sql, positions)
    }
}
