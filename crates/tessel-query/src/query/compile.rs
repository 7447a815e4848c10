//! Statement compilation.
//!
//! Rendering always visits the clauses in the same order: the FROM table and
//! its joins first, then the projection, then WHERE, GROUP BY, HAVING and
//! ORDER BY. The text is assembled in SQL order afterwards, so a rename map
//! is consumed identically by the recording pass and the final render.

use std::{
    collections::{BTreeSet, HashMap},
    marker::PhantomData,
};

use serde::Serialize;
use tessel_config::Config;
use tracing::{debug, trace};

use super::{clause::RenderedSources, context::BuildContext, state::Select1};
use crate::{
    error::{QueryError, Result},
    rename::RenameMap,
    value::{from_sql, FromSql, Value, ValueParser, ValueRef},
};

/// How the single selected column is decoded.
struct Decoder {
    name: String,
    parser: ValueParser,
}

/// A finished statement, ready to be handed to an execution layer.
#[derive(Serialize)]
#[serde(bound = "")]
pub struct CompiledSelect<S> {
    sql: String,
    args: Vec<String>,
    observed_tables: BTreeSet<String>,
    selected_tables: Option<BTreeSet<String>>,
    column_positions: HashMap<String, usize>,
    #[serde(skip)]
    decoder: Option<Decoder>,
    #[serde(skip)]
    _shape: PhantomData<S>,
}

impl<S> CompiledSelect<S> {
    pub(crate) fn new(sql: String, args: Vec<String>, observed_tables: BTreeSet<String>) -> Self {
        Self {
            sql,
            args,
            observed_tables,
            selected_tables: None,
            column_positions: HashMap::new(),
            decoder: None,
            _shape: PhantomData,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind arguments in placeholder order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Tables the statement reads from.
    pub fn observed_tables(&self) -> &BTreeSet<String> {
        &self.observed_tables
    }

    /// Tables the projection touches; `None` means all observed tables.
    pub fn selected_tables(&self) -> Option<&BTreeSet<String>> {
        self.selected_tables.as_ref()
    }

    pub fn column_positions(&self) -> &HashMap<String, usize> {
        &self.column_positions
    }

    /// Offset of a compiled column in the result row.
    ///
    /// Columns are found by alias, or by their table-qualified text when no
    /// alias was given. When two selected columns share an output name only
    /// the later one is indexed; alias one of them to reach both.
    pub fn position_of(&self, name: &str) -> Result<usize> {
        self.column_positions
            .get(name)
            .copied()
            .ok_or_else(|| QueryError::UnknownColumn(name.to_string()))
    }
}

impl<T: FromSql> CompiledSelect<Select1<T>> {
    /// Decodes the value of the single selected column.
    pub fn decode<'a>(&self, raw: impl Into<ValueRef<'a>>) -> Result<T> {
        let raw = raw.into();
        let Some(decoder) = &self.decoder else {
            return from_sql(raw);
        };

        let value = decoder.parser.parse(raw)?;
        if value == Value::Null {
            return from_sql(ValueRef::Null)
                .map_err(|_| QueryError::UnexpectedNull(decoder.name.clone()));
        }
        from_sql(ValueRef::from(&value))
    }
}

impl<S> std::fmt::Debug for CompiledSelect<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSelect")
            .field("sql", &self.sql)
            .field("args", &self.args)
            .field("observed_tables", &self.observed_tables)
            .field("selected_tables", &self.selected_tables)
            .field("column_positions", &self.column_positions)
            .finish()
    }
}

/// Renders the statement text and the projection's column position index.
pub(crate) fn render(
    ctx: &BuildContext,
    mut renames: Option<&mut RenameMap>,
) -> (String, HashMap<String, usize>) {
    let mut from_sql = String::new();
    if let Some(from) = ctx.from_clause() {
        match renames.as_deref_mut() {
            Some(map) => from.append_sql_renamed(&mut from_sql, map),
            None => from.append_sql(&mut from_sql),
        }
    }

    let (projection_sql, positions) = match ctx.projection() {
        Some(projection) => projection.compile(renames.as_deref_mut()),
        None => ("*".to_string(), HashMap::new()),
    };

    let sources = RenderedSources {
        from: from_sql,
        projection: projection_sql,
    };
    let mut sql = String::new();
    for clause in ctx.chain() {
        match renames.as_deref_mut() {
            Some(map) => clause.append_sql_renamed(&mut sql, &sources, map),
            None => clause.append_sql(&mut sql, &sources),
        }
    }

    (sql, positions)
}

/// Compiles the statement, disambiguating repeated tables when the
/// configuration asks for it.
pub(crate) fn compile<S>(ctx: &BuildContext, config: &Config) -> CompiledSelect<S> {
    let settings = &config.rename;
    if settings.auto() {
        let mut recorder = RenameMap::recording();
        render(ctx, Some(&mut recorder));

        let renames = RenameMap::disambiguate(&recorder.into_occurrences(), settings);
        if !renames.is_empty() {
            debug!(
                template = settings.alias_template(),
                "renaming tables declared more than once"
            );
            return compile_with_renames(ctx, renames);
        }
    }

    let rendered = render(ctx, None);
    finish(ctx, rendered)
}

/// Compiles the statement consuming `renames` in render order.
pub(crate) fn compile_with_renames<S>(ctx: &BuildContext, mut renames: RenameMap) -> CompiledSelect<S> {
    let rendered = render(ctx, Some(&mut renames));
    if !renames.is_empty() {
        trace!("compiled with unused rename aliases left");
    }
    finish(ctx, rendered)
}

fn finish<S>(ctx: &BuildContext, (sql, positions): (String, HashMap<String, usize>)) -> CompiledSelect<S> {
    let projection = ctx.projection();
    let selected_tables = projection
        .and_then(|projection| projection.pre_compile())
        .filter(|tables| !tables.is_empty());
    let decoder = projection
        .filter(|projection| projection.is_single())
        .and_then(|projection| projection.columns().first())
        .map(|column| Decoder {
            name: column.output_name(),
            parser: column.parser(),
        });

    debug!(
        sql = %sql,
        args = ctx.args().len(),
        tables = ctx.observed_tables().len(),
        "compiled select statement"
    );

    CompiledSelect {
        sql,
        args: ctx.args().to_vec(),
        observed_tables: ctx.observed_tables().clone(),
        selected_tables,
        column_positions: positions,
        decoder,
        _shape: PhantomData,
    }
}
