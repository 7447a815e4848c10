//! Represents a typed database column.
//!
//! [`Column<T>`] ties a column of a [`Table`] to the Rust type `T` it decodes
//! into. The untyped part, [`ColumnDef`], is what the builder stores: it knows
//! how to render itself plainly or with table renaming, which bind arguments
//! and tables it contributes, and how many result slots it occupies when
//! compiled into a projection.

use std::{
    borrow::Cow,
    collections::{BTreeSet, HashMap},
    marker::PhantomData,
};

use crate::{
    rename::RenameMap,
    table::Table,
    traits::Expression,
    value::{SqlType, ValueParser},
};

/// What a column renders to.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpr {
    /// A stored column, rendered table-qualified.
    Field(&'static str),
    /// Verbatim SQL, such as an inlined literal.
    Literal(Cow<'static, str>),
    /// A bound value, rendered as `?`.
    Bound(String),
    /// `prefix operand (separator operand)* suffix`
    Function {
        prefix: Cow<'static, str>,
        operands: Vec<ColumnDef>,
        separator: &'static str,
        suffix: Cow<'static, str>,
    },
    /// A composite value spread over one result slot per part.
    Embedded(Vec<ColumnDef>),
}

/// An untyped column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    table: Table,
    expr: ColumnExpr,
    alias: Option<Cow<'static, str>>,
    parser: ValueParser,
    nullable: bool,
}

impl ColumnDef {
    pub const fn new(table: Table, expr: ColumnExpr, parser: ValueParser, nullable: bool) -> Self {
        Self {
            table,
            expr,
            alias: None,
            parser,
            nullable,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn expr(&self) -> &ColumnExpr {
        &self.expr
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn parser(&self) -> ValueParser {
        self.parser
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The column name without any table qualifier, as used by `USING`.
    pub fn bare_name(&self) -> Cow<'_, str> {
        match &self.expr {
            ColumnExpr::Field(name) => Cow::Borrowed(name),
            _ => {
                let mut sql = String::new();
                self.append_sql(&mut sql);
                Cow::Owned(sql)
            }
        }
    }

    /// The name this column is found under in a compiled projection.
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.to_string(),
            None => {
                let mut sql = String::new();
                self.append_sql(&mut sql);
                sql
            }
        }
    }

    /// Number of result slots the column occupies.
    pub fn slot_count(&self) -> usize {
        match &self.expr {
            ColumnExpr::Embedded(parts) => parts.iter().map(ColumnDef::slot_count).sum(),
            _ => 1,
        }
    }

    pub fn append_sql(&self, sql: &mut String) {
        match &self.expr {
            ColumnExpr::Field(name) => {
                if !self.table.is_anonymous() {
                    sql.push_str(self.table.sql_ref());
                    sql.push('.');
                }
                sql.push_str(name);
            }
            ColumnExpr::Literal(text) => sql.push_str(text),
            ColumnExpr::Bound(_) => sql.push('?'),
            ColumnExpr::Function {
                prefix,
                operands,
                separator,
                suffix,
            } => {
                sql.push_str(prefix);
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(separator);
                    }
                    operand.append_sql(sql);
                }
                sql.push_str(suffix);
            }
            ColumnExpr::Embedded(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    part.append_sql(sql);
                }
            }
        }
    }

    pub fn append_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        match &self.expr {
            ColumnExpr::Field(name) => {
                if !self.table.is_anonymous() {
                    self.table.append_reference_renamed(sql, renames);
                    sql.push('.');
                }
                sql.push_str(name);
            }
            ColumnExpr::Literal(_) | ColumnExpr::Bound(_) => self.append_sql(sql),
            ColumnExpr::Function {
                prefix,
                operands,
                separator,
                suffix,
            } => {
                sql.push_str(prefix);
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(separator);
                    }
                    operand.append_sql_renamed(sql, renames);
                }
                sql.push_str(suffix);
            }
            ColumnExpr::Embedded(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    part.append_sql_renamed(sql, renames);
                }
            }
        }
    }

    pub fn add_args(&self, args: &mut Vec<String>) {
        match &self.expr {
            ColumnExpr::Bound(arg) => args.push(arg.clone()),
            ColumnExpr::Function { operands, .. } => {
                operands.iter().for_each(|operand| operand.add_args(args))
            }
            ColumnExpr::Embedded(parts) => parts.iter().for_each(|part| part.add_args(args)),
            ColumnExpr::Field(_) | ColumnExpr::Literal(_) => {}
        }
    }

    pub fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        match &self.expr {
            ColumnExpr::Field(_) if !self.table.is_anonymous() => {
                tables.insert(self.table.name().to_string());
            }
            ColumnExpr::Function { operands, .. } => operands
                .iter()
                .for_each(|operand| operand.add_observed_tables(tables)),
            ColumnExpr::Embedded(parts) => {
                parts.iter().for_each(|part| part.add_observed_tables(tables))
            }
            _ => {}
        }
    }

    /// Adds the tables a projection of this column touches.
    pub fn add_selected_tables(&self, tables: &mut BTreeSet<String>) {
        self.add_observed_tables(tables)
    }

    /// Renders this column as a projection entry starting at `offset` and
    /// records its output names. Returns the next free offset.
    ///
    /// An output name already present in `positions` is overwritten, so of
    /// two columns sharing a name the later one wins.
    pub fn compile(
        &self,
        positions: &mut HashMap<String, usize>,
        sql: &mut String,
        offset: usize,
    ) -> usize {
        if let ColumnExpr::Embedded(parts) = &self.expr {
            let parts = self.aliased_parts(parts);
            return compile_parts(&parts, positions, sql, offset, |part, positions, sql, offset| {
                part.compile(positions, sql, offset)
            });
        }

        self.append_sql(sql);
        self.append_alias(sql);
        positions.insert(self.output_name(), offset);
        offset + 1
    }

    /// [`ColumnDef::compile`] with table renaming. Output names stay the
    /// unrenamed ones so result lookups do not depend on the aliases chosen.
    pub fn compile_renamed(
        &self,
        positions: &mut HashMap<String, usize>,
        sql: &mut String,
        renames: &mut RenameMap,
        offset: usize,
    ) -> usize {
        if let ColumnExpr::Embedded(parts) = &self.expr {
            let parts = self.aliased_parts(parts);
            return compile_parts(&parts, positions, sql, offset, |part, positions, sql, offset| {
                part.compile_renamed(positions, sql, renames, offset)
            });
        }

        self.append_sql_renamed(sql, renames);
        self.append_alias(sql);
        positions.insert(self.output_name(), offset);
        offset + 1
    }

    /// Parts of a composite column. An alias on the composite prefixes the
    /// output name of every part: `alias.part`.
    fn aliased_parts<'a>(&self, parts: &'a [ColumnDef]) -> Cow<'a, [ColumnDef]> {
        let Some(alias) = &self.alias else {
            return Cow::Borrowed(parts);
        };

        let parts = parts
            .iter()
            .map(|part| {
                let name = match part.alias() {
                    Some(name) => name.to_string(),
                    None => part.bare_name().into_owned(),
                };
                let mut part = part.clone();
                part.alias = Some(Cow::Owned(format!("{alias}.{name}")));
                part
            })
            .collect();
        Cow::Owned(parts)
    }

    fn append_alias(&self, sql: &mut String) {
        if let Some(alias) = &self.alias {
            sql.push_str(" AS '");
            sql.push_str(alias);
            sql.push('\'');
        }
    }
}

fn compile_parts<F>(
    parts: &[ColumnDef],
    positions: &mut HashMap<String, usize>,
    sql: &mut String,
    mut offset: usize,
    mut compile_part: F,
) -> usize
where
    F: FnMut(&ColumnDef, &mut HashMap<String, usize>, &mut String, usize) -> usize,
{
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        offset = compile_part(part, positions, sql, offset);
    }
    offset
}

/// A typed reference to a database column.
///
/// # Example
///
/// ```rust
/// use tessel_query::{Column, Table};
///
/// const USERS: Table = Table::new("users");
/// const NAME: Column<String> = Column::of(USERS, "name");
/// ```
pub struct Column<T> {
    def: ColumnDef,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self::from_def(self.def.clone())
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Column").field(&self.def).finish()
    }
}

impl<T> Column<T> {
    /// Creates a stored column with an explicit parser.
    pub const fn new(
        table: Table,
        name: &'static str,
        parser: ValueParser,
        nullable: bool,
    ) -> Self {
        Self::from_def(ColumnDef::new(
            table,
            ColumnExpr::Field(name),
            parser,
            nullable,
        ))
    }

    pub(crate) const fn from_def(def: ColumnDef) -> Self {
        Self {
            def,
            _type: PhantomData,
        }
    }

    pub fn def(&self) -> &ColumnDef {
        &self.def
    }

    pub fn into_def(self) -> ColumnDef {
        self.def
    }

    pub fn table(&self) -> &Table {
        self.def.table()
    }

    pub fn is_nullable(&self) -> bool {
        self.def.is_nullable()
    }

    /// Selects this column under `alias`.
    pub fn alias(mut self, alias: impl Into<Cow<'static, str>>) -> Self {
        self.def.alias = Some(alias.into());
        self
    }

    pub fn asc(self) -> OrderingTerm {
        OrderingTerm::new(self.def, Some(Direction::Asc))
    }

    pub fn desc(self) -> OrderingTerm {
        OrderingTerm::new(self.def, Some(Direction::Desc))
    }
}

impl<T: SqlType> Column<T> {
    /// Creates a stored column whose parser and nullability follow `T`.
    pub const fn of(table: Table, name: &'static str) -> Self {
        Self::new(table, name, T::PARSER, T::NULLABLE)
    }
}

impl<T> Expression for Column<T> {
    fn append_to_sql(&self, sql: &mut String) {
        self.def.append_sql(sql)
    }

    fn append_to_sql_renamed(&self, sql: &mut String, renames: &mut RenameMap) {
        self.def.append_sql_renamed(sql, renames)
    }

    fn add_args(&self, args: &mut Vec<String>) {
        self.def.add_args(args)
    }

    fn add_observed_tables(&self, tables: &mut BTreeSet<String>) {
        self.def.add_observed_tables(tables)
    }
}

/// Groups several columns into one composite value that occupies one result
/// slot per part.
pub fn embedded<T, L: ColumnList>(table: Table, parts: L) -> Column<T> {
    let parts = parts.into_defs();
    let nullable = parts.iter().all(ColumnDef::is_nullable);
    Column::from_def(ColumnDef::new(
        table,
        ColumnExpr::Embedded(parts),
        ValueParser::Text,
        nullable,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One `ORDER BY` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingTerm {
    column: ColumnDef,
    direction: Option<Direction>,
}

impl OrderingTerm {
    pub fn new(column: ColumnDef, direction: Option<Direction>) -> Self {
        Self {
            column,
            direction,
        }
    }

    pub(crate) fn column(&self) -> &ColumnDef {
        &self.column
    }

    pub(crate) fn append_direction(&self, sql: &mut String) {
        match self.direction {
            Some(Direction::Asc) => sql.push_str(" ASC"),
            Some(Direction::Desc) => sql.push_str(" DESC"),
            None => {}
        }
    }
}

impl<T> From<Column<T>> for OrderingTerm {
    fn from(column: Column<T>) -> Self {
        OrderingTerm::new(column.def, None)
    }
}

/// A statically non-empty list of columns: a single column or a tuple of
/// column lists.
pub trait ColumnList {
    fn into_defs(self) -> Vec<ColumnDef>;
}

impl<T> ColumnList for Column<T> {
    fn into_defs(self) -> Vec<ColumnDef> {
        vec![self.def]
    }
}

impl<T> ColumnList for &Column<T> {
    fn into_defs(self) -> Vec<ColumnDef> {
        vec![self.def.clone()]
    }
}

/// A column list of at least two columns: a tuple of two or more column
/// lists.
pub trait MultiColumnList: ColumnList {}

/// A statically non-empty list of ordering terms.
pub trait OrderingList {
    fn into_terms(self) -> Vec<OrderingTerm>;
}

impl OrderingList for OrderingTerm {
    fn into_terms(self) -> Vec<OrderingTerm> {
        vec![self]
    }
}

impl<T> OrderingList for Column<T> {
    fn into_terms(self) -> Vec<OrderingTerm> {
        vec![self.into()]
    }
}

macro_rules! impl_lists_for_tuples {
    ($($name:ident),+) => {
        impl<$($name: ColumnList),+> ColumnList for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_defs(self) -> Vec<ColumnDef> {
                let ($($name,)+) = self;
                let mut defs = Vec::new();
                $( defs.extend($name.into_defs()); )+
                defs
            }
        }

        impl<$($name: OrderingList),+> OrderingList for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_terms(self) -> Vec<OrderingTerm> {
                let ($($name,)+) = self;
                let mut terms = Vec::new();
                $( terms.extend($name.into_terms()); )+
                terms
            }
        }
    };
}

macro_rules! impl_multi_for_tuples {
    ($(($($name:ident),+)),+ $(,)?) => {
        $( impl<$($name: ColumnList),+> MultiColumnList for ($($name,)+) {} )+
    };
}

impl_lists_for_tuples!(A);
impl_lists_for_tuples!(A, B);
impl_lists_for_tuples!(A, B, C);
impl_lists_for_tuples!(A, B, C, D);
impl_lists_for_tuples!(A, B, C, D, E);
impl_lists_for_tuples!(A, B, C, D, E, F);
impl_lists_for_tuples!(A, B, C, D, E, F, G);
impl_lists_for_tuples!(A, B, C, D, E, F, G, H);
impl_lists_for_tuples!(A, B, C, D, E, F, G, H, I);
impl_lists_for_tuples!(A, B, C, D, E, F, G, H, I, J);
impl_lists_for_tuples!(A, B, C, D, E, F, G, H, I, J, K);
impl_lists_for_tuples!(A, B, C, D, E, F, G, H, I, J, K, L);

impl_multi_for_tuples!(
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
    (A, B, C, D, E, F, G),
    (A, B, C, D, E, F, G, H),
    (A, B, C, D, E, F, G, H, I),
    (A, B, C, D, E, F, G, H, I, J),
    (A, B, C, D, E, F, G, H, I, J, K),
    (A, B, C, D, E, F, G, H, I, J, K, L),
);

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: Table = Table::new("person");
    const NAME: Column<String> = Column::of(PERSON, "name");
    const AGE: Column<Option<i64>> = Column::of(PERSON, "age");

    #[test]
    fn test_field_rendering() {
        let mut sql = String::new();
        NAME.def().append_sql(&mut sql);
        assert_eq!(sql, "person.name");

        let aliased = Column::<String>::of(PERSON.aliased("p"), "name");
        let mut sql = String::new();
        aliased.def().append_sql(&mut sql);
        assert_eq!(sql, "p.name");
    }

    #[test]
    fn test_typed_metadata() {
        assert_eq!(NAME.def().parser(), ValueParser::Text);
        assert!(!NAME.is_nullable());
        assert_eq!(AGE.def().parser(), ValueParser::Long);
        assert!(AGE.is_nullable());
    }

    #[test]
    fn test_compile_alias() {
        let mut positions = HashMap::new();
        let mut sql = String::new();
        let next = NAME.alias("who").def().compile(&mut positions, &mut sql, 3);

        assert_eq!(next, 4);
        assert_eq!(sql, "person.name AS 'who'");
        assert_eq!(positions.get("who"), Some(&3));
    }

    #[test]
    fn test_compile_embedded_uses_one_slot_per_part() {
        let composite: Column<String> = embedded(PERSON, (&NAME, &AGE));
        assert_eq!(composite.def().slot_count(), 2);

        let mut positions = HashMap::new();
        let mut sql = String::new();
        let next = composite.def().compile(&mut positions, &mut sql, 0);

        assert_eq!(next, 2);
        assert_eq!(sql, "person.name,person.age");
        assert_eq!(positions.get("person.name"), Some(&0));
        assert_eq!(positions.get("person.age"), Some(&1));
    }

    #[test]
    fn test_compile_embedded_alias_prefixes_parts() {
        let composite: Column<String> =
            embedded(PERSON, (&NAME, AGE.alias("years"))).alias("owner");

        let mut positions = HashMap::new();
        let mut sql = String::new();
        let next = composite.def().compile(&mut positions, &mut sql, 1);

        assert_eq!(next, 3);
        assert_eq!(
            sql,
            "person.name AS 'owner.name',person.age AS 'owner.years'"
        );
        assert_eq!(positions.get("owner.name"), Some(&1));
        assert_eq!(positions.get("owner.years"), Some(&2));
        assert!(!positions.contains_key("person.name"));
    }

    #[test]
    fn test_duplicate_output_name_keeps_last_offset() {
        let mut positions = HashMap::new();
        let mut sql = String::new();

        let next = NAME.def().compile(&mut positions, &mut sql, 0);
        NAME.def().compile(&mut positions, &mut sql, next);

        assert_eq!(positions.len(), 1);
        assert_eq!(positions.get("person.name"), Some(&1));
    }

    #[test]
    fn test_compile_renamed_keeps_logical_names() {
        let mut renames = RenameMap::new().with_aliases("person", ["p1"]);
        let mut positions = HashMap::new();
        let mut sql = String::new();

        NAME.def().compile_renamed(&mut positions, &mut sql, &mut renames, 0);

        assert_eq!(sql, "p1.name");
        assert_eq!(positions.get("person.name"), Some(&0));
    }

    #[test]
    fn test_column_lists() {
        assert_eq!(NAME.into_defs().len(), 1);
        assert_eq!((&NAME, &AGE, (NAME, AGE)).into_defs().len(), 4);
        assert_eq!((NAME.desc(), AGE).into_terms().len(), 2);
    }

    #[test]
    fn test_ordering_direction() {
        let mut sql = String::new();
        NAME.desc().append_direction(&mut sql);
        assert_eq!(sql, " DESC");

        let mut sql = String::new();
        OrderingTerm::from(NAME).append_direction(&mut sql);
        assert!(sql.is_empty());
    }
}
