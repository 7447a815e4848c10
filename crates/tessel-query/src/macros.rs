//! Macros for defining entity schemas.
//!
//! The [`define_entity!`] macro generates the table and column constants for
//! one table, tying database column names to Rust types.

/// Defines a module with a `TABLE` constant and typed column constants.
///
/// # Syntax
///
/// ```ignore
/// define_entity!(
///     person {
///         table: "person",
///         relations: ["company"],
///         columns: {
///             ID: i64 => "id",
///             NAME: String => "name",
///             EMAIL: Option<String> => "email"
///         }
///     }
/// );
/// ```
///
/// This expands to:
///
/// ```ignore
/// pub mod person {
///     pub const TABLE: tessel_query::Table =
///         tessel_query::Table::new("person").with_relations(&["company"]);
///     pub const ID: tessel_query::Column<i64> = tessel_query::Column::of(TABLE, "id");
///     pub const NAME: tessel_query::Column<String> = tessel_query::Column::of(TABLE, "name");
///     pub const EMAIL: tessel_query::Column<Option<String>> =
///         tessel_query::Column::of(TABLE, "email");
/// }
/// ```
///
/// `relations` is optional; a table without relations accepts no joins.
#[macro_export]
macro_rules! define_entity {
    (
        $entity:ident {
            table: $table:literal,
            $(relations: [$($relation:literal),* $(,)?],)?
            columns: {
                $($col_name:ident: $col_type:ty => $db_col:literal),* $(,)?
            }
        }
    ) => {
        pub mod $entity {
            #[allow(unused_imports)]
            use super::*;
            use $crate::{Column, Table};

            pub const TABLE: Table = Table::new($table)$(.with_relations(&[$($relation),*]))?;

            $(
                pub const $col_name: Column<$col_type> = Column::of(TABLE, $db_col);
            )*
        }
    };
}
