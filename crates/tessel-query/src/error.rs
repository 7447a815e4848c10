//! Error types for tessel-query.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading a compiled statement's results.
///
/// Building and compiling a statement never fails: invalid clause orders are
/// rejected by the type system, unreachable joins are dropped and exhausted
/// rename queues fall back to the original table names.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Column `{0}` is not part of the compiled projection")]
    #[diagnostic(
        code(tessel_query::unknown_column),
        help("Use the column alias, or the table-qualified name when no alias was given")
    )]
    UnknownColumn(String),

    #[error("Column `{0}` returned NULL but is not nullable")]
    #[diagnostic(
        code(tessel_query::unexpected_null),
        help("Select the value as `Option<_>` to accept NULL results")
    )]
    UnexpectedNull(String),

    #[error("Cannot read `{value}` as {expected}")]
    #[diagnostic(code(tessel_query::value_parse))]
    ValueParse {
        value: String,
        expected: &'static str,
    },
}

/// Result type alias for tessel-query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
