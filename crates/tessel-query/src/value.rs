//! Raw column values and the parsers that decode them.
//!
//! Values are rusqlite's: the execution layer hands over whatever the storage
//! engine produced for a result slot as a [`ValueRef`]. A [`ValueParser`]
//! normalises it to the storage class a column promises, and [`from_sql`]
//! turns the normalised value into the Rust type carried by
//! [`crate::Column`] through rusqlite's [`FromSql`].

use std::any::type_name;

pub use rusqlite::types::{FromSql, ToSql, Value, ValueRef};
use rusqlite::types::ToSqlOutput;
use serde::Serialize;
use tracing::warn;

use crate::error::{QueryError, Result};

/// Decodes a raw value into the storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueParser {
    /// Integer storage; booleans are stored as 0/1.
    Long,
    Double,
    Text,
    Blob,
}

impl ValueParser {
    /// Normalises `raw` to this parser's storage class. `NULL` passes through.
    pub fn parse(&self, raw: ValueRef<'_>) -> Result<Value> {
        let parsed = match (self, raw) {
            (_, ValueRef::Null) => Value::Null,

            (ValueParser::Long, ValueRef::Integer(i)) => Value::Integer(i),
            (ValueParser::Long, ValueRef::Real(f)) => Value::Integer(f.trunc() as i64),
            (ValueParser::Long, ValueRef::Text(text)) => Value::Integer(
                String::from_utf8_lossy(text)
                    .trim()
                    .parse()
                    .map_err(|_| parse_error(raw, "integer"))?,
            ),

            (ValueParser::Double, ValueRef::Integer(i)) => Value::Real(i as f64),
            (ValueParser::Double, ValueRef::Real(f)) => Value::Real(f),
            (ValueParser::Double, ValueRef::Text(text)) => Value::Real(
                String::from_utf8_lossy(text)
                    .trim()
                    .parse()
                    .map_err(|_| parse_error(raw, "real"))?,
            ),

            (ValueParser::Blob, ValueRef::Blob(bytes) | ValueRef::Text(bytes)) => {
                Value::Blob(bytes.to_vec())
            }

            (ValueParser::Text, ValueRef::Blob(_))
            | (ValueParser::Long | ValueParser::Double, ValueRef::Blob(_))
            | (ValueParser::Blob, _) => return Err(parse_error(raw, self.name())),

            (ValueParser::Text, value) => Value::Text(describe(value)),
        };

        Ok(parsed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueParser::Long => "integer",
            ValueParser::Double => "real",
            ValueParser::Text => "text",
            ValueParser::Blob => "blob",
        }
    }
}

/// Textual form of a raw value; blobs are rendered as lowercase hex.
fn describe(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Blob(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

fn parse_error(raw: ValueRef<'_>, expected: &'static str) -> QueryError {
    QueryError::ValueParse {
        value: describe(raw),
        expected,
    }
}

/// Converts a normalised value into `T` with rusqlite's [`FromSql`].
pub fn from_sql<T: FromSql>(value: ValueRef<'_>) -> Result<T> {
    T::column_result(value).map_err(|_| parse_error(value, type_name::<T>()))
}

/// Rust types a column can be declared with.
pub trait SqlType {
    const PARSER: ValueParser;
    const NULLABLE: bool = false;
}

/// Marker for types SQL arithmetic and numeric aggregates accept.
pub trait Numeric: SqlType {}

/// Marker for types SQL string functions accept.
pub trait Textual: SqlType {}

macro_rules! impl_sql_type {
    ($parser:ident => $($ty:ty),+) => {
        $(
            impl SqlType for $ty {
                const PARSER: ValueParser = ValueParser::$parser;
            }
        )+
    };
}

impl_sql_type!(Long => i8, i16, i32, i64, u8, u16, u32, bool);
impl_sql_type!(Double => f32, f64);
impl_sql_type!(Text => String);
impl_sql_type!(Blob => Vec<u8>);

impl<T: SqlType> SqlType for Option<T> {
    const PARSER: ValueParser = T::PARSER;
    const NULLABLE: bool = true;
}

macro_rules! impl_marker {
    ($marker:ident => $($ty:ty),+) => {
        $( impl $marker for $ty {} )+
    };
}

impl_marker!(Numeric => i8, i16, i32, i64, u8, u16, u32, f32, f64);
impl_marker!(Textual => String);

impl<T: Numeric> Numeric for Option<T> {}
impl<T: Textual> Textual for Option<T> {}

/// Values that can be passed as bind arguments.
///
/// Anything rusqlite can bind qualifies. Arguments are kept in their textual
/// form; the execution layer binds them positionally against the `?`
/// placeholders of the compiled SQL.
pub trait SqlArg {
    fn to_arg(&self) -> String;
}

impl<T: ToSql + ?Sized> SqlArg for T {
    fn to_arg(&self) -> String {
        match self.to_sql() {
            Ok(ToSqlOutput::Borrowed(value)) => describe(value),
            Ok(ToSqlOutput::Owned(value)) => describe(ValueRef::from(&value)),
            Ok(_) => {
                warn!(arg = type_name::<T>(), "unsupported bind argument, binding NULL");
                describe(ValueRef::Null)
            }
            Err(err) => {
                warn!(arg = type_name::<T>(), "cannot convert bind argument, binding NULL: {}", err);
                describe(ValueRef::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_long_parser() {
        let parse = |value: &Value| ValueParser::Long.parse(value.into());

        assert_eq!(parse(&Value::Integer(7)), Ok(Value::Integer(7)));
        assert_eq!(parse(&Value::Real(7.9)), Ok(Value::Integer(7)));
        assert_eq!(parse(&text(" 42 ")), Ok(Value::Integer(42)));
        assert!(matches!(
            parse(&text("abc")),
            Err(QueryError::ValueParse { expected: "integer", .. })
        ));
        assert!(parse(&Value::Blob(vec![1])).is_err());
    }

    #[test]
    fn test_double_parser() {
        let parse = |value: &Value| ValueParser::Double.parse(value.into());

        assert_eq!(parse(&Value::Integer(3)), Ok(Value::Real(3.0)));
        assert_eq!(parse(&text("2.5")), Ok(Value::Real(2.5)));
    }

    #[test]
    fn test_text_parser() {
        assert_eq!(
            ValueParser::Text.parse(ValueRef::Integer(3)),
            Ok(text("3"))
        );
        assert!(matches!(
            ValueParser::Text.parse(ValueRef::Blob(&[0xab])),
            Err(QueryError::ValueParse { value, expected: "text" }) if value == "ab"
        ));
    }

    #[test]
    fn test_blob_parser() {
        assert_eq!(
            ValueParser::Blob.parse(ValueRef::Blob(&[1, 2])),
            Ok(Value::Blob(vec![1, 2]))
        );
        assert_eq!(
            ValueParser::Blob.parse(ValueRef::Text(b"ab")),
            Ok(Value::Blob(b"ab".to_vec()))
        );
        assert!(ValueParser::Blob.parse(ValueRef::Integer(1)).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        for parser in [
            ValueParser::Long,
            ValueParser::Double,
            ValueParser::Text,
            ValueParser::Blob,
        ] {
            assert_eq!(parser.parse(ValueRef::Null), Ok(Value::Null));
        }
    }

    #[test]
    fn test_sql_type_parsers() {
        assert_eq!(<i32 as SqlType>::PARSER, ValueParser::Long);
        assert_eq!(<bool as SqlType>::PARSER, ValueParser::Long);
        assert_eq!(<f32 as SqlType>::PARSER, ValueParser::Double);
        assert_eq!(<Option<String> as SqlType>::PARSER, ValueParser::Text);
        assert_eq!(<Vec<u8> as SqlType>::PARSER, ValueParser::Blob);
        assert!(<Option<i64> as SqlType>::NULLABLE);
        assert!(!<i64 as SqlType>::NULLABLE);
    }

    #[test]
    fn test_from_sql() {
        assert_eq!(from_sql::<i32>(ValueRef::Integer(5)), Ok(5));
        assert!(from_sql::<u8>(ValueRef::Integer(300)).is_err());
        assert_eq!(from_sql::<bool>(ValueRef::Integer(1)), Ok(true));
        assert_eq!(from_sql::<Option<String>>(ValueRef::Null), Ok(None));
        assert_eq!(
            from_sql::<Option<String>>(ValueRef::Text(b"x")),
            Ok(Some("x".to_string()))
        );
        assert_eq!(from_sql::<Vec<u8>>(ValueRef::Blob(&[9])), Ok(vec![9]));
        assert!(matches!(
            from_sql::<String>(ValueRef::Null),
            Err(QueryError::ValueParse { value, .. }) if value == "NULL"
        ));
    }

    #[test]
    fn test_sql_args() {
        assert_eq!(5i64.to_arg(), "5");
        assert_eq!("abc".to_arg(), "abc");
        assert_eq!(true.to_arg(), "1");
        assert_eq!(2.5f64.to_arg(), "2.5");
        assert_eq!(String::from("x").to_arg(), "x");
        assert_eq!(vec![0x0fu8, 0xa0].to_arg(), "0fa0");
        assert_eq!(None::<i64>.to_arg(), "NULL");
        assert_eq!(Value::Integer(4).to_arg(), "4");
    }
}
