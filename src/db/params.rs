//! Positional parameter binding.
//!
//! PostgreSQL receives homogeneous string or integer arrays as native arrays
//! so that `column = any($1)` filters work against Steampipe tables; any other
//! array or object travels as `jsonb`. SQLite has no array or JSON type and
//! gets the JSON text.

use crate::models::QueryParam;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::types::Json;
use sqlx::{Postgres, Sqlite};

/// How a JSON array or object is sent to PostgreSQL.
#[derive(Debug, PartialEq)]
enum PgComposite {
    TextArray(Vec<String>),
    BigintArray(Vec<i64>),
    Jsonb,
}

fn pg_composite(value: &JsonValue) -> PgComposite {
    let JsonValue::Array(items) = value else {
        return PgComposite::Jsonb;
    };
    if items.is_empty() {
        return PgComposite::Jsonb;
    }
    if let Some(texts) = items
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect::<Option<Vec<_>>>()
    {
        return PgComposite::TextArray(texts);
    }
    items
        .iter()
        .map(JsonValue::as_i64)
        .collect::<Option<Vec<_>>>()
        .map_or(PgComposite::Jsonb, PgComposite::BigintArray)
}

pub(crate) fn bind_postgres_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &'q QueryParam,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
        QueryParam::Json(v) => match pg_composite(v) {
            PgComposite::TextArray(texts) => query.bind(texts),
            PgComposite::BigintArray(ints) => query.bind(ints),
            PgComposite::Jsonb => query.bind(Json(v)),
        },
    }
}

pub(crate) fn bind_sqlite_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q QueryParam,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
        QueryParam::Json(v) => query.bind(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_array_binds_as_text_array() {
        assert_eq!(
            pg_composite(&json!(["us-east-1", "eu-west-1"])),
            PgComposite::TextArray(vec!["us-east-1".into(), "eu-west-1".into()])
        );
    }

    #[test]
    fn test_integer_array_binds_as_bigint_array() {
        assert_eq!(
            pg_composite(&json!([1, 2, 3])),
            PgComposite::BigintArray(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_mixed_and_nested_values_bind_as_jsonb() {
        assert_eq!(pg_composite(&json!(["a", 1])), PgComposite::Jsonb);
        assert_eq!(pg_composite(&json!([1.5])), PgComposite::Jsonb);
        assert_eq!(pg_composite(&json!([])), PgComposite::Jsonb);
        assert_eq!(pg_composite(&json!({"tag": "prod"})), PgComposite::Jsonb);
    }
}
