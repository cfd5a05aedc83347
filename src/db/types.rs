//! Database-agnostic type mappings.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Database-specific decoders handle the actual value extraction
//!
//! Integer cells go through [`safe_integer`] whatever their width, so every
//! row of every result follows the same rule: values within ±(2^53 - 1) are
//! JSON numbers, larger magnitudes are decimal strings.

use crate::models::{DatabaseType, MAX_SAFE_INTEGER, Row};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row as _, Type, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Temporal,
    Array,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.ends_with("[]") {
        return TypeCategory::Array;
    }

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is an affinity, not an exact type
        if db == DatabaseType::SQLite {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if (lower.starts_with("int") && !lower.starts_with("interval"))
        || matches!(lower.as_str(), "bigint" | "smallint" | "tinyint" | "mediumint")
        || lower.contains("serial")
    {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower == "uuid" {
        return TypeCategory::Uuid;
    }

    if lower.contains("blob") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.starts_with("timestamp") || lower == "date" || lower == "time" || lower == "datetime"
    {
        return TypeCategory::Temporal;
    }

    if lower.contains("char") || lower.contains("text") || lower == "name" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Integer Safety
// =============================================================================

/// JSON representation of a 64-bit integer that survives a round trip through
/// an IEEE-754 double.
pub fn safe_integer(v: i64) -> JsonValue {
    if v.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
        JsonValue::Number(v.into())
    } else {
        JsonValue::String(v.to_string())
    }
}

/// Exact decimal text: whole numbers follow [`safe_integer`], others stay strings.
pub fn decimal_value(text: &str) -> JsonValue {
    match text.parse::<i64>() {
        Ok(v) => safe_integer(v),
        Err(_) => JsonValue::String(text.to_string()),
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Encode binary data as a base64 JSON string.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Trait for converting database rows to JSON maps, preserving column order.
pub trait RowToJson {
    fn to_json_map(&self) -> Row;
    fn column_names(&self) -> Vec<String>;
}

impl RowToJson for PgRow {
    fn to_json_map(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::PostgreSQL);
                let value = postgres::decode_column(self, idx, type_name, category);
                (col.name().to_string(), value)
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

impl RowToJson for SqliteRow {
    fn to_json_map(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let declared = col.type_info().name();
                let value = sqlite::decode_column(self, idx, declared);
                (col.name().to_string(), value)
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod postgres {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use sqlx::postgres::types::Oid;
    use sqlx::types::Uuid;

    pub fn decode_column(
        row: &PgRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> JsonValue {
        match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return JsonValue::Null,
            Err(_) => return JsonValue::Null,
            Ok(_) => {}
        }

        let value = match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => get::<bool>(row, idx).map(JsonValue::Bool),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => get::<Vec<u8>>(row, idx).map(|v| decode_binary_value(&v)),
            TypeCategory::Json => get::<JsonValue>(row, idx),
            TypeCategory::Uuid => get::<Uuid>(row, idx).map(|v| JsonValue::String(v.to_string())),
            TypeCategory::Temporal => decode_temporal(row, idx, type_name),
            TypeCategory::Array => decode_array(row, idx),
            TypeCategory::Text | TypeCategory::Unknown => {
                get::<String>(row, idx).map(JsonValue::String).or_else(|| {
                    get::<Oid>(row, idx).map(|oid| JsonValue::Number(oid.0.into()))
                })
            }
        };
        value.unwrap_or_else(|| unsupported(type_name))
    }

    fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
    where
        T: Decode<'r, sqlx::Postgres> + Type<sqlx::Postgres>,
    {
        row.try_get::<Option<T>, _>(idx).ok().flatten()
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> Option<JsonValue> {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(v) => v.map(|d| decimal_value(&d.0)),
            Err(e) => {
                tracing::error!("Failed to decode NUMERIC: {:?}", e);
                None
            }
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Some(v) = get::<i16>(row, idx) {
            return Some(safe_integer(v.into()));
        }
        if let Some(v) = get::<i32>(row, idx) {
            return Some(safe_integer(v.into()));
        }
        get::<i64>(row, idx).map(safe_integer)
    }

    fn decode_float(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Some(v) = get::<f64>(row, idx) {
            return Some(float_value(v));
        }
        get::<f32>(row, idx).map(|v| float_value(v.into()))
    }

    fn decode_temporal(row: &PgRow, idx: usize, type_name: &str) -> Option<JsonValue> {
        let text = match type_name.to_uppercase().as_str() {
            "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx).map(|v| v.to_rfc3339()),
            "TIMESTAMP" => {
                get::<NaiveDateTime>(row, idx).map(|v| v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            "DATE" => get::<NaiveDate>(row, idx).map(|v| v.to_string()),
            "TIME" => get::<NaiveTime>(row, idx).map(|v| v.to_string()),
            _ => None,
        };
        text.map(JsonValue::String)
    }

    fn decode_array(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Some(values) = get::<Vec<String>>(row, idx) {
            return Some(JsonValue::Array(
                values.into_iter().map(JsonValue::String).collect(),
            ));
        }
        if let Some(values) = get::<Vec<i64>>(row, idx) {
            return Some(JsonValue::Array(values.into_iter().map(safe_integer).collect()));
        }
        if let Some(values) = get::<Vec<i32>>(row, idx) {
            return Some(JsonValue::Array(
                values.into_iter().map(|v| safe_integer(v.into())).collect(),
            ));
        }
        get::<Vec<bool>>(row, idx)
            .map(|values| JsonValue::Array(values.into_iter().map(JsonValue::Bool).collect()))
    }

    fn unsupported(type_name: &str) -> JsonValue {
        JsonValue::String(format!(
            "<unsupported type {}; cast the column to text>",
            type_name.to_lowercase()
        ))
    }
}

mod sqlite {
    use super::*;

    /// Decode by the value's storage class; the declared type only refines
    /// integers (booleans) and text (JSON).
    pub fn decode_column(row: &SqliteRow, idx: usize, declared: &str) -> JsonValue {
        let storage = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return JsonValue::Null,
            Ok(raw) => raw.type_info().name().to_uppercase(),
            Err(_) => return JsonValue::Null,
        };
        let category = categorize_type(declared, DatabaseType::SQLite);

        match storage.as_str() {
            "INTEGER" | "INT8" | "BOOLEAN" => decode_integer(row, idx, category),
            "REAL" => row
                .try_get_unchecked::<f64, _>(idx)
                .map(float_value)
                .unwrap_or(JsonValue::Null),
            "BLOB" => row
                .try_get_unchecked::<Vec<u8>, _>(idx)
                .map(|v| decode_binary_value(&v))
                .unwrap_or(JsonValue::Null),
            _ => decode_text(row, idx, category),
        }
    }

    fn decode_integer(row: &SqliteRow, idx: usize, category: TypeCategory) -> JsonValue {
        match row.try_get_unchecked::<i64, _>(idx) {
            Ok(v) if category == TypeCategory::Boolean => JsonValue::Bool(v != 0),
            Ok(v) => safe_integer(v),
            Err(_) => JsonValue::Null,
        }
    }

    fn decode_text(row: &SqliteRow, idx: usize, category: TypeCategory) -> JsonValue {
        match row.try_get_unchecked::<String, _>(idx) {
            Ok(v) => {
                if category == TypeCategory::Json {
                    if let Ok(json) = serde_json::from_str::<JsonValue>(&v) {
                        return json;
                    }
                }
                JsonValue::String(v)
            }
            Err(_) => JsonValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_integer_boundaries() {
        assert_eq!(safe_integer(42), JsonValue::from(42));
        assert_eq!(
            safe_integer(9_007_199_254_740_991),
            JsonValue::from(9_007_199_254_740_991_i64)
        );
        assert_eq!(
            safe_integer(9_007_199_254_740_992),
            JsonValue::String("9007199254740992".into())
        );
        assert_eq!(
            safe_integer(-9_007_199_254_740_992),
            JsonValue::String("-9007199254740992".into())
        );
        assert_eq!(
            safe_integer(i64::MAX),
            JsonValue::String("9223372036854775807".into())
        );
        assert_eq!(
            safe_integer(i64::MIN),
            JsonValue::String("-9223372036854775808".into())
        );
    }

    #[test]
    fn test_decimal_value() {
        assert_eq!(decimal_value("42"), JsonValue::from(42));
        assert_eq!(decimal_value("12.50"), JsonValue::String("12.50".into()));
        assert_eq!(
            decimal_value("99999999999999999999"),
            JsonValue::String("99999999999999999999".into())
        );
    }

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT8", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT", DatabaseType::SQLite),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("SERIAL", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("NUMERIC", DatabaseType::PostgreSQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("numeric", DatabaseType::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_postgres_specific() {
        assert_eq!(
            categorize_type("JSONB", DatabaseType::PostgreSQL),
            TypeCategory::Json
        );
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DatabaseType::PostgreSQL),
            TypeCategory::Temporal
        );
        assert_eq!(
            categorize_type("TEXT[]", DatabaseType::PostgreSQL),
            TypeCategory::Array
        );
        assert_eq!(
            categorize_type("INET", DatabaseType::PostgreSQL),
            TypeCategory::Unknown
        );
        assert_eq!(
            categorize_type("INTERVAL", DatabaseType::PostgreSQL),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_decode_binary_value() {
        assert_eq!(
            decode_binary_value(b"hello world"),
            JsonValue::String("aGVsbG8gd29ybGQ=".to_string())
        );
        assert_eq!(
            decode_binary_value(&[0xFF, 0xFE, 0x00, 0x01]),
            JsonValue::String("//4AAQ==".to_string())
        );
        assert_eq!(decode_binary_value(&[]), JsonValue::String(String::new()));
    }
}
