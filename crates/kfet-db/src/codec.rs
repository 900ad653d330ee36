//! # Row Codec
//!
//! Bridges typed records and the wire representation used by the execution
//! channel: JSON objects on the way in, positional value rows on the way
//! out. All encoding and decoding is driven by the schema registry, so a
//! record that drifts from the declared table shape is rejected instead of
//! silently truncated.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Encode                                        │
//! │                                                                         │
//! │  NewCustomer ──serde──► JSON object ──registry──► columns + params      │
//! │                          │                         │                    │
//! │                          │ absent/null column      │ declared order     │
//! │                          ▼                         ▼                    │
//! │                     default / NULL          INSERT INTO ... VALUES      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                           Decode                                        │
//! │                                                                         │
//! │  row: [Value] ──arity──► cells ──per-column──► JSON object ──serde──►   │
//! │                check            strict check                 Customer   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Strictness
//! A cell that does not match its declared column type is a decode error.
//! NULL in a non-nullable output column is a decode error. Both indicate
//! the store and the registry disagree, and that must surface immediately.
//!
//! The one deliberate coercion: `Boolean` columns accept INTEGER 0/1 from
//! the store and come back as `bool`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};
use crate::schema::{ColumnDef, ColumnDefault, ColumnType, Entity, TableDef};

// =============================================================================
// Timestamps
// =============================================================================

/// Encodes a timestamp the way every bookkeeping column stores it:
/// RFC 3339 with millisecond precision, UTC, `Z` suffix.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// The current time as a storable timestamp value.
pub fn now_value() -> Value {
    timestamp_value(Utc::now())
}

// =============================================================================
// Encoding
// =============================================================================

/// Column names and positional values produced by encoding a payload.
///
/// `columns` and `values` are parallel: `values[i]` is the parameter for
/// `columns[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub columns: Vec<&'static str>,
    pub values: Vec<Value>,
}

/// Encodes an insert payload against `entity`'s declared columns.
///
/// Columns come out in registry order. A column the payload omits (or sets
/// to null) takes its declared default; without a default it becomes NULL
/// when nullable and an error otherwise. `Now` defaults are filled here,
/// at encode time, so timestamps round-trip in the layer's own format.
///
/// Payload fields that match no declared column are rejected, as are
/// values that do not fit their column's type.
pub fn encode_insert<T: Serialize>(entity: Entity, record: &T) -> DbResult<EncodedRow> {
    let table = entity.table();
    let mut map = to_object(record)?;
    // One timestamp per encode, so created_at == updated_at on fresh rows
    let now = now_value();

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for col in table.writable_columns() {
        let provided = match map.remove(col.name) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        };
        let value = match provided {
            Some(value) => {
                check_value(table.name, col, &value)?;
                value
            }
            None => match col.default {
                Some(default) => default_value(default, &now),
                None if col.nullable => Value::Null,
                None => {
                    return Err(DbError::MissingColumn {
                        table: table.name,
                        column: col.name.to_string(),
                    })
                }
            },
        };
        columns.push(col.name);
        values.push(value);
    }
    reject_leftovers(table, map)?;

    Ok(EncodedRow { columns, values })
}

/// Encodes a partial update payload against `entity`'s declared columns.
///
/// Only fields present in the payload are encoded; an explicit null clears
/// a nullable column and is an error for a non-nullable one. Bookkeeping
/// timestamps cannot be set by callers; when the table tracks `updated_at`
/// it is appended automatically.
pub fn encode_patch<T: Serialize>(entity: Entity, patch: &T) -> DbResult<EncodedRow> {
    let table = entity.table();
    let mut map = to_object(patch)?;

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for col in table
        .writable_columns()
        .filter(|c| c.ty != ColumnType::Timestamp)
    {
        let value = match map.remove(col.name) {
            None => continue,
            Some(Value::Null) if col.nullable => Value::Null,
            Some(Value::Null) => {
                return Err(DbError::InvalidValue {
                    table: table.name,
                    column: col.name.to_string(),
                    expected: col.ty.label(),
                })
            }
            Some(value) => {
                check_value(table.name, col, &value)?;
                value
            }
        };
        columns.push(col.name);
        values.push(value);
    }
    reject_leftovers(table, map)?;

    if columns.is_empty() {
        return Err(DbError::EmptyPatch { table: table.name });
    }
    if let Some(col) = table.column("updated_at") {
        columns.push(col.name);
        values.push(now_value());
    }

    Ok(EncodedRow { columns, values })
}

fn to_object<T: Serialize>(record: &T) -> DbResult<Map<String, Value>> {
    match serde_json::to_value(record).map_err(|e| DbError::Encode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::Encode(format!(
            "expected an object payload, got {}",
            value_kind(&other)
        ))),
    }
}

fn default_value(default: ColumnDefault, now: &Value) -> Value {
    match default {
        ColumnDefault::Real(v) => Value::from(v),
        ColumnDefault::Bool(b) => Value::Bool(b),
        ColumnDefault::Now => now.clone(),
    }
}

/// Rejects payload fields that survived column matching: either the table
/// has no such column, or it has one the caller may not set directly.
fn reject_leftovers(table: &'static TableDef, map: Map<String, Value>) -> DbResult<()> {
    if let Some(key) = map.into_iter().map(|(k, _)| k).next() {
        return Err(if table.column(&key).is_some() {
            DbError::InvalidStatement {
                table: table.name,
                reason: format!("column \"{key}\" cannot be set directly"),
            }
        } else {
            DbError::UnknownColumn {
                table: table.name,
                column: key,
            }
        });
    }
    Ok(())
}

fn check_value(table: &'static str, col: &ColumnDef, value: &Value) -> DbResult<()> {
    let ok = match col.ty {
        ColumnType::Integer => value.as_i64().is_some(),
        ColumnType::Real => value.is_number(),
        ColumnType::Text | ColumnType::Timestamp => value.is_string(),
        ColumnType::Boolean => {
            value.is_boolean() || matches!(value.as_i64(), Some(0) | Some(1))
        }
    };
    if ok {
        Ok(())
    } else {
        Err(DbError::InvalidValue {
            table,
            column: col.name.to_string(),
            expected: col.ty.label(),
        })
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Shape of one column in a statement's result rows.
///
/// Carries everything decoding needs without another registry lookup:
/// the output name (an alias, for joined columns), the declared type, and
/// whether NULL is legal in this position. Columns pulled in through a
/// left join are always nullable, whatever their home table declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

impl OutputColumn {
    /// Output column for a base-table column, as declared.
    pub fn from_def(def: &'static ColumnDef) -> Self {
        OutputColumn {
            name: def.name,
            ty: def.ty,
            nullable: def.nullable,
        }
    }

    /// Output column for a joined or computed value under `name`.
    pub fn joined(name: &'static str, ty: ColumnType) -> Self {
        OutputColumn {
            name,
            ty,
            nullable: true,
        }
    }
}

/// Decodes one positional row into a typed record.
///
/// The row must be exactly as wide as `columns`. Each cell is checked
/// against its column before the assembled object is handed to serde, so
/// a mismatch names the offending column instead of failing deep inside a
/// derive.
pub fn decode_row<T: DeserializeOwned>(
    table: &'static str,
    columns: &[OutputColumn],
    row: &[Value],
) -> DbResult<T> {
    if row.len() != columns.len() {
        return Err(DbError::RowArity {
            table,
            expected: columns.len(),
            actual: row.len(),
        });
    }

    let mut object = Map::with_capacity(columns.len());
    for (col, cell) in columns.iter().zip(row) {
        object.insert(col.name.to_string(), decode_cell(table, col, cell)?);
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|e| DbError::Decode(format!("{table}: {e}")))
}

/// Decodes every row of a result set into typed records.
pub fn decode_rows<T: DeserializeOwned>(
    table: &'static str,
    columns: &[OutputColumn],
    rows: &[Vec<Value>],
) -> DbResult<Vec<T>> {
    rows.iter()
        .map(|row| decode_row(table, columns, row))
        .collect()
}

/// Decodes a single-column text projection, keeping NULL cells as `None`.
pub fn decode_text_cells(
    table: &'static str,
    rows: &[Vec<Value>],
) -> DbResult<Vec<Option<String>>> {
    rows.iter()
        .map(|row| match row.as_slice() {
            [Value::Null] => Ok(None),
            [Value::String(s)] => Ok(Some(s.clone())),
            [other] => Err(DbError::Decode(format!(
                "{table}: expected TEXT, got {}",
                value_kind(other)
            ))),
            _ => Err(DbError::RowArity {
                table,
                expected: 1,
                actual: row.len(),
            }),
        })
        .collect()
}

/// Decodes a one-row, one-column integer result (COUNT and friends).
pub fn decode_scalar_i64(table: &'static str, rows: &[Vec<Value>]) -> DbResult<i64> {
    match rows {
        [row] => match row.as_slice() {
            [cell] => cell.as_i64().ok_or_else(|| {
                DbError::Decode(format!(
                    "{table}: expected INTEGER, got {}",
                    value_kind(cell)
                ))
            }),
            _ => Err(DbError::RowArity {
                table,
                expected: 1,
                actual: row.len(),
            }),
        },
        _ => Err(DbError::Decode(format!(
            "{table}: expected exactly one row, got {}",
            rows.len()
        ))),
    }
}

fn decode_cell(table: &'static str, col: &OutputColumn, cell: &Value) -> DbResult<Value> {
    if cell.is_null() {
        return if col.nullable {
            Ok(Value::Null)
        } else {
            Err(DbError::Decode(format!(
                "unexpected NULL in {table}.{}",
                col.name
            )))
        };
    }

    let decoded = match col.ty {
        ColumnType::Boolean => match cell {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            _ => None,
        },
        ColumnType::Integer => cell.as_i64().map(|_| cell.clone()),
        ColumnType::Real => cell.is_number().then(|| cell.clone()),
        ColumnType::Text | ColumnType::Timestamp => cell.is_string().then(|| cell.clone()),
    };

    decoded.ok_or_else(|| {
        DbError::Decode(format!(
            "{table}.{}: expected {}, got {}",
            col.name,
            col.ty.label(),
            value_kind(cell)
        ))
    })
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
