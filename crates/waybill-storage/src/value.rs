// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between [`SqlValue`] and rusqlite's value types.

use rusqlite::types::{Value, ValueRef};
use waybill_core::{Row, SqlValue};

pub(crate) fn to_sql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Integer(*i),
        SqlValue::Real(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Blob(b) => Value::Blob(b.clone()),
    }
}

pub(crate) fn from_sql(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Real(f),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
    }
}

/// Bind parameters for a rusqlite statement.
pub(crate) fn bind(params: &[SqlValue]) -> rusqlite::ParamsFromIter<Vec<Value>> {
    rusqlite::params_from_iter(params.iter().map(to_sql).collect::<Vec<_>>())
}

/// Read the current result row into an owned [`Row`].
pub(crate) fn read_row(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for (idx, name) in columns.iter().enumerate() {
        values.push((name.clone(), from_sql(row.get_ref(idx)?)));
    }
    Ok(Row::new(values))
}
