// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store adapter and its callers.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::WaybillError;

/// A single SQL value, as bound into a statement or read out of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Build a parameter array for the store's query operations.
///
/// ```
/// use waybill_core::{sql_params, SqlValue};
///
/// let params = sql_params!["GH12345", 3_i64, None::<String>];
/// assert_eq!(params[0], SqlValue::Text("GH12345".into()));
/// assert_eq!(params[2], SqlValue::Null);
/// ```
#[macro_export]
macro_rules! sql_params {
    () => {
        [] as [$crate::types::SqlValue; 0]
    };
    ($($value:expr),+ $(,)?) => {
        [$($crate::types::SqlValue::from($value)),+]
    };
}

/// One result row: column names mapped to values, in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Value for `column`, or `None` if the row has no such column.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Text value for `column`; `None` when missing, NULL, or not text.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlValue::as_str)
    }

    /// Integer value for `column`; `None` when missing, NULL, or not an integer.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }

    /// Owned text for `column`, with NULL and missing read as an empty string.
    pub fn text(&self, column: &str) -> String {
        self.get_str(column).unwrap_or_default().to_string()
    }

    pub fn require_str(&self, column: &str) -> Result<&str, WaybillError> {
        self.get_str(column)
            .ok_or_else(|| WaybillError::query(format!("column `{column}` is missing or not text")))
    }

    pub fn require_i64(&self, column: &str) -> Result<i64, WaybillError> {
        self.get_i64(column).ok_or_else(|| {
            WaybillError::query(format!("column `{column}` is missing or not an integer"))
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Health status reported by the store's health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

/// Lifecycle of a store's one-time initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// A back-office or registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

impl TryFrom<Row> for User {
    type Error = WaybillError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.require_i64("id")?,
            username: row.require_str("username")?.to_string(),
            password: row.text("password"),
            role: row.text("role"),
        })
    }
}

/// A service offering shown on the marketing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
}

impl TryFrom<Row> for Service {
    type Error = WaybillError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.require_i64("id")?,
            title: row.text("title"),
            description: row.text("description"),
            image: row.text("image"),
        })
    }
}

/// Status labels seen in practice. The column itself is free text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, AsRefStr,
)]
pub enum ShipmentStatus {
    Pending,
    #[strum(serialize = "In Transit")]
    InTransit,
    Delivered,
    Held,
}

/// A tracked shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    pub id: i64,
    pub tracking_number: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub status: String,
    pub origin: String,
    pub destination: String,
    pub current_location: String,
    pub estimated_delivery: String,
    pub created_at: String,
}

impl Shipment {
    /// The status as one of the familiar labels, if it is one.
    pub fn known_status(&self) -> Option<ShipmentStatus> {
        self.status.parse().ok()
    }
}

impl TryFrom<Row> for Shipment {
    type Error = WaybillError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.require_i64("id")?,
            tracking_number: row.require_str("tracking_number")?.to_string(),
            sender_name: row.text("sender_name"),
            receiver_name: row.text("receiver_name"),
            status: row.text("status"),
            origin: row.text("origin"),
            destination: row.text("destination"),
            current_location: row.text("current_location"),
            estimated_delivery: row.text("estimated_delivery"),
            created_at: row.text("created_at"),
        })
    }
}

/// Fields an operator supplies when registering a shipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewShipment {
    pub tracking_number: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub origin: String,
    pub destination: String,
    pub current_location: String,
    pub status: String,
    pub estimated_delivery: String,
}

/// Subject given to messages submitted through the quote form.
pub const QUOTE_SUBJECT: &str = "Quote Request";

/// A contact or quote submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: String,
}

impl Message {
    pub fn is_quote(&self) -> bool {
        self.subject == QUOTE_SUBJECT
    }
}

impl TryFrom<Row> for Message {
    type Error = WaybillError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.require_i64("id")?,
            name: row.text("name"),
            email: row.text("email"),
            subject: row.text("subject"),
            message: row.text("message"),
            created_at: row.text("created_at"),
        })
    }
}
