//! Field extraction for raw backend rows.
//!
//! Optional fields come back present-or-absent and are never coerced to an
//! empty string or zero. Required fields go through [`required_text`], which
//! applies the configured [`MalformedRowPolicy`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{Row, CLIENT_JOIN_KEY};
use crate::error::NormalizeError;

/// What to do with a row that lacks a required name/title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Drop the row and log it.
    #[default]
    Skip,
    /// Keep the row, substituting the fallback label.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizePolicy {
    pub malformed_rows: MalformedRowPolicy,
    pub fallback_label: String,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self {
            malformed_rows: MalformedRowPolicy::Skip,
            fallback_label: "Untitled".to_string(),
        }
    }
}

/// Identity as a string. Backends hand out either numeric or text keys.
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn id(row: &Row, kind: &'static str) -> Result<String, NormalizeError> {
    row.get("id")
        .and_then(value_as_id)
        .ok_or(NormalizeError::MissingField { kind, field: "id" })
}

pub fn text(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn required_text(
    row: &Row,
    field: &'static str,
    kind: &'static str,
    policy: &NormalizePolicy,
) -> Result<String, NormalizeError> {
    match text(row, field) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => match policy.malformed_rows {
            MalformedRowPolicy::Skip => Err(NormalizeError::MissingField { kind, field }),
            MalformedRowPolicy::Fallback => Ok(policy.fallback_label.clone()),
        },
    }
}

pub fn flag(row: &Row, field: &str) -> Option<bool> {
    match row.get(field)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Some(true),
            "false" | "f" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

pub fn number(row: &Row, field: &str) -> Option<f64> {
    match row.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Parse a number that may carry currency symbols or thousands separators
/// (`"€25,000"`, `"$1,200.50"`).
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

pub fn timestamp(row: &Row, field: &str) -> Option<DateTime<Utc>> {
    row.get(field)?.as_str().and_then(parse_timestamp)
}

pub fn date(row: &Row, field: &str) -> Option<NaiveDate> {
    let raw = row.get(field)?.as_str()?;
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parse the timestamp shapes the backend and seed data use. Naive values
/// are taken as UTC; bare dates as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Display name of the linked client: the embedded join object first, then a
/// plain `client` text column.
pub fn joined_client_name(row: &Row) -> Option<String> {
    let from_join = match row.get(CLIENT_JOIN_KEY) {
        Some(Value::Object(client)) => client.get("name").and_then(|n| n.as_str()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str()),
        _ => None,
    };
    from_join
        .map(str::to_string)
        .or_else(|| text(row, "client"))
        .filter(|name| !name.trim().is_empty())
}
