//! Typed CRM entities and the per-kind descriptor the list screens use.
//!
//! Rows are read-only snapshots of the hosted tables. Each kind states which
//! text fields search matches against and which field the category filter
//! compares with, so filtering and list loading stay generic.

/// Serialize/deserialize a lenient enum through its string key.
macro_rules! string_keyed {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                Ok(<$ty>::from_str_lossy(&raw))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
pub(crate) use string_keyed;

pub mod activity;
pub mod client;
pub mod lead;
pub mod normalize;
pub mod task;

use serde::{Deserialize, Serialize};

use crate::backend::{Query, Row, Table};
use crate::error::NormalizeError;

pub use activity::{Activity, ActivityStatus, ActivityType};
pub use client::{Client, ClientStatus};
pub use lead::{Lead, LeadStatus, ScoreBand};
pub use normalize::{MalformedRowPolicy, NormalizePolicy};
pub use task::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Client,
    Lead,
    Task,
    Activity,
}

impl EntityKind {
    pub fn table(&self) -> Table {
        match self {
            EntityKind::Client => Table::Clients,
            EntityKind::Lead => Table::Leads,
            EntityKind::Task => Table::Tasks,
            EntityKind::Activity => Table::Activities,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Lead => "lead",
            EntityKind::Task => "task",
            EntityKind::Activity => "activity",
        }
    }

    pub fn plural(&self) -> &'static str {
        self.table().as_str()
    }
}

/// A normalized row of one of the four tables.
pub trait Entity: Clone + Send + Sync + Serialize + 'static {
    const KIND: EntityKind;

    fn from_row(row: &Row, policy: &NormalizePolicy) -> Result<Self, NormalizeError>;

    fn id(&self) -> &str;

    /// Fields the search term is matched against, in order. Absent fields
    /// match as the empty string.
    fn search_fields(&self) -> [Option<&str>; 2];

    /// Value compared by the category filter (status or type key).
    fn category(&self) -> &str;

    /// Canonical category key for a filter value typed in any accepted
    /// spelling (`llamada` -> `call`). Unknown keys come back verbatim.
    fn canonical_category(raw: &str) -> String;

    /// Category filter choices, excluding the "all" sentinel.
    fn category_options() -> Vec<&'static str>;

    /// The single fetch a list screen issues: newest first by creation time.
    fn list_query() -> Query {
        Query::table(Self::KIND.table()).order_desc("created_at")
    }
}

/// Normalize a fetched page, dropping rows that fail required-field checks.
/// Fetch order is preserved.
pub fn normalize_rows<E: Entity>(rows: &[Row], policy: &NormalizePolicy) -> Vec<E> {
    rows.iter()
        .filter_map(|row| match E::from_row(row, policy) {
            Ok(entity) => Some(entity),
            Err(e) => {
                let row_id = row
                    .get("id")
                    .and_then(normalize::value_as_id)
                    .unwrap_or_else(|| "?".to_string());
                log::warn!("Skipping malformed {} row {}: {}", E::KIND.as_str(), row_id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Vec<serde_json::Value>) -> Vec<Row> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    #[test]
    fn test_normalize_rows_skips_malformed_and_keeps_order() {
        let raw = rows(vec![
            json!({ "id": 3, "name": "Carlos Ruiz" }),
            json!({ "id": 2 }),
            json!({ "id": 1, "name": "María González" }),
        ]);

        let clients: Vec<Client> = normalize_rows(&raw, &NormalizePolicy::default());
        let names: Vec<&str> = clients.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Carlos Ruiz", "María González"]);
    }

    #[test]
    fn test_normalize_rows_fallback_keeps_row() {
        let raw = rows(vec![json!({ "id": 2, "company": "Digital Hub" })]);
        let policy = NormalizePolicy {
            malformed_rows: MalformedRowPolicy::Fallback,
            fallback_label: "Untitled".to_string(),
        };

        let clients: Vec<Client> = normalize_rows(&raw, &policy);
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Untitled");
        assert_eq!(clients[0].company.as_deref(), Some("Digital Hub"));
    }

    #[test]
    fn test_list_queries_order_by_creation() {
        let q = Client::list_query();
        assert_eq!(q.table, Table::Clients);
        assert_eq!(q.order.map(|o| o.field), Some("created_at".to_string()));

        let q = Activity::list_query();
        assert_eq!(q.selection, crate::backend::Selection::WithClientName);
    }
}
