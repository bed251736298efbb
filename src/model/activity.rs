use chrono::{DateTime, Utc};
use serde::Serialize;

use super::normalize::{self, NormalizePolicy};
use super::{Entity, EntityKind};
use crate::backend::{Query, Row};
use crate::error::NormalizeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Call,
    Meeting,
    Email,
    Task,
    Visit,
    Other(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Call => "call",
            ActivityType::Meeting => "meeting",
            ActivityType::Email => "email",
            ActivityType::Task => "task",
            ActivityType::Visit => "visit",
            ActivityType::Other(raw) => raw,
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "call" | "llamada" => ActivityType::Call,
            "meeting" | "reunion" | "reunión" => ActivityType::Meeting,
            "email" => ActivityType::Email,
            "task" | "tarea" => ActivityType::Task,
            "visit" | "visita" => ActivityType::Visit,
            _ => ActivityType::Other(s.to_string()),
        }
    }
}

super::string_keyed!(ActivityType);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityStatus {
    Completed,
    Scheduled,
    Cancelled,
    Other(String),
}

impl ActivityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityStatus::Completed => "completed",
            ActivityStatus::Scheduled => "scheduled",
            ActivityStatus::Cancelled => "cancelled",
            ActivityStatus::Other(raw) => raw,
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "completed" | "completada" => ActivityStatus::Completed,
            "scheduled" | "programada" => ActivityStatus::Scheduled,
            "cancelled" | "canceled" | "cancelada" => ActivityStatus::Cancelled,
            _ => ActivityStatus::Other(s.to_string()),
        }
    }
}

super::string_keyed!(ActivityStatus);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    /// Display name of the linked client, resolved at read time.
    pub client_name: Option<String>,
    pub status: Option<ActivityStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub outcome: Option<String>,
    pub assignee: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Activity {
    const KIND: EntityKind = EntityKind::Activity;

    fn from_row(row: &Row, policy: &NormalizePolicy) -> Result<Self, NormalizeError> {
        let kind = Self::KIND.as_str();
        Ok(Activity {
            id: normalize::id(row, kind)?,
            activity_type: normalize::text(row, "type").map(|s| ActivityType::from_str_lossy(&s)),
            title: normalize::required_text(row, "title", kind, policy)?,
            description: normalize::text(row, "description"),
            client_id: row.get("client_id").and_then(normalize::value_as_id),
            client_name: normalize::joined_client_name(row),
            status: normalize::text(row, "status").map(|s| ActivityStatus::from_str_lossy(&s)),
            scheduled_at: normalize::timestamp(row, "scheduled_at")
                .or_else(|| normalize::timestamp(row, "date")),
            completed_at: normalize::timestamp(row, "completed_date"),
            duration: normalize::text(row, "duration"),
            outcome: normalize::text(row, "outcome"),
            assignee: normalize::text(row, "assignee"),
            created_at: normalize::timestamp(row, "created_at"),
        })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> [Option<&str>; 2] {
        [Some(self.title.as_str()), self.client_name.as_deref()]
    }

    /// Activities are filtered by type, not status.
    fn category(&self) -> &str {
        self.activity_type.as_ref().map_or("", |t| t.as_str())
    }

    fn canonical_category(raw: &str) -> String {
        ActivityType::from_str_lossy(raw).as_str().to_string()
    }

    fn category_options() -> Vec<&'static str> {
        vec!["call", "meeting", "email", "task", "visit"]
    }

    fn list_query() -> Query {
        Query::table(Self::KIND.table())
            .with_client_name()
            .order_desc("created_at")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().expect("object fixture")
    }

    #[test]
    fn test_activity_from_row() {
        let activity = Activity::from_row(
            &row(json!({
                "id": "a1",
                "type": "llamada",
                "title": "Sales call",
                "clients": { "name": "TechCorp" },
                "status": "completada",
                "completed_date": "2024-01-15 10:30:00",
                "duration": "45 min",
                "outcome": "Interested, wants a proposal"
            })),
            &NormalizePolicy::default(),
        )
        .unwrap();

        assert_eq!(activity.activity_type, Some(ActivityType::Call));
        assert_eq!(activity.status, Some(ActivityStatus::Completed));
        assert_eq!(activity.client_name.as_deref(), Some("TechCorp"));
        assert!(activity.completed_at.is_some());
        assert_eq!(activity.category(), "call");
    }

    #[test]
    fn test_unlinked_activity_has_no_client_name() {
        let activity = Activity::from_row(
            &row(json!({ "id": 2, "type": "email", "title": "Proposal sent", "clients": null })),
            &NormalizePolicy::default(),
        )
        .unwrap();

        assert_eq!(activity.client_name, None);
        assert_eq!(activity.search_fields(), [Some("Proposal sent"), None]);
    }

    #[test]
    fn test_type_serializes_under_type_key() {
        let activity = Activity::from_row(
            &row(json!({ "id": 3, "type": "visita", "title": "On-site demo" })),
            &NormalizePolicy::default(),
        )
        .unwrap();

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "visit");
        assert!(json["status"].is_null());
    }

    #[test]
    fn test_missing_type_and_status_stay_absent() {
        let activity = Activity::from_row(
            &row(json!({ "id": 4, "title": "Untyped note" })),
            &NormalizePolicy::default(),
        )
        .unwrap();

        assert_eq!(activity.activity_type, None);
        assert_eq!(activity.status, None);
        assert_eq!(activity.category(), "");
    }

    #[test]
    fn test_canonical_category_accepts_spanish_keys() {
        assert_eq!(Activity::canonical_category("llamada"), "call");
        assert_eq!(Activity::canonical_category("Visita"), "visit");
        assert_eq!(Activity::canonical_category("webinar"), "webinar");
    }
}
