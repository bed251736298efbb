use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::normalize::{self, NormalizePolicy};
use super::{Entity, EntityKind};
use crate::backend::{Query, Row};
use crate::error::NormalizeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
    Other(String),
}

impl TaskPriority {
    pub fn as_str(&self) -> &str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
            TaskPriority::Other(raw) => raw,
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" | "alta" => TaskPriority::High,
            "medium" | "media" => TaskPriority::Medium,
            "low" | "baja" => TaskPriority::Low,
            _ => TaskPriority::Other(s.to_string()),
        }
    }
}

super::string_keyed!(TaskPriority);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Other(raw) => raw,
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => TaskStatus::Pending,
            "in_progress" | "en_proceso" => TaskStatus::InProgress,
            "done" | "completed" | "completada" => TaskStatus::Done,
            _ => TaskStatus::Other(s.to_string()),
        }
    }
}

super::string_keyed!(TaskStatus);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    /// Display name of the linked client, resolved at read time.
    pub client_name: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub assignee: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn from_row(row: &Row, policy: &NormalizePolicy) -> Result<Self, NormalizeError> {
        let kind = Self::KIND.as_str();
        let status = normalize::text(row, "status").map(|s| TaskStatus::from_str_lossy(&s));
        // A row without the flag is complete exactly when its status says so.
        let completed = normalize::flag(row, "completed")
            .unwrap_or(matches!(status, Some(TaskStatus::Done)));

        Ok(Task {
            id: normalize::id(row, kind)?,
            title: normalize::required_text(row, "title", kind, policy)?,
            description: normalize::text(row, "description"),
            client_id: row.get("client_id").and_then(normalize::value_as_id),
            client_name: normalize::joined_client_name(row),
            priority: normalize::text(row, "priority").map(|s| TaskPriority::from_str_lossy(&s)),
            status,
            due_date: normalize::date(row, "due_date"),
            completed,
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

    fn category(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.as_str())
    }

    fn canonical_category(raw: &str) -> String {
        TaskStatus::from_str_lossy(raw).as_str().to_string()
    }

    fn category_options() -> Vec<&'static str> {
        vec!["pending", "in_progress", "done"]
    }

    fn list_query() -> Query {
        Query::table(Self::KIND.table())
            .with_client_name()
            .order_desc("created_at")
    }
}
