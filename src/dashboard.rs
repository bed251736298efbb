//! Dashboard summary: four headline counts plus the latest completed
//! activities.
//!
//! All five backend calls are issued together and awaited together. A failed
//! part degrades to zero / empty and is listed in `degraded`; it never takes
//! the other parts down with it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::age::format_age;
use crate::backend::{EqFilter, Query, RemoteCollection, Table};
use crate::config::{Config, MAX_RECENT_ACTIVITIES};
use crate::error::FetchError;
use crate::model::{normalize_rows, Activity, ActivityStatus, ActivityType, NormalizePolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOptions {
    /// Clamped to `1..=MAX_RECENT_ACTIVITIES` when used.
    pub recent_limit: usize,
    pub client_placeholder: String,
    pub policy: NormalizePolicy,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl DashboardOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recent_limit: config.recent_limit(),
            client_placeholder: config.client_placeholder.clone(),
            policy: config.normalize_policy(),
        }
    }

    fn limit(&self) -> usize {
        self.recent_limit.clamp(1, MAX_RECENT_ACTIVITIES)
    }
}

/// One part of the summary, used to report which parts degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SummarySection {
    TotalClients,
    ActiveLeads,
    PendingTasks,
    CompletedActivities,
    RecentActivities,
}

impl SummarySection {
    pub fn table(&self) -> Table {
        match self {
            SummarySection::TotalClients => Table::Clients,
            SummarySection::ActiveLeads => Table::Leads,
            SummarySection::PendingTasks => Table::Tasks,
            SummarySection::CompletedActivities | SummarySection::RecentActivities => {
                Table::Activities
            }
        }
    }

    /// Status filter applied to the section's count, if any.
    fn count_filter(&self) -> Option<EqFilter> {
        match self {
            SummarySection::TotalClients | SummarySection::RecentActivities => None,
            SummarySection::ActiveLeads => Some(EqFilter::new("status", "new")),
            SummarySection::PendingTasks => Some(EqFilter::new("status", "pending")),
            SummarySection::CompletedActivities => Some(EqFilter::new("status", "completed")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    pub title: String,
    /// Linked client's name, or the configured placeholder. Never empty.
    pub client_name: String,
    pub completed_at: Option<DateTime<Utc>>,
    /// Human-readable age of `completed_at`; absent when that is absent.
    pub age: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_clients: u64,
    pub active_leads: u64,
    pub pending_tasks: u64,
    pub completed_activities: u64,
    pub recent_activities: Vec<RecentActivity>,
    /// Sections whose query failed and were zeroed/emptied.
    pub degraded: Vec<SummarySection>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSummary {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// What the renderer shows: a placeholder until the whole summary is ready.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DashboardState {
    #[default]
    Loading,
    Ready { summary: DashboardSummary },
}

/// The query behind the recent-activities list.
pub fn recent_activities_query(limit: usize) -> Query {
    Query::table(Table::Activities)
        .with_client_name()
        .eq("status", "completed")
        .order_desc("completed_date")
        .limit(limit)
}

async fn count_section(backend: &dyn RemoteCollection, section: SummarySection) -> Result<u64, FetchError> {
    let filter = section.count_filter();
    backend.count(section.table(), filter.as_ref()).await
}

fn settle_count(
    section: SummarySection,
    result: Result<u64, FetchError>,
    degraded: &mut Vec<SummarySection>,
) -> u64 {
    result.unwrap_or_else(|e| {
        log::warn!("Dashboard {:?} count failed ({}): {}", section, section.table(), e);
        degraded.push(section);
        0
    })
}

/// Normalize, keep completed rows only, newest first (undated last), cap at
/// `limit`, and annotate with client label and age.
fn assemble_recent(
    rows: &[crate::backend::Row],
    options: &DashboardOptions,
    now: DateTime<Utc>,
) -> Vec<RecentActivity> {
    let mut activities: Vec<Activity> = normalize_rows(rows, &options.policy)
        .into_iter()
        .filter(|a: &Activity| a.status == Some(ActivityStatus::Completed))
        .collect();
    activities.sort_by(|a, b| match (a.completed_at, b.completed_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    activities.truncate(options.limit());

    activities
        .into_iter()
        .map(|a| RecentActivity {
            client_name: a
                .client_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| options.client_placeholder.clone()),
            age: a.completed_at.map(|ts| format_age(ts, now)),
            id: a.id,
            activity_type: a.activity_type,
            title: a.title,
            completed_at: a.completed_at,
        })
        .collect()
}

/// Build the dashboard summary. `now` anchors every age label.
pub async fn build_summary(
    backend: &dyn RemoteCollection,
    options: &DashboardOptions,
    now: DateTime<Utc>,
) -> DashboardSummary {
    let recent_query = recent_activities_query(options.limit());

    let (clients, leads, tasks, completed, recent) = tokio::join!(
        count_section(backend, SummarySection::TotalClients),
        count_section(backend, SummarySection::ActiveLeads),
        count_section(backend, SummarySection::PendingTasks),
        count_section(backend, SummarySection::CompletedActivities),
        backend.query(&recent_query),
    );

    let mut degraded = Vec::new();
    let total_clients = settle_count(SummarySection::TotalClients, clients, &mut degraded);
    let active_leads = settle_count(SummarySection::ActiveLeads, leads, &mut degraded);
    let pending_tasks = settle_count(SummarySection::PendingTasks, tasks, &mut degraded);
    let completed_activities =
        settle_count(SummarySection::CompletedActivities, completed, &mut degraded);

    let recent_activities = match recent {
        Ok(rows) => assemble_recent(&rows, options, now),
        Err(e) => {
            log::warn!("Dashboard recent activities query failed: {}", e);
            degraded.push(SummarySection::RecentActivities);
            Vec::new()
        }
    };

    log::info!(
        "Dashboard summary: {} clients, {} new leads, {} pending tasks, {} completed activities ({} recent, {} degraded)",
        total_clients,
        active_leads,
        pending_tasks,
        completed_activities,
        recent_activities.len(),
        degraded.len()
    );

    DashboardSummary {
        total_clients,
        active_leads,
        pending_tasks,
        completed_activities,
        recent_activities,
        degraded,
        generated_at: now,
    }
}

/// Flip `state` to `Loading`, build the summary, then publish it in one step.
/// The lock is never held across the fetch.
pub async fn load_dashboard(
    backend: &dyn RemoteCollection,
    options: &DashboardOptions,
    state: &Mutex<DashboardState>,
    now: DateTime<Utc>,
) -> DashboardSummary {
    *state.lock() = DashboardState::Loading;
    let summary = build_summary(backend, options, now).await;
    *state.lock() = DashboardState::Ready {
        summary: summary.clone(),
    };
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FailOn, MemoryBackend};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn ts(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339()
    }

    fn seeded() -> MemoryBackend {
        MemoryBackend::new()
            .with_rows(
                Table::Clients,
                vec![
                    json!({ "id": 1, "name": "TechCorp", "status": "active" }),
                    json!({ "id": 2, "name": "Digital Hub", "status": "inactive" }),
                    json!({ "id": 3, "name": "NextGen", "status": "active" }),
                ],
            )
            .with_rows(
                Table::Leads,
                vec![
                    json!({ "id": 1, "name": "Elena", "status": "new" }),
                    json!({ "id": 2, "name": "Roberto", "status": "contacted" }),
                    json!({ "id": 3, "name": "Lucía", "status": "new" }),
                ],
            )
            .with_rows(
                Table::Tasks,
                vec![
                    json!({ "id": 1, "title": "Send proposal", "status": "pending" }),
                    json!({ "id": 2, "title": "Review contract", "status": "done" }),
                ],
            )
    }

    fn with_activities(backend: MemoryBackend, rows: Vec<serde_json::Value>) -> MemoryBackend {
        backend.with_rows(Table::Activities, rows)
    }

    #[tokio::test]
    async fn test_recent_scenario_ages_and_placeholder() {
        let backend = with_activities(
            seeded(),
            vec![
                json!({ "id": "a2", "type": "email", "title": "Proposal sent", "status": "completed",
                        "completed_date": ts(now() - Duration::hours(25)) }),
                json!({ "id": "a1", "type": "call", "title": "Sales call", "status": "completed",
                        "client_id": 1, "completed_date": ts(now() - Duration::minutes(30)) }),
            ],
        );

        let summary = build_summary(&backend, &DashboardOptions::default(), now()).await;

        assert_eq!(summary.recent_activities.len(), 2);
        let first = &summary.recent_activities[0];
        let second = &summary.recent_activities[1];
        assert_eq!(first.id, "a1");
        assert_eq!(first.client_name, "TechCorp");
        assert_eq!(first.age.as_deref(), Some("less than 1 hour ago"));
        assert_eq!(second.id, "a2");
        assert_eq!(second.client_name, "Client not specified");
        assert_eq!(second.age.as_deref(), Some("1 day ago"));
        assert!(!summary.is_degraded());
    }

    #[tokio::test]
    async fn test_counts_use_status_filters() {
        let backend = with_activities(
            seeded(),
            vec![
                json!({ "id": 1, "title": "Call", "status": "completed" }),
                json!({ "id": 2, "title": "Visit", "status": "scheduled" }),
            ],
        );

        let summary = build_summary(&backend, &DashboardOptions::default(), now()).await;

        assert_eq!(summary.total_clients, 3);
        assert_eq!(summary.active_leads, 2);
        assert_eq!(summary.pending_tasks, 1);
        assert_eq!(summary.completed_activities, 1);
    }

    #[tokio::test]
    async fn test_counts_match_canonical_status_keys_only() {
        let backend = with_activities(
            seeded(),
            vec![
                json!({ "id": 1, "title": "Call", "status": "completed" }),
                json!({ "id": 2, "title": "Llamada", "status": "completada" }),
                json!({ "id": 3, "title": "Untracked" }),
            ],
        );

        let summary = build_summary(&backend, &DashboardOptions::default(), now()).await;

        assert_eq!(summary.completed_activities, 1);
    }

    #[tokio::test]
    async fn test_failed_leads_count_zeroes_only_that_count() {
        let backend = with_activities(
            seeded(),
            vec![json!({ "id": 1, "title": "Call", "status": "completed" })],
        );
        backend.fail(Table::Leads, FailOn::Count);

        let summary = build_summary(&backend, &DashboardOptions::default(), now()).await;

        assert_eq!(summary.active_leads, 0);
        assert_eq!(summary.total_clients, 3);
        assert_eq!(summary.pending_tasks, 1);
        assert_eq!(summary.completed_activities, 1);
        assert_eq!(summary.degraded, vec![SummarySection::ActiveLeads]);
    }

    #[tokio::test]
    async fn test_everything_failing_yields_zeroed_summary() {
        let backend = seeded();
        for table in Table::ALL {
            backend.fail(table, FailOn::Both);
        }

        let summary = build_summary(&backend, &DashboardOptions::default(), now()).await;

        assert_eq!(summary.total_clients, 0);
        assert_eq!(summary.active_leads, 0);
        assert_eq!(summary.pending_tasks, 0);
        assert_eq!(summary.completed_activities, 0);
        assert!(summary.recent_activities.is_empty());
        assert_eq!(summary.degraded.len(), 5);
    }

    #[tokio::test]
    async fn test_recent_list_capped_and_sorted() {
        let rows = (0..7)
            .map(|i| {
                json!({ "id": format!("a{}", i), "title": format!("Activity {}", i), "status": "completed",
                        "client_id": 3, "completed_date": ts(now() - Duration::hours(i * 5)) })
            })
            .collect();
        let backend = with_activities(seeded(), rows);

        let summary = build_summary(&backend, &DashboardOptions::default(), now()).await;

        assert_eq!(summary.recent_activities.len(), 4);
        let stamps: Vec<_> = summary
            .recent_activities
            .iter()
            .map(|a| a.completed_at.unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(summary.recent_activities[0].id, "a0");
    }

    #[tokio::test]
    async fn test_recent_limit_option_is_clamped() {
        let rows = (0..3)
            .map(|i| json!({ "id": i, "title": "Call", "status": "completed" }))
            .collect();
        let backend = with_activities(seeded(), rows);

        let mut options = DashboardOptions::default();
        options.recent_limit = 1;
        let summary = build_summary(&backend, &options, now()).await;
        assert_eq!(summary.recent_activities.len(), 1);

        options.recent_limit = 99;
        let summary = build_summary(&backend, &options, now()).await;
        assert_eq!(summary.recent_activities.len(), 3);
    }

    #[tokio::test]
    async fn test_undated_activity_has_no_age() {
        let backend = with_activities(
            seeded(),
            vec![json!({ "id": 1, "title": "Call", "status": "completed", "client_id": 2 })],
        );

        let summary = build_summary(&backend, &DashboardOptions::default(), now()).await;
        let item = &summary.recent_activities[0];
        assert_eq!(item.client_name, "Digital Hub");
        assert_eq!(item.age, None);
    }

    #[tokio::test]
    async fn test_load_dashboard_publishes_ready_state() {
        let backend = with_activities(seeded(), vec![]);
        let state = Mutex::new(DashboardState::default());

        let summary = load_dashboard(&backend, &DashboardOptions::default(), &state, now()).await;

        let published = state.lock().clone();
        assert_eq!(published, DashboardState::Ready { summary });
    }

    #[test]
    fn test_state_serializes_with_status_tag() {
        let json = serde_json::to_value(DashboardState::Loading).unwrap();
        assert_eq!(json["status"], "loading");
    }
}
