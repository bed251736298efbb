//! Latency-recording wrapper around any [`RemoteCollection`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::{EqFilter, Query, RemoteCollection, Row, Table};
use crate::error::FetchError;
use crate::latency::{CallKey, LatencyRecorder};

pub struct TimedBackend<B> {
    inner: B,
    latency: Arc<LatencyRecorder>,
}

impl<B: RemoteCollection> TimedBackend<B> {
    pub fn new(inner: B, latency: Arc<LatencyRecorder>) -> Self {
        Self { inner, latency }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn latency(&self) -> Arc<LatencyRecorder> {
        Arc::clone(&self.latency)
    }
}

#[async_trait]
impl<B: RemoteCollection> RemoteCollection for TimedBackend<B> {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, FetchError> {
        let started = Instant::now();
        let result = self.inner.query(query).await;
        self.latency
            .observe(CallKey::query(query.table), started.elapsed(), result.is_ok());
        result
    }

    async fn count(&self, table: Table, filter: Option<&EqFilter>) -> Result<u64, FetchError> {
        let started = Instant::now();
        let result = self.inner.count(table, filter).await;
        self.latency
            .observe(CallKey::count(table), started.elapsed(), result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FailOn, MemoryBackend};
    use crate::dashboard::{build_summary, DashboardOptions};
    use chrono::Utc;
    use serde_json::json;

    fn timed() -> TimedBackend<MemoryBackend> {
        let memory = MemoryBackend::new()
            .with_rows(
                Table::Leads,
                vec![
                    json!({ "id": 1, "name": "Elena Jiménez", "status": "new" }),
                    json!({ "id": 2, "name": "Roberto Silva", "status": "contacted" }),
                ],
            )
            .with_rows(
                Table::Activities,
                vec![json!({ "id": 1, "type": "call", "title": "Sales call", "status": "completed" })],
            );
        TimedBackend::new(memory, Arc::new(LatencyRecorder::new(300)))
    }

    #[tokio::test]
    async fn test_count_and_query_are_recorded_per_table() {
        let backend = timed();

        let new_leads = backend
            .count(Table::Leads, Some(&EqFilter::new("status", "new")))
            .await
            .unwrap();
        let rows = backend.query(&Query::table(Table::Activities)).await.unwrap();
        assert_eq!((new_leads, rows.len()), (1, 1));

        let latency = backend.latency();
        let leads = latency.stats(CallKey::count(Table::Leads)).unwrap();
        assert_eq!((leads.call.as_str(), leads.calls, leads.failures), ("count:leads", 1, 0));
        let activities = latency.stats(CallKey::query(Table::Activities)).unwrap();
        assert_eq!(activities.calls, 1);
        assert!(latency.stats(CallKey::query(Table::Leads)).is_none());
    }

    #[tokio::test]
    async fn test_failed_calls_are_recorded_as_failures() {
        let backend = timed();
        backend.inner().fail(Table::Leads, FailOn::Count);

        assert!(backend.count(Table::Leads, None).await.is_err());
        backend.inner().heal(Table::Leads);
        assert_eq!(backend.count(Table::Leads, None).await.unwrap(), 2);

        let stats = backend.latency().stats(CallKey::count(Table::Leads)).unwrap();
        assert_eq!((stats.calls, stats.failures), (2, 1));
    }

    #[tokio::test]
    async fn test_dashboard_load_covers_every_call() {
        let backend = timed();

        build_summary(&backend, &DashboardOptions::default(), Utc::now()).await;

        let calls: Vec<String> = backend
            .latency()
            .report()
            .calls
            .into_iter()
            .map(|c| c.call)
            .collect();
        assert_eq!(
            calls,
            vec![
                "query:activities",
                "count:clients",
                "count:leads",
                "count:tasks",
                "count:activities",
            ]
        );
    }
}
