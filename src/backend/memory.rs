//! In-memory backend used by tests and the offline demo.
//!
//! Mirrors the subset of backend behaviour the dashboard relies on: equality
//! filters, descending timestamp order (missing values last), row limits, the
//! `clients(name)` join, and per-table failure injection.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};

use super::{EqFilter, Query, RemoteCollection, Row, Selection, Table, CLIENT_JOIN_KEY};
use crate::error::FetchError;
use crate::model::normalize::{parse_timestamp, value_as_id};

/// Which operations on a table should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Query,
    Count,
    Both,
}

impl FailOn {
    fn covers_query(&self) -> bool {
        matches!(self, FailOn::Query | FailOn::Both)
    }

    fn covers_count(&self) -> bool {
        matches!(self, FailOn::Count | FailOn::Both)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    failures: RwLock<HashMap<Table, FailOn>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `table`. Non-object values are ignored.
    pub fn with_rows(self, table: Table, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        self.tables.write().insert(table, rows);
        self
    }

    pub fn insert(&self, table: Table, row: Row) {
        self.tables.write().entry(table).or_default().push(row);
    }

    pub fn fail(&self, table: Table, on: FailOn) {
        self.failures.write().insert(table, on);
    }

    pub fn heal(&self, table: Table) {
        self.failures.write().remove(&table);
    }

    fn failure_for(&self, table: Table) -> Option<FailOn> {
        self.failures.read().get(&table).copied()
    }

    fn client_name(&self, client_id: &str) -> Option<String> {
        let tables = self.tables.read();
        tables
            .get(&Table::Clients)?
            .iter()
            .find(|c| c.get("id").and_then(value_as_id).as_deref() == Some(client_id))
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_string)
    }
}

fn matches_filter(row: &Row, filter: Option<&EqFilter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    match row.get(&filter.field) {
        Some(Value::String(s)) => *s == filter.value,
        Some(Value::Number(n)) => n.to_string() == filter.value,
        Some(Value::Bool(b)) => b.to_string() == filter.value,
        _ => false,
    }
}

/// Newest first; rows without the column (or with null) go last.
fn compare_desc(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.and_then(|v| v.as_str());
    let b = b.and_then(|v| v.as_str());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(ta), Some(tb)) => tb.cmp(&ta),
            _ => b.cmp(a),
        },
    }
}

#[async_trait]
impl RemoteCollection for MemoryBackend {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, FetchError> {
        if self.failure_for(query.table).is_some_and(|f| f.covers_query()) {
            return Err(FetchError::Unavailable(query.table));
        }

        let mut rows: Vec<Row> = {
            let tables = self.tables.read();
            tables
                .get(&query.table)
                .map(|rows| {
                    rows.iter()
                        .filter(|r| matches_filter(r, query.filter.as_ref()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| compare_desc(a.get(&order.field), b.get(&order.field)));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        if query.selection == Selection::WithClientName {
            for row in rows.iter_mut() {
                if row.contains_key(CLIENT_JOIN_KEY) {
                    continue;
                }
                let joined = row
                    .get("client_id")
                    .and_then(value_as_id)
                    .and_then(|id| self.client_name(&id))
                    .map(|name| json!({ "name": name }))
                    .unwrap_or(Value::Null);
                row.insert(CLIENT_JOIN_KEY.to_string(), joined);
            }
        }

        Ok(rows)
    }

    async fn count(&self, table: Table, filter: Option<&EqFilter>) -> Result<u64, FetchError> {
        if self.failure_for(table).is_some_and(|f| f.covers_count()) {
            return Err(FetchError::Unavailable(table));
        }
        let tables = self.tables.read();
        let count = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| matches_filter(r, filter)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }
}
