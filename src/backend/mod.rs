//! Remote collection boundary.
//!
//! The hosted backend owns all four tables. The dashboard and list screens
//! only ever read through [`RemoteCollection`]: filtered/ordered/limited row
//! queries and count-only queries.

pub mod memory;
pub mod rest;
pub mod timed;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub use memory::{FailOn, MemoryBackend};
pub use rest::RestBackend;
pub use timed::TimedBackend;

/// One raw row as returned by the backend.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Key of the embedded object produced by the activities/tasks → clients join.
pub const CLIENT_JOIN_KEY: &str = "clients";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Clients,
    Leads,
    Tasks,
    Activities,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Clients, Table::Leads, Table::Tasks, Table::Activities];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Clients => "clients",
            Table::Leads => "leads",
            Table::Tasks => "tasks",
            Table::Activities => "activities",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which columns a row query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    AllColumns,
    /// All columns plus the linked client's `name` (one-hop join via `client_id`).
    WithClientName,
}

impl Selection {
    /// PostgREST `select=` expression.
    pub fn as_select(&self) -> &'static str {
        match self {
            Selection::AllColumns => "*",
            Selection::WithClientName => "*,clients(name)",
        }
    }
}

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqFilter {
    pub field: String,
    pub value: String,
}

impl EqFilter {
    pub fn new(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Descending sort on a timestamp column. Rows lacking the column sort last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: Table,
    pub selection: Selection,
    pub filter: Option<EqFilter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            selection: Selection::AllColumns,
            filter: None,
            order: None,
            limit: None,
        }
    }

    pub fn with_client_name(mut self) -> Self {
        self.selection = Selection::WithClientName;
        self
    }

    pub fn eq(mut self, field: &str, value: &str) -> Self {
        self.filter = Some(EqFilter::new(field, value));
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order = Some(Order {
            field: field.to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read-only access to the hosted tables.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Fetch rows matching `query`, in the requested order.
    async fn query(&self, query: &Query) -> Result<Vec<Row>, FetchError>;

    /// Count rows in `table`, optionally restricted by an equality filter.
    async fn count(&self, table: Table, filter: Option<&EqFilter>) -> Result<u64, FetchError>;
}
