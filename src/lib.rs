//! Core of the CRM dashboard: typed views over the hosted `clients`, `leads`,
//! `tasks` and `activities` tables, the dashboard summary, and the generic
//! list-screen controller. Rendering lives in the `crm-dashboard` binary.

pub mod age;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod intent;
pub mod latency;
pub mod model;
pub mod screen;

pub use backend::{MemoryBackend, RemoteCollection, RestBackend};
pub use config::{load_config, Config};
pub use dashboard::{build_summary, DashboardOptions, DashboardSummary};
pub use screen::{ListScreen, LoadState, Screen};
