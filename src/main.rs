//! Terminal renderer for the CRM dashboard.
//!
//! With `--demo` the data comes from a seeded in-memory backend instead of
//! the configured API.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use parking_lot::Mutex;
use serde_json::json;

use crm_dashboard_lib::backend::{MemoryBackend, RemoteCollection, RestBackend, Table, TimedBackend};
use crm_dashboard_lib::config::{load_config, Config};
use crm_dashboard_lib::dashboard::{build_summary, DashboardOptions, DashboardSummary};
use crm_dashboard_lib::filter::CategoryFilter;
use crm_dashboard_lib::intent::{QuickAction, RowAction};
use crm_dashboard_lib::latency::LatencyRecorder;
use crm_dashboard_lib::model::{Activity, Client, Entity, Lead, Task};
use crm_dashboard_lib::screen::{ListScreen, ListView, Screen};

/// Clients, leads, tasks and activities at a glance
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use seeded in-memory data instead of the configured API
    #[arg(long)]
    demo: bool,

    /// Screen to show
    #[arg(value_enum, default_value_t = ScreenArg::Dashboard)]
    screen: ScreenArg,

    /// Case-insensitive search over the list's name/company/title columns
    #[arg(default_value = "")]
    search: String,

    /// Status or type to show (`all` shows everything)
    #[arg(default_value = "all")]
    category: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ScreenArg {
    Dashboard,
    Clients,
    Leads,
    Tasks,
    Activities,
}

impl From<ScreenArg> for Screen {
    fn from(arg: ScreenArg) -> Self {
        match arg {
            ScreenArg::Dashboard => Screen::Dashboard,
            ScreenArg::Clients => Screen::Clients,
            ScreenArg::Leads => Screen::Leads,
            ScreenArg::Tasks => Screen::Tasks,
            ScreenArg::Activities => Screen::Activities,
        }
    }
}

impl Args {
    fn category(&self) -> CategoryFilter {
        CategoryFilter::parse(&self.category)
    }
}

fn demo_backend() -> MemoryBackend {
    let now = Utc::now();
    let ago = |hours: i64| (now - chrono::Duration::hours(hours)).to_rfc3339();
    MemoryBackend::new()
        .with_rows(
            Table::Clients,
            vec![
                json!({ "id": 1, "name": "María González", "company": "TechCorp S.L.", "email": "maria@techcorp.com", "status": "active", "value": 45000, "created_at": ago(400) }),
                json!({ "id": 2, "name": "Carlos Ruiz", "company": "Innovate Solutions", "status": "active", "value": 32000, "created_at": ago(300) }),
                json!({ "id": 3, "name": "Ana Martín", "company": "Digital Hub", "status": "inactive", "created_at": ago(200) }),
                json!({ "id": 4, "name": "Pedro López", "company": "StartUp Pro", "status": "prospect", "created_at": ago(100) }),
            ],
        )
        .with_rows(
            Table::Leads,
            vec![
                json!({ "id": 1, "name": "Elena Jiménez", "company": "FutureTech", "source": "Web", "status": "new", "score": 85, "estimated_value": 25000, "created_at": ago(50) }),
                json!({ "id": 2, "name": "Roberto Silva", "company": "NextGen Corp", "source": "Referral", "status": "contacted", "score": 72, "created_at": ago(70) }),
                json!({ "id": 3, "name": "Lucía Fernández", "status": "qualified", "score": 55, "created_at": ago(90) }),
            ],
        )
        .with_rows(
            Table::Tasks,
            vec![
                json!({ "id": 1, "title": "Send proposal", "client_id": 1, "priority": "high", "status": "pending", "due_date": "2024-01-18", "created_at": ago(20) }),
                json!({ "id": 2, "title": "Follow-up call", "client_id": 2, "priority": "medium", "status": "in_progress", "created_at": ago(30) }),
                json!({ "id": 3, "title": "Review contract", "priority": "low", "status": "done", "created_at": ago(40) }),
            ],
        )
        .with_rows(
            Table::Activities,
            vec![
                json!({ "id": 1, "type": "call", "title": "Sales call", "client_id": 1, "status": "completed", "completed_date": ago(0), "created_at": ago(2) }),
                json!({ "id": 2, "type": "email", "title": "Proposal sent", "status": "completed", "completed_date": ago(25), "created_at": ago(26) }),
                json!({ "id": 3, "type": "meeting", "title": "Quarterly review", "client_id": 2, "status": "completed", "completed_date": ago(5), "created_at": ago(8) }),
                json!({ "id": 4, "type": "visit", "title": "On-site demo", "client_id": 4, "status": "scheduled", "created_at": ago(1) }),
            ],
        )
}

fn render_summary(summary: &DashboardSummary) {
    println!("Dashboard");
    println!("  Total clients         {}", summary.total_clients);
    println!("  New leads             {}", summary.active_leads);
    println!("  Pending tasks         {}", summary.pending_tasks);
    println!("  Completed activities  {}", summary.completed_activities);
    println!();
    println!("Recent activity");
    if summary.recent_activities.is_empty() {
        println!("  (none)");
    }
    for item in &summary.recent_activities {
        println!(
            "  [{}] {} · {} · {}",
            item.activity_type.as_ref().map_or("activity", |t| t.as_str()),
            item.title,
            item.client_name,
            item.age.as_deref().unwrap_or("date unknown")
        );
    }
    println!();
    let quick: Vec<&str> = QuickAction::ALL.iter().map(|a| a.label()).collect();
    println!("Quick actions: {}", quick.join(" | "));
}

fn render_list<E: Entity>(title: &str, view: &ListView<'_, E>, line: impl Fn(&E) -> String) {
    println!("{} ({} of {})", title, view.items.len(), view.total);
    println!("  Filter: {}", view.categories.join(" | "));
    if let Some(empty) = &view.empty {
        println!("  {}", empty.title);
        println!("  {}", empty.hint);
        return;
    }
    let menu: Vec<&str> = RowAction::menu_for(E::KIND).iter().map(|a| a.label()).collect();
    for item in view.items.iter().copied() {
        println!("  {}", line(item));
    }
    println!("  Row actions: {}", menu.join(" | "));
}

fn join_present(parts: &[Option<String>]) -> String {
    parts.iter().flatten().cloned().collect::<Vec<_>>().join(" · ")
}

async fn show_list<E: Entity>(
    title: &str,
    backend: &dyn RemoteCollection,
    config: &Config,
    args: &Args,
    line: impl Fn(&E) -> String,
) {
    let screen = Mutex::new(ListScreen::<E>::new(config.normalize_policy()));
    ListScreen::open(&screen, backend).await;
    let mut screen = screen.lock();
    screen.set_search(&args.search);
    screen.set_category(args.category());
    render_list(title, &screen.view(), line);
}

async fn run(args: Args, config: Config, backend: Arc<dyn RemoteCollection>) {
    let backend = backend.as_ref();
    match Screen::from(args.screen) {
        Screen::Dashboard => {
            let options = DashboardOptions::from_config(&config);
            println!("Loading…");
            let summary = build_summary(backend, &options, Utc::now()).await;
            render_summary(&summary);
        }
        Screen::Clients => {
            show_list::<Client>(Screen::Clients.label(), backend, &config, &args, |c| {
                join_present(&[
                    Some(c.name.clone()),
                    c.company.clone(),
                    c.email.clone(),
                    c.status.as_ref().map(|s| s.to_string()),
                ])
            })
            .await
        }
        Screen::Leads => {
            show_list::<Lead>(Screen::Leads.label(), backend, &config, &args, |l| {
                join_present(&[
                    Some(l.name.clone()),
                    l.company.clone(),
                    l.status.as_ref().map(|s| s.to_string()),
                    l.score.map(|s| format!("score {}", s)),
                    l.estimated_value.map(|v| format!("{:.0}", v)),
                ])
            })
            .await
        }
        Screen::Tasks => {
            show_list::<Task>(Screen::Tasks.label(), backend, &config, &args, |t| {
                let check = if t.completed { "[x]" } else { "[ ]" };
                format!(
                    "{} {}",
                    check,
                    join_present(&[
                        Some(t.title.clone()),
                        t.client_name.clone(),
                        t.priority.as_ref().map(|p| p.to_string()),
                        t.due_date.map(|d| format!("due {}", d)),
                    ])
                )
            })
            .await
        }
        Screen::Activities => {
            show_list::<Activity>(Screen::Activities.label(), backend, &config, &args, |a| {
                join_present(&[
                    a.activity_type.as_ref().map(|t| format!("[{}]", t)),
                    Some(a.title.clone()),
                    a.client_name.clone(),
                    a.status.as_ref().map(|s| s.to_string()),
                ])
            })
            .await
        }
    }
}

fn log_latency(latency: &LatencyRecorder) {
    match serde_json::to_string(&latency.report()) {
        Ok(report) => log::debug!("Latency: {}", report),
        Err(e) => log::warn!("Could not serialize latency report: {}", e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let (config, latency, backend): (Config, Arc<LatencyRecorder>, Arc<dyn RemoteCollection>) =
        if args.demo {
            log::info!("Using in-memory demo data");
            let config = Config::default();
            let latency = Arc::new(LatencyRecorder::new(config.latency_budget_ms));
            let backend = TimedBackend::new(demo_backend(), Arc::clone(&latency));
            (config, latency, Arc::new(backend))
        } else {
            let config = match load_config() {
                Ok(config) => config,
                Err(e) => {
                    log::error!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            let latency = Arc::new(LatencyRecorder::new(config.latency_budget_ms));
            let backend = TimedBackend::new(RestBackend::new(&config), Arc::clone(&latency));
            (config, latency, Arc::new(backend))
        };

    run(args, config, backend).await;
    log_latency(&latency);
    ExitCode::SUCCESS
}
