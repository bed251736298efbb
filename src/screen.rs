//! Generic list-screen controller shared by the clients, leads, tasks and
//! activities screens, plus top-level navigation.
//!
//! A screen issues exactly one fetch when first shown. Search and category
//! changes only re-filter the loaded page. Every load carries a
//! [`LoadTicket`]; results for a superseded or dismissed load are dropped.

use parking_lot::Mutex;
use serde::Serialize;

use crate::backend::{RemoteCollection, Row};
use crate::error::FetchError;
use crate::filter::{self, CategoryFilter, ListFilter};
use crate::model::{normalize_rows, Entity, EntityKind, NormalizePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Loaded,
    /// Fetch failed; the screen shows an empty list.
    Failed,
}

/// Identifies one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    pub title: String,
    pub hint: String,
}

impl EmptyState {
    pub fn for_kind(kind: EntityKind, searching: bool) -> Self {
        let hint = if searching {
            "Try different search terms".to_string()
        } else {
            match kind {
                EntityKind::Client => "Start by adding your first client",
                EntityKind::Lead => "Start by adding your first lead",
                EntityKind::Task => "Start by creating your first task",
                EntityKind::Activity => "Start by logging your first activity",
            }
            .to_string()
        };
        Self {
            title: format!("No {} found", kind.plural()),
            hint,
        }
    }
}

/// Everything the renderer needs to draw one list screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView<'a, E: Entity> {
    pub kind: EntityKind,
    pub state: LoadState,
    pub loading: bool,
    pub items: Vec<&'a E>,
    /// Size of the loaded page before filtering.
    pub total: usize,
    pub filter: &'a ListFilter,
    pub categories: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyState>,
}

#[derive(Debug)]
pub struct ListScreen<E: Entity> {
    items: Vec<E>,
    state: LoadState,
    filter: ListFilter,
    policy: NormalizePolicy,
    generation: u64,
    dismissed: bool,
    last_error: Option<String>,
}

impl<E: Entity> ListScreen<E> {
    pub fn new(policy: NormalizePolicy) -> Self {
        Self {
            items: Vec::new(),
            state: LoadState::Loading,
            filter: ListFilter::default(),
            policy,
            generation: 0,
            dismissed: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True until the first load has been started, or after a dismissal.
    pub fn needs_load(&self) -> bool {
        self.generation == 0 || self.dismissed
    }

    /// Enter `Loading` and invalidate any earlier ticket.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.dismissed = false;
        self.state = LoadState::Loading;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply a fetch result. Returns false if the ticket is stale.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<Row>, FetchError>) -> bool {
        if self.dismissed || ticket.generation != self.generation {
            log::debug!(
                "Dropping stale {} load (ticket {}, current {})",
                E::KIND.plural(),
                ticket.generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(rows) => {
                self.items = normalize_rows(&rows, &self.policy);
                self.state = LoadState::Loaded;
                self.last_error = None;
                log::info!("Loaded {} {}", self.items.len(), E::KIND.plural());
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", E::KIND.plural(), e);
                self.items.clear();
                self.state = LoadState::Failed;
                self.last_error = Some(e.to_string());
            }
        }
        true
    }

    /// The view went away; any in-flight result will be ignored.
    pub fn dismiss(&mut self) {
        self.dismissed = true;
        self.generation += 1;
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.search = search.to_string();
    }

    /// Select a category. The key may use any spelling the kind accepts
    /// (`llamada`, `pendiente`); it is stored in canonical form.
    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = match category {
            CategoryFilter::Only(raw) => CategoryFilter::Only(E::canonical_category(&raw)),
            CategoryFilter::All => CategoryFilter::All,
        };
    }

    /// Loaded entities passing the current filter, in fetch order.
    pub fn visible(&self) -> Vec<&E> {
        filter::apply(&self.items, &self.filter)
    }

    pub fn view(&self) -> ListView<'_, E> {
        let items = self.visible();
        let empty = (!self.is_loading() && items.is_empty())
            .then(|| EmptyState::for_kind(E::KIND, self.filter.has_search()));
        ListView {
            kind: E::KIND,
            state: self.state,
            loading: self.is_loading(),
            items,
            total: self.items.len(),
            filter: &self.filter,
            categories: filter::category_choices::<E>(),
            empty,
        }
    }

    /// First show: fetch once. Later calls leave the loaded page alone.
    pub async fn open(screen: &Mutex<Self>, backend: &dyn RemoteCollection) -> LoadState {
        let needs_load = screen.lock().needs_load();
        if !needs_load {
            return screen.lock().state();
        }
        Self::load(screen, backend).await
    }

    /// Re-issue the screen's fetch, keeping the current search and category.
    pub async fn refresh(screen: &Mutex<Self>, backend: &dyn RemoteCollection) -> LoadState {
        log::info!("Refreshing {}", E::KIND.plural());
        Self::load(screen, backend).await
    }

    async fn load(screen: &Mutex<Self>, backend: &dyn RemoteCollection) -> LoadState {
        let ticket = screen.lock().begin_load();
        let result = backend.query(&E::list_query()).await;
        let mut guard = screen.lock();
        guard.finish_load(ticket, result);
        guard.state()
    }
}

/// Top-level navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Dashboard,
    Clients,
    Leads,
    Tasks,
    Activities,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Dashboard,
        Screen::Clients,
        Screen::Leads,
        Screen::Tasks,
        Screen::Activities,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Screen::Dashboard => "/",
            Screen::Clients => "/clients",
            Screen::Leads => "/leads",
            Screen::Tasks => "/tasks",
            Screen::Activities => "/activities",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Clients => "Clients",
            Screen::Leads => "Leads",
            Screen::Tasks => "Tasks",
            Screen::Activities => "Activities",
        }
    }

    /// Accepts a route path (`/leads`) or a bare name (`leads`, `dashboard`).
    pub fn from_path(path: &str) -> Option<Self> {
        let key = path.trim().trim_end_matches('/').trim_start_matches('/');
        match key.to_lowercase().as_str() {
            "" | "dashboard" => Some(Screen::Dashboard),
            "clients" => Some(Screen::Clients),
            "leads" => Some(Screen::Leads),
            "tasks" => Some(Screen::Tasks),
            "activities" => Some(Screen::Activities),
            _ => None,
        }
    }

    /// Entity listed by this screen; `None` for the dashboard.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Screen::Dashboard => None,
            Screen::Clients => Some(EntityKind::Client),
            Screen::Leads => Some(EntityKind::Lead),
            Screen::Tasks => Some(EntityKind::Task),
            Screen::Activities => Some(EntityKind::Activity),
        }
    }
}
