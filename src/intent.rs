//! Row actions and dashboard quick actions, expressed as intents.
//!
//! The core never performs a mutation itself. The renderer turns a menu
//! click into an [`Intent`] and the [`IntentDispatcher`] hands it to whatever
//! handler the caller registered for that entity kind.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Entity, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowAction {
    View,
    Edit,
    CreateTask,
    LogActivity,
    ConvertToClient,
    MarkLost,
    ToggleComplete,
    Delete,
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::View => "View details",
            RowAction::Edit => "Edit",
            RowAction::CreateTask => "Create task",
            RowAction::LogActivity => "Log activity",
            RowAction::ConvertToClient => "Convert to client",
            RowAction::MarkLost => "Mark as lost",
            RowAction::ToggleComplete => "Toggle complete",
            RowAction::Delete => "Delete",
        }
    }

    /// Row menu for an entity kind, in display order.
    pub fn menu_for(kind: EntityKind) -> &'static [RowAction] {
        match kind {
            EntityKind::Client => &[
                RowAction::View,
                RowAction::Edit,
                RowAction::CreateTask,
                RowAction::LogActivity,
                RowAction::Delete,
            ],
            EntityKind::Lead => &[
                RowAction::View,
                RowAction::Edit,
                RowAction::ConvertToClient,
                RowAction::MarkLost,
                RowAction::Delete,
            ],
            EntityKind::Task => &[
                RowAction::ToggleComplete,
                RowAction::View,
                RowAction::Edit,
                RowAction::Delete,
            ],
            EntityKind::Activity => &[RowAction::View, RowAction::Edit, RowAction::Delete],
        }
    }

    pub fn applies_to(&self, kind: EntityKind) -> bool {
        Self::menu_for(kind).contains(self)
    }
}

/// Dashboard shortcuts that do not target an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickAction {
    CreateLead,
    AddClient,
    LogCall,
    ScheduleVisit,
    CreateTask,
}

impl QuickAction {
    pub const ALL: [QuickAction; 5] = [
        QuickAction::CreateLead,
        QuickAction::AddClient,
        QuickAction::LogCall,
        QuickAction::ScheduleVisit,
        QuickAction::CreateTask,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuickAction::CreateLead => "New lead",
            QuickAction::AddClient => "Add client",
            QuickAction::LogCall => "Log call",
            QuickAction::ScheduleVisit => "Schedule visit",
            QuickAction::CreateTask => "Create task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "camelCase")]
pub enum Intent {
    Row {
        kind: EntityKind,
        id: String,
        action: RowAction,
    },
    Quick {
        action: QuickAction,
    },
}

impl Intent {
    pub fn row<E: Entity>(entity: &E, action: RowAction) -> Self {
        Intent::Row {
            kind: E::KIND,
            id: entity.id().to_string(),
            action,
        }
    }

    pub fn quick(action: QuickAction) -> Self {
        Intent::Quick { action }
    }
}

pub trait IntentHandler: Send + Sync {
    fn handle(&self, intent: &Intent);
}

impl<F> IntentHandler for F
where
    F: Fn(&Intent) + Send + Sync,
{
    fn handle(&self, intent: &Intent) {
        self(intent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Handled,
    /// No handler registered; the intent was logged and dropped.
    Unhandled,
    /// The action is not on that kind's menu.
    Rejected,
}

#[derive(Default)]
pub struct IntentDispatcher {
    row_handlers: HashMap<EntityKind, Box<dyn IntentHandler>>,
    quick_handler: Option<Box<dyn IntentHandler>>,
}

impl IntentDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for row intents on `kind`, replacing any earlier one.
    pub fn register(&mut self, kind: EntityKind, handler: impl IntentHandler + 'static) {
        self.row_handlers.insert(kind, Box::new(handler));
    }

    pub fn register_quick(&mut self, handler: impl IntentHandler + 'static) {
        self.quick_handler = Some(Box::new(handler));
    }

    pub fn dispatch(&self, intent: &Intent) -> DispatchOutcome {
        let handler = match intent {
            Intent::Row { kind, id, action } => {
                if !action.applies_to(*kind) {
                    log::warn!("Rejected {:?} on {} {}: not in menu", action, kind.as_str(), id);
                    return DispatchOutcome::Rejected;
                }
                self.row_handlers.get(kind)
            }
            Intent::Quick { .. } => self.quick_handler.as_ref(),
        };

        match handler {
            Some(handler) => {
                handler.handle(intent);
                DispatchOutcome::Handled
            }
            None => {
                log::info!("No handler for {:?}; ignoring", intent);
                DispatchOutcome::Unhandled
            }
        }
    }
}
