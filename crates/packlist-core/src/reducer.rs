//! Pure state transitions for the packing list.
//!
//! `reduce` takes the current state by value and hands back the next one. It
//! performs no I/O; time and fresh ids come from the supplied [`Environment`],
//! so a fixed environment makes every transition reproducible.

use chrono::Utc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::item::{
    CUSTOM_CATEGORY, DEFAULT_TITLE, Item, NO_TEMPLATE_ID, ORDER_STRIDE, PackListState,
    STATE_VERSION, icon_or_placeholder,
};
use crate::template::{Template, expand_template};

/// Clock and id source injected into the reducer.
pub trait Environment {
    fn now_millis(&mut self) -> i64;
    fn fresh_id(&mut self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn now_millis(&mut self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn fresh_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic environment: a settable clock and sequential ids (`item-1`, `item-2`, ...).
#[derive(Debug, Clone)]
pub struct FixedEnvironment {
    pub now: i64,
    next_id: u64,
}

impl FixedEnvironment {
    pub fn new(now: i64) -> Self {
        Self { now, next_id: 0 }
    }

    pub fn advance(&mut self, millis: i64) {
        self.now += millis;
    }
}

impl Environment for FixedEnvironment {
    fn now_millis(&mut self) -> i64 {
        self.now
    }

    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("item-{}", self.next_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ToggleItem { id: String },
    /// `label` must already be trimmed and 1-20 characters long.
    AddItem { label: String, icon: String },
    DeleteItem { id: String },
    MoveItem { id: String, direction: Direction },
    ResetDone,
    UpdateMeta { list_title: String },
    /// `None` starts an empty list.
    ApplyTemplate(Option<Template>),
    /// Only produced by the persistence boundary after validation.
    LoadState(PackListState),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ToggleItem { .. } => "toggle_item",
            Action::AddItem { .. } => "add_item",
            Action::DeleteItem { .. } => "delete_item",
            Action::MoveItem { .. } => "move_item",
            Action::ResetDone => "reset_done",
            Action::UpdateMeta { .. } => "update_meta",
            Action::ApplyTemplate(_) => "apply_template",
            Action::LoadState(_) => "load_state",
        }
    }
}

pub fn reduce<E: Environment + ?Sized>(
    mut state: PackListState,
    action: Action,
    env: &mut E,
) -> PackListState {
    debug!(action = action.name(), items = state.items.len(), "reducing");

    match action {
        Action::ToggleItem { id } => {
            if let Some(item) = state.items.iter_mut().find(|item| item.id == id) {
                item.done = !item.done;
            }
            touch(&mut state, env);
        }
        Action::AddItem { label, icon } => {
            let max_order = state
                .items
                .iter()
                .map(|item| item.order)
                .max()
                .unwrap_or(0)
                .max(0);
            let item = Item {
                id: env.fresh_id(),
                label,
                icon: icon_or_placeholder(&icon),
                done: false,
                order: max_order.saturating_add(ORDER_STRIDE),
                category: Some(CUSTOM_CATEGORY.to_string()),
            };
            state.items.push(item);
            touch(&mut state, env);
        }
        Action::DeleteItem { id } => {
            state.items.retain(|item| item.id != id);
            renormalize(&mut state.items);
            touch(&mut state, env);
        }
        Action::MoveItem { id, direction } => {
            let position = state
                .sorted_items()
                .iter()
                .position(|item| item.id == id);
            let target = position
                .and_then(|pos| pos.checked_add_signed(direction.offset()))
                .filter(|target| *target < state.items.len());

            let (Some(position), Some(target)) = (position, target) else {
                trace!(%id, ?direction, "move has no effect");
                return state;
            };

            state.items.sort_by_key(|item| item.order);
            let moved = state.items.remove(position);
            state.items.insert(target, moved);
            renormalize(&mut state.items);
            touch(&mut state, env);
        }
        Action::ResetDone => {
            for item in &mut state.items {
                item.done = false;
            }
            touch(&mut state, env);
        }
        Action::UpdateMeta { list_title } => {
            state.list_title = list_title;
            touch(&mut state, env);
        }
        Action::ApplyTemplate(template) => {
            let items = template
                .as_ref()
                .map(|t| expand_template(t, env))
                .unwrap_or_default();
            let updated_at = env.now_millis().max(state.updated_at);
            state = PackListState {
                version: STATE_VERSION,
                started: true,
                selected_template_id: Some(
                    template
                        .as_ref()
                        .map(|t| t.id.clone())
                        .unwrap_or_else(|| NO_TEMPLATE_ID.to_string()),
                ),
                list_title: template
                    .map(|t| t.name)
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                items,
                updated_at,
            };
        }
        Action::LoadState(payload) => {
            state = payload;
        }
    }

    state
}

/// Sorts by order key and reassigns keys to 10, 20, 30, ...
pub fn renormalize(items: &mut [Item]) {
    items.sort_by_key(|item| item.order);
    for (idx, item) in items.iter_mut().enumerate() {
        item.order = (idx as i64 + 1) * ORDER_STRIDE;
    }
}

fn touch<E: Environment + ?Sized>(state: &mut PackListState, env: &mut E) {
    state.updated_at = state.updated_at.max(env.now_millis());
}
