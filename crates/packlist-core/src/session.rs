//! Process-lifetime owner of the list.
//!
//! A [`Session`] is created once: it loads the stored record (or starts on the
//! template-selection screen), routes every change through the reducer, saves
//! after each effective change and keeps the short-lived notices the view shows.
//! Call [`Session::teardown`] when the view goes away so no notice outlives it.

use anyhow::anyhow;
use tracing::{debug, info};

use crate::gesture::{GestureConfig, GestureIntent, GestureRecognizer};
use crate::item::{LabelError, PackListState, normalize_title, validate_label};
use crate::persistence::{LoadOutcome, PersistenceGateway, Storage};
use crate::reducer::{Action, Direction, Environment, reduce};
use crate::share;
use crate::template::TemplateCatalog;

/// How long a toast or the ready banner stays visible.
pub const NOTICE_DURATION_MS: i64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    message: String,
    expires_at: i64,
}

/// What the view should currently display on top of the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notices {
    pub toast: Option<String>,
    pub ready_banner: bool,
}

pub struct Session<S, E> {
    state: PackListState,
    gateway: PersistenceGateway<S>,
    env: E,
    catalog: TemplateCatalog,
    gestures: GestureRecognizer,
    toast: Option<Notice>,
    ready_banner: Option<Notice>,
}

impl<S: Storage, E: Environment> Session<S, E> {
    #[tracing::instrument(skip_all)]
    pub fn open(
        gateway: PersistenceGateway<S>,
        mut env: E,
        catalog: TemplateCatalog,
        gesture_config: GestureConfig,
    ) -> Self {
        let empty = PackListState::empty(env.now_millis());
        let state = match gateway.load() {
            LoadOutcome::Loaded(stored) => {
                info!(items = stored.items.len(), started = stored.started, "resuming stored list");
                reduce(empty, Action::LoadState(stored), &mut env)
            }
            LoadOutcome::Absent | LoadOutcome::Invalid(_) => {
                info!("starting on template selection");
                empty
            }
        };

        Self {
            state,
            gateway,
            env,
            catalog,
            gestures: GestureRecognizer::new(gesture_config),
            toast: None,
            ready_banner: None,
        }
    }

    pub fn state(&self) -> &PackListState {
        &self.state
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn gestures(&mut self) -> &mut GestureRecognizer {
        &mut self.gestures
    }

    /// Runs one action; saves and returns `true` when the state changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let replaces_state = matches!(action, Action::ApplyTemplate(_) | Action::LoadState(_));
        let name = action.name();
        let next = reduce(self.state.clone(), action, &mut self.env);
        let changed = next != self.state;
        self.state = next;

        if replaces_state {
            self.ready_banner = None;
        }
        if changed {
            self.gateway.save(&self.state);
        }
        debug!(action = name, changed, "dispatched");
        changed
    }

    /// `"none"` or `None` starts an empty list.
    pub fn start(&mut self, template_id: Option<&str>) -> anyhow::Result<()> {
        let template = match template_id {
            None | Some(crate::item::NO_TEMPLATE_ID) => None,
            Some(id) => Some(
                self.catalog
                    .get(id)
                    .cloned()
                    .ok_or_else(|| anyhow!("unknown template: {id}"))?,
            ),
        };
        self.dispatch(Action::ApplyTemplate(template));
        Ok(())
    }

    pub fn add_item(&mut self, raw_label: &str, icon: &str) -> Result<(), LabelError> {
        let label = validate_label(raw_label)?;
        self.dispatch(Action::AddItem {
            label: label.clone(),
            icon: icon.trim().to_string(),
        });
        self.show_toast(format!("「{label}」を追加しました"));
        Ok(())
    }

    pub fn toggle(&mut self, id: &str) {
        let changed = self.dispatch(Action::ToggleItem { id: id.to_string() });
        let now_done = self.state.find(id).is_some_and(|item| item.done);
        if changed && now_done && self.state.all_done() {
            let expires_at = self.env.now_millis() + NOTICE_DURATION_MS;
            self.ready_banner = Some(Notice {
                message: "準備完了！".to_string(),
                expires_at,
            });
        }
    }

    pub fn delete(&mut self, id: &str) {
        let label = self.state.find(id).map(|item| item.label.clone());
        self.dispatch(Action::DeleteItem { id: id.to_string() });
        if let Some(label) = label {
            self.show_toast(format!("「{label}」を削除しました"));
        }
    }

    pub fn move_item(&mut self, id: &str, direction: Direction) -> bool {
        self.dispatch(Action::MoveItem {
            id: id.to_string(),
            direction,
        })
    }

    pub fn rename(&mut self, raw_title: &str) {
        self.dispatch(Action::UpdateMeta {
            list_title: normalize_title(raw_title),
        });
    }

    /// Only clears checkmarks when the user confirmed.
    pub fn reset_done(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            debug!("reset declined");
            return false;
        }
        self.dispatch(Action::ResetDone);
        true
    }

    /// Text handed to the clipboard by the host.
    pub fn share_text(&mut self) -> String {
        self.show_toast("コピーしました".to_string());
        share::render_text(&self.state)
    }

    /// Applies recognizer output that touches the list.
    pub fn handle_intent(&mut self, intent: GestureIntent) {
        match intent {
            GestureIntent::Toggle(id) => self.toggle(&id),
            GestureIntent::DropDelete(id) => self.delete(&id),
            GestureIntent::CapturePointer { .. }
            | GestureIntent::BeginDrag(_)
            | GestureIntent::DragOver { .. }
            | GestureIntent::CancelDrag(_) => {}
        }
    }

    pub fn notices(&mut self) -> Notices {
        let now = self.env.now_millis();
        if self.toast.as_ref().is_some_and(|n| n.expires_at <= now) {
            self.toast = None;
        }
        if self.ready_banner.as_ref().is_some_and(|n| n.expires_at <= now) {
            self.ready_banner = None;
        }
        Notices {
            toast: self.toast.as_ref().map(|n| n.message.clone()),
            ready_banner: self.ready_banner.is_some(),
        }
    }

    pub fn ready_message(&self) -> Option<&str> {
        self.ready_banner.as_ref().map(|n| n.message.as_str())
    }

    /// Cancels pending notices; the list itself is already saved.
    pub fn teardown(&mut self) {
        self.toast = None;
        self.ready_banner = None;
        debug!("session torn down");
    }

    fn show_toast(&mut self, message: String) {
        let expires_at = self.env.now_millis() + NOTICE_DURATION_MS;
        self.toast = Some(Notice {
            message,
            expires_at,
        });
    }
}
