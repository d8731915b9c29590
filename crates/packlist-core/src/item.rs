use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Only record version currently defined.
pub const STATE_VERSION: u32 = 1;

/// Gap between consecutive order keys after renumbering.
pub const ORDER_STRIDE: i64 = 10;

pub const PLACEHOLDER_ICON: &str = "📦";
pub const CUSTOM_CATEGORY: &str = "custom";
pub const DEFAULT_TITLE: &str = "持ち物リスト";
pub const NO_TEMPLATE_ID: &str = "none";

pub const LABEL_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub done: bool,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackListState {
    pub version: u32,
    pub started: bool,
    pub selected_template_id: Option<String>,
    pub list_title: String,
    pub items: Vec<Item>,
    pub updated_at: i64,
}

impl PackListState {
    /// Fresh state for the template-selection screen.
    pub fn empty(now_ms: i64) -> Self {
        Self {
            version: STATE_VERSION,
            started: false,
            selected_template_id: None,
            list_title: DEFAULT_TITLE.to_string(),
            items: vec![],
            updated_at: now_ms,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn sorted_items(&self) -> Vec<&Item> {
        let mut sorted: Vec<&Item> = self.items.iter().collect();
        sorted.sort_by_key(|item| item.order);
        sorted
    }

    /// `(done, total)`
    pub fn progress(&self) -> (usize, usize) {
        let done = self.items.iter().filter(|item| item.done).count();
        (done, self.items.len())
    }

    pub fn all_done(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.done)
    }
}

pub fn icon_or_placeholder(icon: &str) -> String {
    let trimmed = icon.trim();
    if trimmed.is_empty() {
        PLACEHOLDER_ICON.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("label is empty")]
    Empty,
    #[error("label is {actual} characters; at most {max} allowed")]
    TooLong { max: usize, actual: usize },
}

/// Host-side check run before `AddItem` is dispatched. Returns the trimmed label.
pub fn validate_label(raw: &str) -> Result<String, LabelError> {
    let trimmed = raw.trim();
    let count = trimmed.chars().count();
    if count == 0 {
        return Err(LabelError::Empty);
    }
    if count > LABEL_MAX_CHARS {
        return Err(LabelError::TooLong {
            max: LABEL_MAX_CHARS,
            actual: count,
        });
    }
    Ok(trimmed.to_string())
}

/// Title used for `UpdateMeta`; blank input falls back to the default.
pub fn normalize_title(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}
