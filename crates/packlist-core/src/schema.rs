//! Structural validation and migration of the persisted record.
//!
//! A stored blob goes through three steps: parse, migrate, check. Migrations
//! work on the raw JSON object so older records can be upgraded before the
//! shape is checked; the checked record is then rebuilt field by field with
//! no implicit coercion.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::item::{Item, NO_TEMPLATE_ID, PackListState, STATE_VERSION};
use crate::reducer::renormalize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("record is not valid json: {0}")]
    Parse(String),
    #[error("record is not a json object")]
    NotAnObject,
    #[error("unsupported record version: {0}")]
    UnsupportedVersion(String),
    #[error("field `{field}` must be {expected}")]
    Field {
        field: &'static str,
        expected: &'static str,
    },
    #[error("items[{index}] field `{field}` must be {expected}")]
    ItemField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(PackListState),
    Invalid(SchemaError),
}

/// One upgrade step applied to the raw record object.
pub struct Migration {
    pub name: &'static str,
    pub apply: fn(&mut Map<String, Value>) -> bool,
}

/// Applied in order to every loaded record.
pub const MIGRATIONS: &[Migration] = &[Migration {
    name: "template-selection-defaults",
    apply: default_template_selection,
}];

/// Records written before the template-selection screen have neither
/// `started` nor `selectedTemplateId`; such lists were already in use.
fn default_template_selection(record: &mut Map<String, Value>) -> bool {
    let mut changed = false;
    if record.get("started").is_none_or(Value::is_null) {
        record.insert("started".to_string(), Value::Bool(true));
        changed = true;
    }
    if !record.contains_key("selectedTemplateId") {
        record.insert(
            "selectedTemplateId".to_string(),
            Value::String(NO_TEMPLATE_ID.to_string()),
        );
        changed = true;
    }
    changed
}

pub fn migrate(record: &mut Map<String, Value>) {
    for migration in MIGRATIONS {
        if (migration.apply)(record) {
            debug!(migration = migration.name, "applied record migration");
        } else {
            trace!(migration = migration.name, "migration not needed");
        }
    }
}

/// Parses, migrates and checks a stored record. Items come back renumbered.
pub fn check_record(raw: &str) -> Validation {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => return Validation::Invalid(SchemaError::Parse(err.to_string())),
    };
    let Value::Object(mut record) = value else {
        return Validation::Invalid(SchemaError::NotAnObject);
    };

    migrate(&mut record);

    match build_state(&record) {
        Ok(mut state) => {
            renormalize(&mut state.items);
            Validation::Valid(state)
        }
        Err(err) => Validation::Invalid(err),
    }
}

fn build_state(record: &Map<String, Value>) -> Result<PackListState, SchemaError> {
    match record.get("version") {
        Some(Value::Number(n)) if n.as_f64() == Some(f64::from(STATE_VERSION)) => {}
        Some(other) => return Err(SchemaError::UnsupportedVersion(other.to_string())),
        None => return Err(SchemaError::UnsupportedVersion("missing".to_string())),
    }

    let list_title = record
        .get("listTitle")
        .and_then(Value::as_str)
        .ok_or(SchemaError::Field {
            field: "listTitle",
            expected: "a string",
        })?;
    let updated_at = record
        .get("updatedAt")
        .and_then(as_integer)
        .ok_or(SchemaError::Field {
            field: "updatedAt",
            expected: "a number",
        })?;
    let started = record
        .get("started")
        .and_then(Value::as_bool)
        .ok_or(SchemaError::Field {
            field: "started",
            expected: "a boolean",
        })?;
    let selected_template_id = match record.get("selectedTemplateId") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(_) => {
            return Err(SchemaError::Field {
                field: "selectedTemplateId",
                expected: "a string or null",
            });
        }
    };
    let raw_items = record
        .get("items")
        .and_then(Value::as_array)
        .ok_or(SchemaError::Field {
            field: "items",
            expected: "an array",
        })?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(raw_items.len());
    for (index, value) in raw_items.iter().enumerate() {
        let item = build_item(index, value)?;
        if seen.insert(item.id.clone()) {
            items.push(item);
        } else {
            debug!(index, id = %item.id, "dropping item with duplicate id");
        }
    }

    Ok(PackListState {
        version: STATE_VERSION,
        started,
        selected_template_id,
        list_title: list_title.to_string(),
        items,
        updated_at,
    })
}

fn build_item(index: usize, value: &Value) -> Result<Item, SchemaError> {
    let field_err = |field: &'static str, expected: &'static str| SchemaError::ItemField {
        index,
        field,
        expected,
    };
    let obj = value.as_object().ok_or(field_err("*", "an object"))?;
    let string = |field: &'static str| {
        obj.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(field_err(field, "a string"))
    };

    let category = match obj.get("category") {
        None => None,
        Some(Value::String(c)) => Some(c.clone()),
        Some(_) => return Err(field_err("category", "a string when present")),
    };

    Ok(Item {
        id: string("id")?,
        label: string("label")?,
        icon: string("icon")?,
        done: obj
            .get("done")
            .and_then(Value::as_bool)
            .ok_or(field_err("done", "a boolean"))?,
        order: obj
            .get("order")
            .and_then(as_integer)
            .ok_or(field_err("order", "a number"))?,
        category,
    })
}

/// Any json number; fractional values are truncated.
fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}
