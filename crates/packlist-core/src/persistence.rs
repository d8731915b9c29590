use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::item::PackListState;
use crate::schema::{SchemaError, Validation, check_record};

/// Key of the single persisted record.
pub const STATE_KEY: &str = "packlist-state-v1";

/// Durable key/value blob storage.
pub trait Storage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One file per key inside a data directory; writes go through a temp file
/// and a rename so a crash never leaves half a record behind.
#[derive(Debug)]
pub struct FileStorage {
    pub data_dir: PathBuf,
}

impl FileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        info!(data_dir = %data_dir.display(), "opened file storage");
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    #[tracing::instrument(skip(self))]
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        debug!(file = %path.display(), bytes = raw.len(), "read record");
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value))]
    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        debug!(file = %path.display(), bytes = value.len(), "wrote record");
        Ok(())
    }
}

/// In-process storage; `fail_writes` makes every write error out.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    pub fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.fail_writes {
            return Err(anyhow!("storage is read-only"));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Absent,
    Invalid(SchemaError),
    Loaded(PackListState),
}

impl LoadOutcome {
    pub fn into_state(self) -> Option<PackListState> {
        match self {
            LoadOutcome::Loaded(state) => Some(state),
            LoadOutcome::Absent | LoadOutcome::Invalid(_) => None,
        }
    }
}

/// Reads and writes the single persisted list record.
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    storage: S,
    key: String,
}

impl<S: Storage> PersistenceGateway<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STATE_KEY)
    }

    pub fn with_key(storage: S, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Never fails: read errors count as absent, bad records as invalid.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn load(&self) -> LoadOutcome {
        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("no stored list");
                return LoadOutcome::Absent;
            }
            Err(err) => {
                let error = format!("{err:#}");
                warn!(%error, "failed reading stored list; treating as absent");
                return LoadOutcome::Absent;
            }
        };

        match check_record(&raw) {
            Validation::Valid(state) => {
                debug!(items = state.items.len(), "loaded stored list");
                LoadOutcome::Loaded(state)
            }
            Validation::Invalid(reason) => {
                warn!(%reason, "stored list failed validation; ignoring it");
                LoadOutcome::Invalid(reason)
            }
        }
    }

    /// Overwrites the record. Failures are logged and dropped.
    #[tracing::instrument(skip(self, state), fields(key = %self.key, items = state.items.len()))]
    pub fn save(&self, state: &PackListState) {
        let result = serde_json::to_string(state)
            .context("failed to serialize list")
            .and_then(|json| self.storage.write(&self.key, &json));
        if let Err(err) = result {
            let error = format!("{err:#}");
            warn!(%error, "failed to save list; continuing without persistence");
        }
    }
}
