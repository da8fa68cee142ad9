use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError, WorkspaceError};
use crate::models::{FileKind, Mode, SmtpSettings, StoreData, WorkspaceFile};

/// Store shared between web handlers
pub type SharedStore = Arc<Mutex<Store>>;

/// Persisted configuration and workspace manifest.
///
/// Loaded once per process. Every mutation re-reads the file, applies the
/// change, validates and writes the whole document back atomically, so
/// separate processes sharing the file converge (last writer wins).
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: StoreData,
}

impl Store {
    /// Open the store at `path`; a missing file yields defaults
    pub fn open(path: impl Into<PathBuf>) -> std::result::Result<Self, StoreError> {
        let path = path.into();
        let data = Self::read(&path)?;
        info!(
            "Loaded store {} ({} workspace files)",
            path.display(),
            data.workspace_files.len()
        );
        Ok(Self { path, data })
    }

    /// Wrap a store for sharing across handlers
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    fn read(path: &Path) -> std::result::Result<StoreData, StoreError> {
        if !path.exists() {
            debug!("Store file does not exist, using defaults");
            return Ok(StoreData::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::ReadError(path.to_path_buf(), e))?;

        if content.trim().is_empty() {
            return Ok(StoreData::default());
        }

        let (data, dropped) = serde_json::from_str(&content)
            .and_then(StoreData::from_value_repaired)
            .map_err(|e| StoreError::ParseError(path.to_path_buf(), e.to_string()))?;

        for problem in dropped {
            warn!("Store {} holds an invalid value, using the default: {}", path.display(), problem);
        }

        Ok(data)
    }

    /// Save to file atomically (write to temp, then rename)
    fn write(path: &Path, data: &StoreData) -> std::result::Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::WriteError(parent.to_path_buf(), e))?;
            }
        }

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StoreError::ParseError(path.to_path_buf(), e.to_string()))?;

        let temp_file = path.with_extension("json.tmp");
        fs::write(&temp_file, &json).map_err(|e| StoreError::WriteError(temp_file.clone(), e))?;
        fs::rename(&temp_file, path).map_err(|e| StoreError::WriteError(path.to_path_buf(), e))?;

        debug!("Saved store {}", path.display());
        Ok(())
    }

    /// Persist the current snapshot
    pub fn save(&self) -> std::result::Result<(), StoreError> {
        Self::write(&self.path, &self.data)
    }

    /// Re-read the file, discarding the in-memory snapshot
    pub fn reload(&mut self) -> std::result::Result<(), StoreError> {
        self.data = Self::read(&self.path)?;
        Ok(())
    }

    /// Reload, mutate, persist. On error nothing is written.
    fn update<T, F>(&mut self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut StoreData) -> Result<T>,
    {
        let mut fresh = Self::read(&self.path)?;
        let out = mutate(&mut fresh)?;
        Self::write(&self.path, &fresh)?;
        self.data = fresh;
        Ok(out)
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model(&self) -> Option<&str> {
        self.data.active_model()
    }

    pub fn mode(&self) -> Mode {
        self.data.mode
    }

    pub fn smtp(&self) -> &SmtpSettings {
        &self.data.smtp
    }

    pub fn supported_models(&self) -> &[String] {
        &self.data.supported_models
    }

    /// Select the active model; it must be in the supported list
    pub fn set_model(&mut self, model: &str) -> Result<()> {
        self.update(|data| {
            data.check_model(model)?;
            data.model = Some(model.to_string());
            Ok(())
        })?;
        info!("Model set to {}", model);
        Ok(())
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.update(|data| {
            data.mode = mode;
            Ok(())
        })?;
        info!("Mode set to {}", mode);
        Ok(())
    }

    pub fn set_smtp(&mut self, smtp: SmtpSettings) -> Result<()> {
        smtp.validate()?;
        self.update(|data| {
            data.smtp = smtp;
            Ok(())
        })?;
        info!("SMTP settings updated");
        Ok(())
    }

    /// Add or replace a workspace entry by path
    pub fn add_file(&mut self, path: impl Into<PathBuf>, kind: FileKind) -> Result<()> {
        let entry = WorkspaceFile::new(path, kind);
        debug!("Adding {} as {}", entry.path.display(), kind);
        self.update(|data| {
            data.workspace_files.upsert(entry);
            Ok(())
        })
    }

    /// Remove entries by path; absent paths are ignored
    pub fn remove_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize> {
        let removed = self.update(|data| Ok(data.workspace_files.remove(paths)))?;
        info!("Removed {} workspace files", removed);
        Ok(removed)
    }

    /// Change the type of an existing entry
    pub fn classify_file(&mut self, path: &Path, kind: FileKind) -> Result<()> {
        self.update(|data| {
            if data.workspace_files.classify(path, kind) {
                Ok(())
            } else {
                Err(WorkspaceError::NotInWorkspace(path.to_path_buf()).into())
            }
        })
    }
}
