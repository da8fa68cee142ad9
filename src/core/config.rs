use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AirecruitError, StoreError};
use crate::models::Settings;

/// Load settings from the project directory with CLI overrides
pub fn load_settings(
    project_root: &Path,
    port: Option<u16>,
    no_browser: bool,
) -> Result<Settings, AirecruitError> {
    let settings = Settings::load_from_dir(project_root)?;
    let mut settings = settings.with_overrides(port, no_browser);

    if settings.workspace.workdir.is_relative() {
        settings.workspace.workdir = project_root.join(&settings.workspace.workdir);
    }

    info!(
        "Settings loaded: provider={:?}, url={}, timeout={}s, workdir={}",
        settings.llm.provider,
        settings.llm.url,
        settings.llm.timeout_seconds,
        settings.workspace.workdir.display()
    );

    Ok(settings)
}

/// Resolve where the persisted store lives: explicit path, or ~/.airecruit/config.json
pub fn resolve_store_path(explicit: Option<PathBuf>) -> Result<PathBuf, StoreError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
    Ok(home.join(".airecruit").join("config.json"))
}
