use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings loaded from airecruit.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which wire protocol the completion endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible `/chat/completions`
    #[default]
    Openai,
    /// Ollama `/api/chat`
    Ollama,
}

/// LLM endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Base URL of the API
    #[serde(default = "default_llm_url")]
    pub url: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Timeout in seconds for completion requests
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            url: default_llm_url(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout(),
            temperature: default_temperature(),
        }
    }
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

/// How a single resume/JD is picked when several share a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// The entry added (or re-added) last
    #[default]
    MostRecent,
    /// Every readable document of the type, concatenated
    All,
}

/// Workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory scanned for documents and receiving exports
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    #[serde(default)]
    pub selection: SelectionPolicy,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            selection: SelectionPolicy::default(),
        }
    }
}

fn default_workdir() -> PathBuf {
    PathBuf::from("workdir")
}

/// Behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Echo model output to the terminal while it streams (Ollama only)
    #[serde(default = "default_stream_output")]
    pub stream_output: bool,
    /// Keep at most this many non-system messages per task (0 = unbounded)
    #[serde(default)]
    pub max_history_messages: usize,
    /// Leave the work session after the first successful action
    #[serde(default)]
    pub end_session_on_action: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            stream_output: default_stream_output(),
            max_history_messages: 0,
            end_session_on_action: false,
        }
    }
}

fn default_stream_output() -> bool {
    true
}

/// Local web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            open_browser: default_open_browser(),
        }
    }
}

fn default_port() -> u16 {
    5000
}

fn default_open_browser() -> bool {
    true
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Try to load settings from airecruit.toml in the given directory
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join("airecruit.toml");
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI overrides into the settings
    pub fn with_overrides(mut self, port: Option<u16>, no_browser: bool) -> Self {
        if let Some(p) = port {
            self.server.port = p;
        }
        if no_browser {
            self.server.open_browser = false;
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {0}: {1}")]
    ReadError(PathBuf, std::io::Error),
    #[error("Failed to parse settings file {0}: {1}")]
    ParseError(PathBuf, toml::de::Error),
    #[error("Unsupported model '{0}'. Use /model ls to see the supported list")]
    UnsupportedModel(String),
    #[error("Invalid mode '{0}'. Expected 'candidate' or 'hunter'")]
    InvalidMode(String),
    #[error("Invalid SMTP port {0}. Expected 465, 587 or 25")]
    InvalidSmtpPort(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.llm.provider, Provider::Openai);
        assert_eq!(settings.llm.url, "https://api.openai.com/v1");
        assert_eq!(settings.llm.timeout_seconds, 120);
        assert!((settings.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(settings.workspace.workdir, PathBuf::from("workdir"));
        assert_eq!(settings.workspace.selection, SelectionPolicy::MostRecent);
        assert!(settings.behavior.stream_output);
        assert_eq!(settings.behavior.max_history_messages, 0);
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_settings_with_overrides() {
        let settings = Settings::default().with_overrides(Some(8080), true);
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.server.open_browser);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[llm]
provider = "ollama"
url = "http://localhost:11434"
timeout_seconds = 60

[workspace]
selection = "all"

[behavior]
max_history_messages = 12
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.llm.provider, Provider::Ollama);
        assert_eq!(settings.llm.url, "http://localhost:11434");
        assert_eq!(settings.llm.timeout_seconds, 60);
        assert_eq!(settings.llm.api_key_env, "OPENAI_API_KEY"); // default
        assert_eq!(settings.workspace.selection, SelectionPolicy::All);
        assert_eq!(settings.behavior.max_history_messages, 12);
        assert!(settings.behavior.stream_output);
    }
}
