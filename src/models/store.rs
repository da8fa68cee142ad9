use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::{ConfigError, Manifest};

/// Operating persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Job seeker: optimize own resume, cover letters, applications
    #[default]
    Candidate,
    /// Headhunter: optimize candidate resumes, recommendation letters
    Hunter,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Candidate => "candidate",
            Mode::Hunter => "hunter",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "candidate" => Ok(Mode::Candidate),
            "hunter" => Ok(Mode::Hunter),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

/// Ports accepted for SMTP delivery
pub const SMTP_PORTS: [u16; 3] = [465, 587, 25];

/// Outgoing mail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpSettings {
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_password: Option<String>,
    #[serde(default)]
    pub smtp_server: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            sender_email: None,
            sender_password: None,
            smtp_server: None,
            smtp_port: default_smtp_port(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

impl SmtpSettings {
    /// Names of the fields still unset (empty strings count as unset)
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.sender_email) {
            missing.push("sender_email");
        }
        if blank(&self.sender_password) {
            missing.push("sender_password");
        }
        if blank(&self.smtp_server) {
            missing.push("smtp_server");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SMTP_PORTS.contains(&self.smtp_port) {
            return Err(ConfigError::InvalidSmtpPort(self.smtp_port));
        }
        Ok(())
    }
}

/// The persisted JSON document: model selection, mode, SMTP and workspace manifest.
///
/// Unknown keys are ignored on load; missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_supported_models")]
    pub supported_models: Vec<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub workspace_files: Manifest,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            model: None,
            supported_models: default_supported_models(),
            mode: Mode::default(),
            smtp: SmtpSettings::default(),
            workspace_files: Manifest::default(),
        }
    }
}

fn default_supported_models() -> Vec<String> {
    ["gpt-4o", "gpt-4o-mini", "gpt-4", "gpt-3.5-turbo", "deepseek-chat"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl StoreData {
    /// Active model, falling back to the first supported one
    pub fn active_model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .or_else(|| self.supported_models.first().map(String::as_str))
    }

    pub fn check_model(&self, model: &str) -> Result<(), ConfigError> {
        if self.supported_models.iter().any(|m| m == model) {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedModel(model.to_string()))
        }
    }

    /// Parse a persisted document, dropping values that break an invariant.
    ///
    /// An unknown mode falls back to the default, an unsupported model is
    /// cleared and an invalid SMTP port resets to 587. The dropped values
    /// are returned so the caller can report them.
    pub fn from_value_repaired(mut value: Value) -> serde_json::Result<(Self, Vec<ConfigError>)> {
        let mut dropped = Vec::new();
        let mode_ok = match value.get_mut("mode") {
            None => true,
            Some(raw) => match raw.as_str().map(str::parse::<Mode>) {
                Some(Ok(mode)) => {
                    *raw = Value::from(mode.display_name());
                    true
                }
                _ => {
                    let shown = raw.as_str().map_or_else(|| raw.to_string(), String::from);
                    dropped.push(ConfigError::InvalidMode(shown));
                    false
                }
            },
        };
        if !mode_ok {
            if let Some(obj) = value.as_object_mut() {
                obj.remove("mode");
            }
        }

        let mut data: StoreData = serde_json::from_value(value)?;
        dropped.extend(data.repair());
        Ok((data, dropped))
    }

    /// Clear an unsupported model and reset an invalid SMTP port
    pub fn repair(&mut self) -> Vec<ConfigError> {
        let mut dropped = Vec::new();
        if let Some(model) = self.model.take() {
            match self.check_model(&model) {
                Ok(()) => self.model = Some(model),
                Err(e) => dropped.push(e),
            }
        }
        if let Err(e) = self.smtp.validate() {
            dropped.push(e);
            self.smtp.smtp_port = default_smtp_port();
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("Hunter".parse::<Mode>().unwrap(), Mode::Hunter);
        assert_eq!(" candidate ".parse::<Mode>().unwrap(), Mode::Candidate);
        assert!(matches!(
            "recruiter".parse::<Mode>(),
            Err(ConfigError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_smtp_missing_fields() {
        let mut smtp = SmtpSettings::default();
        assert_eq!(
            smtp.missing_fields(),
            vec!["sender_email", "sender_password", "smtp_server"]
        );
        smtp.sender_email = Some("me@example.com".to_string());
        smtp.sender_password = Some("  ".to_string());
        smtp.smtp_server = Some("smtp.example.com".to_string());
        assert_eq!(smtp.missing_fields(), vec!["sender_password"]);
    }

    #[test]
    fn test_smtp_port_validation() {
        let mut smtp = SmtpSettings::default();
        assert!(smtp.validate().is_ok());
        smtp.smtp_port = 2525;
        assert!(matches!(smtp.validate(), Err(ConfigError::InvalidSmtpPort(2525))));
    }

    #[test]
    fn test_store_defaults_and_unknown_keys() {
        let json = r#"{"mode":"hunter","default_model":"legacy","extra":{"a":1}}"#;
        let data: StoreData = serde_json::from_str(json).unwrap();
        assert_eq!(data.mode, Mode::Hunter);
        assert!(data.model.is_none());
        assert_eq!(data.active_model(), Some("gpt-4o"));
        assert!(data.workspace_files.is_empty());
        assert_eq!(data.smtp.smtp_port, 587);
    }

    #[test]
    fn test_repair_clears_unsupported_model() {
        let mut data = StoreData::default();
        data.model = Some("gpt-4".to_string());
        assert!(data.repair().is_empty());
        assert_eq!(data.model.as_deref(), Some("gpt-4"));

        data.model = Some("made-up".to_string());
        let dropped = data.repair();
        assert!(matches!(dropped.as_slice(), [ConfigError::UnsupportedModel(m)] if m == "made-up"));
        assert!(data.model.is_none());
        assert_eq!(data.active_model(), Some("gpt-4o"));
    }

    #[test]
    fn test_invalid_values_dropped_on_load() {
        let value = serde_json::json!({
            "model": "bogus",
            "mode": "recruiter",
            "smtp": {"smtp_port": 2525, "smtp_server": "smtp.example.com"}
        });
        let (data, dropped) = StoreData::from_value_repaired(value).unwrap();

        assert_eq!(dropped.len(), 3);
        assert!(matches!(&dropped[0], ConfigError::InvalidMode(m) if m == "recruiter"));
        assert_eq!(data.mode, Mode::Candidate);
        assert!(data.model.is_none());
        assert_eq!(data.smtp.smtp_port, 587);
        assert_eq!(data.smtp.smtp_server.as_deref(), Some("smtp.example.com"));
    }

    #[test]
    fn test_mode_case_is_normalized_on_load() {
        let (data, dropped) =
            StoreData::from_value_repaired(serde_json::json!({"mode": "Hunter"})).unwrap();
        assert!(dropped.is_empty());
        assert_eq!(data.mode, Mode::Hunter);

        let (data, dropped) = StoreData::from_value_repaired(serde_json::json!({"mode": 3})).unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(data.mode, Mode::Candidate);
    }
}
