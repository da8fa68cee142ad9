//! Local side-effecting actions the model can request through directives.
//!
//! The registry is the single list of actions: the prompt builder documents
//! it and the dispatcher resolves directive names against it.

mod export_pdf;
mod send_email;

pub use export_pdf::*;
pub use send_email::*;

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::store::Store;
use crate::error::ActionError;
use crate::models::Mode;

/// One parameter an action requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    /// What the model should put there (mode-specific)
    pub hint: &'static str,
}

impl ParamSpec {
    pub const fn new(name: &'static str, hint: &'static str) -> Self {
        Self { name, hint }
    }
}

/// What an action may consult while running
pub struct ActionContext<'a> {
    pub store: &'a Store,
    pub workdir: &'a Path,
}

/// Fully validated parameters: every required name has a concrete value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionParams(BTreeMap<String, String>);

impl ActionParams {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value of a required parameter
    pub fn require(&self, action: &'static str, name: &str) -> Result<&str, ActionError> {
        self.get(name).ok_or_else(|| ActionError::InvalidParam {
            action,
            param: name.to_string(),
            message: "missing".to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ActionParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A registered local action
pub trait Action: Send + Sync {
    /// Name the model uses in the `action` field
    fn name(&self) -> &'static str;

    /// Other accepted names
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-line description for prompts and menus
    fn summary(&self, mode: Mode) -> &'static str;

    /// Required parameters, in the order they are asked for
    fn params(&self, mode: Mode) -> Vec<ParamSpec>;

    fn invoke(&self, params: &ActionParams, ctx: &ActionContext<'_>) -> Result<String, ActionError>;
}

/// Static name -> action mapping
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in actions: PDF export and email
    pub fn standard(renderer: Box<dyn PdfRenderer>, mailer: Box<dyn Mailer>, open_after_export: bool) -> Self {
        let mut registry = Self::new();
        registry
            .register(ExportPdfAction::new(renderer, open_after_export))
            .register(SendEmailAction::new(mailer));
        registry
    }

    pub fn register(&mut self, action: impl Action + 'static) -> &mut Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Resolve a directive's action name (case-insensitive, aliases included)
    pub fn lookup(&self, name: &str) -> Option<&dyn Action> {
        let wanted = name.trim().to_lowercase();
        self.actions
            .iter()
            .find(|a| a.name() == wanted || a.aliases().iter().any(|alias| *alias == wanted))
            .map(|a| a.as_ref())
    }

    /// Action at a 1-based menu position
    pub fn by_index(&self, index: usize) -> Option<&dyn Action> {
        index
            .checked_sub(1)
            .and_then(|i| self.actions.get(i))
            .map(|a| a.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Action> {
        self.actions.iter().map(|a| a.as_ref())
    }

    /// Numbered menu lines for model-free invocation
    pub fn menu(&self, mode: Mode) -> Vec<String> {
        self.iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {} - {}", i + 1, a.name(), a.summary(mode)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Action for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn aliases(&self) -> &'static [&'static str] {
            &["say"]
        }

        fn summary(&self, _mode: Mode) -> &'static str {
            "Repeat the text"
        }

        fn params(&self, _mode: Mode) -> Vec<ParamSpec> {
            vec![ParamSpec::new("text", "what to say")]
        }

        fn invoke(&self, params: &ActionParams, _ctx: &ActionContext<'_>) -> Result<String, ActionError> {
            Ok(params.require("echo", "text")?.to_string())
        }
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let mut registry = ActionRegistry::new();
        registry.register(Echo);
        assert_eq!(registry.lookup("echo").unwrap().name(), "echo");
        assert_eq!(registry.lookup(" SAY ").unwrap().name(), "echo");
        assert!(registry.lookup("ech").is_none());
    }

    #[test]
    fn test_by_index_is_one_based() {
        let mut registry = ActionRegistry::new();
        registry.register(Echo);
        assert!(registry.by_index(0).is_none());
        assert!(registry.by_index(1).is_some());
        assert!(registry.by_index(2).is_none());
        assert_eq!(registry.menu(Mode::Candidate), vec!["1. echo - Repeat the text"]);
    }

    #[test]
    fn test_params_require() {
        let params: ActionParams = [("text", "hi")].into_iter().collect();
        assert_eq!(params.require("echo", "text").unwrap(), "hi");
        assert!(params.require("echo", "other").is_err());
    }
}
