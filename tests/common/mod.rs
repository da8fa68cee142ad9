//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use airecruit::core::{ActionRegistry, ChatBackend, Console, Mailer, OutgoingEmail, PdfRenderer, Store};
use airecruit::error::LlmError;
use airecruit::models::{ChatMessage, FileKind, Settings, SmtpSettings};

/// Create a project directory with an empty work directory
pub fn create_test_project() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let project_root = temp_dir.path().to_path_buf();
    fs::create_dir_all(project_root.join("workdir")).expect("Failed to create workdir");
    (temp_dir, project_root)
}

pub fn store_path(project_root: &Path) -> PathBuf {
    project_root.join("store").join("config.json")
}

pub fn open_store(project_root: &Path) -> Store {
    Store::open(store_path(project_root)).expect("Failed to open store")
}

/// Settings with the work directory inside the project
pub fn test_settings(project_root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.workspace.workdir = project_root.join("workdir");
    settings
}

/// Write a document into the work directory
pub fn write_document(project_root: &Path, name: &str, content: &str) -> PathBuf {
    let path = project_root.join("workdir").join(name);
    fs::write(&path, content).expect("Failed to write document");
    path
}

/// Write a document and add it to the workspace
pub fn add_document(store: &mut Store, project_root: &Path, name: &str, kind: FileKind, content: &str) -> PathBuf {
    let path = write_document(project_root, name, content);
    store.add_file(path.clone(), kind).expect("Failed to add file");
    path
}

pub fn configure_smtp(store: &mut Store) {
    store
        .set_smtp(SmtpSettings {
            sender_email: Some("me@example.com".to_string()),
            sender_password: Some("app-token".to_string()),
            smtp_server: Some("smtp.example.com".to_string()),
            smtp_port: 587,
        })
        .expect("Failed to save SMTP settings");
}

/// Console fed from a script; records prompts and output
#[derive(Clone, Default)]
pub struct ScriptedConsole {
    inputs: Arc<Mutex<VecDeque<String>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub output: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConsole {
    pub fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: Arc::new(Mutex::new(inputs.iter().map(|s| s.to_string()).collect())),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn output(&self) -> String {
        self.output.lock().unwrap().join("\n")
    }

    pub fn remaining_inputs(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.inputs.lock().unwrap().pop_front()
    }

    fn say(&mut self, text: &str) {
        self.output.lock().unwrap().push(text.to_string());
    }
}

/// Backend replying from a script; records every request
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    pub requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::EmptyContent))
    }
}

/// Mailer that records instead of sending
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn deliver(&self, _smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), String> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Renderer that writes a stub PDF and records the HTML
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub rendered: Arc<Mutex<Vec<String>>>,
}

impl RecordingRenderer {
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

impl PdfRenderer for RecordingRenderer {
    fn render(&self, html: &str, output: &Path) -> Result<(), String> {
        self.rendered.lock().unwrap().push(html.to_string());
        fs::write(output, b"%PDF-1.4\n").map_err(|e| e.to_string())
    }
}

pub fn test_registry(renderer: &RecordingRenderer, mailer: &RecordingMailer) -> ActionRegistry {
    ActionRegistry::standard(Box::new(renderer.clone()), Box::new(mailer.clone()), false)
}

/// Wrap a JSON directive in a reply the way the model does
pub fn directive_reply(text: &str, json: &str) -> String {
    format!("{}\n\n```json\n{}\n```\n", text, json)
}
