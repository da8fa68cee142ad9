use std::path::PathBuf;
use thiserror::Error;

use crate::models::ConfigError;

/// Main error type for AIRecruit
#[derive(Error, Debug)]
pub enum AirecruitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Console error: {0}")]
    Console(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the persisted JSON store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read store {0}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("Failed to write store {0}: {1}")]
    WriteError(PathBuf, std::io::Error),

    #[error("Store {0} is not valid JSON: {1}")]
    ParseError(PathBuf, String),

    #[error("No home directory found for the default store location")]
    NoHomeDir,
}

/// Errors related to workspace documents
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("File unavailable: {path}: {source}")]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not in workspace: {0}")]
    NotInWorkspace(PathBuf),

    #[error("Unsupported file type: {0} (expected pdf, docx, md or txt)")]
    UnsupportedFileType(PathBuf),

    #[error("No {0} in the workspace. Add one with /file")]
    MissingDocument(&'static str),
}

impl WorkspaceError {
    /// Path the error is attributed to, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            WorkspaceError::FileUnavailable { path, .. } => Some(path),
            WorkspaceError::NotInWorkspace(path) => Some(path),
            WorkspaceError::UnsupportedFileType(path) => Some(path),
            WorkspaceError::MissingDocument(_) => None,
        }
    }
}

/// Errors converting PDF/DOCX documents to text
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to extract text from PDF {0}: {1}")]
    Pdf(PathBuf, String),

    #[error("Failed to read DOCX {0}: {1}")]
    Docx(PathBuf, String),

    #[error("Failed to write converted text {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

/// Errors from the completion endpoint
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Model returned empty content")]
    EmptyContent,

    #[error("API key not set: export {0} or add it to .env")]
    MissingApiKey(String),

    #[error("No model selected and no supported models configured")]
    NoModel,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::ConnectionRefused(err.to_string())
        } else if let Some(status) = err.status() {
            LlmError::HttpError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

/// Errors from parsing a directive block out of a model reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("directive block is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("directive block is not a JSON object")]
    NotAnObject,

    #[error("directive block has no \"action\" field")]
    MissingAction,
}

/// Errors raised by local actions
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("{action}: {message}")]
    Config { action: &'static str, message: String },

    #[error("{action}: invalid parameter '{param}': {message}")]
    InvalidParam {
        action: &'static str,
        param: String,
        message: String,
    },

    #[error("{action} failed: {message}")]
    Failed { action: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, AirecruitError>;
