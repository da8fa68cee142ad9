//! AIRecruit - LLM-driven recruiting assistant
//!
//! AIRecruit keeps a small workspace of classified documents (resumes and
//! job descriptions), feeds them to an LLM as context and runs local
//! actions (PDF export, email) that the model requests through structured
//! directives in its replies.
//!
//! # Architecture
//!
//! - **commands**: REPL, slash-command handlers and the web transport
//! - **core**: store, workspace, prompts, directive parsing, dispatcher, actions
//! - **models**: Data structures (settings, persisted store, messages)
//! - **error**: Error types

pub mod commands;
pub mod core;
pub mod error;
pub mod models;

pub use error::{AirecruitError, Result};
