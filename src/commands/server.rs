//! Local web transport: a thin HTTP shell over the store, the workspace and
//! the one-shot capabilities.

use axum::{
    extract::{Multipart, Path as UrlPath, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::core::{escape_html, import_file, run_capability, Capability, ChatBackend, SharedStore, WorkspaceReader};
use crate::error::{AirecruitError, WorkspaceError};
use crate::models::{FileKind, Mode, Settings, SmtpSettings};

/// Error returned by handlers, rendered as `{"error": {"code", "message"}}`
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AirecruitError> for AppError {
    fn from(err: AirecruitError) -> Self {
        match &err {
            AirecruitError::Config(_) => AppError::Validation(err.to_string()),
            AirecruitError::Workspace(WorkspaceError::NotInWorkspace(_))
            | AirecruitError::Workspace(WorkspaceError::FileUnavailable { .. }) => AppError::NotFound(err.to_string()),
            AirecruitError::Workspace(_) => AppError::Validation(err.to_string()),
            AirecruitError::Llm(_) => AppError::Llm(err.to_string()),
            _ => AppError::Internal(anyhow::anyhow!(err.to_string())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    e.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub settings: Arc<Settings>,
    pub backend: Arc<dyn ChatBackend>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/files", get(files_handler))
        .route("/api/add_file", post(add_file_handler))
        .route("/api/remove_file", post(remove_file_handler))
        .route("/api/classify", post(classify_handler))
        .route("/api/update_config", post(update_config_handler))
        .route("/api/optimize", post(optimize_handler))
        .route("/api/capabilities/:name", post(capability_handler))
        .with_state(state)
}

/// Bind, optionally open the browser, and serve until shutdown
pub async fn serve(state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let url = format!("http://{}", addr);
    info!("Listening on {url}");

    if open_browser {
        if let Err(e) = open::that(&url) {
            warn!("Could not open a browser: {e}");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let mut store = state.store.lock().await;
    if let Err(e) = store.reload() {
        warn!("Serving the cached store: {e}");
    }
    let files: String = store
        .data()
        .workspace_files
        .listing()
        .iter()
        .map(|line| format!("<li>{}</li>", escape_html(line)))
        .collect();
    let files = if files.is_empty() {
        "<li><em>No files yet</em></li>".to_string()
    } else {
        files
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>AIRecruit</title></head>
<body>
<h1>AIRecruit</h1>
<p>{date} | model: <b>{model}</b> | mode: <b>{mode}</b></p>
<h2>Workspace ({count})</h2>
<ul>{files}</ul>
<form action="/api/add_file" method="post" enctype="multipart/form-data">
<input type="file" name="files" multiple>
<select name="type"><option value="auto">unclassified</option><option value="resume">resume</option><option value="jd">job description</option></select>
<button type="submit">Upload</button>
</form>
</body></html>"#,
        date = chrono::Local::now().format("%Y-%m-%d"),
        model = escape_html(store.model().unwrap_or("none")),
        mode = store.mode(),
        count = store.data().workspace_files.len(),
        files = files,
    ))
}

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "airecruit"
    }))
}

/// GET /api/files
async fn files_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let mut store = state.store.lock().await;
    store.reload().map_err(AirecruitError::from)?;
    let manifest = &store.data().workspace_files;
    let counts = manifest.counts();
    Ok(Json(json!({
        "files": manifest.files(),
        "counts": {
            "resume": counts.resume,
            "jd": counts.jd,
            "auto": counts.auto,
        }
    })))
}

/// Keep only the final path component of an uploaded name
fn safe_file_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
}

/// POST /api/add_file (multipart: `files`, optional `type`)
async fn add_file_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut uploads: Vec<(String, Vec<u8>)> = Vec::new();
    let mut kind: Option<FileKind> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "type" => {
                let text = field.text().await.map_err(|e| AppError::Validation(e.to_string()))?;
                kind = Some(text.parse().map_err(AppError::Validation)?);
            }
            "files" => {
                let name = field
                    .file_name()
                    .and_then(safe_file_name)
                    .ok_or_else(|| AppError::Validation("Uploaded file has no name".to_string()))?;
                let bytes = field.bytes().await.map_err(|e| AppError::Validation(e.to_string()))?;
                uploads.push((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    if uploads.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    let workdir = &state.settings.workspace.workdir;
    tokio::fs::create_dir_all(workdir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let mut store = state.store.lock().await;
    let mut added = Vec::new();
    for (name, bytes) in uploads {
        let path = workdir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        let outcome = import_file(&mut *store, &path, kind)?;
        added.push(json!({
            "path": outcome.path,
            "type": outcome.kind,
            "converted": outcome.converted,
        }));
    }

    Ok(Json(json!({ "status": "added", "count": added.len(), "files": added })))
}

#[derive(Debug, Deserialize)]
pub struct RemoveFileRequest {
    pub path: Option<String>,
}

/// POST /api/remove_file
async fn remove_file_handler(
    State(state): State<AppState>,
    Json(req): Json<RemoveFileRequest>,
) -> Result<Json<Value>, AppError> {
    let path = req
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing file path".to_string()))?;

    let mut store = state.store.lock().await;
    let removed = store.remove_files(&[PathBuf::from(&path)])?;
    Ok(Json(json!({
        "status": "removed",
        "path": path,
        "removed": removed,
        "files": store.data().workspace_files.paths(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// POST /api/classify
async fn classify_handler(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<Value>, AppError> {
    let kind: FileKind = req.kind.parse().map_err(AppError::Validation)?;
    let mut store = state.store.lock().await;
    store.classify_file(Path::new(&req.path), kind)?;
    Ok(Json(json!({ "status": "classified", "path": req.path, "type": kind })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    pub key: Option<String>,
    pub value: Option<Value>,
}

/// POST /api/update_config for `model`, `mode` and `email`
async fn update_config_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateConfigRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(key), Some(value)) = (req.key, req.value) else {
        return Err(AppError::Validation("Missing key or value".to_string()));
    };
    let as_text = |v: &Value| {
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(format!("'{}' expects a string value", key)))
    };

    let mut store = state.store.lock().await;
    match key.as_str() {
        "model" => store.set_model(&as_text(&value)?)?,
        "mode" => {
            let mode = as_text(&value)?.parse::<Mode>().map_err(AirecruitError::from)?;
            store.set_mode(mode)?;
        }
        "email" => {
            let smtp: SmtpSettings = serde_json::from_value(value.clone())
                .map_err(|e| AppError::Validation(format!("Invalid SMTP settings: {}", e)))?;
            store.set_smtp(smtp)?;
        }
        other => return Err(AppError::Validation(format!("Unknown config key: {}", other))),
    }

    info!("Updated config key {}", key);
    Ok(Json(json!({ "status": "updated", "key": key })))
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentsRequest {
    pub jd: Option<String>,
    pub resume: Option<String>,
}

/// Run a capability with request documents, falling back to the workspace
async fn run_with_documents(
    state: &AppState,
    capability: Capability,
    req: DocumentsRequest,
) -> Result<String, AppError> {
    let (model, resume, jd) = {
        let store = state.store.lock().await;
        let reader = WorkspaceReader::new(&store.data().workspace_files, state.settings.workspace.selection);
        let resume = req
            .resume
            .filter(|r| !r.trim().is_empty())
            .or_else(|| reader.resumes().content);
        let jd = req
            .jd
            .filter(|j| !j.trim().is_empty())
            .or_else(|| reader.job_descriptions().content);
        let model = store
            .model()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("No model selected".to_string()))?;
        (model, resume, jd)
    };

    let reply = run_capability(
        capability,
        state.backend.as_ref(),
        &model,
        state.settings.llm.temperature,
        resume.as_deref(),
        jd.as_deref(),
    )
    .await?;
    Ok(reply)
}

/// POST /api/optimize
async fn optimize_handler(
    State(state): State<AppState>,
    body: Option<Json<DocumentsRequest>>,
) -> Result<Json<Value>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let optimized = run_with_documents(&state, Capability::Optimize, req).await?;
    Ok(Json(json!({ "optimized": optimized })))
}

/// POST /api/capabilities/:name
async fn capability_handler(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
    body: Option<Json<DocumentsRequest>>,
) -> Result<Json<Value>, AppError> {
    let capability: Capability = name.parse().map_err(AppError::NotFound)?;
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let result = run_with_documents(&state, capability, req).await?;
    Ok(Json(json!({ "capability": capability.name(), "result": result })))
}
