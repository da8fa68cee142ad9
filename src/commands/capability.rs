use crate::core::{run_capability, Capability, ChatBackend, Console, Store, WorkspaceReader};
use crate::error::{LlmError, Result};
use crate::models::{Provider, Settings};

/// Run a one-shot capability over the workspace documents
pub async fn run_capability_command(
    capability: Capability,
    store: &Store,
    backend: &dyn ChatBackend,
    settings: &Settings,
    console: &mut dyn Console,
) -> Result<()> {
    let reader = WorkspaceReader::new(&store.data().workspace_files, settings.workspace.selection);
    let resumes = reader.resumes();
    let jds = reader.job_descriptions();
    for error in resumes.errors.iter().chain(jds.errors.iter()) {
        console.say(&format!("Warning: {}", error));
    }

    let model = store.model().ok_or(LlmError::NoModel)?;
    console.say(&format!("{}...", capability.description()));

    let reply = run_capability(
        capability,
        backend,
        model,
        settings.llm.temperature,
        resumes.as_deref(),
        jds.as_deref(),
    )
    .await?;

    let echoed = settings.behavior.stream_output && settings.llm.provider == Provider::Ollama;
    if !echoed {
        console.say(&reply);
    }
    Ok(())
}
