//! Integration tests for the top-level command loop

use airecruit::commands::Repl;
use airecruit::models::{FileKind, Mode};

mod common;
use common::*;

fn repl_with(root: &std::path::Path, inputs: &[&str], backend: &ScriptedBackend) -> (Repl, ScriptedConsole) {
    let console = ScriptedConsole::new(inputs);
    let renderer = RecordingRenderer::default();
    let mailer = RecordingMailer::default();
    let repl = Repl::new(
        open_store(root),
        test_settings(root),
        Box::new(backend.clone()),
        test_registry(&renderer, &mailer),
        Box::new(console.clone()),
    );
    (repl, console)
}

#[tokio::test]
async fn test_model_and_mode_commands() {
    let (_temp, root) = create_test_project();
    let backend = ScriptedBackend::default();
    let (mut repl, console) = repl_with(
        &root,
        &["/model gpt-4o-mini", "/model not-a-model", "/mode hunter", "/model", "/exit"],
        &backend,
    );

    repl.run().await;

    assert_eq!(repl.store().model(), Some("gpt-4o-mini"));
    assert_eq!(repl.store().mode(), Mode::Hunter);
    let output = console.output();
    assert!(output.contains("not-a-model"));
    assert!(output.ends_with("Bye"));
    assert!(backend.requests().is_empty());

    let reopened = open_store(&root);
    assert_eq!(reopened.model(), Some("gpt-4o-mini"));
    assert_eq!(reopened.mode(), Mode::Hunter);
}

#[tokio::test]
async fn test_unknown_command_does_not_end_the_session() {
    let (_temp, root) = create_test_project();
    let backend = ScriptedBackend::default();
    let (mut repl, console) = repl_with(&root, &["/teleport", "hello", "/help"], &backend);

    repl.run().await;

    let output = console.output();
    assert!(output.contains("Unknown command: /teleport"));
    assert!(output.contains("/work"));
    assert!(output.contains("cover-letter"));
}

#[tokio::test]
async fn test_slash_command_typed_in_work_mode_runs_at_top_level() {
    let (_temp, root) = create_test_project();
    let backend = ScriptedBackend::default();
    let (mut repl, _console) = repl_with(&root, &["/work", "/mode hunter", "/exit"], &backend);

    repl.run().await;

    assert_eq!(repl.store().mode(), Mode::Hunter);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_capability_command_reports_missing_documents() {
    let (_temp, root) = create_test_project();
    let backend = ScriptedBackend::replying(&["Rust engineer"]);
    let (mut repl, console) = repl_with(&root, &["/summarize", "/exit"], &backend);

    repl.run().await;

    assert!(console.output().contains("No resume in the workspace"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_file_menu_adds_from_workdir() {
    let (_temp, root) = create_test_project();
    write_document(&root, "cv.md", "Jane Doe");
    write_document(&root, "ignored.png", "binary");
    let backend = ScriptedBackend::default();
    let (mut repl, console) = repl_with(&root, &["/file", "1", "1", "1", "0", "/exit"], &backend);

    repl.run().await;

    let manifest = &repl.store().data().workspace_files;
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.files()[0].kind, FileKind::Resume);
    assert!(console.output().contains("Added: cv.md [RESUME]"));
}

#[tokio::test]
async fn test_smtp_setup_and_mode_selection() {
    let (_temp, root) = create_test_project();
    let backend = ScriptedBackend::default();
    let (mut repl, console) = repl_with(
        &root,
        &[
            "/smtp",
            "me@example.com",
            "app-token",
            "smtp.example.com",
            "465",
            "/mode",
            "2",
            "/exit",
        ],
        &backend,
    );

    repl.run().await;

    let smtp = repl.store().smtp();
    assert!(smtp.is_complete());
    assert_eq!(smtp.smtp_port, 465);
    assert_eq!(repl.store().mode(), Mode::Hunter);
    assert!(console.output().contains("SMTP settings saved"));
}
