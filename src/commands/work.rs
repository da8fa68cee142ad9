use crate::core::{ActionRegistry, ChatBackend, Console, SessionExit, Store, WorkSession};
use crate::models::Settings;

/// Run a work session. Returns a slash command typed at `work>` for the
/// REPL to run next, and whether input has ended.
pub async fn run_work(
    store: &mut Store,
    backend: &dyn ChatBackend,
    console: &mut dyn Console,
    registry: &ActionRegistry,
    settings: &Settings,
) -> (Option<String>, bool) {
    let exit = WorkSession::new(store, backend, console, registry, settings).run().await;
    match exit {
        SessionExit::Command(command) => (Some(command), false),
        SessionExit::EndOfInput => (None, true),
        SessionExit::Left | SessionExit::ActionCompleted => {
            console.say("Left work mode");
            (None, false)
        }
    }
}

/// `/menu` outside work mode
pub fn show_menu(store: &Store, registry: &ActionRegistry, console: &mut dyn Console) {
    console.say("Actions (enter /work, then a number, to run one without the model):");
    for line in registry.menu(store.mode()) {
        console.say(&format!("  {}", line));
    }
}
