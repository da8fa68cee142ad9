//! The work session: a multi-turn exchange with the model that turns
//! directives in its replies into local actions.
//!
//! A task starts with a request typed at `work>` and a fresh history. It
//! runs as a small state machine until a directive has been handled or the
//! user cancels, then control returns to `work>`.

use tracing::{debug, info, warn};

use crate::core::actions::{ActionContext, ActionParams, ActionRegistry};
use crate::core::console::Console;
use crate::core::directive::{parse_reply, Directive, ParseOutcome};
use crate::core::llm::ChatBackend;
use crate::core::prompts::build_system_prompt;
use crate::core::store::Store;
use crate::core::workspace::WorkspaceReader;
use crate::error::LlmError;
use crate::models::{Conversation, Manifest, Provider, Settings};

/// Inputs that abandon the current sub-dialog (compared case-insensitively)
pub const CANCEL_TOKENS: [&str; 4] = ["cancel", "exit", "quit", "取消"];

pub fn is_cancel(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    CANCEL_TOKENS.iter().any(|t| *t == input)
}

/// Why the work session returned control to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    /// The user typed a cancel token at `work>`
    Left,
    /// Slash command typed at `work>`, to be run by the REPL
    Command(String),
    /// An action succeeded and the session is configured to end on it
    ActionCompleted,
    EndOfInput,
}

/// How one directive was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action ran; carries its result text
    Succeeded(String),
    /// The action raised; carries the error text
    Failed(String),
    /// No registered action has this name
    Unknown(String),
    /// The user cancelled parameter completion
    Cancelled,
    EndOfInput,
}

/// How one task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Dispatched(DispatchOutcome),
    Cancelled,
    EndOfInput,
}

#[derive(Debug)]
enum TaskState {
    AwaitingUserInput,
    AwaitingModelReply,
    DirectiveFound(Directive),
    Finished(TaskOutcome),
}

/// Everything a work session needs, borrowed from the REPL
pub struct WorkSession<'a> {
    store: &'a mut Store,
    backend: &'a dyn ChatBackend,
    console: &'a mut dyn Console,
    registry: &'a ActionRegistry,
    settings: &'a Settings,
}

impl<'a> WorkSession<'a> {
    pub fn new(
        store: &'a mut Store,
        backend: &'a dyn ChatBackend,
        console: &'a mut dyn Console,
        registry: &'a ActionRegistry,
        settings: &'a Settings,
    ) -> Self {
        Self {
            store,
            backend,
            console,
            registry,
            settings,
        }
    }

    /// Ollama replies are already echoed while streaming
    fn reply_echoed(&self) -> bool {
        self.settings.behavior.stream_output && self.settings.llm.provider == Provider::Ollama
    }

    pub fn show_menu(&mut self) {
        let mode = self.store.mode();
        self.console.say("Actions (enter a number to run one without the model):");
        for line in self.registry.menu(mode) {
            self.console.say(&format!("  {}", line));
        }
    }

    /// Read requests at `work>` until the user leaves
    pub async fn run(&mut self) -> SessionExit {
        self.console.say(&format!(
            "Work mode ({}). Describe what you need, enter /menu for local actions, or 'exit' to leave.",
            self.store.mode()
        ));

        loop {
            let Some(line) = self.console.read_line("work>") else {
                return SessionExit::EndOfInput;
            };
            let input = line.trim();

            if input.is_empty() {
                continue;
            }
            if is_cancel(input) {
                return SessionExit::Left;
            }
            if input == "menu" || input == "/menu" {
                self.show_menu();
                continue;
            }
            if input.starts_with('/') {
                return SessionExit::Command(input.to_string());
            }

            let outcome = if let Ok(index) = input.parse::<usize>() {
                TaskOutcome::Dispatched(self.run_menu_selection(index))
            } else {
                self.run_task(input).await
            };

            match outcome {
                TaskOutcome::EndOfInput | TaskOutcome::Dispatched(DispatchOutcome::EndOfInput) => {
                    return SessionExit::EndOfInput;
                }
                TaskOutcome::Dispatched(DispatchOutcome::Succeeded(_))
                    if self.settings.behavior.end_session_on_action =>
                {
                    return SessionExit::ActionCompleted;
                }
                _ => {}
            }
        }
    }

    /// Current system prompt and the manifest it was built from
    fn build_prompt(&mut self) -> (String, Manifest) {
        let manifest = self.store.data().workspace_files.clone();
        let reader = WorkspaceReader::new(&manifest, self.settings.workspace.selection);
        let resumes = reader.resumes();
        let jds = reader.job_descriptions();

        for error in resumes.errors.iter().chain(jds.errors.iter()) {
            self.console.say(&format!("Warning: {}", error));
        }

        let prompt = build_system_prompt(self.store.mode(), resumes.as_deref(), jds.as_deref(), self.registry);
        (prompt, manifest)
    }

    /// Rebuild the system message if the workspace changed since it was built
    fn refresh_prompt(&mut self, conversation: &mut Conversation, built_from: &mut Manifest) {
        if let Err(e) = self.store.reload() {
            warn!("Could not reload store: {}", e);
            return;
        }
        if self.store.data().workspace_files != *built_from {
            debug!("Workspace changed, rebuilding system prompt");
            let (prompt, manifest) = self.build_prompt();
            conversation.set_system(prompt);
            *built_from = manifest;
        }
    }

    async fn request_reply(&mut self, conversation: &Conversation) -> Result<String, LlmError> {
        let model = self.store.model().ok_or(LlmError::NoModel)?.to_string();
        debug!("Requesting completion from {} with {} messages", model, conversation.len());
        self.backend
            .complete(&model, conversation.messages(), self.settings.llm.temperature)
            .await
    }

    /// Run one task that starts with `request`
    pub async fn run_task(&mut self, request: &str) -> TaskOutcome {
        let (prompt, mut built_from) = self.build_prompt();
        let mut conversation = Conversation::new(prompt, self.settings.behavior.max_history_messages);
        conversation.push_user(request);

        let mut state = TaskState::AwaitingModelReply;
        loop {
            state = match state {
                TaskState::AwaitingUserInput => match self.console.read_line(">") {
                    None => TaskState::Finished(TaskOutcome::EndOfInput),
                    Some(line) if is_cancel(&line) => {
                        self.console.say("Task cancelled.");
                        TaskState::Finished(TaskOutcome::Cancelled)
                    }
                    Some(line) if line.trim().is_empty() => TaskState::AwaitingUserInput,
                    Some(line) => {
                        conversation.push_user(line.trim());
                        TaskState::AwaitingModelReply
                    }
                },

                TaskState::AwaitingModelReply => {
                    self.refresh_prompt(&mut conversation, &mut built_from);
                    match self.request_reply(&conversation).await {
                        Ok(reply) => {
                            if !self.reply_echoed() {
                                self.console.say(&reply);
                            }
                            conversation.push_assistant(reply.as_str());
                            self.classify_reply(&reply)
                        }
                        Err(e) => {
                            conversation.pop_unanswered();
                            self.console.say(&format!("LLM error: {}", e));
                            TaskState::AwaitingUserInput
                        }
                    }
                }

                TaskState::DirectiveFound(directive) => {
                    TaskState::Finished(TaskOutcome::Dispatched(self.dispatch(directive)))
                }

                TaskState::Finished(outcome) => return outcome,
            };
        }
    }

    fn classify_reply(&mut self, reply: &str) -> TaskState {
        match parse_reply(reply) {
            ParseOutcome::NoDirective => TaskState::AwaitingUserInput,
            ParseOutcome::Directive(directive) => TaskState::DirectiveFound(directive),
            ParseOutcome::Malformed(e) => {
                self.console.say(&format!(
                    "Note: the reply contained an action block that could not be read ({}). Nothing was run.",
                    e
                ));
                TaskState::AwaitingUserInput
            }
        }
    }

    /// Run the action at a 1-based menu position; parameters come from the user
    pub fn run_menu_selection(&mut self, index: usize) -> DispatchOutcome {
        let registry = self.registry;
        match registry.by_index(index) {
            Some(action) => self.dispatch(Directive::new(action.name())),
            None => {
                self.console
                    .say(&format!("No action numbered {}. Enter /menu to list them.", index));
                DispatchOutcome::Unknown(index.to_string())
            }
        }
    }

    /// Resolve, complete, validate and invoke one directive
    pub fn dispatch(&mut self, mut directive: Directive) -> DispatchOutcome {
        let registry = self.registry;
        let mode = self.store.mode();

        let Some(action) = registry.lookup(&directive.action) else {
            let known: Vec<&str> = registry.iter().map(|a| a.name()).collect();
            self.console.say(&format!(
                "Unrecognized action '{}'. Known actions: {}",
                directive.action,
                known.join(", ")
            ));
            return DispatchOutcome::Unknown(directive.action);
        };

        let specs = action.params(mode);
        let required: Vec<&str> = specs.iter().map(|p| p.name).collect();

        loop {
            let missing = directive.missing(&required);
            if missing.is_empty() {
                break;
            }
            self.console.say(&format!(
                "{} needs: {} (enter 'cancel' to abort)",
                action.name(),
                missing.join(", ")
            ));
            for name in missing {
                let hint = specs.iter().find(|p| p.name == name).map(|p| p.hint).unwrap_or_default();
                match self.console.read_line(&format!("{} [{}]", name, hint)) {
                    None => return DispatchOutcome::EndOfInput,
                    Some(value) if is_cancel(&value) => {
                        self.console.say(&format!("{} cancelled.", action.name()));
                        return DispatchOutcome::Cancelled;
                    }
                    Some(value) => directive.supply(name, &value),
                }
            }
        }

        let params: ActionParams = required
            .iter()
            .filter_map(|name| directive.param(name).map(|value| (*name, value)))
            .collect();

        info!("Running action {}", action.name());
        let ctx = ActionContext {
            store: &*self.store,
            workdir: &self.settings.workspace.workdir,
        };
        match action.invoke(&params, &ctx) {
            Ok(result) => {
                self.console.say(&format!("Done: {}", result));
                DispatchOutcome::Succeeded(result)
            }
            Err(e) => {
                self.console.say(&format!("Action failed: {}", e));
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}
