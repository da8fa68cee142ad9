use tracing::debug;

use super::{
    configure_smtp, file_menu, handle_mode, list_models, run_capability_command, run_work, set_model,
    show_help, show_menu, show_model,
};
use crate::core::{ActionRegistry, Capability, ChatBackend, Console, Store};
use crate::models::Settings;

/// A parsed line from the top-level prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    File,
    ModelList,
    ModelShow,
    ModelSet(String),
    Mode(Option<String>),
    Smtp,
    Work,
    Menu,
    Capability(Capability),
    Exit,
    Unknown(String),
    /// Input without a leading slash
    Text(String),
}

impl ReplCommand {
    /// Parse one input line; blank input yields None
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let Some(body) = input.strip_prefix('/') else {
            return Some(ReplCommand::Text(input.to_string()));
        };

        let (name, arg) = match body.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (body, None),
        };

        let command = match name.to_lowercase().as_str() {
            "help" | "h" | "?" => ReplCommand::Help,
            "file" | "files" => ReplCommand::File,
            "model" => match arg {
                None => ReplCommand::ModelShow,
                Some(a) if a.eq_ignore_ascii_case("ls") => ReplCommand::ModelList,
                Some(a) => ReplCommand::ModelSet(a.to_string()),
            },
            "mode" => ReplCommand::Mode(arg.map(str::to_string)),
            "smtp" => ReplCommand::Smtp,
            "work" => ReplCommand::Work,
            "menu" => ReplCommand::Menu,
            "exit" | "quit" => ReplCommand::Exit,
            other => match other.parse::<Capability>() {
                Ok(capability) => ReplCommand::Capability(capability),
                Err(_) => ReplCommand::Unknown(input.to_string()),
            },
        };
        Some(command)
    }
}

/// The interactive top level and everything it drives
pub struct Repl {
    store: Store,
    settings: Settings,
    backend: Box<dyn ChatBackend>,
    registry: ActionRegistry,
    console: Box<dyn Console>,
}

impl Repl {
    pub fn new(
        store: Store,
        settings: Settings,
        backend: Box<dyn ChatBackend>,
        registry: ActionRegistry,
        console: Box<dyn Console>,
    ) -> Self {
        Self {
            store,
            settings,
            backend,
            registry,
            console,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Read commands until `/exit` or end of input
    pub async fn run(&mut self) {
        self.console.say(&format!(
            "AIRecruit {} | model: {} | mode: {} | {} workspace files",
            env!("CARGO_PKG_VERSION"),
            self.store.model().unwrap_or("none"),
            self.store.mode(),
            self.store.data().workspace_files.len()
        ));
        self.console.say("Enter /help for commands");

        let mut pending: Option<String> = None;
        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => match self.console.read_line("airecruit>") {
                    Some(line) => line,
                    None => break,
                },
            };

            let Some(command) = ReplCommand::parse(&line) else {
                continue;
            };
            debug!("REPL command: {:?}", command);

            match command {
                ReplCommand::Exit => break,
                command => match self.execute(command).await {
                    Step::Continue => {}
                    Step::Forward(next) => pending = Some(next),
                    Step::Stop => break,
                },
            }
        }
        self.console.say("Bye");
    }

    /// Run one command; errors are reported and never end the session
    pub async fn execute(&mut self, command: ReplCommand) -> Step {
        let console = self.console.as_mut();
        let result = match command {
            ReplCommand::Help => {
                show_help(console);
                Ok(())
            }
            ReplCommand::File => match file_menu(&mut self.store, &self.settings, console) {
                Ok(Some(next)) => return Step::Forward(next),
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            },
            ReplCommand::ModelList => {
                list_models(&self.store, console);
                Ok(())
            }
            ReplCommand::ModelShow => {
                show_model(&self.store, console);
                Ok(())
            }
            ReplCommand::ModelSet(name) => set_model(&mut self.store, &name, console),
            ReplCommand::Mode(arg) => handle_mode(&mut self.store, arg.as_deref(), console),
            ReplCommand::Smtp => configure_smtp(&mut self.store, console),
            ReplCommand::Work => {
                let (next, ended) = run_work(
                    &mut self.store,
                    self.backend.as_ref(),
                    console,
                    &self.registry,
                    &self.settings,
                )
                .await;
                if ended {
                    return Step::Stop;
                }
                return next.map_or(Step::Continue, Step::Forward);
            }
            ReplCommand::Menu => {
                show_menu(&self.store, &self.registry, console);
                Ok(())
            }
            ReplCommand::Capability(capability) => {
                run_capability_command(capability, &self.store, self.backend.as_ref(), &self.settings, console)
                    .await
            }
            ReplCommand::Unknown(input) => {
                console.say(&format!("Unknown command: {} (enter /help)", input));
                Ok(())
            }
            ReplCommand::Text(_) => {
                console.say("Enter /work to talk to the assistant, or /help for commands");
                Ok(())
            }
            ReplCommand::Exit => return Step::Stop,
        };

        if let Err(e) = result {
            self.console.say(&format!("Error: {}", e));
        }
        Step::Continue
    }
}

/// What the REPL does after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// Run this input next, as if typed at the prompt
    Forward(String),
    Stop,
}
