use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use airecruit::commands::{serve, AppState, Repl};
use airecruit::core::{
    load_settings, resolve_store_path, ActionRegistry, LlmClient, SmtpMailer, Store, TerminalConsole,
    WkhtmltopdfRenderer,
};

/// AIRecruit - LLM-driven resume optimization, letters and applications
#[derive(Parser)]
#[command(name = "airecruit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Persisted store location (defaults to ~/.airecruit/config.json)
    #[arg(long, global = true, env = "AIRECRUIT_STORE")]
    store: Option<PathBuf>,

    /// Set the LLM model and exit
    #[arg(short, long)]
    model: Option<String>,

    /// Start the local web server
    #[arg(long)]
    server: bool,

    /// Web server port (overrides airecruit.toml)
    #[arg(long, requires = "server")]
    port: Option<u16>,

    /// Do not open a browser when the server starts
    #[arg(long, requires = "server")]
    no_browser: bool,
}

fn init_logging(verbose: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .without_time()
            .init();
    } else {
        let level = if verbose { Level::DEBUG } else { Level::INFO };
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .without_time()
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let project_root = std::env::current_dir().context("Cannot determine the current directory")?;
    let settings = load_settings(&project_root, cli.port, cli.no_browser)?;
    let store_path = resolve_store_path(cli.store)?;
    let mut store = Store::open(&store_path)?;
    debug!("Using store {}", store_path.display());

    if let Some(model) = cli.model {
        store.set_model(&model)?;
        println!("Model set to {}", model);
        return Ok(());
    }

    let backend = LlmClient::new(settings.llm.clone(), settings.behavior.stream_output)?;

    if cli.server {
        let port = settings.server.port;
        let open_browser = settings.server.open_browser;
        let state = AppState {
            store: store.into_shared(),
            settings: Arc::new(settings),
            backend: Arc::new(backend),
        };
        return serve(state, port, open_browser).await;
    }

    let registry = ActionRegistry::standard(
        Box::new(WkhtmltopdfRenderer::new()),
        Box::new(SmtpMailer),
        true,
    );
    let mut repl = Repl::new(store, settings, Box::new(backend), registry, Box::new(TerminalConsole::new()));
    repl.run().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
