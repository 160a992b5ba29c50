use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use messenger_bridge::api::ApiServer;
use messenger_bridge::config;
use messenger_bridge::db::{self, ConversationRepo};
use messenger_bridge::{Config, Persona};

/// Bridge - answers Messenger page messages with an LLM
#[derive(Parser)]
#[command(name = "bridge", version, about)]
struct Cli {
    /// Port to listen on (overrides config file and environment)
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short, long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook server (default)
    Serve,
    /// Print stored conversation turns for a user
    History {
        /// Page-scoped user ID
        #[arg(short, long)]
        user: String,
        /// Only show the most recent turns
        #[arg(short, long)]
        limit: Option<usize>,
        /// Database file (defaults to the configured path)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Print turns as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration and print it with secrets redacted
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,messenger_bridge=info",
        1 => "info,messenger_bridge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config_path, cli.port).await,
        Command::History {
            user,
            limit,
            db,
            json,
        } => show_history(config_path, &user, limit, db, json),
        Command::CheckConfig => check_config(config_path, cli.port),
    }
}

/// Run the webhook server until interrupted
async fn serve(config_path: Option<&Path>, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load(config_path)?.with_port(port);
    tracing::debug!(?config, "loaded configuration");

    tracing::info!(
        port = config.port,
        database = %config.database_path.display(),
        model = %config.llm.model,
        persona = %config.persona.name,
        "starting messenger bridge"
    );

    let server = ApiServer::from_config(&config)?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}

/// Print a user's stored turns
///
/// Only the database path is needed, so secrets are not required here.
fn show_history(
    config_path: Option<&Path>,
    user_id: &str,
    limit: Option<usize>,
    db_override: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let db_path = match db_override {
        Some(path) => path,
        None => config::load_database_path(config_path)?,
    };

    let pool = db::init(&db_path)?;
    let repo = ConversationRepo::new(pool);

    let turns = match limit {
        Some(n) => repo.recent(user_id, n)?,
        None => repo.history(user_id)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    if turns.is_empty() {
        println!("No conversation stored for user {user_id}");
        return Ok(());
    }

    for (i, turn) in turns.iter().enumerate() {
        println!("[{}] user: {}", i + 1, turn.user_message);
        println!("    assistant: {}", turn.assistant_response);
    }

    Ok(())
}

/// Validate and print the resolved configuration
fn check_config(config_path: Option<&Path>, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load(config_path)?.with_port(port);
    println!("{config:#?}");

    if config.persona.system_prompt == Persona::default().system_prompt {
        println!("\nUsing built-in persona prompt");
    }

    Ok(())
}
