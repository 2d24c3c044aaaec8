//! Console driver for chatpoker sessions.
//!
//! Reads one command per line from stdin, the way a chat bot would hand
//! over parsed messages, and prints the resulting session views as JSON.

mod commands;
mod config;

use std::sync::Arc;

use anyhow::Error;
use chatpoker::{
    InMemoryLedger, Ledger, PgLedger, SessionRegistry, TableError, TimeoutSweeper,
    db::Database, game::SessionView,
};
use commands::{Command, USAGE};
use config::ServerConfig;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Run chatpoker sessions from the console

USAGE:
  cp_server [OPTIONS]

OPTIONS:
  --db-url     URL         Ledger database  [default: env DATABASE_URL, or in-memory wallets]

FLAGS:
  --continuous             Keep dealing hands instead of closing after one
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  DEFAULT_WALLET_BALANCE   Starting balance for new wallets
  SESSION_SMALL_BLIND      Small blind for new sessions
  SESSION_BIG_BLIND        Big blind for new sessions
  SWEEP_INTERVAL_MS        How often stalled turns are checked
  (See .env file for all configuration options)
";

struct Args {
    database_url: Option<String>,
    continuous: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        database_url: pargs.opt_value_from_str("--db-url")?,
        continuous: pargs.contains("--continuous"),
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(args.database_url, args.continuous)?;
    config.validate()?;

    let ledger: Arc<dyn Ledger> = match &config.database {
        Some(db_config) => {
            info!("Connecting to ledger database");
            let db = Database::new(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database connected successfully");
            Arc::new(PgLedger::new(db.pool().clone(), config.default_wallet_balance))
        }
        None => {
            info!("DATABASE_URL not set, keeping wallets in memory");
            Arc::new(InMemoryLedger::new(config.default_wallet_balance))
        }
    };

    let registry = SessionRegistry::new(ledger);
    let sweeper = TimeoutSweeper::new(registry.clone(), config.sweep_interval()).spawn();

    info!("Ready. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = run_command(&registry, &config, command).await {
            eprintln!("{}", e.client_message());
        }
    }

    sweeper.abort();
    for id in registry.list_sessions().await {
        if let Err(e) = registry.abort(id).await {
            log::warn!("Failed to abort session {} on shutdown: {}", id, e);
        }
    }
    info!("Shutting down...");

    Ok(())
}

async fn run_command(
    registry: &SessionRegistry,
    config: &ServerConfig,
    command: Command,
) -> Result<(), TableError> {
    match command {
        Command::New { name } => {
            let name = name.unwrap_or_else(|| "Hold'em".to_string());
            let handle = registry.open_session(config.session_config(&name)).await?;
            println!("Opened session {} '{}'", handle.session_id(), name);
        }
        Command::Join {
            session_id,
            player_id,
            name,
            buy_in,
        } => print_view(&registry.join(session_id, player_id, &name, buy_in).await?),
        Command::Leave {
            session_id,
            player_id,
        } => print_view(&registry.leave(session_id, player_id).await?),
        Command::Start { session_id } => print_view(&registry.start(session_id).await?),
        Command::Act {
            session_id,
            player_id,
            action,
        } => print_view(&registry.act(session_id, player_id, action).await?),
        Command::View { session_id, viewer } => {
            print_view(&registry.view(session_id, viewer).await?);
        }
        Command::Abort { session_id } => print_view(&registry.abort(session_id).await?),
        Command::Balance { player_id } => {
            println!("{}", registry.balance(player_id).await?);
        }
        Command::Sessions => println!("{:?}", registry.list_sessions().await),
        Command::Help => print!("{USAGE}"),
        Command::Quit => {}
    }
    Ok(())
}

fn print_view(view: &SessionView) {
    match serde_json::to_string_pretty(view) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to render view: {}", e),
    }
}
