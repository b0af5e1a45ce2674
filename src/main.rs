use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenvy::dotenv;

mod commands;
mod config;
mod ingestion;
mod store;
mod telemetry;
mod util;

use commands::{gator_commands, Command, State};
use config::Config;
use ingestion::fetch::{HttpFetcher, FETCH_TIMEOUT};
use store::PgStore;

#[derive(Parser)]
#[command(name = "gator", about = "RSS feed aggregator CLI")]
struct Cli {
    /// Postgres connection string; overrides DATABASE_URL and the config file
    #[arg(long)]
    dsn: Option<String>,
    /// Config file (default: ~/.gatorconfig.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(long, default_value_t = false)]
    json: bool,

    /// login, register, reset, users, agg, addfeed, feeds, follow, following, unfollow, browse
    command: Option<String>,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and GATOR_LOG_FORMAT
    telemetry::config::init_tracing();

    if let Err(err) = run(cli).await {
        tracing::debug!("{}", telemetry::config::sanitize(&format!("{err:?}")));
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(name) = cli.command else {
        bail!("no command provided (try `gator register <name>`)");
    };
    let registry = gator_commands();
    if !registry.contains(&name) {
        bail!("command not found: {name:?} (known: {})", registry.names().join(", "));
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    let dsn = cli
        .dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .or_else(|| Some(config.db_url.clone()).filter(|u| !u.is_empty()))
        .context("no database configured: pass --dsn, set DATABASE_URL or db_url in the config file")?;

    let store = PgStore::connect(&dsn).await.context("connecting to the database")?;
    let source = HttpFetcher::new(FETCH_TIMEOUT)?;
    let mut state = State { store: Arc::new(store), source: Arc::new(source), config };

    registry.dispatch(&mut state, &Command::new(name, cli.args)).await?;
    Ok(())
}
