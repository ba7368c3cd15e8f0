use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use passnet_config::ensure_workspace_config;
use passnet_core::{MinuteWindow, parse_limit};
use passnet_engine::{
    NetworkParams, PositionsParams, TopPassersParams, import_events, network, positions, roster,
    teams, top_passers,
};
use passnet_parse::match_id_from_file_name;
use passnet_store::{GraphStore, SqliteGraphStore};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Passing-network graph service")]
struct Cli {
    #[arg(
        long,
        default_value = ".",
        help = "Workspace root holding the .passnet store"
    )]
    workspace: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a match event log, replacing the match's derived graph
    Import {
        file: PathBuf,

        #[arg(long, help = "Match identifier; defaults to the file name without .json")]
        match_id: Option<String>,
    },
    /// List imported matches, newest first
    Matches,
    /// List the teams involved in a match
    Teams { match_id: String },
    /// List the players appearing in a match's passing graph
    Players {
        match_id: String,

        #[arg(long, help = "Restrict to passes played by this team")]
        team_id: Option<i64>,
    },
    /// Aggregate the passing network between players
    Network {
        match_id: String,

        #[arg(long, help = "Window lower bound in minutes; non-numeric input defaults to 0")]
        from_min: Option<String>,

        #[arg(
            long,
            help = "Window upper bound in minutes, exclusive; non-numeric input defaults to 200"
        )]
        to_min: Option<String>,

        #[arg(long, help = "Restrict to passes played by this team")]
        team_id: Option<i64>,

        #[arg(long, help = "Keep only successful passes")]
        successful: bool,
    },
    /// Average start position per player
    Positions {
        match_id: String,

        #[arg(long)]
        from_min: Option<String>,

        #[arg(long)]
        to_min: Option<String>,

        #[arg(long)]
        team_id: Option<i64>,
    },
    /// Rank a team's players by pass attempts
    TopPassers {
        match_id: String,

        #[arg(long, help = "Team to rank; required")]
        team_id: Option<i64>,

        #[arg(long)]
        from_min: Option<String>,

        #[arg(long)]
        to_min: Option<String>,

        #[arg(long, help = "Row cap; junk or negative input defaults to 10")]
        limit: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = ensure_workspace_config(&cli.workspace).with_context(|| {
        format!(
            "failed to load or create workspace config under {}",
            cli.workspace.display()
        )
    })?;

    let store = SqliteGraphStore::open_with_timeout(
        &cli.workspace,
        Duration::from_millis(config.store.busy_timeout_ms),
    )
    .context("failed to open graph store")?;
    store.ping().context("graph store did not answer")?;

    match cli.command {
        Command::Import { file, match_id } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let events = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let match_id = match_id.unwrap_or_else(|| {
                let file_name = file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match_id_from_file_name(&file_name)
            });

            let summary = import_events(&store, &match_id, &events, None)?;
            print_json(&summary)
        }
        Command::Matches => print_json(&passnet_engine::matches(&store)?),
        Command::Teams { match_id } => print_json(&teams(&store, &match_id)?),
        Command::Players { match_id, team_id } => {
            print_json(&roster(&store, &match_id, team_id)?)
        }
        Command::Network {
            match_id,
            from_min,
            to_min,
            team_id,
            successful,
        } => {
            let params = NetworkParams {
                window: MinuteWindow::from_raw(from_min.as_deref(), to_min.as_deref()),
                team_id,
                successful_only: successful,
            };
            print_json(&network(&store, &match_id, &params)?)
        }
        Command::Positions {
            match_id,
            from_min,
            to_min,
            team_id,
        } => {
            let params = PositionsParams {
                window: MinuteWindow::from_raw(from_min.as_deref(), to_min.as_deref()),
                team_id,
            };
            print_json(&positions(&store, &match_id, &params)?)
        }
        Command::TopPassers {
            match_id,
            team_id,
            from_min,
            to_min,
            limit,
        } => {
            let params = TopPassersParams {
                window: MinuteWindow::from_raw(from_min.as_deref(), to_min.as_deref()),
                team_id,
                limit: parse_limit(limit.as_deref()),
            };
            print_json(&top_passers(&store, &match_id, &params)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
