//! droid: Droid agent main binary
//!
//! Usage:
//!   droid run <crew> [--inputs JSON]   - Run a crew once and print the result
//!   droid list <agents|tasks|crews|tools>
//!   droid memory [--limit N]           - Show recent memory records
//!   droid repl                         - Interactive mode
//!   droid serve                        - HTTP API + scheduler (default)

mod app;
mod cli;

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use droid_api::AppState;
use droid_core::{Config, MemoryFilter};
use droid_schedule::{ScheduleConfig, Scheduler};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "droid", version, about = "Multi-agent crews for content automation")]
struct Cli {
    /// Configuration file (default: $DROID_CONFIG or ./droid.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level directive, e.g. `debug` or `droid_core=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a crew once and print its result as JSON
    Run {
        crew: String,
        /// Crew inputs as a JSON object of strings
        #[arg(long)]
        inputs: Option<String>,
    },
    /// List defined entities
    List {
        #[arg(value_enum)]
        kind: ListKind,
    },
    /// Show recent memory records
    Memory {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        category: Option<String>,
    },
    /// Interactive mode
    Repl,
    /// Start the HTTP API and the scheduler
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Agents,
    Tasks,
    Crews,
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    dotenvy::dotenv().ok();

    let config = Config::load(args.config.as_deref())?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.parse()?)
                .from_env_lossy(),
        )
        .init();

    tracing::info!("Starting droid {}", env!("CARGO_PKG_VERSION"));

    let orchestrator = app::build_orchestrator(&config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Run { crew, inputs } => {
            let inputs = cli::parse_inputs(inputs.as_deref())?;
            let result = orchestrator.run_crew(&crew, &inputs).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::List { kind } => {
            cli::print_list(&orchestrator, kind);
            Ok(())
        }
        Command::Memory { limit, category } => {
            let mut filter = MemoryFilter::default().limit(limit);
            if let Some(category) = category {
                filter = filter.category(category);
            }
            cli::print_memory(&orchestrator, &filter)
        }
        Command::Repl => cli::run_repl(orchestrator).await,
        Command::Serve => run_server(config, orchestrator).await,
    }
}

/// Run the HTTP API and the scheduler until Ctrl+C
async fn run_server(config: Config, orchestrator: droid_core::Orchestrator) -> anyhow::Result<()> {
    let orchestrator = Arc::new(Mutex::new(orchestrator));

    let scheduler = if config.scheduler.enabled {
        let schedule = ScheduleConfig::load(config.scheduler.config_path.as_deref())?;
        let scheduler = Scheduler::new(&schedule, Arc::clone(&orchestrator))?;
        if scheduler.is_empty() {
            tracing::info!("No enabled schedules");
            None
        } else {
            tracing::info!(entries = scheduler.len(), "Scheduling crews");
            Some(scheduler.start())
        }
    } else {
        tracing::info!("Scheduler is disabled");
        None
    };

    let state = AppState::new(Arc::clone(&orchestrator), config.api.key.clone());
    let port = config.api.port;

    tracing::info!("droid initialized successfully, press Ctrl+C to exit");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        tracing::info!("Shutting down...");
    };

    let served = droid_api::start_server(port, state, shutdown).await;

    if let Some(handle) = scheduler {
        handle.stop().await;
    }

    tracing::info!("Shutdown complete");
    served
}
