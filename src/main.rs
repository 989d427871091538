//! flowmacro command line entry point
//!
//! `flowmacro show <graph>` loads a graph document (macros included) and
//! prints its compact form again; `flowmacro run <graph>` executes it and
//! prints what every collector received.

use anyhow::Context;
use clap::{Parser, Subcommand};
use flowmacro::config::{EngineConfig, LoggingConfig};
use flowmacro::graph::{DefinitionFormat, Executor, Graph};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable overriding the configured log filter
const LOG_ENV: &str = "FLOWMACRO_LOG";

#[derive(Parser, Debug)]
#[command(author, version, name = "flowmacro")]
#[command(about = "Load, inspect and run dataflow graphs built from macro nodes")]
struct Cli {
    /// Engine config file (defaults to the platform data directory)
    #[arg(global = true, short = 'c', long)]
    config: Option<PathBuf>,

    /// Extra directory searched for macro definitions
    #[arg(global = true, short = 'd', long = "definitions")]
    definition_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Print the compact form of a graph after a load/serialize cycle")]
    Show {
        graph: PathBuf,
        /// Print TOML instead of JSON
        #[arg(long)]
        toml: bool,
    },
    #[command(about = "Run a graph to completion and print collector states")]
    Run { graph: PathBuf },
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(&logging.filter))
    };

    let (file_layer, guard) = match &logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "flowmacro.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter()),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(guard)
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::load_or_default(),
    };
    config.definition_dirs.extend(cli.definition_dirs.iter().cloned());
    Ok(config)
}

fn show(graph_path: &Path, toml: bool, config: EngineConfig) -> anyhow::Result<()> {
    let graph = Graph::load_file(graph_path, config)
        .with_context(|| format!("Failed to load graph {}", graph_path.display()))?;
    let format = if toml {
        DefinitionFormat::Toml
    } else {
        DefinitionFormat::Json
    };
    println!("{}", graph.to_compact_all()?.encode(format)?);
    Ok(())
}

fn run(graph_path: &Path, config: EngineConfig) -> anyhow::Result<()> {
    let mut graph = Graph::load_file(graph_path, config)
        .with_context(|| format!("Failed to load graph {}", graph_path.display()))?;
    let stats = Executor::run_to_completion(&mut graph).context("Graph execution failed")?;
    tracing::info!(
        "Run finished: {} ticks, {} packets",
        stats.ticks,
        stats.packets_delivered
    );

    for (id, slot) in graph.nodes() {
        if let Some(state) = graph.collector_state(id) {
            println!("{}: {}", slot.display(), serde_json::to_string(state)?);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _guard = init_logging(&config.logging)?;

    tracing::info!("Starting flowmacro");

    match &cli.cmd {
        Commands::Show { graph, toml } => show(graph, *toml, config),
        Commands::Run { graph } => run(graph, config),
    }
}
