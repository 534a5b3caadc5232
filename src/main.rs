//! Deep-link dispatch bridge CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  LINK DISPATCH                    │
//!                    │                                                   │
//!  link event        │  ┌──────────┐    ┌──────────┐    ┌────────────┐  │
//!  ──────────────────┼─▶│ dispatch │───▶│ routing  │───▶│  handler   │──┼──▶ host
//!                    │  │dispatcher│    │ matcher  │    │  registry  │  │
//!                    │  └────┬─────┘    └──────────┘    └────────────┘  │
//!                    │       │ snapshot                                   │
//!                    │  ┌────▼─────┐    ┌──────────┐                     │
//!  payload           │  │  config  │◀───│ watcher/ │◀────────────────────┼── payload file
//!  ──────────────────┼─▶│  store   │    │  reload  │                     │
//!                    │  └──────────┘    └──────────┘                     │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use link_dispatch::config::loader::{load_payload, load_settings};
use link_dispatch::config::validation::validate_payload;
use link_dispatch::config::watcher::ConfigWatcher;
use link_dispatch::dispatch::reload::run_reload_loop;
use link_dispatch::dispatch::{DispatchRequest, StaticBootstrap};
use link_dispatch::lifecycle::signals::shutdown_on_ctrl_c;
use link_dispatch::lifecycle::Shutdown;
use link_dispatch::observability::{logging, metrics};
use link_dispatch::{BridgeSettings, Dispatcher, HandlerRegistry, LinkEvent, UserActivity};

#[derive(Parser)]
#[command(name = "link-dispatch")]
#[command(about = "Deep-link dispatch bridge tools", long_about = None)]
struct Cli {
    /// Settings file (TOML or JSON).
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a routing payload file
    Check { payload: PathBuf },
    /// Print the match result of each link against a payload file
    Resolve {
        payload: PathBuf,
        /// URLs, or `activity:<type>` for a continuation
        #[arg(required = true)]
        links: Vec<String>,
    },
    /// Dispatch links read from stdin, reloading the payload on change
    Watch,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => BridgeSettings::default(),
    };

    if let Err(e) = logging::init_logging(&settings.observability) {
        eprintln!("failed to initialise logging: {}", e);
    }

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match cli.command {
        Commands::Check { payload } => check(&payload),
        Commands::Resolve { payload, links } => resolve(&payload, &links),
        Commands::Watch => watch(settings).await,
    }
}

fn parse_link(raw: &str) -> Result<LinkEvent, Box<dyn std::error::Error>> {
    match raw.strip_prefix("activity:") {
        Some(activity_type) => Ok(LinkEvent::Activity(UserActivity::new(activity_type))),
        None => Ok(LinkEvent::from_url(raw)?),
    }
}

fn check(path: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let payload = load_payload(path)?;
    match validate_payload(&payload) {
        Ok(config) => {
            println!("version {}", config.version);
            for route in &config.routes {
                println!("  {} -> {}", route.pattern, route.handler);
            }
            if let Some(default) = &config.default_handler {
                println!("  (default) -> {}", default);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            for error in errors {
                eprintln!("error: {}", error);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn resolve(path: &Path, links: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let payload = load_payload(path)?;
    let dispatcher = Dispatcher::builder()
        .bootstrap(StaticBootstrap(payload))
        .build();

    for raw in links {
        let event = parse_link(raw)?;
        let result = dispatcher.resolve(&event)?;
        let line = serde_json::json!({ "link": raw, "match": result });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(ExitCode::SUCCESS)
}

async fn watch(settings: BridgeSettings) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Some(payload_path) = settings.bootstrap.payload_path.clone() else {
        eprintln!("watch needs [bootstrap] payload_path in the settings file");
        return Ok(ExitCode::FAILURE);
    };

    let registry = Arc::new(HandlerRegistry::new());
    let dispatcher = Arc::new(Dispatcher::from_settings(&settings, registry.clone()));
    dispatcher.configure_if_needed()?;
    dispatcher.set_ready();

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    // Keep the watcher alive for the whole session.
    let _watcher = if settings.watch.enabled {
        let (watcher, updates) = ConfigWatcher::new(
            Path::new(&payload_path),
            Duration::from_secs(settings.watch.poll_interval_secs),
        );
        let watcher = watcher.run()?;
        tokio::spawn(run_reload_loop(dispatcher.clone(), updates, shutdown.subscribe()));
        Some(watcher)
    } else {
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stop = shutdown.subscribe();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                register_logging_handlers(&dispatcher, &registry);
                match parse_link(line) {
                    Ok(event) => {
                        let outcome = dispatcher.dispatch(event);
                        println!("{} -> {:?}", line, outcome);
                    }
                    Err(e) => eprintln!("{}: {}", line, e),
                }
            }
            _ = stop.recv() => break,
        }
    }

    shutdown.trigger();
    Ok(ExitCode::SUCCESS)
}

/// Make sure every handler id of the current snapshot has a handler.
fn register_logging_handlers(dispatcher: &Dispatcher, registry: &HandlerRegistry) {
    let Some(snapshot) = dispatcher.snapshot() else {
        return;
    };
    let ids = snapshot
        .routes
        .iter()
        .map(|r| r.handler.as_str())
        .chain(snapshot.default_handler.as_deref());
    for id in ids {
        if !registry.contains(id) {
            registry.register(id, |req: &DispatchRequest<'_>| {
                tracing::info!(
                    handler = req.handler,
                    params = ?req.params,
                    query = ?req.query,
                    version = req.config_version,
                    "Link handled"
                );
                true
            });
        }
    }
}
