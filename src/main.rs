//! remote-config - inspect and watch remote configuration sources

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remote_config::settings::{SettingsManager, SourceKind};
use remote_config::{Settings, ShutdownCoordinator, Value};

/// CLI arguments for remote-config
#[derive(Parser, Debug)]
#[command(name = "remote-config")]
#[command(about = "Read typed configuration from a file, URL or git repository")]
#[command(version)]
#[command(long_about = "
Read typed configuration from a file, URL or git repository.

Settings priority (highest to lowest):
1. Command-line arguments
2. Settings file (--config)
3. Environment variables
4. Built-in defaults

Environment variables:
  REMOTE_CONFIG_SOURCE            - Source kind (file, url, git)
  REMOTE_CONFIG_PATH              - File path, or path inside the git repository
  REMOTE_CONFIG_URL               - Document URL, or git remote
  REMOTE_CONFIG_BRANCH            - Git branch
  REMOTE_CONFIG_REFRESH_INTERVAL  - Refresh interval (e.g. 30s, 5m)
  REMOTE_CONFIG_LOG_LEVEL         - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Settings file path
    #[arg(short, long, default_value = "remote-config.toml")]
    pub config: PathBuf,

    /// Read a local YAML/JSON file
    #[arg(long, conflicts_with_all = ["url", "git"])]
    pub file: Option<PathBuf>,

    /// Fetch a YAML/JSON document over HTTP(S)
    #[arg(long, conflicts_with = "git")]
    pub url: Option<String>,

    /// Git remote to clone
    #[arg(long, requires_all = ["branch", "path"])]
    pub git: Option<String>,

    /// Git branch (with --git)
    #[arg(long)]
    pub branch: Option<String>,

    /// Path of the document inside the git repository (with --git)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Refresh interval (e.g. 30s, 5m)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value of one key
    Get { key: String },
    /// Print every key of the current snapshot
    Dump,
    /// Print the given keys (or everything) after every refresh until interrupted
    Watch {
        #[arg(short, long = "key")]
        keys: Vec<String>,
    },
    /// Refresh once more and print the refresh metrics in Prometheus text format
    Metrics,
    /// Validate the settings and exit
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let settings = load_settings(&args)?;
    init_tracing(&args, &settings);

    if matches!(args.command, Command::Validate) {
        info!("Settings are valid");
        info!("  Source: {:?}", settings.source.kind);
        info!(
            "  Refresh interval: {}",
            humantime::format_duration(settings.refresh_interval)
        );
        return Ok(());
    }

    let shutdown = ShutdownCoordinator::new(Duration::from_secs(10));
    let client = settings
        .connect(&shutdown.token())
        .await
        .context("Failed to start configuration client")?;

    match &args.command {
        Command::Get { key } => {
            let value = client.get_value(key)?;
            println!("{}", render(&value)?);
        }
        Command::Dump => print_snapshot(&client, &[])?,
        Command::Metrics => {
            if let Err(e) = client.refresh_now().await {
                warn!("Refresh failed: {}", e);
            }
            print!("{}", client.metrics().render());
        }
        Command::Watch { keys } => {
            print_snapshot(&client, keys)?;

            let mut ticker = tokio::time::interval(client.refresh_interval());
            ticker.tick().await;
            let signals = shutdown.listen_for_signals();
            tokio::pin!(signals);
            loop {
                tokio::select! {
                    res = &mut signals => {
                        if let Err(e) = res {
                            error!("Error setting up signal handlers: {}", e);
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = print_snapshot(&client, keys) {
                            error!("Failed to print configuration: {}", e);
                        }
                    }
                }
            }
        }
        Command::Validate => unreachable!("handled before connecting"),
    }

    shutdown.shutdown_client(&client).await?;
    Ok(())
}

/// CLI flags > settings file > environment > defaults
fn load_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = if args.config.exists() {
        SettingsManager::load_layered(&args.config)?
    } else {
        let mut settings = Settings::default();
        settings.apply_env_overrides()?;
        settings
    };

    if let Some(file) = &args.file {
        settings.source.kind = SourceKind::File;
        settings.source.path = Some(file.clone());
    } else if let Some(url) = &args.url {
        settings.source.kind = SourceKind::Url;
        settings.source.url = Some(url.clone());
    } else if let Some(remote) = &args.git {
        settings.source.kind = SourceKind::Git;
        settings.source.url = Some(remote.clone());
        settings.source.branch = args.branch.clone();
        settings.source.path = args.path.clone();
    }

    if let Some(interval) = args.interval {
        settings.refresh_interval = interval;
    }
    if let Some(level) = &args.log_level {
        settings.logging.level = level.clone();
    }

    settings
        .validate()
        .context("Final settings validation failed")?;
    Ok(settings)
}

fn print_snapshot(client: &remote_config::Client, keys: &[String]) -> Result<()> {
    let snapshot = client
        .snapshot()
        .context("Source does not expose a snapshot")?;

    for (key, value) in snapshot.iter() {
        if keys.is_empty() || keys.contains(key) {
            println!("{}: {}", key, render(value)?);
        }
    }
    Ok(())
}

fn render(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other)?,
    })
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs, settings: &Settings) {
    let log_level = if args.verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}
