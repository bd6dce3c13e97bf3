mod bee_commands;
mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    hive_config::HiveConfig,
    hive_runtime::{EventPump, Hive, LogHandler, builtin_registry},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "hive", about = "Hive: runs bees that watch services and react to them")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of searching the standard locations.
    #[arg(long, global = true, env = "HIVE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every configured bee and log their events (default).
    Run,
    /// List the registered bee factories.
    Factories,
    /// Show everything a factory declares, as JSON.
    Describe { id: String },
    /// Start the configured bees, run one action and print the events it
    /// produced.
    Trigger {
        bee: String,
        action: String,
        /// How long to collect events after the action returned.
        #[arg(long, default_value_t = 1000)]
        wait_ms: u64,
    },
    /// Exchange an OAuth2 authorization code through a factory.
    Oauth {
        factory: String,
        #[arg(long, env = "HIVE_OAUTH_CLIENT_ID")]
        client_id: String,
        #[arg(long, env = "HIVE_OAUTH_CLIENT_SECRET")]
        client_secret: String,
        #[arg(long)]
        code: String,
    },
    /// Configuration tools.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the file named by `--config`, or discover one.
fn load_config(cli: &Cli) -> anyhow::Result<HiveConfig> {
    match &cli.config {
        Some(path) => hive_config::load_config(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(hive_config::discover_and_load()),
    }
}

async fn run(config: &HiveConfig) -> anyhow::Result<()> {
    let registry = Arc::new(builtin_registry());
    config_commands::ensure_valid(config, &registry)?;

    let (hive, rx) = Hive::from_config(registry, config);
    let started = hive.start_all(config).await?;
    if started == 0 {
        warn!("no bees configured");
    }
    info!(bees = started, "hive running, press Ctrl-C to stop");

    let cancel = CancellationToken::new();
    let pump = {
        let cancel = cancel.clone();
        tokio::spawn(async move { EventPump::new(rx, cancel).run(&LogHandler).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    cancel.cancel();
    let handled = pump.await?;
    info!(events = handled, "hive stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "hive starting");

    let config = load_config(&cli)?;
    match cli.command {
        None | Some(Commands::Run) => run(&config).await,
        Some(Commands::Factories) => bee_commands::list_factories(&builtin_registry()),
        Some(Commands::Describe { id }) => bee_commands::describe(&builtin_registry(), &id),
        Some(Commands::Trigger {
            bee,
            action,
            wait_ms,
        }) => bee_commands::trigger(&config, &bee, &action, wait_ms).await,
        Some(Commands::Oauth {
            factory,
            client_id,
            client_secret,
            code,
        }) => {
            bee_commands::oauth(
                &builtin_registry(),
                &factory,
                &client_id,
                &client_secret,
                &code,
            )
            .await
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref(), &config)
        },
    }
}
