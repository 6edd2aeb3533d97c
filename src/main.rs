use anyhow::Result;
use clap::{Parser, Subcommand};
use cqlmigrate::commands;
use cqlmigrate::config::{self, ConfigInput, MigrationInput};
use cqlmigrate::constants::CONFIG_FILENAME;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations to the keyspace
    Migrate {
        #[command(flatten)]
        cluster_args: config::ClusterArgs,

        #[command(flatten)]
        keyspace_args: config::KeyspaceArgs,

        #[command(flatten)]
        migration_args: config::MigrationArgs,

        #[command(flatten)]
        migrate_args: config::MigrateArgs,
    },

    /// Check resolved migrations against the ones applied to the keyspace
    Validate {
        /// Target version ('latest', 'current' or a version)
        #[arg(long)]
        target: Option<String>,

        #[command(flatten)]
        cluster_args: config::ClusterArgs,

        #[command(flatten)]
        keyspace_args: config::KeyspaceArgs,

        #[command(flatten)]
        migration_args: config::MigrationArgs,
    },

    /// Mark an existing keyspace as being at a given version
    Baseline {
        #[command(flatten)]
        cluster_args: config::ClusterArgs,

        #[command(flatten)]
        keyspace_args: config::KeyspaceArgs,

        #[command(flatten)]
        migration_args: config::MigrationArgs,

        #[command(flatten)]
        baseline_args: config::BaselineArgs,
    },

    /// Print the state of every known migration
    Info {
        /// Target version ('latest', 'current' or a version)
        #[arg(long)]
        target: Option<String>,

        #[command(flatten)]
        cluster_args: config::ClusterArgs,

        #[command(flatten)]
        keyspace_args: config::KeyspaceArgs,

        #[command(flatten)]
        migration_args: config::MigrationArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        warn!("Received shutdown signal, stopping after the current migration...");
        signal_token.cancel();
    });

    run_main(cli, shutdown).await
}

/// Runs a command that writes nothing, abandoning it on shutdown
async fn until_shutdown<T>(
    shutdown: &CancellationToken,
    command: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        result = command => result,
        _ = shutdown.cancelled() => anyhow::bail!("Interrupted by shutdown signal"),
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cli_input(
    cluster_args: &config::ClusterArgs,
    keyspace_args: &config::KeyspaceArgs,
    migration: MigrationInput,
) -> ConfigInput {
    ConfigInput {
        cluster: Some(cluster_args.clone().into()),
        keyspace: Some(keyspace_args.clone().into()),
        migration: Some(migration),
    }
}

async fn run_main(cli: Cli, shutdown: CancellationToken) -> Result<()> {
    let (file_config, _root_dir) = config::load_config(&cli.config_file)?;

    match &cli.command {
        Commands::Migrate {
            cluster_args,
            keyspace_args,
            migration_args,
            migrate_args,
        } => {
            let migration = MigrationInput::from(migration_args.clone())
                .merge_with(migrate_args.clone().into());
            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_input(cluster_args, keyspace_args, migration))
                .resolve()?;

            info!("Migrating keyspace");
            commands::cmd_migrate(&config, !cli.quiet, shutdown).await?;
            Ok(())
        }
        Commands::Validate {
            target,
            cluster_args,
            keyspace_args,
            migration_args,
        } => {
            let migration = MigrationInput {
                target: target.clone(),
                ..migration_args.clone().into()
            };
            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_input(cluster_args, keyspace_args, migration))
                .resolve()?;

            info!("Validating migrations");
            until_shutdown(&shutdown, commands::cmd_validate(&config)).await
        }
        Commands::Baseline {
            cluster_args,
            keyspace_args,
            migration_args,
            baseline_args,
        } => {
            let migration = MigrationInput::from(migration_args.clone())
                .merge_with(baseline_args.clone().into());
            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_input(cluster_args, keyspace_args, migration))
                .resolve()?;

            info!("Baselining keyspace");
            commands::cmd_baseline(&config).await
        }
        Commands::Info {
            target,
            cluster_args,
            keyspace_args,
            migration_args,
        } => {
            let migration = MigrationInput {
                target: target.clone(),
                ..migration_args.clone().into()
            };
            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_input(cluster_args, keyspace_args, migration))
                .resolve()?;

            until_shutdown(&shutdown, commands::cmd_info(&config)).await
        }
    }
}
