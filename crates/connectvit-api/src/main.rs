//! ConnectVit server and CLI entry point.
//!
//! Binary name: `connectvit`
//!
//! Parses CLI arguments, loads configuration, then runs the requested
//! command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use connectvit_infra::config::{load_server_config, resolve_data_dir};
use connectvit_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need logging or config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "connectvit", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.otel, cli.log_json, cli.log_filter())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let data_dir = resolve_data_dir();
    let config = load_server_config(&data_dir).await;

    let result = match cli.command {
        Commands::Serve { host, port } => cli::serve::serve(config, data_dir, host, port).await,
        Commands::Migrate => cli::serve::migrate(&config, &data_dir, cli.json).await,
        Commands::Config => cli::serve::show_config(&config, &data_dir, cli.json),
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
