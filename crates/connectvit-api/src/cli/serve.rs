//! `serve`, `migrate` and `config` commands.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use connectvit_infra::config::database_url;
use connectvit_infra::gateway::Gateway;
use connectvit_types::config::ServerConfig;

use crate::http::router::build_router;
use crate::state::AppState;

/// Run the server until Ctrl+C or SIGTERM, then close every session.
pub async fn serve(
    mut config: ServerConfig,
    data_dir: PathBuf,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::init(config, data_dir).await?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} ConnectVit listening on {} ({})",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan(),
        state.gateway.backend()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = build_router(state.clone());
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(drain(state.clone()))
    .await?;

    state.gateway.close().await;
    println!("\n  Server stopped.");
    Ok(())
}

/// Resolves once a shutdown signal arrives and every session is closed.
async fn drain(state: AppState) {
    crate::shutdown_signal().await;
    state.shutdown.cancel();
    let closed = state.sessions.close_all();
    tracing::info!(closed, "closed realtime sessions for shutdown");
}

/// Connect once so pending migrations run, then exit.
pub async fn migrate(config: &ServerConfig, data_dir: &Path, json: bool) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir).await?;
    let url = database_url(config, data_dir);
    let gateway = Gateway::connect(&url, &config.database).await?;
    gateway.close().await;

    if json {
        println!(
            "{}",
            serde_json::json!({ "migrated": true, "backend": gateway.backend() })
        );
    } else {
        println!(
            "  {} Migrations applied ({})",
            console::style("✓").green(),
            gateway.backend()
        );
    }
    Ok(())
}

/// Print the configuration the server would run with.
pub fn show_config(config: &ServerConfig, data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let mut effective = config.clone();
    effective.database.url = Some(database_url(config, data_dir));

    if json {
        println!("{}", serde_json::to_string_pretty(&effective)?);
    } else {
        println!("# data dir: {}", data_dir.display());
        print!("{}", toml::to_string_pretty(&effective)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_creates_sqlite_database() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        migrate(&ServerConfig::default(), &data_dir, true).await.unwrap();
        assert!(data_dir.join("connect.db").exists());
    }
}
