//! Strictly Arbiter - service entry point.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use strictly_arbiter::{
    AppState, DecisionEngine, GameOrchestrator, GameRepository, HttpEngineClient, ServiceConfig,
    SessionStore, StatsService, router,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_arbiter=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        config = config.with_database_path(db_path);
    }

    match cli.command {
        Command::Serve {
            port,
            host,
            engine_url,
        } => {
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(url) = engine_url {
                config = config.with_engine_url(url);
            }
            run_server(config).await
        }
        Command::Migrate => run_migrations(&config),
        Command::AddUser { name } => run_add_user(&config, name),
        Command::Users => run_list_users(&config),
        Command::EngineHealth { engine_url } => {
            if let Some(url) = engine_url {
                config = config.with_engine_url(url);
            }
            run_engine_health(&config).await
        }
    }
}

/// Opens the repository and applies pending migrations.
#[instrument(skip(config), fields(db_path = %config.database_path()))]
fn open_repository(config: &ServiceConfig) -> Result<GameRepository> {
    let repository = GameRepository::new(config.database_path().clone())?;
    repository.run_migrations()?;
    Ok(repository)
}

/// Builds the HTTP engine client.
fn engine_client(config: &ServiceConfig) -> Result<HttpEngineClient> {
    Ok(HttpEngineClient::new(
        config.engine_url(),
        config.engine_timeout(),
        config.engine_difficulty().clone(),
    )?)
}

/// Run the HTTP service
#[instrument(skip(config))]
async fn run_server(config: ServiceConfig) -> Result<()> {
    info!(
        engine_url = %config.engine_url(),
        db_path = %config.database_path(),
        "Starting Strictly Arbiter"
    );

    let store: Arc<dyn SessionStore> = Arc::new(open_repository(&config)?);
    let engine: Arc<dyn DecisionEngine> = Arc::new(engine_client(&config)?);

    let state = AppState {
        orchestrator: GameOrchestrator::new(engine, Arc::clone(&store)),
        stats: StatsService::new(store, *config.leaderboard_limit()),
    };

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown requested");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Apply pending migrations and exit
#[instrument(skip(config))]
fn run_migrations(config: &ServiceConfig) -> Result<()> {
    let repository = GameRepository::new(config.database_path().clone())?;
    let applied = repository.run_migrations()?;
    println!("Applied {} migration(s) to {}", applied, config.database_path());
    Ok(())
}

/// Register a display name so the leaderboard can show it
#[instrument(skip(config))]
fn run_add_user(config: &ServiceConfig, name: String) -> Result<()> {
    let repository = open_repository(config)?;
    let user = repository.get_or_create_user(name)?;
    println!("{}\t{}", user.id(), user.display_name());
    Ok(())
}

/// List registered profiles
#[instrument(skip(config))]
fn run_list_users(config: &ServiceConfig) -> Result<()> {
    let repository = open_repository(config)?;
    for user in repository.list_users()? {
        println!("{}\t{}", user.id(), user.display_name());
    }
    Ok(())
}

/// Probe the decision engine once
#[instrument(skip(config))]
async fn run_engine_health(config: &ServiceConfig) -> Result<()> {
    let engine = engine_client(config)?;
    let report = engine.health_check().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
