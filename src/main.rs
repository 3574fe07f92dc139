use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use class_site_api::config::AppConfig;
use class_site_api::database::{ClassStore, MemoryStore, PgStore};
use class_site_api::{app, Deployment};

const DEFAULT_LOG_FILTER: &str = "class_site_api=info,tower_http=info";

#[derive(Parser)]
#[command(name = "class-site-api")]
#[command(about = "Class site backend: password check and gated class data API")]
#[command(version)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Component::All, help = "Which handlers to serve")]
    component: Component,

    #[arg(long, help = "Listen port (overrides CLASS_SITE_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Keep data in memory instead of Postgres")]
    in_memory: bool,

    #[arg(long, help = "Skip schema migrations at startup")]
    no_migrate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Component {
    All,
    Auth,
    Data,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and CLASS_SITE_PASSWORD
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.no_migrate {
        config.database.run_migrations = false;
    }

    info!(
        "Starting class site API in {:?} mode, serving {:?}",
        config.environment, cli.component
    );

    let mut pg = None;
    let deployment = match cli.component {
        Component::Auth => Deployment::Auth,
        Component::Data | Component::All => {
            let store: Arc<dyn ClassStore> = if cli.in_memory {
                warn!("Using in-memory store; data is lost on exit");
                Arc::new(MemoryStore::new())
            } else {
                let store = PgStore::connect(&config.database)
                    .await
                    .context("failed to connect to database")?;
                if config.database.run_migrations {
                    store.migrate().await.context("failed to run migrations")?;
                }
                pg = Some(store.clone());
                Arc::new(store)
            };

            if cli.component == Component::All {
                Deployment::All(store)
            } else {
                Deployment::Data(store)
            }
        }
    };

    let router = app(
        config.security.shared_secret.clone(),
        deployment,
        config.server.max_body_bytes,
    );

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(store) = pg {
        store.close().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
