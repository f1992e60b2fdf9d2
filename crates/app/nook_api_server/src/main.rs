//! Nook API server binary.
//!
//! Loads configuration from the environment (and `.env`), connects both
//! stores, runs their migrations and serves the REST API until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use nook_api::config::ApiConfig;
use nook_core::auth::identity::{DisabledVerifier, FirebaseVerifier, IdentityVerifier};
use nook_core::store::PgUserStore;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server. Anything not given here is read from
/// the environment by [`ApiConfig::from_env`].
#[derive(Parser, Debug)]
#[command(name = "nook_api_server", about = "Nook API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Maximum number of connections in each database pool.
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,
}

async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nook_api=debug,nook_core=debug".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.max_connections = args.max_connections;

    info!(?config, "starting nook_api_server");

    let pool = connect(&config.database_url, config.max_connections).await?;
    let docs = if config.document_database_url == config.database_url {
        pool.clone()
    } else {
        connect(&config.document_database_url, config.max_connections).await?
    };

    info!("running database migrations");
    nook_api::migrate(&pool, &docs).await?;

    let verifier: Arc<dyn IdentityVerifier> = match config.firebase_project_id.as_deref() {
        Some(project) => {
            info!(project, "external identity login enabled");
            Arc::new(FirebaseVerifier::new(project, config.identity_timeout)?)
        }
        None => {
            warn!("FIREBASE_PROJECT_ID is not set; external identity login is disabled");
            Arc::new(DisabledVerifier)
        }
    };

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let bind_addr = config.bind_addr.clone();
    let state = nook_api::AppState::new(config, pool, docs, users, verifier);
    let app = nook_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}
