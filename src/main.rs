use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info, warn};

use jokes_rest_api::{
    clients::{ElasticsearchClient, HttpJokeClient},
    config::{Config, Environment},
    create_router,
    db::Database,
    middleware::init_tracing,
    AppState,
};

#[tokio::main]
async fn main() {
    // .env is read here as well so ENV can pick the log format
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing(&Environment::from_env()) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let database = match Database::new(config.database.clone()).await {
        Ok(db) => {
            info!("Database connection established");
            Arc::new(db)
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = database.migrate().await {
        error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    if config.seed_database {
        if let Err(e) = database.seed().await {
            error!("Failed to seed database: {}", e);
            std::process::exit(1);
        }
    }

    let search = match ElasticsearchClient::new(&config.search) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build Elasticsearch client: {:#}", e);
            std::process::exit(1);
        }
    };

    // The index only receives best-effort copies, so a missing cluster is not fatal
    if let Err(e) = search.ensure_index().await {
        warn!("Elasticsearch index setup failed, continuing without it: {}", e);
    }

    let fetcher = match HttpJokeClient::new(&config.external) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build external joke client: {:#}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(
        database,
        fetcher,
        search,
        config.jokes.clone(),
        config.external.fetch_timeout,
    ));

    let app = create_router(state, config.request_timeout);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
