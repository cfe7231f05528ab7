// textlens - Text analysis service with cached results and rate limiting
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use textlens::cache::{DerivedCache, ListCache};
use textlens::cli::Args;
use textlens::config::{AppConfig, StoreBackend};
use textlens::documents::{DocumentService, InMemoryDocumentRepository};
use textlens::ratelimit::RateLimiter;
use textlens::server::create_router;
use textlens::store;
use textlens::utils::logging;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration, CLI overrides on top
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.memory_store {
        config.store.backend = StoreBackend::Memory;
    }

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting textlens v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Connect the shared store
    let store = store::connect(&config.store).await?;

    // Phase 4: Build components over the one store handle
    let cache = Arc::new(DerivedCache::new(store.clone(), config.cache.clone()));
    let lists = ListCache::new(
        store.clone(),
        config.cache.user_documents_ttl_seconds,
        config.cache.enabled,
    );
    let documents = Arc::new(DocumentService::new(
        Arc::new(InMemoryDocumentRepository::new()),
        cache,
        lists,
    ));
    let limiter = Arc::new(RateLimiter::new(store, config.rate_limit.enabled));
    if !config.rate_limit.enabled {
        info!("Rate limiting disabled by configuration");
    }

    // Phase 5: Build and start HTTP server
    let app = create_router(config.clone(), documents, limiter)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
