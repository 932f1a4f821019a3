//! Pubkey Authentication Service
//!
//! Issues login challenges, resolves signed responses to identities and
//! guards routes with bearer credentials, tribe tokens, a shared secret or
//! the dev free pass.

use std::process::ExitCode;
use std::sync::Arc;

use pubkey_auth_service::{
    app::build_router,
    cache::MemoryCache,
    identity::MemoryIdentityStore,
    settings::Settings,
    state::AppState,
    telemetry::{init_tracing, shutdown_tracing},
};

/// Expired cache entries are swept at this multiple of the default cache TTL.
const PURGE_INTERVAL_FACTOR: u32 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = Settings::from_env();
    if let Err(err) = settings.validate() {
        eprintln!("Invalid configuration: {err}");
        return ExitCode::FAILURE;
    }

    init_tracing();
    tracing::info!("Starting pubkey auth service...");
    if settings.access().free_pass_active() {
        tracing::warn!("Admin free pass is active; gated routes admit any caller");
    }

    let cache = Arc::new(MemoryCache::new());
    let identities = Arc::new(MemoryIdentityStore::new());

    let purge_every = settings.cache_ttl().saturating_mul(PURGE_INTERVAL_FACTOR);
    let sweeper = cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            interval.tick().await;
            let removed = sweeper.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "purged expired cache entries");
            }
        }
    });

    let addr = settings.socket_addr();
    let app = build_router(AppState::new(settings, cache, identities));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {addr}: {err}");
            shutdown_tracing();
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Pubkey auth service listening on {}", addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    shutdown_tracing();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Server error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
