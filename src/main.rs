// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use lending_server::{
    api::router,
    config::{Config, LOG_FORMAT_ENV},
    state::{AppState, KvStores, Repositories},
    storage::{RedisKvStore, StorageResult},
};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

/// With Redis, sessions and the entity cache share one pool.
async fn connect_stores(config: &Config) -> StorageResult<KvStores> {
    match config.store.redis_url {
        Some(ref url) => {
            let store = RedisKvStore::connect(url, config.store.timeout).await?;
            Ok(KvStores {
                sessions: Arc::new(store.clone()),
                cache: Arc::new(store),
            })
        }
        None => {
            tracing::warn!("REDIS_URL not set; sessions and cache are held in process memory");
            Ok(KvStores::in_memory(&config.store))
        }
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => {},
    }
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let stores = match connect_stores(&config).await {
        Ok(stores) => stores,
        Err(e) => {
            tracing::error!(
                error = %e,
                timeout_ms = config.store.timeout.as_millis() as u64,
                "failed to connect to redis for sessions and cache"
            );
            return ExitCode::FAILURE;
        }
    };

    tracing::warn!("using in-memory repositories; accounts and orders do not survive a restart");

    let admin = config.admin.clone();
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, stores, Repositories::in_memory());

    if let Some(ref admin) = admin {
        match state.users.bootstrap_admin(admin).await {
            Ok(true) => tracing::info!(email = %admin.email, "bootstrap admin created"),
            Ok(false) => tracing::debug!("bootstrap admin already present"),
            Err(e) => {
                tracing::error!(error = %e, "failed to create bootstrap admin");
                return ExitCode::FAILURE;
            }
        }
    }

    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to parse bind address");
            return ExitCode::FAILURE;
        }
    };
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    tracing::info!(
        %addr,
        session_backend = state.session_store.backend(),
        cache_backend = state.cache_store.backend(),
        "lending server listening (docs at /docs)"
    );

    let app = router(state);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("server stopped");
    ExitCode::SUCCESS
}
