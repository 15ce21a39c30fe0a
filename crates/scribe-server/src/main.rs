mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};

use scribe_api::{AppState, AppStateInner, RouterConfig, SessionKeys, middleware, router};
use scribe_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribe=info,scribe_api=debug,scribe_db=info,tower_http=debug".into()),
        )
        .init();
    middleware::install_panic_hook();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    // Init database; an unopenable file is retried per request
    let db = Database::open_deferred(&config.database.path);

    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions: SessionKeys::new(&config.session.secret, config.session.secure_cookies),
    });

    let app = router(
        state,
        &RouterConfig {
            static_dir: config.server.static_dir.clone(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        },
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Scribe listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Scribe stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
