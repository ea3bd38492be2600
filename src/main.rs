use std::net::SocketAddr;

use atlas_files::{config, logging, routes, state::AppState};
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration first: the logging section decides where logs go
    let app_cfg = config::load()?;

    // Guards must live until shutdown so the non-blocking writers flush
    let _log_guards = logging::init(&app_cfg.logging)?;
    config::report(&app_cfg);

    let port = app_cfg.server.port;
    let host = app_cfg.server.host.clone();
    let state = AppState::new(app_cfg)?;

    let app = routes::router(state);
    // CORS: permissive in debug builds for local tooling, same-origin otherwise
    let app = if cfg!(debug_assertions) { app.layer(CorsLayer::permissive()) } else { app };

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Atlas files API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
