use std::net::{IpAddr, SocketAddr};

use axum::Router;
use configs::AppConfig;
use store::Store;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes;
use crate::state::{AppState, AuthSettings};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// `server.host` is an IPv4 or IPv6 literal; brackets around IPv6 are accepted.
fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    let host = cfg.server.host.trim();
    let literal = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
    let ip: IpAddr = literal
        .parse()
        .map_err(|e| anyhow::anyhow!("server.host `{host}` is not an IP address: {e}"))?;
    Ok(SocketAddr::new(ip, cfg.server.port))
}

/// Select the store and create the configured administrator, if any.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let store = Store::initialize(cfg).await?;
    if let Some(admin) = &cfg.auth.bootstrap_admin {
        let user = store.ensure_admin(&admin.name, &admin.email, &admin.password).await?;
        info!(event = "bootstrap_admin", user_id = user.id, "administrator account ready");
    }
    if cfg.auth.jwt_secret == "dev-secret-change-me" {
        warn!(event = "insecure_default", "auth.jwt_secret is the development default; set JWT_SECRET");
    }
    Ok(AppState::new(store, AuthSettings::from_config(&cfg.auth)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: build the app and serve until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(&cfg.server.frontend_dir).await?;

    let state = build_state(&cfg).await?;
    let backend = state.store.kind();
    let app: Router = routes::build_router(state, build_cors(), &cfg.server);

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, %backend, event = "listening", "geed server started");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(event = "stopped", "server stopped");
    Ok(())
}
