//! Environment/runtime helpers
//!
//! Sanity checks run once at startup.

use tracing::warn;

/// Warn when the frontend bundle is missing; the API keeps working without it.
pub async fn ensure_env(frontend_dir: &str) -> anyhow::Result<()> {
    match tokio::fs::metadata(frontend_dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(anyhow::anyhow!("{frontend_dir} exists but is not a directory"));
        }
        Err(_) => {
            warn!(%frontend_dir, "frontend assets directory not found; static assets may 404");
        }
    }
    Ok(())
}
