//! Read-only dashboard over the last-computed reviews
//!
//! A minimal HTTP surface: `GET /reviews` returns the latest review set
//! as JSON, `GET /healthz` answers liveness probes. Nothing here mutates
//! state; the serve loop in the CLI refreshes the shared review set on
//! its own cadence.

use crate::review::Review;
use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use log::info;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The review set shared between the refresh loop and the handlers
pub type SharedReviews = Arc<RwLock<Vec<Review>>>;

/// Build the dashboard router
pub fn router(reviews: SharedReviews) -> Router {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/healthz", get(healthz))
        .with_state(reviews)
}

async fn list_reviews(State(reviews): State<SharedReviews>) -> Json<Vec<Review>> {
    Json(reviews.read().await.clone())
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serve the dashboard until ctrl-c
pub async fn serve(reviews: SharedReviews, port: u16) -> Result<()> {
    let app = router(reviews);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding dashboard to port {}", port))?;
    info!("Dashboard listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Dashboard shutting down");
        })
        .await
        .context("serving dashboard")?;
    Ok(())
}
