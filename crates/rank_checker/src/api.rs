use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::account::is_valid_address;
use crate::checker::{RankChecker, RankReport};
use crate::rank_tier::RankTier;
use crate::sources::AccountDataSource;

/// Shared application state available to all handlers.
pub struct AppState<S> {
    pub checker: RankChecker<S>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: AccountDataSource + Send + Sync + 'static,
{
    Router::new()
        .route("/api/health", get(health::<S>))
        .route("/api/tiers", get(tiers))
        .route("/api/rank/{address}", get(rank::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
    cached_accounts: usize,
}

async fn health<S>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse
where
    S: AccountDataSource + Send + Sync + 'static,
{
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: uptime,
        cached_accounts: state.checker.cached_accounts().await,
    })
}

/// Tier legend, best first.
async fn tiers() -> Json<[RankTier; 8]> {
    Json(RankTier::ALL)
}

#[derive(Serialize)]
pub(crate) struct MessageResponse {
    pub message: String,
}

async fn rank<S>(
    State(state): State<Arc<AppState<S>>>,
    Path(address): Path<String>,
) -> Result<Json<RankReport>, (StatusCode, Json<MessageResponse>)>
where
    S: AccountDataSource + Send + Sync + 'static,
{
    if !is_valid_address(&address) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: format!(
                    "invalid address: {address} (expected 0x followed by 40 hex characters)"
                ),
            }),
        ));
    }

    Ok(Json(state.checker.check(&address).await))
}
