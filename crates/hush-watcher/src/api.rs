use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use hush_circuits::GroupTree;
use hush_sdk::models::{fr_from_decimal, fr_to_decimal};
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::db::Db;

pub struct AppState {
    pub db: Db,
    /// Latest chain head seen by the poller.
    pub head: Option<u64>,
}

pub type SharedState = Arc<RwLock<AppState>>;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn internal(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status))
        .route("/v1/groups/{id}/root", get(group_root))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn status(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let s = state.read().await;
    let next_block = s.db.load_cursor().map_err(internal)?;
    let events_applied = s.db.events_applied().map_err(internal)?;
    Ok(Json(json!({
        "next_block": next_block,
        "events_applied": events_applied,
        "head": s.head,
    })))
}

/// Membership root of a group, rebuilt from the commitments seen on chain.
async fn group_root(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.read().await.db.load_members(id).map_err(internal)?;
    if members.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown group" })),
        ));
    }
    let commitments = members
        .iter()
        .map(|m| fr_from_decimal(m).ok_or_else(|| internal(format!("stored commitment {m:?} is not decimal"))))
        .collect::<Result<Vec<_>, _>>()?;
    let root = GroupTree::from_members(&commitments).root();
    Ok(Json(json!({
        "group_id": id,
        "members": members.len(),
        "root": fr_to_decimal(&root.0),
    })))
}
