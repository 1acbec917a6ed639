//! Sync ingestion route.

use axum::{extract::State, routing::post, Json, Router};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{handle_push, PushRequest, PushResponse};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sync", post(push_handler))
}

/// POST /sync - Push operations to the server.
async fn push_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>> {
    let response = handle_push(&state.pool, &auth.user_id, request).await?;
    Ok(Json(response))
}
