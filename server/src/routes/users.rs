//! User provisioning route.
//!
//! Account management lives in front of this service; this endpoint only
//! makes sure the row backing the sequence allocator exists for a user.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{AppError, Result};
use crate::AppState;

/// Request body for user provisioning.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub id: String,
}

/// Response for user provisioning.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub id: String,
    pub next_seq_no: i64,
}

/// Create user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users", post(create_user_handler))
}

/// POST /users - ensure a user row exists. Idempotent.
async fn create_user_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>> {
    if request.id.is_empty() {
        return Err(AppError::BadRequest("user id must not be empty".to_string()));
    }

    db::create_user(&state.pool, &request.id).await?;
    let user = db::get_user(&state.pool, &request.id)
        .await?
        .ok_or(AppError::Storage(sqlx::Error::RowNotFound))?;

    Ok(Json(CreateUserResponse {
        id: user.id,
        next_seq_no: user.next_seq_no,
    }))
}
