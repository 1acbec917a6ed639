//! Push handler - merges a batch of client operations into the store.

use crate::error::{AppError, Result};
use crate::handlers::apply_operation;
use recall_engine::{validate_batch, ClientOperation, Operation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Request body for push sync.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Stable id of the originating device; participates in write
    /// tie-breaking only
    pub client_id: String,
    /// Operations in client order, as raw wire JSON. Parsed one at a time so
    /// a bad operation fails exactly where it sits in the batch.
    pub operations: Vec<serde_json::Value>,
}

/// Response for push sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// How many operations were applied
    pub applied: usize,
    /// Sequence number consumed by the last applied operation
    pub last_seq_no: Option<i64>,
}

/// Merge a batch of operations for one user.
///
/// The batch gate runs before anything is parsed or any sequence number is
/// reserved. Operations are then applied sequentially; if one fails, the
/// ones already applied stay applied (each is individually durable) and the
/// client re-sends the remainder. Convergence is unaffected by the re-send.
pub async fn handle_push(
    pool: &PgPool,
    user_id: &str,
    request: PushRequest,
) -> Result<PushResponse> {
    let PushRequest {
        client_id,
        operations,
    } = request;

    if client_id.is_empty() {
        return Err(AppError::BadRequest(
            "clientId must not be empty".to_string(),
        ));
    }
    validate_batch(&operations)?;

    let mut applied = 0;
    let mut last_seq_no = None;

    for value in operations {
        let operation = Operation::from_value(value)?;
        let op = ClientOperation::new(user_id, client_id.clone(), operation);
        let seq_no = apply_operation(pool, &op).await?;
        applied += 1;
        last_seq_no = Some(seq_no);
    }

    tracing::debug!(user_id, applied, "Push batch merged");

    Ok(PushResponse {
        applied,
        last_seq_no,
    })
}
