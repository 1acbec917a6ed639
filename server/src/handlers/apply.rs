//! Operation dispatch: one sequence number, one handler, one merge statement.

use crate::db::{self, tables, LwwWrite, SqlValue};
use crate::error::{AppError, Result};
use recall_engine::{ClientOperation, Payload};
use sqlx::PgPool;

/// Apply one enriched operation and return the sequence number it consumed.
///
/// The number is reserved before the merge runs. If the merge then fails, or
/// loses to the stored row, the number is burned; consumers only rely on
/// monotonicity, so gaps are fine.
///
/// The match is exhaustive over the closed operation set. An unknown wire
/// discriminator never reaches this point; it is rejected at parse time.
pub async fn apply_operation(pool: &PgPool, op: &ClientOperation) -> Result<i64> {
    let seq_no = db::reserve_sequence(pool, &op.user_id, 1)
        .await?
        .ok_or_else(|| AppError::SequenceAllocation {
            user_id: op.user_id.clone(),
        })?;

    let stamp = op.stamp();
    match &op.operation.payload {
        Payload::Card(p) => {
            db::lww_upsert(
                pool,
                &tables::CARDS,
                LwwWrite {
                    user_id: Some(op.user_id.clone()),
                    key: vec![SqlValue::Text(p.id.clone())],
                    payload: tables::card_values(p),
                    stamp,
                    seq_no,
                },
            )
            .await?
        }
        Payload::CardContent(p) => {
            db::lww_upsert(
                pool,
                &tables::CARD_CONTENTS,
                LwwWrite {
                    user_id: None,
                    key: vec![SqlValue::Text(p.card_id.clone())],
                    payload: tables::card_content_values(p),
                    stamp,
                    seq_no,
                },
            )
            .await?
        }
        Payload::CardDeleted(p) => {
            db::lww_upsert(
                pool,
                &tables::CARD_DELETED,
                LwwWrite {
                    user_id: None,
                    key: vec![SqlValue::Text(p.card_id.clone())],
                    payload: tables::card_deleted_values(p),
                    stamp,
                    seq_no,
                },
            )
            .await?
        }
        Payload::CardBookmarked(p) => {
            db::lww_upsert(
                pool,
                &tables::CARD_BOOKMARKED,
                LwwWrite {
                    user_id: None,
                    key: vec![SqlValue::Text(p.card_id.clone())],
                    payload: tables::card_bookmarked_values(p),
                    stamp,
                    seq_no,
                },
            )
            .await?
        }
        Payload::CardSuspended(p) => {
            db::lww_upsert(
                pool,
                &tables::CARD_SUSPENDED,
                LwwWrite {
                    user_id: None,
                    key: vec![SqlValue::Text(p.card_id.clone())],
                    payload: tables::card_suspended_values(p),
                    stamp,
                    seq_no,
                },
            )
            .await?
        }
        Payload::Deck(p) => {
            db::lww_upsert(
                pool,
                &tables::DECKS,
                LwwWrite {
                    user_id: Some(op.user_id.clone()),
                    key: vec![SqlValue::Text(p.id.clone())],
                    payload: tables::deck_values(p),
                    stamp,
                    seq_no,
                },
            )
            .await?
        }
        Payload::ReviewLogDeleted(p) => {
            db::lww_upsert(
                pool,
                &tables::REVIEW_LOG_DELETED,
                LwwWrite {
                    user_id: None,
                    key: vec![SqlValue::Text(p.review_log_id.clone())],
                    payload: tables::review_log_deleted_values(p),
                    stamp,
                    seq_no,
                },
            )
            .await?
        }
        Payload::ReviewLog(p) => db::insert_review_log(pool, p, &stamp, seq_no).await?,
        Payload::UpdateDeckCard(p) => db::upsert_deck_card(pool, p, &stamp, seq_no).await?,
    }

    tracing::debug!(
        user_id = %op.user_id,
        kind = op.operation.kind(),
        seq_no,
        "Applied operation"
    );

    Ok(seq_no)
}
