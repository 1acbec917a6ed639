//! Merge primitives over the persistent tables.
//!
//! Every primitive is a single insert-with-conditional-update statement, so
//! the comparison against the stored row happens inside the statement itself.
//! No handler reads a row and then writes; there is no read-modify-write
//! window even though the storage engine offers no interactive transactions.

use super::tables::LwwTable;
use recall_engine::{ReviewLogPayload, UpdateDeckCardPayload, WriteStamp};
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// A column value bound into a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    BigInt(i64),
    Int(i32),
    Double(f64),
    Bool(bool),
    /// Nullable BIGINT column (a card that was never reviewed)
    MaybeBigInt(Option<i64>),
}

/// One write against a last-write-wins table.
#[derive(Debug, Clone)]
pub struct LwwWrite {
    /// Owning user, for tables that carry one; written on first insert only
    pub user_id: Option<String>,
    /// Values for the table's key columns, in descriptor order
    pub key: Vec<SqlValue>,
    /// Values for the table's payload columns, in descriptor order
    pub payload: Vec<SqlValue>,
    pub stamp: WriteStamp,
    pub seq_no: i64,
}

fn push_value(values: &mut Separated<'_, 'static, Postgres, &'static str>, value: &SqlValue) {
    match value {
        SqlValue::Text(v) => values.push_bind(v.clone()),
        SqlValue::BigInt(v) => values.push_bind(*v),
        SqlValue::Int(v) => values.push_bind(*v),
        SqlValue::Double(v) => values.push_bind(*v),
        SqlValue::Bool(v) => values.push_bind(*v),
        SqlValue::MaybeBigInt(v) => values.push_bind(*v),
    };
}

/// Build the upsert for one last-write-wins write.
///
/// The update arm replaces the payload and all merge metadata as one unit,
/// guarded by strict stamp dominance; an equal or older stamp leaves the row
/// untouched, which is what makes replays no-ops. The owning user column,
/// when present, is only ever written by the insert arm.
fn build_lww_upsert(table: &LwwTable, write: &LwwWrite) -> QueryBuilder<'static, Postgres> {
    debug_assert_eq!(write.key.len(), table.key_columns.len());
    debug_assert_eq!(write.payload.len(), table.payload_columns.len());
    debug_assert_eq!(write.user_id.is_some(), table.user_scoped);

    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(table.name);
    qb.push(" (");
    {
        let mut columns = qb.separated(", ");
        if table.user_scoped {
            columns.push("user_id");
        }
        for column in table.key_columns {
            columns.push(column);
        }
        for column in table.payload_columns {
            columns.push(column);
        }
        columns.push("last_modified");
        columns.push("last_modified_client");
        columns.push("seq_no");
    }
    qb.push(") VALUES (");
    {
        let mut values = qb.separated(", ");
        if let Some(user_id) = &write.user_id {
            values.push_bind(user_id.clone());
        }
        for value in &write.key {
            push_value(&mut values, value);
        }
        for value in &write.payload {
            push_value(&mut values, value);
        }
        values.push_bind(write.stamp.last_modified);
        values.push_bind(write.stamp.client_id.clone());
        values.push_bind(write.seq_no);
    }
    qb.push(") ON CONFLICT (");
    {
        let mut columns = qb.separated(", ");
        for column in table.key_columns {
            columns.push(column);
        }
    }
    qb.push(") DO UPDATE SET ");
    {
        let mut assignments = qb.separated(", ");
        for column in table.payload_columns {
            assignments.push(format!("{column} = EXCLUDED.{column}"));
        }
        assignments.push("last_modified = EXCLUDED.last_modified");
        assignments.push("last_modified_client = EXCLUDED.last_modified_client");
        assignments.push("seq_no = EXCLUDED.seq_no");
    }
    qb.push(" WHERE (EXCLUDED.last_modified, EXCLUDED.last_modified_client) > (");
    qb.push(table.name);
    qb.push(".last_modified, ");
    qb.push(table.name);
    qb.push(".last_modified_client)");

    qb
}

/// Last-write-wins upsert: install unconditionally when the key is new,
/// otherwise only under strict `(last_modified, last_modified_client)`
/// dominance.
pub async fn lww_upsert(
    pool: &PgPool,
    table: &LwwTable,
    write: LwwWrite,
) -> Result<(), sqlx::Error> {
    let mut query = build_lww_upsert(table, &write);
    query.build().execute(pool).await?;
    Ok(())
}

/// Grow-only insert for review logs: a primary-key collision leaves the
/// existing row untouched. Review logs are historical events; no field is
/// ever updated.
const INSERT_REVIEW_LOG_SQL: &str = r#"
INSERT INTO review_logs (
    id, card_id, grade, state, due, stability, difficulty,
    elapsed_days, last_elapsed_days, scheduled_days, review, duration,
    last_modified, last_modified_client, seq_no
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
ON CONFLICT (id) DO NOTHING
"#;

pub async fn insert_review_log(
    pool: &PgPool,
    payload: &ReviewLogPayload,
    stamp: &WriteStamp,
    seq_no: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_REVIEW_LOG_SQL)
        .bind(&payload.id)
        .bind(&payload.card_id)
        .bind(payload.grade)
        .bind(payload.state)
        .bind(payload.due)
        .bind(payload.stability)
        .bind(payload.difficulty)
        .bind(payload.elapsed_days)
        .bind(payload.last_elapsed_days)
        .bind(payload.scheduled_days)
        .bind(payload.review)
        .bind(payload.duration)
        .bind(stamp.last_modified)
        .bind(&stamp.client_id)
        .bind(seq_no)
        .execute(pool)
        .await?;
    Ok(())
}

/// Counter-backed upsert for card<->deck membership: install iff the incoming
/// counter is strictly greater. The write stamp is stored for observability
/// but takes no part in the guard; `max` over counters is what converges.
const UPSERT_DECK_CARD_SQL: &str = r#"
INSERT INTO card_decks (card_id, deck_id, cl_count, last_modified, last_modified_client, seq_no)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (card_id, deck_id) DO UPDATE SET
    cl_count = EXCLUDED.cl_count,
    last_modified = EXCLUDED.last_modified,
    last_modified_client = EXCLUDED.last_modified_client,
    seq_no = EXCLUDED.seq_no
WHERE EXCLUDED.cl_count > card_decks.cl_count
"#;

pub async fn upsert_deck_card(
    pool: &PgPool,
    payload: &UpdateDeckCardPayload,
    stamp: &WriteStamp,
    seq_no: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(UPSERT_DECK_CARD_SQL)
        .bind(&payload.card_id)
        .bind(&payload.deck_id)
        .bind(payload.cl_count)
        .bind(stamp.last_modified)
        .bind(&stamp.client_id)
        .bind(seq_no)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tables;

    fn flag_write() -> LwwWrite {
        LwwWrite {
            user_id: None,
            key: vec![SqlValue::Text("card-1".into())],
            payload: vec![SqlValue::Bool(true)],
            stamp: WriteStamp::new(100, "device-a"),
            seq_no: 7,
        }
    }

    fn card_write() -> LwwWrite {
        LwwWrite {
            user_id: Some("user-1".into()),
            key: vec![SqlValue::Text("card-1".into())],
            payload: vec![
                SqlValue::BigInt(0),
                SqlValue::Double(0.0),
                SqlValue::Double(0.0),
                SqlValue::BigInt(0),
                SqlValue::BigInt(0),
                SqlValue::BigInt(0),
                SqlValue::BigInt(0),
                SqlValue::Int(0),
                SqlValue::MaybeBigInt(None),
            ],
            stamp: WriteStamp::new(100, "device-a"),
            seq_no: 1,
        }
    }

    #[test]
    fn lww_upsert_guards_on_strict_stamp_dominance() {
        let query = build_lww_upsert(&tables::CARD_DELETED, &flag_write());
        let sql = query.sql();

        assert!(sql.starts_with("INSERT INTO card_deleted (card_id, deleted, last_modified"));
        assert!(sql.contains("ON CONFLICT (card_id) DO UPDATE SET"));
        assert!(sql.contains("deleted = EXCLUDED.deleted"));
        assert!(sql.contains("seq_no = EXCLUDED.seq_no"));
        assert!(sql.ends_with(
            "WHERE (EXCLUDED.last_modified, EXCLUDED.last_modified_client) \
             > (card_deleted.last_modified, card_deleted.last_modified_client)"
        ));
    }

    #[test]
    fn user_scoped_tables_insert_owner_but_never_update_it() {
        let query = build_lww_upsert(&tables::CARDS, &card_write());
        let sql = query.sql();

        assert!(sql.starts_with("INSERT INTO cards (user_id, id, due"));
        let update_arm = sql.split("DO UPDATE SET").nth(1).unwrap();
        assert!(!update_arm.contains("user_id"));
    }

    #[test]
    fn lww_update_replaces_every_payload_column() {
        let query = build_lww_upsert(&tables::CARDS, &card_write());
        let sql = query.sql();
        for column in tables::CARDS.payload_columns {
            assert!(
                sql.contains(&format!("{column} = EXCLUDED.{column}")),
                "missing assignment for {column}"
            );
        }
    }

    #[test]
    fn review_log_insert_never_updates() {
        assert!(INSERT_REVIEW_LOG_SQL.contains("ON CONFLICT (id) DO NOTHING"));
        assert!(!INSERT_REVIEW_LOG_SQL.contains("DO UPDATE"));
    }

    #[test]
    fn deck_card_guard_is_strict_and_ignores_the_stamp() {
        assert!(UPSERT_DECK_CARD_SQL.contains("WHERE EXCLUDED.cl_count > card_decks.cl_count"));
        // The stamp columns are written but never compared
        assert!(!UPSERT_DECK_CARD_SQL.contains("EXCLUDED.last_modified >"));
        assert!(!UPSERT_DECK_CARD_SQL.contains("(EXCLUDED.last_modified"));
    }
}
