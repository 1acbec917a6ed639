//! Database operations for the users table.

use sqlx::{PgPool, Row};

/// A stored user row.
#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    /// Next sequence number the allocator would hand out for this user
    pub next_seq_no: i64,
    #[allow(dead_code)]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            next_seq_no: row.try_get("next_seq_no")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Create a user row if it does not already exist. Idempotent; the sequence
/// counter starts at 1 and is never reset by a re-create.
pub async fn create_user(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fetch a user row by id.
pub async fn get_user(pool: &PgPool, id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT id, next_seq_no, created_at FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
