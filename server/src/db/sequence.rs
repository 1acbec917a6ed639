//! Per-user sequence number allocation.

use sqlx::PgPool;

/// Reservation statement. The update returns the value `next_seq_no` held
/// before the increment, so the reserved range is `[first, first + n)`.
/// Reservations for the same user serialize on the row; different users
/// touch different rows and never contend.
const RESERVE_SQL: &str =
    "UPDATE users SET next_seq_no = next_seq_no + $2 WHERE id = $1 RETURNING next_seq_no - $2";

/// Reserve a contiguous run of `n >= 1` sequence numbers for a user and
/// return the first.
///
/// Returns `None` when the user row does not exist (the update touched zero
/// rows); the caller decides how to surface that. No retry happens here.
///
/// Reservation deliberately happens before the merge rather than inside a
/// transaction with it. Sequence numbers only need to be monotonic, not
/// gapless, so a merge that later fails or loses simply burns its number.
pub async fn reserve_sequence(
    pool: &PgPool,
    user_id: &str,
    n: i64,
) -> Result<Option<i64>, sqlx::Error> {
    debug_assert!(n >= 1);

    let first: Option<(i64,)> = sqlx::query_as(RESERVE_SQL)
        .bind(user_id)
        .bind(n)
        .fetch_optional(pool)
        .await?;

    Ok(first.map(|row| row.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_is_one_atomic_statement() {
        // Increment and read-back happen in a single UPDATE .. RETURNING;
        // there is no read-modify-write window to race through.
        assert!(RESERVE_SQL.starts_with("UPDATE users SET next_seq_no = next_seq_no + $2"));
        assert!(RESERVE_SQL.ends_with("RETURNING next_seq_no - $2"));
        assert!(RESERVE_SQL.contains("WHERE id = $1"));
    }
}
