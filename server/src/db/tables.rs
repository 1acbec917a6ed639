//! The table registry for last-write-wins merges.
//!
//! Each register table is described once: its name, key columns, payload
//! columns, and whether rows carry an owning user. The merge statement is
//! generated from the descriptor, so the seven register tables share a
//! single primitive instead of seven hand-written upserts. The bind-value
//! builders live next to the column lists they must stay in step with.

use super::merge::SqlValue;
use recall_engine::{
    CardBookmarkedPayload, CardContentPayload, CardDeletedPayload, CardPayload,
    CardSuspendedPayload, DeckPayload, ReviewLogDeletedPayload,
};

/// A last-write-wins table the merge primitive can operate on.
#[derive(Debug)]
pub struct LwwTable {
    pub name: &'static str,
    pub key_columns: &'static [&'static str],
    pub payload_columns: &'static [&'static str],
    /// Whether rows carry an owning `user_id`, set on first insert and never
    /// updated afterwards
    pub user_scoped: bool,
}

pub const CARDS: LwwTable = LwwTable {
    name: "cards",
    key_columns: &["id"],
    payload_columns: &[
        "due",
        "stability",
        "difficulty",
        "elapsed_days",
        "scheduled_days",
        "reps",
        "lapses",
        "state",
        "last_review",
    ],
    user_scoped: true,
};

/// Bind values for [`CARDS`], in column order.
pub fn card_values(p: &CardPayload) -> Vec<SqlValue> {
    vec![
        SqlValue::BigInt(p.due),
        SqlValue::Double(p.stability),
        SqlValue::Double(p.difficulty),
        SqlValue::BigInt(p.elapsed_days),
        SqlValue::BigInt(p.scheduled_days),
        SqlValue::BigInt(p.reps),
        SqlValue::BigInt(p.lapses),
        SqlValue::Int(p.state),
        SqlValue::MaybeBigInt(p.last_review),
    ]
}

pub const CARD_CONTENTS: LwwTable = LwwTable {
    name: "card_contents",
    key_columns: &["card_id"],
    payload_columns: &["front", "back"],
    user_scoped: false,
};

/// Bind values for [`CARD_CONTENTS`], in column order.
pub fn card_content_values(p: &CardContentPayload) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(p.front.clone()),
        SqlValue::Text(p.back.clone()),
    ]
}

pub const CARD_DELETED: LwwTable = LwwTable {
    name: "card_deleted",
    key_columns: &["card_id"],
    payload_columns: &["deleted"],
    user_scoped: false,
};

pub fn card_deleted_values(p: &CardDeletedPayload) -> Vec<SqlValue> {
    vec![SqlValue::Bool(p.deleted)]
}

pub const CARD_BOOKMARKED: LwwTable = LwwTable {
    name: "card_bookmarked",
    key_columns: &["card_id"],
    payload_columns: &["bookmarked"],
    user_scoped: false,
};

pub fn card_bookmarked_values(p: &CardBookmarkedPayload) -> Vec<SqlValue> {
    vec![SqlValue::Bool(p.bookmarked)]
}

pub const CARD_SUSPENDED: LwwTable = LwwTable {
    name: "card_suspended",
    key_columns: &["card_id"],
    payload_columns: &["suspended"],
    user_scoped: false,
};

pub fn card_suspended_values(p: &CardSuspendedPayload) -> Vec<SqlValue> {
    vec![SqlValue::Bool(p.suspended)]
}

pub const DECKS: LwwTable = LwwTable {
    name: "decks",
    key_columns: &["id"],
    payload_columns: &["name", "description", "deleted"],
    user_scoped: true,
};

/// Bind values for [`DECKS`], in column order.
pub fn deck_values(p: &DeckPayload) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(p.name.clone()),
        SqlValue::Text(p.description.clone()),
        SqlValue::Bool(p.deleted),
    ]
}

pub const REVIEW_LOG_DELETED: LwwTable = LwwTable {
    name: "review_log_deleted",
    key_columns: &["review_log_id"],
    payload_columns: &["deleted"],
    user_scoped: false,
};

pub fn review_log_deleted_values(p: &ReviewLogDeletedPayload) -> Vec<SqlValue> {
    vec![SqlValue::Bool(p.deleted)]
}
