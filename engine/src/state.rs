//! In-memory replica state for one user's dataset.
//!
//! `ReplicaState` holds the same tables the persistent store does and applies
//! operations with the same merge rules the single-statement upserts enforce:
//! last-write-wins registers, a grow-only review-log set, and the
//! counter-backed card↔deck membership. Because it is pure and deterministic,
//! the convergence behavior is directly testable here without a database.

use crate::{
    operation::{
        CardBookmarkedPayload, CardContentPayload, CardDeletedPayload, CardPayload,
        CardSuspendedPayload, ClientOperation, DeckPayload, Payload, ReviewLogDeletedPayload,
        ReviewLogPayload, UpdateDeckCardPayload,
    },
    stamp::WriteStamp,
    CardId, DeckId, ReviewLogId, SeqNo,
};
use std::collections::HashMap;
use std::hash::Hash;

/// A stored last-write-wins register row: payload plus merge metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LwwRow<P> {
    pub payload: P,
    pub stamp: WriteStamp,
    pub seq_no: SeqNo,
}

/// A stored review-log row. Inserted once, never updated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLogRow {
    pub payload: ReviewLogPayload,
    pub stamp: WriteStamp,
    pub seq_no: SeqNo,
}

/// A card↔deck membership row. `cl_count` is the authoritative value; the
/// stamp is kept for observability and takes no part in conflict resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckCardRow {
    pub cl_count: i64,
    pub stamp: WriteStamp,
    pub seq_no: SeqNo,
}

/// Read-side membership derivation: a card is in a deck iff its toggle
/// counter is even.
pub fn deck_membership(cl_count: i64) -> bool {
    cl_count % 2 == 0
}

/// One user's replica: every table the sync protocol writes, plus the
/// per-user sequence counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicaState {
    next_seq_no: SeqNo,
    cards: HashMap<CardId, LwwRow<CardPayload>>,
    card_contents: HashMap<CardId, LwwRow<CardContentPayload>>,
    card_deleted: HashMap<CardId, LwwRow<CardDeletedPayload>>,
    card_bookmarked: HashMap<CardId, LwwRow<CardBookmarkedPayload>>,
    card_suspended: HashMap<CardId, LwwRow<CardSuspendedPayload>>,
    decks: HashMap<DeckId, LwwRow<DeckPayload>>,
    review_log_deleted: HashMap<ReviewLogId, LwwRow<ReviewLogDeletedPayload>>,
    review_logs: HashMap<ReviewLogId, ReviewLogRow>,
    card_decks: HashMap<(CardId, DeckId), DeckCardRow>,
}

impl ReplicaState {
    /// Create an empty replica. Sequence numbers start at 1.
    pub fn new() -> Self {
        Self {
            next_seq_no: 1,
            ..Self::default()
        }
    }

    /// The next sequence number that would be handed out.
    pub fn next_seq_no(&self) -> SeqNo {
        self.next_seq_no
    }

    /// Reserve a contiguous run of `n` sequence numbers and return the first.
    ///
    /// The reserved range is `[first, first + n)`. Numbers are never reused;
    /// a reservation whose merge later fails simply leaves a gap.
    pub fn reserve(&mut self, n: i64) -> SeqNo {
        debug_assert!(n >= 1);
        let first = self.next_seq_no;
        self.next_seq_no += n;
        first
    }

    /// Reserve one sequence number and apply the operation under it.
    pub fn ingest(&mut self, op: &ClientOperation) -> SeqNo {
        let seq_no = self.reserve(1);
        self.apply(op, seq_no);
        seq_no
    }

    /// Apply an operation under an already-reserved sequence number.
    ///
    /// The final state for any key is independent of the order in which the
    /// operations targeting it arrive, and re-applying an operation is a
    /// no-op on the stored row.
    pub fn apply(&mut self, op: &ClientOperation, seq_no: SeqNo) {
        let stamp = op.stamp();
        match &op.operation.payload {
            Payload::Card(p) => {
                merge_lww(&mut self.cards, p.id.clone(), p.clone(), stamp, seq_no);
            }
            Payload::CardContent(p) => {
                merge_lww(
                    &mut self.card_contents,
                    p.card_id.clone(),
                    p.clone(),
                    stamp,
                    seq_no,
                );
            }
            Payload::CardDeleted(p) => {
                merge_lww(
                    &mut self.card_deleted,
                    p.card_id.clone(),
                    p.clone(),
                    stamp,
                    seq_no,
                );
            }
            Payload::CardBookmarked(p) => {
                merge_lww(
                    &mut self.card_bookmarked,
                    p.card_id.clone(),
                    p.clone(),
                    stamp,
                    seq_no,
                );
            }
            Payload::CardSuspended(p) => {
                merge_lww(
                    &mut self.card_suspended,
                    p.card_id.clone(),
                    p.clone(),
                    stamp,
                    seq_no,
                );
            }
            Payload::Deck(p) => {
                merge_lww(&mut self.decks, p.id.clone(), p.clone(), stamp, seq_no);
            }
            Payload::ReviewLogDeleted(p) => {
                merge_lww(
                    &mut self.review_log_deleted,
                    p.review_log_id.clone(),
                    p.clone(),
                    stamp,
                    seq_no,
                );
            }
            Payload::ReviewLog(p) => self.insert_review_log(p, stamp, seq_no),
            Payload::UpdateDeckCard(p) => self.merge_deck_card(p, stamp, seq_no),
        }
    }

    /// Grow-only insert: a colliding id leaves the existing row untouched.
    fn insert_review_log(&mut self, p: &ReviewLogPayload, stamp: WriteStamp, seq_no: SeqNo) {
        self.review_logs
            .entry(p.id.clone())
            .or_insert_with(|| ReviewLogRow {
                payload: p.clone(),
                stamp,
                seq_no,
            });
    }

    /// Counter-backed upsert: install iff the incoming counter is strictly
    /// greater. The stamp never decides the winner.
    fn merge_deck_card(&mut self, p: &UpdateDeckCardPayload, stamp: WriteStamp, seq_no: SeqNo) {
        let key = (p.card_id.clone(), p.deck_id.clone());
        match self.card_decks.get_mut(&key) {
            Some(row) => {
                if p.cl_count > row.cl_count {
                    row.cl_count = p.cl_count;
                    row.stamp = stamp;
                    row.seq_no = seq_no;
                }
            }
            None => {
                self.card_decks.insert(
                    key,
                    DeckCardRow {
                        cl_count: p.cl_count,
                        stamp,
                        seq_no,
                    },
                );
            }
        }
    }

    pub fn card(&self, id: &str) -> Option<&LwwRow<CardPayload>> {
        self.cards.get(id)
    }

    pub fn card_content(&self, card_id: &str) -> Option<&LwwRow<CardContentPayload>> {
        self.card_contents.get(card_id)
    }

    pub fn card_deleted(&self, card_id: &str) -> Option<&LwwRow<CardDeletedPayload>> {
        self.card_deleted.get(card_id)
    }

    pub fn card_bookmarked(&self, card_id: &str) -> Option<&LwwRow<CardBookmarkedPayload>> {
        self.card_bookmarked.get(card_id)
    }

    pub fn card_suspended(&self, card_id: &str) -> Option<&LwwRow<CardSuspendedPayload>> {
        self.card_suspended.get(card_id)
    }

    pub fn deck(&self, id: &str) -> Option<&LwwRow<DeckPayload>> {
        self.decks.get(id)
    }

    pub fn review_log(&self, id: &str) -> Option<&ReviewLogRow> {
        self.review_logs.get(id)
    }

    pub fn review_log_deleted(&self, id: &str) -> Option<&LwwRow<ReviewLogDeletedPayload>> {
        self.review_log_deleted.get(id)
    }

    pub fn deck_card(&self, card_id: &str, deck_id: &str) -> Option<&DeckCardRow> {
        self.card_decks
            .get(&(card_id.to_string(), deck_id.to_string()))
    }

    /// Whether the card is currently in the deck (no row means no).
    pub fn card_in_deck(&self, card_id: &str, deck_id: &str) -> bool {
        self.deck_card(card_id, deck_id)
            .is_some_and(|row| deck_membership(row.cl_count))
    }
}

/// Last-write-wins upsert: install unconditionally when the key is new,
/// otherwise only under strict stamp dominance. Everything on the row moves
/// together.
fn merge_lww<K, P>(
    table: &mut HashMap<K, LwwRow<P>>,
    key: K,
    payload: P,
    stamp: WriteStamp,
    seq_no: SeqNo,
) where
    K: Eq + Hash,
{
    match table.get_mut(&key) {
        Some(row) => {
            if stamp.dominates(&row.stamp) {
                row.payload = payload;
                row.stamp = stamp;
                row.seq_no = seq_no;
            }
        }
        None => {
            table.insert(
                key,
                LwwRow {
                    payload,
                    stamp,
                    seq_no,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;

    fn deck_op(client_id: &str, timestamp: i64, name: &str) -> ClientOperation {
        ClientOperation::new(
            "user-1",
            client_id,
            Operation {
                timestamp,
                payload: Payload::Deck(DeckPayload {
                    id: "deck-1".into(),
                    name: name.into(),
                    description: String::new(),
                    deleted: false,
                }),
            },
        )
    }

    fn deck_card_op(client_id: &str, timestamp: i64, cl_count: i64) -> ClientOperation {
        ClientOperation::new(
            "user-1",
            client_id,
            Operation {
                timestamp,
                payload: Payload::UpdateDeckCard(UpdateDeckCardPayload {
                    card_id: "card-1".into(),
                    deck_id: "deck-1".into(),
                    cl_count,
                }),
            },
        )
    }

    #[test]
    fn sequence_numbers_start_at_one() {
        let mut state = ReplicaState::new();
        assert_eq!(state.next_seq_no(), 1);
        assert_eq!(state.reserve(1), 1);
        assert_eq!(state.next_seq_no(), 2);
    }

    #[test]
    fn reserve_returns_first_of_run() {
        let mut state = ReplicaState::new();
        state.reserve(4);
        assert_eq!(state.reserve(3), 5);
        assert_eq!(state.next_seq_no(), 8);
    }

    #[test]
    fn lww_install_then_dominating_write() {
        let mut state = ReplicaState::new();
        state.ingest(&deck_op("a", 100, "French"));
        state.ingest(&deck_op("a", 200, "French B2"));

        let row = state.deck("deck-1").unwrap();
        assert_eq!(row.payload.name, "French B2");
        assert_eq!(row.stamp.last_modified, 200);
        assert_eq!(row.seq_no, 2);
    }

    #[test]
    fn lww_stale_write_is_ignored() {
        let mut state = ReplicaState::new();
        state.ingest(&deck_op("z", 100, "French"));
        state.ingest(&deck_op("z", 99, "stale"));

        let row = state.deck("deck-1").unwrap();
        assert_eq!(row.payload.name, "French");
        // The stale write still consumed a sequence number
        assert_eq!(row.seq_no, 1);
        assert_eq!(state.next_seq_no(), 3);
    }

    #[test]
    fn lww_timestamp_tie_broken_by_client_id() {
        let mut state = ReplicaState::new();
        state.ingest(&deck_op("b", 100, "from B"));
        state.ingest(&deck_op("a", 100, "from A"));

        // "b" > "a", so the earlier write keeps the register
        assert_eq!(state.deck("deck-1").unwrap().payload.name, "from B");
    }

    #[test]
    fn review_log_insert_is_grow_only() {
        let mut state = ReplicaState::new();
        let mut payload = ReviewLogPayload {
            id: "r1".into(),
            card_id: "card-1".into(),
            grade: 3,
            state: 1,
            due: 200,
            stability: 1.0,
            difficulty: 4.0,
            elapsed_days: 0,
            last_elapsed_days: 0,
            scheduled_days: 1,
            review: 100,
            duration: 4500,
        };
        let first = ClientOperation::new(
            "user-1",
            "a",
            Operation {
                timestamp: 100,
                payload: Payload::ReviewLog(payload.clone()),
            },
        );
        state.ingest(&first);

        // Same id with a different body and a later stamp changes nothing
        payload.grade = 1;
        let collision = ClientOperation::new(
            "user-1",
            "b",
            Operation {
                timestamp: 500,
                payload: Payload::ReviewLog(payload),
            },
        );
        state.ingest(&collision);

        let row = state.review_log("r1").unwrap();
        assert_eq!(row.payload.grade, 3);
        assert_eq!(row.seq_no, 1);
    }

    #[test]
    fn deck_card_counter_is_monotone() {
        let mut state = ReplicaState::new();
        state.ingest(&deck_card_op("a", 100, 1));
        state.ingest(&deck_card_op("a", 200, 2));
        state.ingest(&deck_card_op("a", 300, 1)); // late replay

        let row = state.deck_card("card-1", "deck-1").unwrap();
        assert_eq!(row.cl_count, 2);
        assert!(state.card_in_deck("card-1", "deck-1"));
    }

    #[test]
    fn deck_card_stamp_does_not_decide() {
        let mut state = ReplicaState::new();
        state.ingest(&deck_card_op("a", 900, 1));
        // Older wall clock, higher counter: counter wins
        state.ingest(&deck_card_op("a", 100, 2));

        let row = state.deck_card("card-1", "deck-1").unwrap();
        assert_eq!(row.cl_count, 2);
        assert_eq!(row.stamp.last_modified, 100);
    }

    #[test]
    fn membership_parity() {
        assert!(deck_membership(0));
        assert!(!deck_membership(1));
        assert!(deck_membership(2));
        assert!(!state_with_single_toggle().card_in_deck("card-1", "deck-1"));
    }

    fn state_with_single_toggle() -> ReplicaState {
        let mut state = ReplicaState::new();
        state.ingest(&deck_card_op("a", 100, 1));
        state
    }

    #[test]
    fn tables_are_independent_per_key_family() {
        let mut state = ReplicaState::new();
        let flag = ClientOperation::new(
            "user-1",
            "a",
            Operation {
                timestamp: 100,
                payload: Payload::CardDeleted(CardDeletedPayload {
                    card_id: "card-1".into(),
                    deleted: true,
                }),
            },
        );
        state.ingest(&flag);

        assert!(state.card_deleted("card-1").is_some());
        assert!(state.card("card-1").is_none());
        assert!(state.card_bookmarked("card-1").is_none());
    }
}
