//! # Recall Engine
//!
//! Deterministic merge semantics for a multi-device flashcard sync service.
//!
//! Many clients mutate a shared per-user dataset offline and later stream
//! their mutations to the server as operations. This crate defines the
//! operation wire types and the merge rules that make every replica converge
//! to the same state regardless of arrival order: each table behaves as a
//! conflict-free replicated data type.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of HTTP or SQL
//! - **Deterministic**: the final state for a key is a pure function of the
//!   set of operations applied, not their order
//! - **Testable**: [`ReplicaState`] executes the merge rules in memory, so
//!   convergence properties are checked without a database
//!
//! ## Core Concepts
//!
//! ### Operations
//!
//! An [`Operation`] is a tagged record `{type, timestamp, payload}` with a
//! closed set of nine kinds. On the server it is enriched into a
//! [`ClientOperation`] carrying the owning user and originating device.
//!
//! ### Merge rules
//!
//! - Last-write-wins registers (cards, card contents, flags, decks, review-log
//!   deletion markers): a write is installed iff its [`WriteStamp`], the pair
//!   `(last_modified, client_id)` ordered lexicographically, strictly
//!   dominates the stored one.
//! - Grow-only set (review logs): rows are inserted once and never touched
//!   again; id collisions are ignored.
//! - Counter-backed set (card↔deck membership): the monotone counter
//!   `cl_count` merges by max; membership is the parity of the counter,
//!   derived on the read side.
//!
//! ### Sequence numbers
//!
//! Every accepted write is stamped with a per-user monotone sequence number.
//! Sequence numbers never participate in conflict resolution; they exist so a
//! pull path can stream deltas. Gaps are permitted and expected.
//!
//! ## Quick Start
//!
//! ```rust
//! use recall_engine::{
//!     CardContentPayload, ClientOperation, Operation, Payload, ReplicaState,
//! };
//!
//! let op = ClientOperation::new(
//!     "user-1",
//!     "device-a",
//!     Operation {
//!         timestamp: 1_706_745_600_000,
//!         payload: Payload::CardContent(CardContentPayload {
//!             card_id: "card-1".into(),
//!             front: "Bonjour".into(),
//!             back: "Hello".into(),
//!         }),
//!     },
//! );
//!
//! let mut state = ReplicaState::new();
//! let seq_no = state.ingest(&op);
//! assert_eq!(seq_no, 1);
//! assert_eq!(state.card_content("card-1").unwrap().payload.front, "Bonjour");
//! ```

pub mod batch;
pub mod error;
pub mod operation;
pub mod stamp;
pub mod state;

// Re-export main types at crate root
pub use batch::{validate_batch, MAX_OPS};
pub use error::Error;
pub use operation::{
    CardBookmarkedPayload, CardContentPayload, CardDeletedPayload, CardPayload,
    CardSuspendedPayload, ClientOperation, DeckPayload, Operation, Payload,
    ReviewLogDeletedPayload, ReviewLogPayload, UpdateDeckCardPayload,
};
pub use stamp::WriteStamp;
pub use state::{deck_membership, DeckCardRow, LwwRow, ReplicaState, ReviewLogRow};

/// Type aliases for clarity
pub type CardId = String;
pub type DeckId = String;
pub type ReviewLogId = String;
pub type UserId = String;
pub type ClientId = String;
pub type Timestamp = i64;
pub type SeqNo = i64;
