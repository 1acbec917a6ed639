//! Operation types for expressing client mutations.
//!
//! Clients mutate their local replica offline and stream the mutations to the
//! server as operations. Each operation targets exactly one logical entity;
//! the discriminator set is closed, so adding a kind is a schema plus
//! dispatcher change.

use crate::{error::Result, stamp::WriteStamp, ClientId, Error, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Scheduler state of a card, stored verbatim.
///
/// All fields are owned by the client-side scheduler; the server never
/// interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayload {
    pub id: String,
    pub due: Timestamp,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: i64,
    pub scheduled_days: i64,
    pub reps: i64,
    pub lapses: i64,
    pub state: i32,
    pub last_review: Option<Timestamp>,
}

/// Front/back text of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardContentPayload {
    pub card_id: String,
    pub front: String,
    pub back: String,
}

/// Logical deletion marker for a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDeletedPayload {
    pub card_id: String,
    pub deleted: bool,
}

/// Bookmark flag for a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBookmarkedPayload {
    pub card_id: String,
    pub bookmarked: bool,
}

/// Suspension flag for a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSuspendedPayload {
    pub card_id: String,
    pub suspended: bool,
}

/// A deck, with its own logical deletion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckPayload {
    pub id: String,
    pub name: String,
    pub description: String,
    pub deleted: bool,
}

/// One historical review event. Review logs are append-only; the id is
/// client-assigned and globally unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLogPayload {
    pub id: String,
    #[serde(rename = "cardId")]
    pub card_id: String,
    pub grade: i32,
    pub state: i32,
    pub due: Timestamp,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: i64,
    pub last_elapsed_days: i64,
    pub scheduled_days: i64,
    pub review: Timestamp,
    pub duration: i64,
}

/// Logical deletion marker for a review log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogDeletedPayload {
    pub review_log_id: String,
    pub deleted: bool,
}

/// Card↔deck membership toggle. Membership is encoded by the parity of the
/// monotone counter `cl_count`; a client toggles by writing a strictly
/// greater counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckCardPayload {
    pub card_id: String,
    pub deck_id: String,
    pub cl_count: i64,
}

/// The kind-specific body of an operation, tagged by the wire discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Payload {
    Card(CardPayload),
    ReviewLog(ReviewLogPayload),
    ReviewLogDeleted(ReviewLogDeletedPayload),
    CardContent(CardContentPayload),
    CardDeleted(CardDeletedPayload),
    CardBookmarked(CardBookmarkedPayload),
    CardSuspended(CardSuspendedPayload),
    Deck(DeckPayload),
    UpdateDeckCard(UpdateDeckCardPayload),
}

impl Payload {
    /// Every wire discriminator this build understands.
    pub const KINDS: [&'static str; 9] = [
        "card",
        "reviewLog",
        "reviewLogDeleted",
        "cardContent",
        "cardDeleted",
        "cardBookmarked",
        "cardSuspended",
        "deck",
        "updateDeckCard",
    ];

    /// The wire discriminator of this payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Card(_) => "card",
            Payload::ReviewLog(_) => "reviewLog",
            Payload::ReviewLogDeleted(_) => "reviewLogDeleted",
            Payload::CardContent(_) => "cardContent",
            Payload::CardDeleted(_) => "cardDeleted",
            Payload::CardBookmarked(_) => "cardBookmarked",
            Payload::CardSuspended(_) => "cardSuspended",
            Payload::Deck(_) => "deck",
            Payload::UpdateDeckCard(_) => "updateDeckCard",
        }
    }
}

/// A client-authored mutation as it arrives on the wire:
/// `{type, timestamp, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Client wall-clock time of the mutation, milliseconds since epoch.
    /// May be skewed between clients.
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Operation {
    /// The wire discriminator of this operation.
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }

    /// Parse one operation from its wire JSON.
    ///
    /// A discriminator outside the closed set is a client/server version
    /// mismatch and reports as [`Error::UnknownOperationType`]; any other
    /// shape problem reports as [`Error::InvalidPayload`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if let Some(kind) = value.get("type").and_then(serde_json::Value::as_str) {
            if !Payload::KINDS.contains(&kind) {
                return Err(Error::UnknownOperationType(kind.to_string()));
            }
        }
        serde_json::from_value(value).map_err(|err| Error::InvalidPayload(err.to_string()))
    }
}

/// An operation enriched with the identity the server trusts it under: the
/// owning user and the originating device. All writes are scoped to
/// `user_id`; `client_id` participates in tie-breaking only.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOperation {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub operation: Operation,
}

impl ClientOperation {
    /// Attribute an operation to a user and client.
    pub fn new(
        user_id: impl Into<UserId>,
        client_id: impl Into<ClientId>,
        operation: Operation,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            client_id: client_id.into(),
            operation,
        }
    }

    /// The last-write-wins stamp this operation writes with.
    pub fn stamp(&self) -> WriteStamp {
        WriteStamp::new(self.operation.timestamp, self.client_id.clone())
    }
}
