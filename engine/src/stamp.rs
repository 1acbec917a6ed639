//! Write stamps for last-write-wins conflict resolution.
//!
//! A stamp combines the client-reported modification time with the client id,
//! giving a total order over writes from all devices. The order is what makes
//! conflict resolution deterministic without any coordination.

use crate::{ClientId, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The version of a last-write-wins register.
///
/// Ordering rules:
/// 1. Higher `last_modified` wins
/// 2. If timestamps are equal, lexicographically higher `client_id` wins
///
/// Client clocks may be skewed; the client id tiebreak only has to be
/// deterministic, not fair. Equal stamps compare equal, so replaying a write
/// never dominates itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteStamp {
    /// Client wall-clock time of the write, milliseconds since epoch
    pub last_modified: Timestamp,
    /// Device/replica that produced the write
    pub client_id: ClientId,
}

impl WriteStamp {
    /// Create a stamp from a timestamp and client id.
    pub fn new(last_modified: Timestamp, client_id: impl Into<ClientId>) -> Self {
        Self {
            last_modified,
            client_id: client_id.into(),
        }
    }

    /// Strict dominance: true iff installing a write with this stamp over a
    /// row holding `other` is allowed. Equal stamps do not dominate.
    pub fn dominates(&self, other: &WriteStamp) -> bool {
        self > other
    }
}

impl Ord for WriteStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.last_modified.cmp(&other.last_modified) {
            Ordering::Equal => self.client_id.cmp(&other.client_id),
            other => other,
        }
    }
}

impl PartialOrd for WriteStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
