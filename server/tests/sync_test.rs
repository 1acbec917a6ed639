//! Protocol-level tests for the sync ingestion surface.
//!
//! These cover the wire contract and the batch gate; they do not require a
//! running PostgreSQL database.

use recall_engine::{validate_batch, ClientOperation, Error, Operation, MAX_OPS};
use serde_json::json;

/// Test helper to build a card operation in wire form.
fn card_value(id: &str, timestamp: i64) -> serde_json::Value {
    json!({
        "type": "card",
        "timestamp": timestamp,
        "payload": {
            "id": id,
            "due": timestamp + 86_400_000,
            "stability": 2.5,
            "difficulty": 5.0,
            "elapsed_days": 1,
            "scheduled_days": 1,
            "reps": 3,
            "lapses": 0,
            "state": 2,
            "last_review": timestamp
        }
    })
}

#[cfg(test)]
mod protocol_tests {
    use super::*;

    #[test]
    fn test_push_request_deserialization() {
        let json = r#"{
            "clientId": "device-123",
            "operations": [
                {
                    "type": "cardContent",
                    "timestamp": 1706745600000,
                    "payload": {"cardId": "card-1", "front": "Bonjour", "back": "Hello"}
                },
                {
                    "type": "updateDeckCard",
                    "timestamp": 1706745601000,
                    "payload": {"cardId": "card-1", "deckId": "deck-1", "clCount": 2}
                }
            ]
        }"#;

        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PushRequest {
            client_id: String,
            operations: Vec<serde_json::Value>,
        }

        let request: PushRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.client_id, "device-123");
        assert_eq!(request.operations.len(), 2);

        // Each raw value parses into a typed operation
        let ops: Vec<Operation> = request
            .operations
            .into_iter()
            .map(|value| Operation::from_value(value).unwrap())
            .collect();
        assert_eq!(ops[0].kind(), "cardContent");
        assert_eq!(ops[1].kind(), "updateDeckCard");
    }

    #[test]
    fn test_every_wire_discriminator_parses() {
        let values = vec![
            card_value("card-1", 100),
            json!({
                "type": "reviewLog",
                "timestamp": 100,
                "payload": {
                    "id": "r1", "cardId": "card-1", "grade": 3, "state": 1,
                    "due": 200, "stability": 1.0, "difficulty": 4.0,
                    "elapsed_days": 0, "last_elapsed_days": 0,
                    "scheduled_days": 1, "review": 100, "duration": 4000
                }
            }),
            json!({
                "type": "reviewLogDeleted",
                "timestamp": 100,
                "payload": {"reviewLogId": "r1", "deleted": true}
            }),
            json!({
                "type": "cardContent",
                "timestamp": 100,
                "payload": {"cardId": "card-1", "front": "f", "back": "b"}
            }),
            json!({
                "type": "cardDeleted",
                "timestamp": 100,
                "payload": {"cardId": "card-1", "deleted": false}
            }),
            json!({
                "type": "cardBookmarked",
                "timestamp": 100,
                "payload": {"cardId": "card-1", "bookmarked": true}
            }),
            json!({
                "type": "cardSuspended",
                "timestamp": 100,
                "payload": {"cardId": "card-1", "suspended": true}
            }),
            json!({
                "type": "deck",
                "timestamp": 100,
                "payload": {"id": "d1", "name": "French", "description": "", "deleted": false}
            }),
            json!({
                "type": "updateDeckCard",
                "timestamp": 100,
                "payload": {"cardId": "card-1", "deckId": "d1", "clCount": 1}
            }),
        ];

        let expected_kinds = [
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

        for (value, expected) in values.into_iter().zip(expected_kinds) {
            let op = Operation::from_value(value).unwrap();
            assert_eq!(op.kind(), expected);
        }
    }

    #[test]
    fn test_unknown_discriminator_is_version_mismatch() {
        let value = json!({
            "type": "cardArchived",
            "timestamp": 100,
            "payload": {"cardId": "card-1"}
        });

        let err = Operation::from_value(value).unwrap_err();
        assert_eq!(err, Error::UnknownOperationType("cardArchived".into()));
        assert_eq!(err.to_string(), "unknown operation type: cardArchived");
    }

    #[test]
    fn test_batch_gate_at_the_cap() {
        let ops: Vec<serde_json::Value> = (0..MAX_OPS as i64)
            .map(|i| card_value("card-1", i))
            .collect();
        assert!(validate_batch(&ops).is_ok());
    }

    #[test]
    fn test_batch_gate_over_the_cap() {
        let ops: Vec<serde_json::Value> = (0..(MAX_OPS as i64 + 1))
            .map(|i| card_value("card-1", i))
            .collect();

        let err = validate_batch(&ops).unwrap_err();
        assert_eq!(err.to_string(), "Too many operations");
    }

    #[test]
    fn test_enrichment_sets_the_write_stamp() {
        let op = Operation::from_value(card_value("card-1", 1_706_745_600_000)).unwrap();
        let enriched = ClientOperation::new("user-1", "device-a", op);

        let stamp = enriched.stamp();
        assert_eq!(stamp.last_modified, 1_706_745_600_000);
        assert_eq!(stamp.client_id, "device-a");
        assert_eq!(enriched.user_id, "user-1");
    }

    #[test]
    fn test_push_response_serialization() {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct PushResponse {
            applied: usize,
            last_seq_no: Option<i64>,
        }

        let response = PushResponse {
            applied: 2,
            last_seq_no: Some(42),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"applied\":2"));
        assert!(json.contains("\"lastSeqNo\":42"));
    }
}
