// Re-export needed modules for testing
pub mod config;
pub mod engine;
pub mod models;
pub mod protocol; // Wire frames in and out
pub mod replay;
pub mod transport;

// Re-export main types for convenience
pub use engine::{ChatEngine, EngineSnapshot, UserAction};
pub use models::*;
pub use protocol::{ClientRequest, ServerEvent};
pub use transport::{ChannelTransport, Transport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_display_name() {
        let plain = Contact::new(1, "ann");
        assert_eq!(plain.display_name(), "ann");

        let renamed = Contact {
            contact_name: Some("Annie".to_string()),
            ..Contact::new(1, "ann")
        };
        assert_eq!(renamed.display_name(), "Annie");

        // An empty override falls back to the username
        let blank = Contact {
            contact_name: Some(String::new()),
            ..Contact::new(1, "ann")
        };
        assert_eq!(blank.display_name(), "ann");
    }

    #[test]
    fn test_private_message_participants() {
        let msg = PrivateMessage {
            id: 1,
            sender_id: 10,
            receiver_id: 20,
            content: "Hello, world!".to_string(),
            timestamp: 1650000000,
            is_read: false,
            sender_username: None,
            receiver_username: None,
        };

        assert_eq!(msg.counterpart(10), 20);
        assert_eq!(msg.counterpart(20), 10);
        assert!(msg.involves(10));
        assert!(msg.involves(20));
        assert!(!msg.involves(30));
    }

    #[test]
    fn test_timestamp_formats() {
        let numeric: GroupMessage = serde_json::from_str(
            r#"{"userId":1,"username":"ann","content":"hi","timestamp":100}"#,
        )
        .unwrap();
        assert_eq!(numeric.timestamp, 100);

        let server: GroupMessage = serde_json::from_str(
            r#"{"userId":1,"username":"ann","content":"hi","timestamp":"1970-01-01T00:00:01"}"#,
        )
        .unwrap();
        assert_eq!(server.timestamp, 1000);

        let fractional: GroupMessage = serde_json::from_str(
            r#"{"userId":1,"username":"ann","content":"hi","timestamp":"1970-01-01T00:00:01.5"}"#,
        )
        .unwrap();
        assert_eq!(fractional.timestamp, 1500);

        let rfc: GroupMessage = serde_json::from_str(
            r#"{"userId":1,"username":"ann","content":"hi","timestamp":"1970-01-01T00:00:02+00:00"}"#,
        )
        .unwrap();
        assert_eq!(rfc.timestamp, 2000);

        let bad = serde_json::from_str::<GroupMessage>(
            r#"{"userId":1,"username":"ann","content":"hi","timestamp":"yesterday"}"#,
        );
        assert!(bad.is_err());

        let missing = serde_json::from_str::<GroupMessage>(
            r#"{"userId":1,"username":"ann","content":"hi"}"#,
        );
        assert!(missing.is_err());
    }

    #[test]
    fn test_summary_optional_fields() {
        let summary: ConversationSummary =
            serde_json::from_str(r#"{"otherUserId":3,"unreadCount":2}"#).unwrap();
        assert_eq!(summary.last_message, None);
        assert_eq!(summary.last_message_time, None);
        assert_eq!(summary.unread_count, 2);

        let summary: ConversationSummary = serde_json::from_str(
            r#"{"otherUserId":3,"lastMessage":"yo","lastMessageTime":"1970-01-01T00:01:00","unreadCount":0}"#,
        )
        .unwrap();
        assert_eq!(summary.last_message_time, Some(60_000));
    }
}
