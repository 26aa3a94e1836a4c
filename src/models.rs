use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned user identifier.
pub type UserId = i64;

/// A message broadcast to the group channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    pub user_id: UserId,
    pub username: String,
    pub content: String,
    #[serde(deserialize_with = "timestamp::required")]
    pub timestamp: i64, // milliseconds since the Unix epoch
}

/// A one-to-one message between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessage {
    pub id: i64,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(deserialize_with = "timestamp::required")]
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_username: Option<String>,
}

impl PrivateMessage {
    /// The participant of this message that is not `me`.
    pub fn counterpart(&self, me: UserId) -> UserId {
        if self.sender_id == me {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// Whether this message belongs to the conversation with `other`.
    pub fn involves(&self, other: UserId) -> bool {
        self.sender_id == other || self.receiver_id == other
    }
}

/// An entry of the current user's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub user_id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Contact {
    pub fn new(user_id: UserId, username: &str) -> Self {
        Contact {
            user_id,
            username: username.to_string(),
            contact_name: None,
            status: None,
        }
    }

    /// The name shown in the sidebar: the roster override if set, else the username.
    pub fn display_name(&self) -> &str {
        match self.contact_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Server-derived aggregate of one private conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub other_user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_username: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub last_message_time: Option<i64>,
    #[serde(default)]
    pub unread_count: u32,
}

/// A user present on the server, as listed next to the group channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default)]
    pub is_banned: bool,
}

/// Top-level view the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Group,
    Private,
}

/// One row of the sidebar: a roster contact left-joined with its conversation summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    #[serde(flatten)]
    pub contact: Contact,
    pub last_message: Option<String>,
    pub last_message_time: Option<i64>,
    pub unread_count: u32,
}

/// Wire timestamps arrive either as epoch milliseconds or as the server's
/// `yyyy-MM-ddTHH:mm:ss` local format (interpreted as UTC).
pub mod timestamp {
    use super::*;

    const SERVER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    /// Parse the textual form into epoch milliseconds.
    pub fn parse(text: &str) -> Option<i64> {
        if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(text) {
            return Some(parsed.timestamp_millis());
        }
        let naive = NaiveDateTime::parse_from_str(text, SERVER_FORMAT).ok()?;
        Some(Utc.from_utc_datetime(&naive).timestamp_millis())
    }

    fn convert<E: serde::de::Error>(raw: Raw) -> Result<i64, E> {
        match raw {
            Raw::Millis(ms) => Ok(ms),
            Raw::Text(text) => {
                parse(&text).ok_or_else(|| E::custom(format!("invalid timestamp: {}", text)))
            }
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        convert(Raw::deserialize(deserializer)?)
    }

    pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            Some(raw) => convert(raw).map(Some),
            None => Ok(None),
        }
    }
}
