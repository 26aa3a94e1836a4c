// Deduplication keys for inbound messages
//
// Two distinct group messages from the same user with identical content and
// timestamp share a key and are treated as one delivery.

use std::fmt;

use crate::models::{GroupMessage, PrivateMessage, UserId};

/// Identity of a group message: `(userId, timestamp, content)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    user_id: UserId,
    timestamp: i64,
    content: String,
}

/// Identity of a private message: `(id, senderId, receiverId)`.
///
/// `id` alone is not trusted to be unique across servers, so the
/// participants are part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrivateKey {
    id: i64,
    sender_id: UserId,
    receiver_id: UserId,
}

pub fn group_key(msg: &GroupMessage) -> GroupKey {
    GroupKey {
        user_id: msg.user_id,
        timestamp: msg.timestamp,
        content: msg.content.clone(),
    }
}

pub fn private_key(msg: &PrivateMessage) -> PrivateKey {
    PrivateKey {
        id: msg.id,
        sender_id: msg.sender_id,
        receiver_id: msg.receiver_id,
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.user_id, self.timestamp, self.content)
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.id, self.sender_id, self.receiver_id)
    }
}
