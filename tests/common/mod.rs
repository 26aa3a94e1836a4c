// Common test utilities for integration tests
// This module contains shared code for all integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use log::LevelFilter;

use chatsync::{
    models::{Contact, ConversationSummary, GroupMessage, OnlineUser, PrivateMessage, UserId},
    ChatEngine, ClientRequest, Transport,
};

/// Id of the logged-in user in every test
pub const ME: UserId = 1;

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Transport that remembers every request instead of sending it
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<ClientRequest>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests dispatched so far, clearing the record
    pub fn take(&self) -> Vec<ClientRequest> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn sent(&self) -> Vec<ClientRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn dispatch(&self, request: ClientRequest) {
        self.sent.lock().unwrap().push(request);
    }
}

/// Engine for `ME` plus a handle on what it sends
pub fn new_engine() -> (ChatEngine<RecordingTransport>, RecordingTransport) {
    setup_logging();
    let transport = RecordingTransport::new();
    (ChatEngine::new(ME, transport.clone()), transport)
}

pub fn contact(user_id: UserId, username: &str) -> Contact {
    Contact::new(user_id, username)
}

pub fn group_msg(user_id: UserId, timestamp: i64, content: &str) -> GroupMessage {
    GroupMessage {
        user_id,
        username: format!("user{}", user_id),
        content: content.to_string(),
        timestamp,
    }
}

pub fn private_msg(
    id: i64,
    sender_id: UserId,
    receiver_id: UserId,
    content: &str,
    timestamp: i64,
) -> PrivateMessage {
    PrivateMessage {
        id,
        sender_id,
        receiver_id,
        content: content.to_string(),
        timestamp,
        is_read: false,
        sender_username: None,
        receiver_username: None,
    }
}

pub fn summary(
    other_user_id: UserId,
    last_message_time: Option<i64>,
    unread_count: u32,
) -> ConversationSummary {
    ConversationSummary {
        other_user_id,
        other_username: None,
        last_message: last_message_time.map(|t| format!("last at {}", t)),
        last_message_time,
        unread_count,
    }
}

pub fn online_user(id: UserId, username: &str) -> OnlineUser {
    OnlineUser {
        id,
        username: username.to_string(),
        status: Some("ONLINE".to_string()),
        permission: None,
        is_banned: false,
    }
}
