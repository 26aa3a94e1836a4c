// Wire protocol for the chat server
// Every frame is a JSON object `{ "type": <kind>, "payload": <value> }`

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{
    Contact, ConversationSummary, GroupMessage, OnlineUser, PrivateMessage, UserId,
};

// Frame kinds
pub mod kind {
    // Server to client
    pub const MESSAGE_BROADCAST: &str = "MESSAGE_BROADCAST";
    pub const PRIVATE_MESSAGE: &str = "PRIVATE_MESSAGE";
    pub const CONVERSATION_HISTORY: &str = "CONVERSATION_HISTORY";
    pub const CONVERSATIONS_LIST: &str = "CONVERSATIONS_LIST";
    pub const CONTACTS_LIST: &str = "CONTACTS_LIST";
    pub const CONTACT_ADDED: &str = "CONTACT_ADDED";
    pub const USER_LIST_UPDATE: &str = "USER_LIST_UPDATE";
    pub const SUCCESS: &str = "SUCCESS";
    pub const ERROR: &str = "ERROR";

    // Client to server
    pub const LOGIN_REQUEST: &str = "LOGIN_REQUEST";
    pub const LOGOUT_REQUEST: &str = "LOGOUT_REQUEST";
    pub const MESSAGE_SEND: &str = "MESSAGE_SEND";
    pub const STATUS_CHANGE_REQUEST: &str = "STATUS_CHANGE_REQUEST";
    pub const BAN_REQUEST: &str = "BAN_REQUEST";
    pub const PRIVATE_MESSAGE_SEND: &str = "PRIVATE_MESSAGE_SEND";
    pub const GET_CONVERSATION: &str = "GET_CONVERSATION";
    pub const GET_CONVERSATIONS: &str = "GET_CONVERSATIONS";
    pub const MARK_AS_READ: &str = "MARK_AS_READ";
    pub const ADD_CONTACT: &str = "ADD_CONTACT";
    pub const REMOVE_CONTACT: &str = "REMOVE_CONTACT";
    pub const GET_CONTACTS: &str = "GET_CONTACTS";
}

/// Errors raised while decoding or encoding frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not a JSON object
    #[error("Invalid frame: {0}")]
    InvalidFrame(#[source] serde_json::Error),

    /// The frame has no `type` field
    #[error("Frame has no type")]
    MissingType,

    /// The payload does not match its declared kind
    #[error("Malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization of an outbound frame failed
    #[error("Failed to encode {0} frame")]
    Encode(&'static str),
}

/// A decoded inbound server event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    GroupMessageReceived(GroupMessage),
    PrivateMessageReceived(PrivateMessage),
    ConversationHistoryLoaded {
        other_user_id: UserId,
        messages: Vec<PrivateMessage>,
    },
    ConversationsListUpdated(Vec<ConversationSummary>),
    ContactsListUpdated(Vec<Contact>),
    ContactAdded(Contact),
    UserListUpdated(Vec<OnlineUser>),
    Success(String),
    ServerError(String),
}

impl ServerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::GroupMessageReceived(_) => kind::MESSAGE_BROADCAST,
            ServerEvent::PrivateMessageReceived(_) => kind::PRIVATE_MESSAGE,
            ServerEvent::ConversationHistoryLoaded { .. } => kind::CONVERSATION_HISTORY,
            ServerEvent::ConversationsListUpdated(_) => kind::CONVERSATIONS_LIST,
            ServerEvent::ContactsListUpdated(_) => kind::CONTACTS_LIST,
            ServerEvent::ContactAdded(_) => kind::CONTACT_ADDED,
            ServerEvent::UserListUpdated(_) => kind::USER_LIST_UPDATE,
            ServerEvent::Success(_) => kind::SUCCESS,
            ServerEvent::ServerError(_) => kind::ERROR,
        }
    }
}

/// An outbound request to the server. Fire-and-forget: any answer arrives
/// later as a `ServerEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    /// `password` holds the hex SHA-256 digest, never the plain text
    Login { username: String, password: String },
    Logout,
    SendGroupMessage(String),
    ChangeStatus(String),
    Ban(UserId),
    SendPrivateMessage { receiver_id: UserId, content: String },
    GetConversation(UserId),
    GetConversations,
    MarkAsRead(UserId),
    AddContact { user_id: UserId, contact_name: Option<String> },
    RemoveContact(UserId),
    GetContacts,
}

impl ClientRequest {
    /// Build a login request, digesting the password before it is stored.
    pub fn login(username: &str, password: &str) -> Self {
        ClientRequest::Login {
            username: username.to_string(),
            password: hash_password(password),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientRequest::Login { .. } => kind::LOGIN_REQUEST,
            ClientRequest::Logout => kind::LOGOUT_REQUEST,
            ClientRequest::SendGroupMessage(_) => kind::MESSAGE_SEND,
            ClientRequest::ChangeStatus(_) => kind::STATUS_CHANGE_REQUEST,
            ClientRequest::Ban(_) => kind::BAN_REQUEST,
            ClientRequest::SendPrivateMessage { .. } => kind::PRIVATE_MESSAGE_SEND,
            ClientRequest::GetConversation(_) => kind::GET_CONVERSATION,
            ClientRequest::GetConversations => kind::GET_CONVERSATIONS,
            ClientRequest::MarkAsRead(_) => kind::MARK_AS_READ,
            ClientRequest::AddContact { .. } => kind::ADD_CONTACT,
            ClientRequest::RemoveContact(_) => kind::REMOVE_CONTACT,
            ClientRequest::GetContacts => kind::GET_CONTACTS,
        }
    }
}

/// Lowercase hex SHA-256 of the password, as the server stores it.
///
/// This only keeps the plain text out of the frame; transport encryption is
/// the actual protection.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPayload {
    other_user_id: UserId,
    #[serde(default)]
    messages: Vec<PrivateMessage>,
}

/// Decode one text frame.
///
/// Returns `Ok(None)` for kinds this client does not consume.
pub fn decode_frame(text: &str) -> Result<Option<ServerEvent>, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(ProtocolError::InvalidFrame)?;
    decode_value(value)
}

/// Decode a frame that has already been parsed as JSON.
pub fn decode_value(value: Value) -> Result<Option<ServerEvent>, ProtocolError> {
    let frame: RawFrame = serde_json::from_value(value).map_err(ProtocolError::InvalidFrame)?;
    let frame_kind = frame.kind.ok_or(ProtocolError::MissingType)?;
    let payload = frame.payload;

    let event = match frame_kind.as_str() {
        kind::MESSAGE_BROADCAST => {
            ServerEvent::GroupMessageReceived(payload_as(&frame_kind, payload)?)
        }
        kind::PRIVATE_MESSAGE => {
            ServerEvent::PrivateMessageReceived(payload_as(&frame_kind, payload)?)
        }
        kind::CONVERSATION_HISTORY => {
            let history: HistoryPayload = payload_as(&frame_kind, payload)?;
            ServerEvent::ConversationHistoryLoaded {
                other_user_id: history.other_user_id,
                messages: history.messages,
            }
        }
        kind::CONVERSATIONS_LIST => {
            ServerEvent::ConversationsListUpdated(payload_as(&frame_kind, payload)?)
        }
        kind::CONTACTS_LIST => ServerEvent::ContactsListUpdated(payload_as(&frame_kind, payload)?),
        kind::CONTACT_ADDED => ServerEvent::ContactAdded(payload_as(&frame_kind, payload)?),
        kind::USER_LIST_UPDATE => ServerEvent::UserListUpdated(payload_as(&frame_kind, payload)?),
        kind::SUCCESS => ServerEvent::Success(payload_text(payload)),
        kind::ERROR => ServerEvent::ServerError(payload_text(payload)),
        other => {
            debug!("Ignoring frame of unknown kind {}", other);
            return Ok(None);
        }
    };

    Ok(Some(event))
}

fn payload_as<T: serde::de::DeserializeOwned>(
    kind: &str,
    payload: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::MalformedPayload {
        kind: kind.to_string(),
        source,
    })
}

fn payload_text(payload: Value) -> String {
    match payload {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Build the JSON frame for an outbound request.
pub fn request_frame(request: &ClientRequest) -> Value {
    let payload = match request {
        ClientRequest::Login { username, password } => {
            json!({ "username": username, "password": password })
        }
        ClientRequest::Logout | ClientRequest::GetConversations | ClientRequest::GetContacts => {
            Value::Null
        }
        ClientRequest::SendGroupMessage(content) | ClientRequest::ChangeStatus(content) => {
            json!(content)
        }
        ClientRequest::Ban(user_id)
        | ClientRequest::GetConversation(user_id)
        | ClientRequest::MarkAsRead(user_id)
        | ClientRequest::RemoveContact(user_id) => json!(user_id),
        ClientRequest::SendPrivateMessage { receiver_id, content } => {
            json!({ "receiverId": receiver_id, "content": content })
        }
        ClientRequest::AddContact { user_id, contact_name } => {
            json!({ "userId": user_id, "contactName": contact_name })
        }
    };

    json!({ "type": request.kind(), "payload": payload })
}

/// Encode an outbound request as a text frame.
pub fn encode_request(request: &ClientRequest) -> Result<String, ProtocolError> {
    serde_json::to_string(&request_frame(request))
        .map_err(|_| ProtocolError::Encode(request.kind()))
}
