// Event reconciliation engine
// Owns the synchronized client state and applies inbound server events and
// user intents to it one at a time.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::VecDeque;

use crate::models::{
    ActiveView, Contact, ContactView, ConversationSummary, GroupMessage, OnlineUser,
    PrivateMessage, UserId,
};
use crate::protocol::{self, ClientRequest, ProtocolError, ServerEvent};
use crate::transport::Transport;

pub mod actor;
pub mod focus;
pub mod identity;
pub mod ledger;
pub mod merge;
pub mod unread;

pub use focus::{FocusTracker, ViewFocus};
pub use identity::{group_key, private_key, GroupKey, PrivateKey};
pub use ledger::DedupLedger;
pub use unread::UnreadState;

/// A user-driven intent. Applied on the same thread of control as inbound
/// events, so no event can interleave with its sub-steps.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    SelectContact(Contact),
    SelectContactById(UserId),
    SetActiveView(ActiveView),
    BackToContacts,
    SendGroupMessage(String),
    SendPrivateMessage(String),
    AddContact { user_id: UserId, contact_name: Option<String> },
    RemoveContact(UserId),
    QuickAddContact(OnlineUser),
    ChangeStatus(String),
    BanUser(UserId),
    RefreshConversations,
}

/// Every read model at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub focus: ViewFocus,
    pub group_log: Vec<GroupMessage>,
    pub active_private_log: Vec<PrivateMessage>,
    pub contacts: Vec<ContactView>,
    pub online_users: Vec<OnlineUser>,
    pub unread_total: u64,
}

pub struct ChatEngine<T: Transport> {
    me: UserId,
    transport: T,
    focus: FocusTracker,

    // Session lifetime
    group_log: Vec<GroupMessage>,
    group_ledger: DedupLedger<GroupKey>,
    roster: Vec<Contact>,
    conversations: Vec<ConversationSummary>,
    unread: UnreadState,
    online_users: Vec<OnlineUser>,

    // Conversation lifetime; newest first
    private_log: VecDeque<PrivateMessage>,
    private_ledger: DedupLedger<PrivateKey>,
}

impl<T: Transport> ChatEngine<T> {
    pub fn new(me: UserId, transport: T) -> Self {
        ChatEngine {
            me,
            transport,
            focus: FocusTracker::new(),
            group_log: Vec::new(),
            group_ledger: DedupLedger::new(),
            roster: Vec::new(),
            conversations: Vec::new(),
            unread: UnreadState::new(),
            online_users: Vec::new(),
            private_log: VecDeque::new(),
            private_ledger: DedupLedger::new(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.me
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Decode and apply one wire frame.
    ///
    /// A malformed frame is rejected on its own and leaves all state untouched;
    /// frames of unknown kind are skipped.
    pub fn ingest_frame(&mut self, text: &str) -> Result<(), ProtocolError> {
        match protocol::decode_frame(text) {
            Ok(Some(event)) => {
                self.handle_event(event);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                warn!("Rejected inbound frame: {}", e);
                Err(e)
            }
        }
    }

    pub fn handle_event(&mut self, event: ServerEvent) {
        debug!("Handling {} event", event.kind());
        match event {
            ServerEvent::GroupMessageReceived(msg) => self.ingest_group_message(msg),
            ServerEvent::PrivateMessageReceived(msg) => self.ingest_private_message(msg),
            ServerEvent::ConversationHistoryLoaded { other_user_id, messages } => {
                self.load_history(other_user_id, messages)
            }
            ServerEvent::ConversationsListUpdated(summaries) => {
                self.replace_conversations(summaries)
            }
            ServerEvent::ContactsListUpdated(contacts) => {
                info!("Roster replaced with {} contacts", contacts.len());
                self.roster = contacts;
            }
            ServerEvent::ContactAdded(contact) => self.add_to_roster(contact),
            ServerEvent::UserListUpdated(users) => {
                debug!("{} users online", users.len());
                self.online_users = users;
            }
            ServerEvent::Success(message) => {
                info!("Server reported success: {}", message);
                // Contact add/remove is acknowledged this way; pull the roster again
                self.transport.request_contacts_refresh();
            }
            ServerEvent::ServerError(message) => warn!("Server reported error: {}", message),
        }
    }

    fn ingest_group_message(&mut self, msg: GroupMessage) {
        if !self.group_ledger.check_and_mark(group_key(&msg)) {
            debug!("Dropping duplicate group message {}", group_key(&msg));
            return;
        }
        self.group_log.push(msg);
    }

    fn ingest_private_message(&mut self, msg: PrivateMessage) {
        let key = private_key(&msg);
        if !self.private_ledger.check_and_mark(key) {
            debug!("Dropping duplicate private message {}", key);
            return;
        }

        // Both decisions below read this one focus value
        let focus = self.focus.current();
        let in_open_conversation = focus.selected_id().map_or(false, |id| msg.involves(id));
        let from_other = msg.sender_id != self.me;
        let focused_on_sender = focus.is_focused_on(msg.sender_id);

        if from_other {
            if focused_on_sender {
                // The server still counts it as unread until told otherwise
                self.transport.dispatch(ClientRequest::MarkAsRead(msg.sender_id));
            } else {
                self.unread.increment(msg.sender_id);
            }
        }

        if in_open_conversation {
            self.private_log.push_front(msg);
        }
    }

    fn load_history(&mut self, other_user_id: UserId, messages: Vec<PrivateMessage>) {
        if self.focus.current().selected_id() != Some(other_user_id) {
            debug!(
                "Discarding history for {}, conversation is no longer open",
                other_user_id
            );
            return;
        }

        self.private_ledger.reset();
        for msg in &messages {
            self.private_ledger.mark_seen(private_key(msg));
        }
        info!("Loaded {} messages with {}", messages.len(), other_user_id);
        self.private_log = messages.into();
    }

    fn replace_conversations(&mut self, summaries: Vec<ConversationSummary>) {
        self.unread.replace_all(&summaries);
        self.conversations = summaries;
        info!(
            "Reconciled {} conversations, {} unread",
            self.conversations.len(),
            self.unread.total()
        );
    }

    fn add_to_roster(&mut self, contact: Contact) {
        match self.roster.iter_mut().find(|c| c.user_id == contact.user_id) {
            Some(existing) => *existing = contact,
            None => {
                info!("Contact {} added", contact.user_id);
                self.roster.push(contact);
            }
        }
    }

    // ===== User intents =====

    pub fn apply(&mut self, action: UserAction) {
        match action {
            UserAction::SelectContact(contact) => self.select_contact(contact),
            UserAction::SelectContactById(user_id) => {
                if !self.select_contact_by_id(user_id) {
                    warn!("Cannot select {}: not in roster", user_id);
                }
            }
            UserAction::SetActiveView(view) => self.set_active_view(view),
            UserAction::BackToContacts => self.back_to_contacts(),
            UserAction::SendGroupMessage(text) => {
                self.send_group_message(&text);
            }
            UserAction::SendPrivateMessage(text) => {
                self.send_private_message(&text);
            }
            UserAction::AddContact { user_id, contact_name } => {
                self.add_contact(user_id, contact_name)
            }
            UserAction::RemoveContact(user_id) => self.remove_contact(user_id),
            UserAction::QuickAddContact(user) => self.quick_add_contact(&user),
            UserAction::ChangeStatus(status) => {
                self.transport.dispatch(ClientRequest::ChangeStatus(status))
            }
            UserAction::BanUser(user_id) => self.transport.dispatch(ClientRequest::Ban(user_id)),
            UserAction::RefreshConversations => {
                self.transport.dispatch(ClientRequest::GetConversations)
            }
        }
    }

    /// Open the conversation with `contact`.
    ///
    /// The previous conversation's log and ledger are dropped before any
    /// further event is handled, and the history is requested from the server.
    pub fn select_contact(&mut self, contact: Contact) {
        let user_id = contact.user_id;
        info!("Selecting conversation with {}", user_id);

        self.focus.select(Some(contact));
        self.private_log.clear();
        self.private_ledger.reset();
        self.unread.reset_for(user_id);
        self.transport.request_conversation(user_id);
    }

    pub fn select_contact_by_id(&mut self, user_id: UserId) -> bool {
        match self.roster.iter().find(|c| c.user_id == user_id).cloned() {
            Some(contact) => {
                self.select_contact(contact);
                true
            }
            None => false,
        }
    }

    pub fn set_active_view(&mut self, view: ActiveView) {
        self.focus.set_active_view(view);
        if view == ActiveView::Private {
            // An already-selected conversation becomes the focused one
            if let Some(user_id) = self.focus.current().selected_id() {
                self.unread.reset_for(user_id);
            }
        }
    }

    pub fn back_to_contacts(&mut self) {
        self.focus.select(None);
        self.private_log.clear();
        self.private_ledger.reset();
    }

    /// Returns false when there was nothing to send.
    pub fn send_group_message(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.transport.dispatch(ClientRequest::SendGroupMessage(text.to_string()));
        true
    }

    /// Send to the selected contact. The message shows up in the log once the
    /// server echoes it back.
    pub fn send_private_message(&mut self, text: &str) -> bool {
        let receiver_id = match self.focus.current().selected_id() {
            Some(id) => id,
            None => {
                debug!("No conversation open, not sending private message");
                return false;
            }
        };
        if text.trim().is_empty() {
            return false;
        }
        self.transport.dispatch(ClientRequest::SendPrivateMessage {
            receiver_id,
            content: text.to_string(),
        });
        true
    }

    pub fn add_contact(&mut self, user_id: UserId, contact_name: Option<String>) {
        self.transport.dispatch(ClientRequest::AddContact { user_id, contact_name });
    }

    pub fn remove_contact(&mut self, user_id: UserId) {
        self.transport.dispatch(ClientRequest::RemoveContact(user_id));
        if self.focus.current().selected_id() == Some(user_id) {
            self.back_to_contacts();
        }
    }

    /// Jump from the online-user list into a private conversation, adding the
    /// user to the roster first if needed.
    pub fn quick_add_contact(&mut self, user: &OnlineUser) {
        if user.id == self.me {
            return;
        }

        let existing = self.roster.iter().find(|c| c.user_id == user.id).cloned();
        // Straight to the tracker: the old selection is never shown, so its
        // unread count must survive
        self.focus.set_active_view(ActiveView::Private);
        match existing {
            Some(contact) => self.select_contact(contact),
            None => self.add_contact(user.id, Some(user.username.clone())),
        }
    }

    // ===== Read models =====

    pub fn focus(&self) -> &ViewFocus {
        self.focus.current()
    }

    pub fn group_log(&self) -> &[GroupMessage] {
        &self.group_log
    }

    /// The open conversation, newest first (arrival order, prepended).
    pub fn active_private_log(&self) -> Vec<PrivateMessage> {
        self.private_log.iter().cloned().collect()
    }

    /// The open conversation sorted oldest first by timestamp, for display.
    pub fn chronological_private_log(&self) -> Vec<PrivateMessage> {
        let mut log = self.active_private_log();
        log.sort_by_key(|m| m.timestamp);
        log
    }

    pub fn roster(&self) -> &[Contact] {
        &self.roster
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn contacts_view(&self) -> Vec<ContactView> {
        merge::merge_contacts(&self.roster, &self.conversations, &self.unread)
    }

    pub fn contacts_view_filtered(&self, term: &str) -> Vec<ContactView> {
        merge::filter_contacts(self.contacts_view(), term)
    }

    pub fn online_users(&self) -> &[OnlineUser] {
        &self.online_users
    }

    pub fn unread_total(&self) -> u64 {
        self.unread.total()
    }

    pub fn unread_for(&self, contact_id: UserId) -> u32 {
        self.unread.get(contact_id)
    }

    pub fn unread(&self) -> &UnreadState {
        &self.unread
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            focus: self.focus.current().clone(),
            group_log: self.group_log.clone(),
            active_private_log: self.active_private_log(),
            contacts: self.contacts_view(),
            online_users: self.online_users.clone(),
            unread_total: self.unread.total(),
        }
    }
}
