use serde::Serialize;

use crate::models::{ActiveView, Contact, UserId};

/// What the user is looking at right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFocus {
    pub active_view: ActiveView,
    pub selected_contact: Option<Contact>,
}

impl ViewFocus {
    pub fn selected_id(&self) -> Option<UserId> {
        self.selected_contact.as_ref().map(|c| c.user_id)
    }

    /// True when the private conversation with `user_id` is on screen.
    pub fn is_focused_on(&self, user_id: UserId) -> bool {
        self.active_view == ActiveView::Private && self.selected_id() == Some(user_id)
    }
}

/// Single-writer holder of the current `ViewFocus`.
///
/// Handlers must call `current()` when an event arrives rather than keeping
/// an earlier copy around.
#[derive(Debug, Default)]
pub struct FocusTracker {
    focus: ViewFocus,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &ViewFocus {
        &self.focus
    }

    pub fn set_active_view(&mut self, view: ActiveView) {
        self.focus.active_view = view;
    }

    /// Replace the selection, returning the previous one.
    pub fn select(&mut self, contact: Option<Contact>) -> Option<Contact> {
        std::mem::replace(&mut self.focus.selected_contact, contact)
    }
}
