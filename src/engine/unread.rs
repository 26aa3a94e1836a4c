// Unread accounting for private conversations

use log::{debug, warn};
use std::collections::HashMap;

use crate::models::{ConversationSummary, UserId};

/// Per-contact unread counters plus their running total.
///
/// `total` always equals the sum of `per_contact`; every mutation keeps both
/// in step without rescanning the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadState {
    per_contact: HashMap<UserId, u32>,
    total: u64,
}

impl UnreadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, contact_id: UserId) {
        let count = self.per_contact.entry(contact_id).or_insert(0);
        match count.checked_add(1) {
            Some(next) => {
                *count = next;
                self.total += 1;
                debug!("Unread for {} is now {} (total {})", contact_id, next, self.total);
            }
            // The total only moves when the counter does
            None => warn!("Unread counter for {} is saturated", contact_id),
        }
    }

    /// Mark every message from `contact_id` as consumed.
    pub fn reset_for(&mut self, contact_id: UserId) {
        let prior = match self.per_contact.get_mut(&contact_id) {
            Some(count) => std::mem::take(count),
            None => return,
        };

        if u64::from(prior) > self.total {
            // Local and server views raced; clamp instead of underflowing
            warn!(
                "Unread total {} below counter {} for {}, clamping to zero",
                self.total, prior, contact_id
            );
            self.total = 0;
        } else {
            self.total -= u64::from(prior);
        }
    }

    /// Replace all counters with the server's conversation summaries.
    pub fn replace_all(&mut self, summaries: &[ConversationSummary]) {
        self.per_contact.clear();
        for summary in summaries {
            let count = self.per_contact.entry(summary.other_user_id).or_insert(0);
            *count = count.saturating_add(summary.unread_count);
        }
        self.total = self.per_contact.values().map(|&c| u64::from(c)).sum();
    }

    pub fn get(&self, contact_id: UserId) -> u32 {
        self.per_contact.get(&contact_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Full rescan of the invariant; only for assertions.
    pub fn is_consistent(&self) -> bool {
        self.total == self.per_contact.values().map(|&c| u64::from(c)).sum::<u64>()
    }
}
