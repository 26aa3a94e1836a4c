// Sidebar projection: roster left-joined with conversation summaries

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::engine::unread::UnreadState;
use crate::models::{Contact, ContactView, ConversationSummary, UserId};

/// Build the sidebar rows for `roster`.
///
/// Contacts with a last message time come first, newest first; the rest keep
/// roster order. Unread counts come from `unread`, which the server summaries
/// seed and local deliveries advance.
///
/// A summary's own `unread_count` is never copied into the row. A contact with
/// no summary still shows its local unread count, so the rows always add up to
/// `unread.total()`.
pub fn merge_contacts(
    roster: &[Contact],
    summaries: &[ConversationSummary],
    unread: &UnreadState,
) -> Vec<ContactView> {
    let mut by_user: HashMap<UserId, &ConversationSummary> =
        HashMap::with_capacity(summaries.len());
    for summary in summaries {
        by_user.entry(summary.other_user_id).or_insert(summary);
    }

    let mut rows: Vec<ContactView> = roster
        .iter()
        .map(|contact| {
            let summary = by_user.get(&contact.user_id);
            ContactView {
                contact: contact.clone(),
                last_message: summary.and_then(|s| s.last_message.clone()),
                last_message_time: summary.and_then(|s| s.last_message_time),
                unread_count: unread.get(contact.user_id),
            }
        })
        .collect();

    // sort_by is stable, so equal keys keep roster insertion order
    rows.sort_by(|a, b| compare_recency(a.last_message_time, b.last_message_time));
    rows
}

fn compare_recency(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep rows whose display override or username contains `term`, ignoring case.
///
/// Applied after sorting, so the surviving rows keep their relative order.
pub fn filter_contacts(rows: Vec<ContactView>, term: &str) -> Vec<ContactView> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return rows;
    }

    rows.into_iter()
        .filter(|row| {
            let name_match = row
                .contact
                .contact_name
                .as_ref()
                .map_or(false, |name| name.to_lowercase().contains(&needle));
            name_match || row.contact.username.to_lowercase().contains(&needle)
        })
        .collect()
}
