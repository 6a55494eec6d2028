use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{ApiContext, Client, Message};

/// Derived, per-request view of one one-to-one thread: the counterparty and
/// the most recent message exchanged with them. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub counterparty: i64,
    pub counterparty_name: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub last_automated: bool,
    pub unread: u32,
}

/// Fold a combined inbox+sent snapshot into one summary per counterparty,
/// most recent activity first.
///
/// `resolve_name` is consulted exactly once per distinct counterparty, on
/// first sight; when it yields nothing the summary falls back to
/// `"User {id}"`. Duplicate messages (fetched through both inbox and sent)
/// collapse into the same key bucket. Broadcasts and receiver-less messages
/// are skipped. Equal last-message timestamps order by ascending
/// counterparty id: the fold map iterates id-ascending and the final sort is
/// stable.
pub fn build_conversations<F>(
    messages: &[Message],
    viewer: i64,
    mut resolve_name: F,
) -> Vec<ConversationSummary>
where
    F: FnMut(i64) -> Option<String>,
{
    let mut folded: BTreeMap<i64, ConversationSummary> = BTreeMap::new();
    for message in messages {
        let other = match message.counterparty(viewer) {
            Some(other) => other,
            None => continue,
        };
        match folded.entry(other) {
            Entry::Vacant(slot) => {
                let name =
                    resolve_name(other).unwrap_or_else(|| format!("User {}", other));
                slot.insert(ConversationSummary {
                    counterparty: other,
                    counterparty_name: name,
                    last_message: message.body.clone(),
                    last_message_at: message.sent_at,
                    last_automated: message.automated,
                    // the API exposes no per-thread unread tally
                    unread: 0,
                });
            }
            Entry::Occupied(mut slot) => {
                let summary = slot.get_mut();
                if message.sent_at > summary.last_message_at {
                    summary.last_message = message.body.clone();
                    summary.last_message_at = message.sent_at;
                    summary.last_automated = message.automated;
                }
            }
        }
    }
    let mut conversations: Vec<ConversationSummary> = folded.into_values().collect();
    conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    conversations
}

/// Whether the viewer has any unread inbound message at all. Existential,
/// not per-conversation; consumes the same inbox snapshot as the fold.
pub fn has_unread(inbox: &[Message]) -> bool {
    inbox.iter().any(|m| !m.read)
}

/// Everything the messaging pages need from one pair of upstream fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationView {
    pub conversations: Vec<ConversationSummary>,
    pub has_unread: bool,
}

impl ConversationView {
    /// Assemble the conversation list for `ctx.viewer` from the current
    /// inbox+sent snapshot.
    ///
    /// An upstream failure on either fetch degrades that side to an empty
    /// list, and a failed name lookup degrades to the placeholder name;
    /// this never returns an error. Names are prefetched sequentially, one
    /// directory call per distinct counterparty (the client caches them
    /// across requests).
    #[instrument(skip(client, ctx))]
    pub async fn load(client: &Client, ctx: &ApiContext) -> ConversationView {
        let inbox = Message::inbox(client, ctx).await.unwrap_or_else(|e| {
            warn!("inbox fetch failed, treating as empty: {}", e);
            Vec::new()
        });
        let sent = Message::sent(client, ctx).await.unwrap_or_else(|e| {
            warn!("sent fetch failed, treating as empty: {}", e);
            Vec::new()
        });
        let has_unread = has_unread(&inbox);

        let mut messages = inbox;
        messages.extend(sent);

        let mut names: BTreeMap<i64, Option<String>> = BTreeMap::new();
        for message in &messages {
            if let Some(other) = message.counterparty(ctx.viewer) {
                if let Entry::Vacant(slot) = names.entry(other) {
                    slot.insert(client.display_name(ctx, other).await);
                }
            }
        }

        let conversations = build_conversations(&messages, ctx.viewer, |id| {
            names.get(&id).cloned().flatten()
        });
        ConversationView {
            conversations,
            has_unread,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::UserRole;
    use chrono::TimeZone;

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    fn msg(id: i64, sender: i64, receiver: Option<i64>, body: &str, ts: i64) -> Message {
        Message {
            id,
            sender,
            receiver,
            body: body.to_string(),
            sent_at: at(ts),
            read: true,
            broadcast: false,
            automated: false,
            target_role: None,
            archived_at: None,
        }
    }

    fn no_names(_: i64) -> Option<String> {
        None
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(build_conversations(&[], 1, no_names).is_empty());
    }

    #[test]
    fn broadcasts_and_receiverless_messages_never_leak_in() {
        let mut announcement = msg(1, 1, None, "announcement", 10);
        announcement.broadcast = true;
        announcement.target_role = Some(UserRole::Tenant);
        let receiverless = msg(2, 3, None, "dangling", 20);
        // flagged broadcast that still carries a receiver id
        let mut flagged = msg(3, 4, Some(1), "to everyone", 30);
        flagged.broadcast = true;

        let conversations =
            build_conversations(&[announcement, receiverless, flagged], 1, no_names);
        assert!(conversations.is_empty());
    }

    #[test]
    fn one_summary_per_counterparty() {
        let messages = vec![
            // the same exchange fetched through both inbox and sent
            msg(1, 2, Some(1), "hi", 10),
            msg(1, 2, Some(1), "hi", 10),
            msg(2, 1, Some(2), "yo", 20),
            msg(3, 3, Some(1), "hello", 15),
        ];
        let conversations = build_conversations(&messages, 1, no_names);
        assert_eq!(conversations.len(), 2);
        let mut ids: Vec<i64> = conversations.iter().map(|c| c.counterparty).collect();
        ids.sort();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn last_message_wins_regardless_of_input_order() {
        // viewer 1: inbox has "hi" at T1, sent has "yo" at T2 > T1
        let messages = vec![
            msg(2, 1, Some(2), "yo", 20),
            msg(1, 2, Some(1), "hi", 10),
        ];
        let conversations = build_conversations(&messages, 1, no_names);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].counterparty, 2);
        assert_eq!(conversations[0].last_message, "yo");
        assert_eq!(conversations[0].last_message_at, at(20));
    }

    #[test]
    fn equal_timestamp_does_not_overwrite_the_seed() {
        let mut first = msg(1, 2, Some(1), "first", 10);
        first.automated = true;
        let second = msg(2, 2, Some(1), "second", 10);
        let conversations = build_conversations(&[first, second], 1, no_names);
        assert_eq!(conversations[0].last_message, "first");
        assert!(conversations[0].last_automated);
    }

    #[test]
    fn ordered_by_recency_descending() {
        let messages = vec![
            msg(1, 2, Some(1), "older", 10),
            msg(2, 3, Some(1), "newer", 20),
        ];
        let conversations = build_conversations(&messages, 1, no_names);
        let order: Vec<i64> = conversations.iter().map(|c| c.counterparty).collect();
        assert_eq!(order, vec![3, 2]);
    }

    #[test]
    fn timestamp_ties_order_by_counterparty_id() {
        let messages = vec![
            msg(1, 9, Some(1), "from nine", 10),
            msg(2, 4, Some(1), "from four", 10),
        ];
        let conversations = build_conversations(&messages, 1, no_names);
        let order: Vec<i64> = conversations.iter().map(|c| c.counterparty).collect();
        assert_eq!(order, vec![4, 9]);
    }

    #[test]
    fn resolver_failure_falls_back_to_placeholder() {
        let messages = vec![msg(1, 42, Some(1), "hi", 10)];
        let conversations = build_conversations(&messages, 1, no_names);
        assert_eq!(conversations[0].counterparty_name, "User 42");
    }

    #[test]
    fn resolver_consulted_once_per_counterparty() {
        let messages = vec![
            msg(1, 2, Some(1), "a", 10),
            msg(2, 1, Some(2), "b", 20),
            msg(3, 2, Some(1), "c", 30),
            msg(4, 3, Some(1), "d", 40),
        ];
        let mut calls: Vec<i64> = Vec::new();
        let conversations = build_conversations(&messages, 1, |id| {
            calls.push(id);
            Some(format!("Resolved {}", id))
        });
        calls.sort();
        assert_eq!(calls, vec![2, 3]);
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].counterparty_name, "Resolved 3");
    }

    #[test]
    fn automated_flag_tracks_the_latest_message() {
        let mut reminder = msg(2, 2, Some(1), "rent is due", 20);
        reminder.automated = true;
        let messages = vec![msg(1, 2, Some(1), "hi", 10), reminder];
        let conversations = build_conversations(&messages, 1, no_names);
        assert!(conversations[0].last_automated);
        assert_eq!(conversations[0].last_message, "rent is due");
    }

    #[test]
    fn unread_tally_is_reported_as_zero() {
        let mut unread = msg(1, 2, Some(1), "hi", 10);
        unread.read = false;
        let conversations = build_conversations(&[unread], 1, no_names);
        assert_eq!(conversations[0].unread, 0);
    }

    #[test]
    fn deterministic_resolver_makes_the_fold_idempotent() {
        let messages = vec![
            msg(1, 2, Some(1), "hi", 10),
            msg(2, 1, Some(2), "yo", 20),
            msg(3, 5, Some(1), "hey", 20),
        ];
        let resolver = |id: i64| Some(format!("User Number {}", id));
        let first = build_conversations(&messages, 1, resolver);
        let second = build_conversations(&messages, 1, resolver);
        assert_eq!(first, second);
    }

    #[test]
    fn unread_detection_is_existential_over_the_inbox() {
        let read = msg(1, 2, Some(1), "seen", 10);
        let mut fresh = msg(2, 3, Some(1), "new", 20);
        fresh.read = false;
        assert!(!has_unread(&[read.clone()]));
        assert!(has_unread(&[read, fresh]));
        assert!(!has_unread(&[]));
    }
}
