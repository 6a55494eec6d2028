use chrono::{DateTime, Utc};

use crate::api::v1::{BroadcastSendV1, MessageRecordV1, MessageSendV1};
use crate::{ApiContext, Client, RoostModelResult, UserRole};

/// One directed communication, as projected from the platform API.
///
/// Messages are immutable from this system's perspective; the read and
/// archive flags belong to the API and are only ever observed here.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender: i64,
    pub receiver: Option<i64>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
    pub broadcast: bool,
    pub automated: bool,
    pub target_role: Option<UserRole>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Message {
    /// The user on the other side of this message relative to `viewer`.
    ///
    /// Broadcasts and receiver-less messages have no counterparty and fold
    /// into no conversation.
    pub fn counterparty(&self, viewer: i64) -> Option<i64> {
        if self.broadcast {
            return None;
        }
        let receiver = self.receiver?;
        Some(if self.sender == viewer {
            receiver
        } else {
            self.sender
        })
    }

    pub async fn inbox(client: &Client, ctx: &ApiContext) -> RoostModelResult<Vec<Message>> {
        let records: Vec<MessageRecordV1> = client.get(ctx, "/api/v1/messages/inbox").await?;
        records.into_iter().map(Message::try_from).collect()
    }

    pub async fn sent(client: &Client, ctx: &ApiContext) -> RoostModelResult<Vec<Message>> {
        let records: Vec<MessageRecordV1> = client.get(ctx, "/api/v1/messages/sent").await?;
        records.into_iter().map(Message::try_from).collect()
    }

    pub async fn send(
        client: &Client,
        ctx: &ApiContext,
        receiver: i64,
        body: &str,
    ) -> RoostModelResult<()> {
        client
            .post_unit(
                ctx,
                "/api/v1/messages/send",
                &MessageSendV1 {
                    receiver_id: receiver,
                    body,
                },
            )
            .await
    }

    /// Admin announcement to all users or a role-filtered subset.
    pub async fn broadcast(
        client: &Client,
        ctx: &ApiContext,
        target_role: Option<UserRole>,
        body: &str,
    ) -> RoostModelResult<()> {
        client
            .post_unit(
                ctx,
                "/api/v1/messages/broadcast",
                &BroadcastSendV1 {
                    target_role: target_role.map(|r| r.as_str()),
                    body,
                },
            )
            .await
    }

    /// Ask the API to flag the thread with `counterparty` as read.
    pub async fn mark_thread_read(
        client: &Client,
        ctx: &ApiContext,
        counterparty: i64,
    ) -> RoostModelResult<()> {
        client
            .post_unit(
                ctx,
                "/api/v1/messages/read",
                &serde_json::json!({ "counterparty_id": counterparty }),
            )
            .await
    }

    /// The one-to-one thread between `viewer` and `other`, oldest first.
    pub fn thread_between<'a>(
        messages: &'a [Message],
        viewer: i64,
        other: i64,
    ) -> Vec<&'a Message> {
        let mut thread: Vec<&Message> = messages
            .iter()
            .filter(|m| m.counterparty(viewer) == Some(other))
            .collect();
        // sort on (time, id) so duplicate fetches land adjacent for dedup
        thread.sort_by_key(|m| (m.sent_at, m.id));
        thread.dedup_by_key(|m| m.id);
        thread
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn msg(id: i64, sender: i64, receiver: Option<i64>, ts: i64) -> Message {
        Message {
            id,
            sender,
            receiver,
            body: format!("message {}", id),
            sent_at: Utc.timestamp_opt(ts, 0).unwrap(),
            read: true,
            broadcast: false,
            automated: false,
            target_role: None,
            archived_at: None,
        }
    }

    #[test]
    fn counterparty_is_the_other_side() {
        let m = msg(1, 2, Some(1), 0);
        assert_eq!(m.counterparty(1), Some(2));
        assert_eq!(m.counterparty(2), Some(1));
    }

    #[test]
    fn broadcasts_have_no_counterparty() {
        let mut m = msg(1, 2, None, 0);
        assert_eq!(m.counterparty(1), None);
        m.receiver = Some(1);
        m.broadcast = true;
        assert_eq!(m.counterparty(1), None);
    }

    #[test]
    fn thread_is_chronological_and_deduplicated() {
        let messages = vec![
            msg(3, 1, Some(2), 30),
            msg(1, 2, Some(1), 10),
            // the same message fetched through both inbox and sent
            msg(1, 2, Some(1), 10),
            msg(2, 1, Some(3), 20),
        ];
        let thread = Message::thread_between(&messages, 1, 2);
        let ids: Vec<i64> = thread.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
