//! Conversations and messages

use shared::models::{Conversation, ConversationSummary, Message};
use sqlx::PgPool;

/// Conversation plus the agency owner that answers it
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationAccess {
    #[sqlx(flatten)]
    pub conversation: Conversation,
    pub owner_id: Option<String>,
}

impl ConversationAccess {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.conversation.participant_id == user_id || self.owner_id.as_deref() == Some(user_id)
    }

    /// Users that receive realtime events for this conversation
    pub fn members(&self) -> Vec<&str> {
        let mut members = vec![self.conversation.participant_id.as_str()];
        if let Some(owner) = self.owner_id.as_deref() {
            members.push(owner);
        }
        members
    }
}

pub async fn find_access(pool: &PgPool, id: i64) -> Result<Option<ConversationAccess>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.*, a.owner_id FROM conversations c
         JOIN agencies a ON a.id = c.agency_id
         WHERE c.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Reuse the (agency, participant) conversation or start it
pub async fn get_or_create<'e, E>(
    executor: E,
    agency_id: i64,
    participant_id: &str,
    subject: Option<&str>,
    now: i64,
) -> Result<Conversation, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        r#"
        INSERT INTO conversations (agency_id, participant_id, subject, last_message_at, created_at)
        VALUES ($1, $2, $3, $4, $4)
        ON CONFLICT (agency_id, participant_id) DO UPDATE SET last_message_at = EXCLUDED.last_message_at
        RETURNING *
        "#,
    )
    .bind(agency_id)
    .bind(participant_id)
    .bind(subject)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn insert_message(
    tx: &mut sqlx::PgConnection,
    conversation_id: i64,
    sender_id: &str,
    body: &str,
    now: i64,
) -> Result<Message, sqlx::Error> {
    let message: Message = sqlx::query_as(
        "INSERT INTO messages (conversation_id, sender_id, body, created_at)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(conversation_id)
    .bind(sender_id)
    .bind(body)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE conversations SET last_message_at = $1 WHERE id = $2")
        .bind(now)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

    Ok(message)
}

/// Inbox: conversations where the user is participant or agency owner
pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<ConversationSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT c.id, c.agency_id, a.name AS agency_name, a.slug AS agency_slug,
               c.participant_id, u.full_name AS participant_name, c.subject, c.last_message_at,
               (SELECT COUNT(*) FROM messages m
                WHERE m.conversation_id = c.id AND m.sender_id <> $1 AND m.read_at IS NULL) AS unread_count
        FROM conversations c
        JOIN agencies a ON a.id = c.agency_id
        JOIN users u ON u.id = c.participant_id
        WHERE c.participant_id = $1 OR a.owner_id = $1
        ORDER BY c.last_message_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Page of messages older than `before`, returned oldest first
pub async fn list_messages(
    pool: &PgPool,
    conversation_id: i64,
    before: Option<i64>,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let mut rows: Vec<Message> = sqlx::query_as(
        "SELECT * FROM messages
         WHERE conversation_id = $1 AND ($2::bigint IS NULL OR id < $2)
         ORDER BY id DESC LIMIT $3",
    )
    .bind(conversation_id)
    .bind(before)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.reverse();
    Ok(rows)
}

/// Mark the other side's messages read; returns how many changed
pub async fn mark_read(pool: &PgPool, conversation_id: i64, reader_id: &str, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE messages SET read_at = $1
         WHERE conversation_id = $2 AND sender_id <> $3 AND read_at IS NULL",
    )
    .bind(now)
    .bind(conversation_id)
    .bind(reader_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(owner: Option<&str>) -> ConversationAccess {
        ConversationAccess {
            conversation: Conversation {
                id: 1,
                agency_id: 2,
                participant_id: "p".into(),
                subject: None,
                last_message_at: 0,
                created_at: 0,
            },
            owner_id: owner.map(String::from),
        }
    }

    #[test]
    fn test_membership() {
        let a = access(Some("o"));
        assert!(a.is_member("p"));
        assert!(a.is_member("o"));
        assert!(!a.is_member("x"));
        assert_eq!(a.members(), vec!["p", "o"]);

        let orphaned = access(None);
        assert_eq!(orphaned.members(), vec!["p"]);
    }
}
