//! Conversations, messages and realtime message events

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default page size for message history
pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;
pub const MAX_MESSAGE_LIMIT: i64 = 100;
pub const MAX_MESSAGE_LEN: u64 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Conversation {
    pub id: i64,
    pub agency_id: i64,
    pub participant_id: String,
    pub subject: Option<String>,
    pub last_message_at: i64,
    pub created_at: i64,
}

/// Inbox row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ConversationSummary {
    pub id: i64,
    pub agency_id: i64,
    pub agency_name: String,
    pub agency_slug: String,
    pub participant_id: String,
    pub participant_name: Option<String>,
    pub subject: Option<String>,
    pub last_message_at: i64,
    pub unread_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: String,
    pub body: String,
    pub read_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConversationCreate {
    #[validate(range(min = 1))]
    pub agency_id: i64,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(max = 5000))]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageCreate {
    #[validate(length(max = 5000))]
    pub body: String,
}

/// Trimmed message body, `None` when blank
pub fn message_body(body: &str) -> Option<&str> {
    crate::util::non_blank(Some(body))
}

/// `?before=<message id>&limit=`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MessagesQuery {
    pub before: Option<i64>,
    pub limit: Option<i64>,
}

impl MessagesQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
            .clamp(1, MAX_MESSAGE_LIMIT)
    }
}

/// Server → client WebSocket frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEvent {
    Ready,
    MessageCreated {
        conversation_id: i64,
        message: Message,
    },
    ConversationRead {
        conversation_id: i64,
        reader_id: String,
        read_at: i64,
    },
    /// Events were dropped; refetch conversations
    Resync,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body() {
        assert_eq!(message_body("  hi  "), Some("hi"));
        assert_eq!(message_body(" \n\t "), None);
    }

    #[test]
    fn test_messages_query_limit() {
        assert_eq!(MessagesQuery::default().limit(), 50);
        let q = MessagesQuery {
            before: None,
            limit: Some(1000),
        };
        assert_eq!(q.limit(), 100);
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(MessageEvent::Ready).unwrap();
        assert_eq!(json, serde_json::json!({"type": "ready"}));

        let json = serde_json::to_value(MessageEvent::ConversationRead {
            conversation_id: 7,
            reader_id: "u1".into(),
            read_at: 1,
        })
        .unwrap();
        assert_eq!(json["type"], "conversation_read");
        assert_eq!(json["conversation_id"], 7);
    }
}
