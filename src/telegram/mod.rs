pub mod console;

pub use console::ConsoleSession;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::ChatRef;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    /// The platform could not resolve the referenced chat/entity.
    #[error("could not resolve chat {0}")]
    Resolution(String),

    /// Flood control / rate limiting. Surfaced to the caller; retry policy
    /// belongs to the session implementation, not this core.
    #[error("rate limited by the platform, retry after {seconds}s")]
    FloodWait { seconds: u64 },

    #[error("transport error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A resolved chat entity.
#[derive(Debug, Clone)]
pub struct ChatHandle {
    pub id: i64,
    /// Normalized handle (no `@`, lower-case), when the chat has one.
    pub handle: Option<String>,
    pub title: Option<String>,
    /// Whether the chat has forum threads enabled.
    pub forum: bool,
}

/// One thread as reported by the platform's thread-listing call.
#[derive(Debug, Clone)]
pub struct ThreadInfo {
    pub thread_id: i64,
    /// Message id anchoring the thread; threads without one are skipped.
    pub root_msg_id: Option<i64>,
    pub title: Option<String>,
}

/// One page of the thread listing.
#[derive(Debug, Clone)]
pub struct ThreadPage {
    pub items: Vec<ThreadInfo>,
    /// Total thread count when the platform reports one.
    pub total: Option<usize>,
}

/// Reply metadata attached to an inbound message. Different client builds
/// put the thread root in different fields, hence both.
#[derive(Debug, Clone, Default)]
pub struct ReplyMeta {
    pub top_msg_id: Option<i64>,
    pub reply_to_top_id: Option<i64>,
}

/// An inbound message event from the chat platform.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    /// Normalized handle of the chat, when known.
    pub chat_handle: Option<String>,
    pub chat_title: Option<String>,
    pub msg_id: i64,
    pub raw_text: String,
    pub reply: Option<ReplyMeta>,
    /// Some builds expose the thread root directly on the message.
    pub top_msg_id: Option<i64>,
    pub reply_to_top_id: Option<i64>,
    /// Raw message dictionary, last-resort source for the thread root.
    pub raw_meta: Option<serde_json::Value>,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(chat_id: i64, msg_id: i64, raw_text: impl Into<String>) -> Self {
        Self {
            chat_id,
            chat_handle: None,
            chat_title: None,
            msg_id,
            raw_text: raw_text.into(),
            reply: None,
            top_msg_id: None,
            reply_to_top_id: None,
            raw_meta: None,
            received_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// The chat-platform collaborator. The real client (MTProto session, login
/// flow, flood-wait handling) lives behind this seam; the routing core only
/// depends on these four calls plus the inbound event stream.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Resolve a chat reference to an entity.
    async fn get_entity(&self, chat: &ChatRef) -> Result<ChatHandle, SessionError>;

    /// List one page of forum threads, starting after `offset_thread`
    /// (0 for the first page).
    async fn list_threads(
        &self,
        chat: &ChatHandle,
        offset_thread: i64,
        limit: usize,
    ) -> Result<ThreadPage, SessionError>;

    /// Forward the original message (with any attachments) to `to`.
    async fn forward(&self, msg: &InboundMessage, to: &ChatRef) -> Result<(), SessionError>;

    /// Send a plain text message to `to`.
    async fn send_text(&self, to: &ChatRef, text: &str) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// Thread-root extraction
// ---------------------------------------------------------------------------

/// Extract the thread-root message id from an inbound message, trying the
/// known field locations in order: reply metadata, direct message fields,
/// then the raw message dictionary (where ids sometimes arrive as numeric
/// strings). No I/O; returns None when every location comes up empty.
pub fn extract_thread_root(msg: &InboundMessage) -> Option<i64> {
    if let Some(reply) = &msg.reply {
        if let Some(v) = reply.top_msg_id.or(reply.reply_to_top_id) {
            return Some(v);
        }
    }

    if let Some(v) = msg.top_msg_id.or(msg.reply_to_top_id) {
        return Some(v);
    }

    if let Some(meta) = &msg.raw_meta {
        let reply_to = meta.get("reply_to")?;
        for key in ["top_msg_id", "reply_to_top_id"] {
            match reply_to.get(key) {
                Some(serde_json::Value::Number(n)) => {
                    if let Some(v) = n.as_i64() {
                        return Some(v);
                    }
                }
                Some(serde_json::Value::String(s)) => {
                    if let Ok(v) = s.parse::<i64>() {
                        return Some(v);
                    }
                }
                _ => {}
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_root_from_reply_meta() {
        let mut msg = InboundMessage::new(1, 10, "x");
        msg.reply = Some(ReplyMeta {
            top_msg_id: Some(4),
            reply_to_top_id: None,
        });
        assert_eq!(extract_thread_root(&msg), Some(4));

        msg.reply = Some(ReplyMeta {
            top_msg_id: None,
            reply_to_top_id: Some(7),
        });
        assert_eq!(extract_thread_root(&msg), Some(7));
    }

    #[test]
    fn test_extract_root_from_direct_fields() {
        let mut msg = InboundMessage::new(1, 10, "x");
        msg.reply_to_top_id = Some(31);
        assert_eq!(extract_thread_root(&msg), Some(31));
    }

    #[test]
    fn test_extract_root_from_raw_meta_number_or_string() {
        let mut msg = InboundMessage::new(1, 10, "x");
        msg.raw_meta = Some(json!({"reply_to": {"top_msg_id": 14}}));
        assert_eq!(extract_thread_root(&msg), Some(14));

        msg.raw_meta = Some(json!({"reply_to": {"reply_to_top_id": "-42"}}));
        assert_eq!(extract_thread_root(&msg), Some(-42));
    }

    #[test]
    fn test_extract_root_reply_meta_wins_over_raw() {
        let mut msg = InboundMessage::new(1, 10, "x");
        msg.reply = Some(ReplyMeta {
            top_msg_id: Some(4),
            reply_to_top_id: None,
        });
        msg.raw_meta = Some(json!({"reply_to": {"top_msg_id": 99}}));
        assert_eq!(extract_thread_root(&msg), Some(4));
    }

    #[test]
    fn test_extract_root_none_when_absent() {
        let msg = InboundMessage::new(1, 10, "x");
        assert_eq!(extract_thread_root(&msg), None);
    }
}
