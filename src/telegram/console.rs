use async_trait::async_trait;

use crate::models::ChatRef;
use super::{ChatHandle, ChatSession, InboundMessage, SessionError, ThreadPage};

/// Dry-run session backend: resolves chats trivially, reports no forum
/// threads and logs all outbound traffic instead of sending it. Used by the
/// stdin feed in `main` and anywhere a real client is not wired up yet.
#[derive(Debug, Default)]
pub struct ConsoleSession;

impl ConsoleSession {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatSession for ConsoleSession {
    async fn get_entity(&self, chat: &ChatRef) -> Result<ChatHandle, SessionError> {
        let (id, handle) = match chat {
            ChatRef::Id(id) => (*id, None),
            ChatRef::Handle(h) => (0, Some(h.clone())),
        };
        Ok(ChatHandle {
            id,
            handle,
            title: None,
            forum: false,
        })
    }

    async fn list_threads(
        &self,
        _chat: &ChatHandle,
        _offset_thread: i64,
        _limit: usize,
    ) -> Result<ThreadPage, SessionError> {
        Ok(ThreadPage {
            items: Vec::new(),
            total: Some(0),
        })
    }

    async fn forward(&self, msg: &InboundMessage, to: &ChatRef) -> Result<(), SessionError> {
        tracing::info!(
            to = %to,
            from_chat = msg.chat_id,
            msg_id = msg.msg_id,
            "console session: forward (dry run)"
        );
        Ok(())
    }

    async fn send_text(&self, to: &ChatRef, text: &str) -> Result<(), SessionError> {
        tracing::info!(to = %to, "console session: send (dry run)\n{text}");
        Ok(())
    }
}
