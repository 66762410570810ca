use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use sigrelay::config::{AppConfig, TradeDefaults};
use sigrelay::models::ChatRef;
use sigrelay::telegram::{
    ChatHandle, ChatSession, InboundMessage, ReplyMeta, SessionError, ThreadInfo, ThreadPage,
};

/// In-memory chat session: serves configured entities and thread lists,
/// records every outbound forward and text send.
#[derive(Default)]
pub struct FakeSession {
    pub entities: HashMap<ChatRef, ChatHandle>,
    /// chat id → full thread list, paged by `list_threads`.
    pub threads: HashMap<i64, Vec<ThreadInfo>>,
    pub forwards: Mutex<Vec<(i64, ChatRef)>>,
    pub sends: Mutex<Vec<(ChatRef, String)>>,
}

impl FakeSession {
    #[allow(dead_code)]
    pub fn with_forum_chat(chat_id: i64, threads: Vec<ThreadInfo>) -> Self {
        let mut session = Self::default();
        session.entities.insert(
            ChatRef::Id(chat_id),
            ChatHandle {
                id: chat_id,
                handle: None,
                title: Some("Test Group".into()),
                forum: true,
            },
        );
        session.threads.insert(chat_id, threads);
        session
    }

    #[allow(dead_code)]
    pub fn sent_texts(&self) -> Vec<(ChatRef, String)> {
        self.sends.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn forwarded(&self) -> Vec<(i64, ChatRef)> {
        self.forwards.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSession for FakeSession {
    async fn get_entity(&self, chat: &ChatRef) -> Result<ChatHandle, SessionError> {
        match self.entities.get(chat) {
            Some(e) => Ok(e.clone()),
            None => match chat {
                ChatRef::Id(id) => Ok(ChatHandle {
                    id: *id,
                    handle: None,
                    title: None,
                    forum: false,
                }),
                ChatRef::Handle(h) => Err(SessionError::Resolution(h.clone())),
            },
        }
    }

    async fn list_threads(
        &self,
        chat: &ChatHandle,
        offset_thread: i64,
        limit: usize,
    ) -> Result<ThreadPage, SessionError> {
        let all = self.threads.get(&chat.id).cloned().unwrap_or_default();
        let start = if offset_thread == 0 {
            0
        } else {
            all.iter()
                .position(|t| t.thread_id == offset_thread)
                .map(|i| i + 1)
                .unwrap_or(all.len())
        };
        let items: Vec<ThreadInfo> = all.into_iter().skip(start).take(limit).collect();
        Ok(ThreadPage {
            total: Some(self.threads.get(&chat.id).map_or(0, Vec::len)),
            items,
        })
    }

    async fn forward(&self, msg: &InboundMessage, to: &ChatRef) -> Result<(), SessionError> {
        self.forwards.lock().unwrap().push((msg.msg_id, to.clone()));
        Ok(())
    }

    async fn send_text(&self, to: &ChatRef, text: &str) -> Result<(), SessionError> {
        self.sends.lock().unwrap().push((to.clone(), text.into()));
        Ok(())
    }
}

/// Thread entry the way the listing call reports it.
#[allow(dead_code)]
pub fn thread(id: i64, root: i64, title: &str) -> ThreadInfo {
    ThreadInfo {
        thread_id: id,
        root_msg_id: Some(root),
        title: Some(title.into()),
    }
}

/// Baseline config: one numeric source, no allow-list, everything else to
/// the defaults a fresh environment would give. Tests override fields.
#[allow(dead_code)]
pub fn test_config(sources: Vec<ChatRef>) -> AppConfig {
    AppConfig {
        api_id: 0,
        api_hash: String::new(),
        session_name: "test".into(),
        sources,
        thread_allowlist: None,
        default_target: ChatRef::handle("me"),
        target_map: HashMap::new(),
        notify_only: HashSet::new(),
        gemini_api_key: None,
        gemini_model: "gemini-1.5-flash".into(),
        trade: TradeDefaults {
            symbol_suffix: "USDT".into(),
            price_precision: 2,
            qty_precision: 4,
            risk_pct: None,
            balance: None,
            tp_profile: "auto".into(),
            tp_auto_threshold_pct: Decimal::new(12, 1),
            kw_scalp: "scalp".into(),
            kw_swing: "swing".into(),
        },
    }
}

/// A message that parses cleanly with every grammar tier exercised.
#[allow(dead_code)]
pub fn signal_message(chat_id: i64, msg_id: i64, thread_root: Option<i64>) -> InboundMessage {
    let mut msg = InboundMessage::new(
        chat_id,
        msg_id,
        "🟢 LONG $ETH\nEntrada: 10 - 12\nSL: 9\nTPs: 13 / 14",
    );
    msg.chat_title = Some("Test Group".into());
    if let Some(root) = thread_root {
        msg.reply = Some(ReplyMeta {
            top_msg_id: Some(root),
            reply_to_top_id: None,
        });
    }
    msg
}
