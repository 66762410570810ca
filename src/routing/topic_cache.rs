use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::config::AppConfig;
use crate::telegram::{ChatHandle, ChatSession, SessionError};

/// Threads per listing page.
const THREAD_PAGE_SIZE: usize = 200;
/// Upper bound on pages fetched per chat (5 × 200 = 1000 threads).
const MAX_THREAD_PAGES: usize = 5;

#[derive(Debug, Default)]
struct ChatTopics {
    /// thread id → thread-root message id
    thread_to_root: HashMap<i64, i64>,
    /// thread-root message id → (thread id, title)
    root_to_thread: HashMap<i64, (i64, String)>,
    /// thread-roots whitelisted by the configured allow-list
    allowed_roots: HashSet<i64>,
}

/// Per-chat cache of thread-root ↔ thread mappings plus the derived
/// permission set, built once by the prefetch task at boot.
///
/// `resolve` and `is_allowed` are pure lookups with no I/O. A chat that has
/// not finished prefetching simply has no entry yet, so permission checks
/// fail closed during the warm-up window; threads created after the prefetch
/// stay unresolved until the process restarts.
#[derive(Debug, Default)]
pub struct TopicCache {
    chats: RwLock<HashMap<i64, ChatTopics>>,
}

impl TopicCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefetch thread maps for every configured source chat, sequentially.
    /// Failures are logged per chat and do not stop the remaining loads.
    pub async fn preload_all(&self, session: &dyn ChatSession, config: &AppConfig) {
        for source in &config.sources {
            let entity = match session.get_entity(source).await {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!(chat = %source, error = %e, "topic prefetch: chat resolution failed");
                    continue;
                }
            };
            let allowed = config.allowlist_for(entity.id, entity.handle.as_deref());
            if let Err(e) = self.preload_chat(session, &entity, allowed).await {
                tracing::error!(chat = %source, error = %e, "topic prefetch failed");
            }
        }
    }

    /// Load all thread pages for one chat and build its maps. Non-forum
    /// chats have no threads and are skipped. The configured allow-list of
    /// thread ids is translated into thread-root space here; ids not found
    /// in the freshly built map are silently dropped.
    pub async fn preload_chat(
        &self,
        session: &dyn ChatSession,
        entity: &ChatHandle,
        allowed_threads: Option<&HashSet<i64>>,
    ) -> Result<(), SessionError> {
        if !entity.forum {
            return Ok(());
        }

        let mut topics = ChatTopics::default();
        let mut offset = 0i64;
        let mut seen = 0usize;

        for _ in 0..MAX_THREAD_PAGES {
            let page = session
                .list_threads(entity, offset, THREAD_PAGE_SIZE)
                .await?;
            if page.items.is_empty() {
                break;
            }
            for t in &page.items {
                let Some(root) = t.root_msg_id else { continue };
                let title = t
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("topic#{}", t.thread_id));
                topics.thread_to_root.insert(t.thread_id, root);
                topics.root_to_thread.insert(root, (t.thread_id, title));
                seen += 1;
            }
            if let Some(total) = page.total {
                if seen >= total {
                    break;
                }
            }
            offset = page.items.last().map(|t| t.thread_id).unwrap_or(0);
        }

        if let Some(allowed) = allowed_threads {
            for thread_id in allowed {
                if let Some(root) = topics.thread_to_root.get(thread_id) {
                    topics.allowed_roots.insert(*root);
                }
            }
        }

        tracing::info!(
            chat_id = entity.id,
            threads = topics.root_to_thread.len(),
            allowed = topics.allowed_roots.len(),
            "topic cache preloaded"
        );

        self.chats
            .write()
            .expect("topic cache lock poisoned")
            .insert(entity.id, topics);
        Ok(())
    }

    /// Resolve (thread id, title) from a thread-root. `(None, None)` when the
    /// chat was never prefetched or the thread is newer than the prefetch.
    pub fn resolve(&self, chat_id: i64, thread_root: Option<i64>) -> (Option<i64>, Option<String>) {
        let Some(root) = thread_root else {
            return (None, None);
        };
        let chats = self.chats.read().expect("topic cache lock poisoned");
        match chats
            .get(&chat_id)
            .and_then(|topics| topics.root_to_thread.get(&root))
        {
            Some((thread_id, title)) => (Some(*thread_id), Some(title.clone())),
            None => (None, None),
        }
    }

    /// Whether this thread-root is whitelisted for the chat. Fails closed:
    /// no root, no cache entry, or an empty permission set all deny.
    pub fn is_allowed(&self, chat_id: i64, thread_root: Option<i64>) -> bool {
        let Some(root) = thread_root else {
            return false;
        };
        let chats = self.chats.read().expect("topic cache lock poisoned");
        chats
            .get(&chat_id)
            .map(|topics| topics.allowed_roots.contains(&root))
            .unwrap_or(false)
    }

    /// Whether the prefetch for this chat has completed.
    pub fn is_loaded(&self, chat_id: i64) -> bool {
        self.chats
            .read()
            .expect("topic cache lock poisoned")
            .contains_key(&chat_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
