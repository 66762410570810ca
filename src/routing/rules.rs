use std::collections::{HashMap, HashSet};

use crate::config::AppConfig;
use crate::models::ChatRef;

/// Destination and notify-only lookup tables.
///
/// Both resolve with the same four-tier, first-match-wins order:
/// (chat, thread-id) → (chat, thread-root) → (chat, none) → global default.
/// At every tier the chat is matched by numeric id first, then by handle.
#[derive(Debug, Clone)]
pub struct RouteTables {
    targets: HashMap<(ChatRef, Option<i64>), ChatRef>,
    default_target: ChatRef,
    notify_only: HashSet<(ChatRef, Option<i64>)>,
}

impl RouteTables {
    pub fn new(
        targets: HashMap<(ChatRef, Option<i64>), ChatRef>,
        default_target: ChatRef,
        notify_only: HashSet<(ChatRef, Option<i64>)>,
    ) -> Self {
        Self {
            targets,
            default_target,
            notify_only,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.target_map.clone(),
            config.default_target.clone(),
            config.notify_only.clone(),
        )
    }

    pub fn default_target(&self) -> &ChatRef {
        &self.default_target
    }

    /// Resolve the destination for a message.
    pub fn resolve_target(
        &self,
        chat_id: i64,
        chat_handle: Option<&str>,
        thread_id: Option<i64>,
        thread_root: Option<i64>,
    ) -> ChatRef {
        for key in tier_keys(chat_id, chat_handle, thread_id, thread_root) {
            if let Some(target) = self.targets.get(&key) {
                return target.clone();
            }
        }
        self.default_target.clone()
    }

    /// Whether matching traffic should only get a notification.
    pub fn is_notify_only(
        &self,
        chat_id: i64,
        chat_handle: Option<&str>,
        thread_id: Option<i64>,
        thread_root: Option<i64>,
    ) -> bool {
        tier_keys(chat_id, chat_handle, thread_id, thread_root)
            .into_iter()
            .any(|key| self.notify_only.contains(&key))
    }
}

/// Candidate keys in lookup order.
fn tier_keys(
    chat_id: i64,
    chat_handle: Option<&str>,
    thread_id: Option<i64>,
    thread_root: Option<i64>,
) -> Vec<(ChatRef, Option<i64>)> {
    let mut tiers: Vec<Option<i64>> = Vec::with_capacity(3);
    if thread_id.is_some() {
        tiers.push(thread_id);
    }
    if thread_root.is_some() && thread_root != thread_id {
        tiers.push(thread_root);
    }
    tiers.push(None);

    let mut keys = Vec::with_capacity(tiers.len() * 2);
    for tier in tiers {
        keys.push((ChatRef::Id(chat_id), tier));
        if let Some(handle) = chat_handle {
            keys.push((ChatRef::handle(handle), tier));
        }
    }
    keys
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> RouteTables {
        let mut targets = HashMap::new();
        targets.insert((ChatRef::Id(-100), Some(4)), ChatRef::Id(1));
        targets.insert((ChatRef::Id(-100), Some(900)), ChatRef::Id(2));
        targets.insert((ChatRef::Id(-100), None), ChatRef::Id(3));
        targets.insert((ChatRef::handle("canal"), Some(7)), ChatRef::Id(4));

        let mut notify = HashSet::new();
        notify.insert((ChatRef::Id(-100), Some(4)));
        notify.insert((ChatRef::handle("quiet"), None));

        RouteTables::new(targets, ChatRef::handle("me"), notify)
    }

    #[test]
    fn test_thread_id_beats_root_beats_chat_beats_default() {
        let t = tables();
        // all three rules overlap; thread-id wins
        assert_eq!(t.resolve_target(-100, None, Some(4), Some(900)), ChatRef::Id(1));
        // no thread-id rule; root wins over chat-wide
        assert_eq!(t.resolve_target(-100, None, Some(5), Some(900)), ChatRef::Id(2));
        // neither thread rule; chat-wide
        assert_eq!(t.resolve_target(-100, None, Some(5), Some(901)), ChatRef::Id(3));
        // unknown chat falls to the global default
        assert_eq!(
            t.resolve_target(-200, None, Some(4), Some(900)),
            ChatRef::handle("me")
        );
    }

    #[test]
    fn test_handle_match_when_id_has_no_rule() {
        let t = tables();
        assert_eq!(
            t.resolve_target(-300, Some("Canal"), Some(7), None),
            ChatRef::Id(4)
        );
    }

    #[test]
    fn test_notify_only_same_tiering() {
        let t = tables();
        assert!(t.is_notify_only(-100, None, Some(4), None));
        assert!(!t.is_notify_only(-100, None, Some(5), None));
        assert!(t.is_notify_only(0, Some("quiet"), Some(9), Some(10)));
    }

    #[test]
    fn test_no_thread_info_uses_chat_tier() {
        let t = tables();
        assert_eq!(t.resolve_target(-100, None, None, None), ChatRef::Id(3));
    }
}
