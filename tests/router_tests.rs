mod common;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use common::{signal_message, test_config, thread, FakeSession};
use sigrelay::models::ChatRef;
use sigrelay::routing::{Router, TopicCache};
use sigrelay::services::LogOrderSink;
use sigrelay::telegram::InboundMessage;

const CHAT: i64 = -1002427024288;

fn router_with(session: Arc<FakeSession>, cache: Arc<TopicCache>, config: sigrelay::config::AppConfig) -> Router {
    Router::new(
        session,
        cache,
        config,
        None,
        Arc::new(LogOrderSink::default()),
    )
}

#[tokio::test]
async fn test_signal_is_forwarded_and_reported() {
    let session = Arc::new(FakeSession::with_forum_chat(
        CHAT,
        vec![thread(4, 400, "signals")],
    ));
    let cache = Arc::new(TopicCache::new());
    let config = test_config(vec![ChatRef::Id(CHAT)]);
    cache.preload_all(session.as_ref(), &config).await;

    let router = router_with(session.clone(), cache, config);
    router.handle_event(&signal_message(CHAT, 10, Some(400))).await;

    assert_eq!(session.forwarded(), vec![(10, ChatRef::handle("me"))]);
    let sends = session.sent_texts();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].0, ChatRef::handle("me"));
    assert!(sends[0].1.contains("Local validation OK"));
    assert!(sends[0].1.contains("LONG ETH"));
    assert!(sends[0].1.contains("ETHUSDT"));
}

#[tokio::test]
async fn test_allowlist_drops_before_prefetch() {
    let session = Arc::new(FakeSession::with_forum_chat(
        CHAT,
        vec![thread(4, 400, "signals")],
    ));
    // Cache deliberately not preloaded: warm-up window.
    let cache = Arc::new(TopicCache::new());
    let mut config = test_config(vec![ChatRef::Id(CHAT)]);
    config.thread_allowlist = Some(HashMap::from([(
        ChatRef::Id(CHAT),
        HashSet::from([4i64]),
    )]));

    let router = router_with(session.clone(), cache, config);
    router.handle_event(&signal_message(CHAT, 10, Some(400))).await;

    assert!(session.forwarded().is_empty());
    assert!(session.sent_texts().is_empty());
}

#[tokio::test]
async fn test_allowlist_passes_known_thread_and_drops_others() {
    let session = Arc::new(FakeSession::with_forum_chat(
        CHAT,
        vec![thread(4, 400, "signals"), thread(14, 500, "chat")],
    ));
    let cache = Arc::new(TopicCache::new());
    let mut config = test_config(vec![ChatRef::Id(CHAT)]);
    config.thread_allowlist = Some(HashMap::from([(
        ChatRef::Id(CHAT),
        HashSet::from([4i64]),
    )]));
    cache.preload_all(session.as_ref(), &config).await;

    let router = router_with(session.clone(), cache, config);
    router.handle_event(&signal_message(CHAT, 10, Some(500))).await;
    assert!(session.forwarded().is_empty());

    router.handle_event(&signal_message(CHAT, 11, Some(400))).await;
    assert_eq!(session.forwarded().len(), 1);
}

#[tokio::test]
async fn test_destination_tiering_thread_beats_chat_wide() {
    let session = Arc::new(FakeSession::with_forum_chat(
        CHAT,
        vec![thread(4, 400, "signals"), thread(14, 500, "chat")],
    ));
    let cache = Arc::new(TopicCache::new());
    let mut config = test_config(vec![ChatRef::Id(CHAT)]);
    config.target_map = HashMap::from([
        ((ChatRef::Id(CHAT), Some(4)), ChatRef::Id(555)),
        ((ChatRef::Id(CHAT), None), ChatRef::Id(333)),
    ]);
    cache.preload_all(session.as_ref(), &config).await;

    let router = router_with(session.clone(), cache, config);
    router.handle_event(&signal_message(CHAT, 10, Some(400))).await;
    router.handle_event(&signal_message(CHAT, 11, Some(500))).await;

    assert_eq!(
        session.forwarded(),
        vec![(10, ChatRef::Id(555)), (11, ChatRef::Id(333))]
    );
}

#[tokio::test]
async fn test_notify_only_route_sends_single_notification() {
    let session = Arc::new(FakeSession::with_forum_chat(
        CHAT,
        vec![thread(4, 400, "signals")],
    ));
    let cache = Arc::new(TopicCache::new());
    let mut config = test_config(vec![ChatRef::Id(CHAT)]);
    config.notify_only = HashSet::from([(ChatRef::Id(CHAT), Some(4))]);
    cache.preload_all(session.as_ref(), &config).await;

    let router = router_with(session.clone(), cache, config);
    router.handle_event(&signal_message(CHAT, 10, Some(400))).await;

    assert!(session.forwarded().is_empty());
    let sends = session.sent_texts();
    assert_eq!(sends.len(), 1);
    assert!(sends[0].1.contains("New message detected"));
    assert!(sends[0].1.contains("signals"));
}

#[tokio::test]
async fn test_unparseable_signal_still_forwards_with_notice() {
    let session = Arc::new(FakeSession::with_forum_chat(CHAT, vec![]));
    let cache = Arc::new(TopicCache::new());
    let config = test_config(vec![ChatRef::Id(CHAT)]);
    cache.preload_all(session.as_ref(), &config).await;

    let router = router_with(session.clone(), cache, config);
    // Looks like a signal (side + stop marker) but has no entry or TPs.
    let msg = InboundMessage::new(CHAT, 10, "SHORT the top! SL: 120");
    router.handle_event(&msg).await;

    assert_eq!(session.forwarded().len(), 1);
    let sends = session.sent_texts();
    assert_eq!(sends.len(), 1);
    assert!(sends[0].1.contains("could not be interpreted"));
}

#[tokio::test]
async fn test_non_signal_chatter_is_dropped_silently() {
    let session = Arc::new(FakeSession::with_forum_chat(CHAT, vec![]));
    let cache = Arc::new(TopicCache::new());
    let config = test_config(vec![ChatRef::Id(CHAT)]);
    cache.preload_all(session.as_ref(), &config).await;

    let router = router_with(session.clone(), cache, config);
    router
        .handle_event(&InboundMessage::new(CHAT, 10, "gm everyone ☀️"))
        .await;

    assert!(session.forwarded().is_empty());
    assert!(session.sent_texts().is_empty());
}

#[tokio::test]
async fn test_message_from_unconfigured_chat_is_ignored() {
    let session = Arc::new(FakeSession::default());
    let cache = Arc::new(TopicCache::new());
    let config = test_config(vec![ChatRef::Id(CHAT)]);

    let router = router_with(session.clone(), cache, config);
    router.handle_event(&signal_message(-555, 10, None)).await;

    assert!(session.forwarded().is_empty());
    assert!(session.sent_texts().is_empty());
}

#[tokio::test]
async fn test_discovery_mode_emits_nothing() {
    let session = Arc::new(FakeSession::default());
    let cache = Arc::new(TopicCache::new());
    let config = test_config(Vec::new());

    let router = router_with(session.clone(), cache, config);
    router.handle_event(&signal_message(CHAT, 10, None)).await;

    assert!(session.forwarded().is_empty());
    assert!(session.sent_texts().is_empty());
}

#[tokio::test]
async fn test_source_match_by_handle() {
    let session = Arc::new(FakeSession::default());
    let cache = Arc::new(TopicCache::new());
    let config = test_config(vec![ChatRef::handle("canal")]);

    let router = router_with(session.clone(), cache, config);
    let mut msg = signal_message(777, 10, None);
    msg.chat_handle = Some("canal".into());
    router.handle_event(&msg).await;

    assert_eq!(session.forwarded().len(), 1);
}
