use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use sigrelay::config::AppConfig;
use sigrelay::models::ChatRef;
use sigrelay::routing::{Router, TopicCache};
use sigrelay::services::{Advisor, LogOrderSink};
use sigrelay::telegram::{ChatSession, ConsoleSession, InboundMessage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    if config.sources.is_empty() {
        tracing::warn!("no source chats configured, running in discovery mode");
    } else {
        tracing::info!(sources = config.sources.len(), "listening on configured sources");
    }

    let session: Arc<dyn ChatSession> = Arc::new(ConsoleSession::new());
    let cache = Arc::new(TopicCache::new());

    // Prefetch topic maps in the background; until a chat finishes loading,
    // its allow-list checks deny everything.
    {
        let session = session.clone();
        let cache = cache.clone();
        let config = config.clone();
        tokio::spawn(async move {
            cache.preload_all(session.as_ref(), &config).await;
            tracing::info!("topic prefetch finished");
        });
    }

    let advisor = Advisor::from_config(&config);
    if advisor.is_none() {
        tracing::info!("advisor disabled (no GEMINI_API_KEY)");
    }

    let feed_chat = config.sources.first().cloned();
    let router = Router::new(
        session,
        cache,
        config,
        advisor,
        Arc::new(LogOrderSink::default()),
    );

    // Dry-run feed: read messages from stdin, one message per blank-line
    // separated block, and dispatch them as if they arrived from the first
    // configured source chat.
    tracing::info!("reading messages from stdin (blank line ends a message, EOF quits)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buf: Vec<String> = Vec::new();
    let mut next_msg_id: i64 = 1;

    loop {
        let line = lines.next_line().await?;
        let flush = match &line {
            Some(l) if !l.trim().is_empty() => {
                buf.push(l.clone());
                false
            }
            _ => true,
        };

        if flush && !buf.is_empty() {
            let text = buf.join("\n");
            buf.clear();
            let mut msg = InboundMessage::new(0, next_msg_id, text);
            next_msg_id += 1;
            match &feed_chat {
                Some(ChatRef::Id(id)) => msg.chat_id = *id,
                Some(ChatRef::Handle(h)) => msg.chat_handle = Some(h.clone()),
                None => {}
            }
            router.handle_event(&msg).await;
        }

        if line.is_none() {
            break;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
