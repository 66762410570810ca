use metrics::counter;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::{ChatRef, RoutingDecision};
use crate::parsing;
use crate::pipeline;
use crate::routing::{RouteTables, TopicCache};
use crate::services::{report, Advisor, OrderSink};
use crate::telegram::{extract_thread_root, ChatSession, InboundMessage};

/// The inbound dispatcher. One instance handles every message event for the
/// lifetime of the process; all state it touches is either immutable after
/// boot (config, route tables) or internally synchronized (topic cache).
pub struct Router {
    session: Arc<dyn ChatSession>,
    cache: Arc<TopicCache>,
    tables: RouteTables,
    config: AppConfig,
    advisor: Option<Advisor>,
    sink: Arc<dyn OrderSink>,
}

impl Router {
    pub fn new(
        session: Arc<dyn ChatSession>,
        cache: Arc<TopicCache>,
        config: AppConfig,
        advisor: Option<Advisor>,
        sink: Arc<dyn OrderSink>,
    ) -> Self {
        let tables = RouteTables::from_config(&config);
        Self {
            session,
            cache,
            tables,
            config,
            advisor,
            sink,
        }
    }

    /// Handle one inbound message event. Never returns an error and never
    /// panics on malformed input: failures inside the pipeline are reported
    /// to the resolved destination and swallowed here, so one bad message
    /// cannot take the listener down.
    pub async fn handle_event(&self, msg: &InboundMessage) {
        // Discovery mode: with no sources configured, log enough to build a
        // config from and do nothing else.
        if self.config.sources.is_empty() {
            tracing::info!(
                chat_id = msg.chat_id,
                handle = msg.chat_handle.as_deref().unwrap_or("-"),
                title = msg.chat_title.as_deref().unwrap_or("-"),
                "discovery: message from unconfigured chat"
            );
            return;
        }

        if !self.is_source(msg) {
            return;
        }

        let thread_root = extract_thread_root(msg);

        let text = msg.raw_text.trim();
        if text.is_empty() || !parsing::looks_like_signal(text) {
            tracing::debug!(
                chat_id = msg.chat_id,
                msg_id = msg.msg_id,
                "not a signal, dropped"
            );
            return;
        }

        // Thread allow-list gate. Only applies when an allow-list is
        // configured for this chat; the permission set lives in thread-root
        // space, so an unfinished prefetch denies everything (fail closed).
        if self
            .config
            .allowlist_for(msg.chat_id, msg.chat_handle.as_deref())
            .is_some()
            && !self.cache.is_allowed(msg.chat_id, thread_root)
        {
            let reason = if self.cache.is_loaded(msg.chat_id) {
                "thread not in allow-list"
            } else {
                "topic prefetch not finished yet"
            };
            tracing::info!(
                chat_id = msg.chat_id,
                msg_id = msg.msg_id,
                thread_root = thread_root.unwrap_or(0),
                reason,
                "signal dropped by allow-list"
            );
            counter!("messages_denied_total").increment(1);
            return;
        }

        let (thread_id, thread_title) = self.cache.resolve(msg.chat_id, thread_root);

        let handle = msg.chat_handle.as_deref();
        let target = self
            .tables
            .resolve_target(msg.chat_id, handle, thread_id, thread_root);
        let notify_only = self
            .tables
            .is_notify_only(msg.chat_id, handle, thread_id, thread_root);

        let decision = RoutingDecision {
            source_chat_id: msg.chat_id,
            source_handle: msg.chat_handle.clone(),
            source_title: msg
                .chat_title
                .clone()
                .unwrap_or_else(|| msg.chat_id.to_string()),
            thread_root,
            thread_id,
            thread_title,
            target,
            notify_only,
        };

        tracing::info!(
            chat_id = decision.source_chat_id,
            msg_id = msg.msg_id,
            thread_id = decision.thread_id.unwrap_or(0),
            target = %decision.target,
            notify_only = decision.notify_only,
            "routing message"
        );

        if let Err(e) = pipeline::process_message(
            self.session.as_ref(),
            self.advisor.as_ref(),
            self.sink.as_ref(),
            &self.config.trade,
            &decision,
            msg,
        )
        .await
        {
            tracing::error!(
                chat_id = decision.source_chat_id,
                msg_id = msg.msg_id,
                error = %e,
                "message processing failed"
            );
            counter!("messages_failed_total").increment(1);
            let notice = report::format_processing_error(&e);
            if let Err(e2) = self.session.send_text(&decision.target, &notice).await {
                tracing::error!(error = %e2, "could not deliver the error notice either");
            }
        }
    }

    fn is_source(&self, msg: &InboundMessage) -> bool {
        self.config.sources.iter().any(|s| match s {
            ChatRef::Id(id) => *id == msg.chat_id,
            ChatRef::Handle(h) => msg
                .chat_handle
                .as_deref()
                .is_some_and(|mh| mh.eq_ignore_ascii_case(h)),
        })
    }
}
